//! Label types stored on samples.

use serde::{Deserialize, Serialize};

/// A single classification label.
///
/// Ground truth usually only carries `label`; model predictions may add a
/// `confidence` and the raw per-class `logits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Classification {
    /// Class name. `None` means the label is absent.
    #[serde(default)]
    pub label: Option<String>,
    /// Confidence of the label, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Raw (pre-softmax) per-class scores, in class-list order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logits: Option<Vec<f64>>,
}

impl Classification {
    /// Create a label with no confidence.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            confidence: None,
            logits: None,
        }
    }

    /// Set the confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Set the logits.
    #[must_use]
    pub fn with_logits(mut self, logits: Vec<f64>) -> Self {
        self.logits = Some(logits);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_skips_absent_fields() {
        let json = serde_json::to_value(Classification::new("cat")).unwrap();
        assert_eq!(json, serde_json::json!({ "label": "cat" }));

        let back: Classification = serde_json::from_value(serde_json::json!({
            "label": "dog",
            "confidence": 0.25,
            "logits": [0.1, 2.0],
        }))
        .unwrap();
        assert_eq!(back.confidence, Some(0.25));
        assert_eq!(back.logits.as_deref(), Some(&[0.1, 2.0][..]));
    }
}
