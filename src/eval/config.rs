//! Evaluation method configuration.
//!
//! One enum variant per method, each carrying its own parameters:
//!
//! | Method   | Config         | Parameters |
//! |----------|----------------|------------|
//! | `simple` | [`SimpleConfig`] | none |
//! | `binary` | [`BinaryConfig`] | none |
//! | `top-k`  | [`TopKConfig`]   | `k` (default 5) |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Method used when none is given.
pub const DEFAULT_METHOD: &str = "simple";

/// Default `k` for top-k evaluation.
pub const DEFAULT_TOP_K: usize = 5;

/// Config for simple evaluation: a prediction is correct iff it equals the
/// ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleConfig {}

/// Config for binary evaluation over `(negative, positive)` classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinaryConfig {}

/// Config for top-k evaluation.
///
/// Deserialization rejects `k == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTopKConfig")]
pub struct TopKConfig {
    /// A prediction is correct when the truth is among the `k` largest logits.
    pub k: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTopKConfig {
    #[serde(default = "default_k")]
    k: usize,
}

fn default_k() -> usize {
    DEFAULT_TOP_K
}

impl TryFrom<RawTopKConfig> for TopKConfig {
    type Error = Error;

    fn try_from(raw: RawTopKConfig) -> Result<Self> {
        Self::new(raw.k)
    }
}

impl Default for TopKConfig {
    fn default() -> Self {
        Self { k: DEFAULT_TOP_K }
    }
}

impl TopKConfig {
    /// Config with the given `k`.
    pub fn new(k: usize) -> Result<Self> {
        let config = Self { k };
        config.validate()?;
        Ok(config)
    }

    /// Check that `k >= 1`.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::invalid_input("top-k evaluation requires k >= 1"));
        }
        Ok(())
    }
}

/// Classification evaluation method and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum EvaluationConfig {
    /// Exact-match evaluation.
    #[serde(rename = "simple")]
    Simple(SimpleConfig),
    /// Binary (TP/FP/TN/FN) evaluation.
    #[serde(rename = "binary")]
    Binary(BinaryConfig),
    /// Top-k evaluation over logits.
    #[serde(rename = "top-k")]
    TopK(TopKConfig),
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig::Simple(SimpleConfig::default())
    }
}

impl EvaluationConfig {
    /// Build a config from a method name and its parameters.
    ///
    /// `method = None` selects `simple`. `params` is a JSON object of the
    /// method's parameters (`Value::Null` for none); unknown parameters are
    /// rejected.
    ///
    /// ```rust
    /// use verdict::eval::EvaluationConfig;
    ///
    /// let params = serde_json::json!({ "k": 3 });
    /// let config = EvaluationConfig::from_method(Some("top-k"), params).unwrap();
    /// assert_eq!(config.method(), "top-k");
    ///
    /// assert!(EvaluationConfig::from_method(Some("fuzzy"), serde_json::Value::Null).is_err());
    /// ```
    pub fn from_method(method: Option<&str>, params: Value) -> Result<Self> {
        let method = method.unwrap_or(DEFAULT_METHOD);
        let params = match params {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        let bad_params = |e: serde_json::Error| {
            Error::invalid_input(format!("invalid parameters for '{}': {}", method, e))
        };

        let config = match method {
            "simple" => {
                EvaluationConfig::Simple(serde_json::from_value(params).map_err(bad_params)?)
            }
            "binary" => {
                EvaluationConfig::Binary(serde_json::from_value(params).map_err(bad_params)?)
            }
            "top-k" => EvaluationConfig::TopK(serde_json::from_value(params).map_err(bad_params)?),
            other => {
                return Err(Error::invalid_input(format!(
                    "Unsupported evaluation method '{}'",
                    other
                )))
            }
        };
        Ok(config)
    }

    /// Pick the explicit config if given, otherwise build one from the
    /// method name and parameters. An explicit config is validated too.
    pub fn resolve(
        config: Option<EvaluationConfig>,
        method: Option<&str>,
        params: Value,
    ) -> Result<Self> {
        match config {
            Some(config) => {
                config.validate()?;
                Ok(config)
            }
            None => Self::from_method(method, params),
        }
    }

    /// Check the method's parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            EvaluationConfig::Simple(_) | EvaluationConfig::Binary(_) => Ok(()),
            EvaluationConfig::TopK(config) => config.validate(),
        }
    }

    /// Method name.
    pub fn method(&self) -> &'static str {
        match self {
            EvaluationConfig::Simple(_) => "simple",
            EvaluationConfig::Binary(_) => "binary",
            EvaluationConfig::TopK(_) => "top-k",
        }
    }

    /// Names of all supported methods.
    pub fn methods() -> &'static [&'static str] {
        &["simple", "binary", "top-k"]
    }
}

impl fmt::Display for EvaluationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationConfig::TopK(c) => write!(f, "top-k (k={})", c.k),
            other => f.write_str(other.method()),
        }
    }
}

impl FromStr for EvaluationConfig {
    type Err = Error;

    /// Method name with default parameters.
    fn from_str(s: &str) -> Result<Self> {
        Self::from_method(Some(s), Value::Null)
    }
}
