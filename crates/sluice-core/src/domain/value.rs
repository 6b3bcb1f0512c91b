//! Sample values flowing through preprocessing pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A discriminated metric value.
///
/// `None` marks an absent value (e.g. a discarded sample); `Error` carries a
/// failure produced upstream or by a pipeline, so errors can travel the same
/// path as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    /// Floating-point sample.
    Float(f64),

    /// Unsigned 64-bit sample (counters, sizes).
    UInt(u64),

    /// Text sample.
    Text(String),

    /// Log record with metadata.
    Log(LogValue),

    /// No value.
    None,

    /// An error carried as a value.
    Error(String),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Float(_) => "float",
            Value::UInt(_) => "uint",
            Value::Text(_) => "text",
            Value::Log(_) => "log",
            Value::None => "none",
            Value::Error(_) => "error",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => v.fmt(f),
            Value::UInt(v) => v.fmt(f),
            Value::Text(v) => v.fmt(f),
            Value::Log(v) => v.message.fmt(f),
            Value::None => f.write_str("(none)"),
            Value::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// A log sample: message text plus log metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogValue {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default)]
    pub severity: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<u64>,
}

impl LogValue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            severity: 0,
            event_id: None,
        }
    }
}

/// A value together with its originating timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: Value,
    pub ts: DateTime<Utc>,
}

impl Sample {
    pub fn new(value: Value, ts: DateTime<Utc>) -> Self {
        Self { value, ts }
    }

    /// A sample stamped with the current wall clock.
    pub fn now(value: Value) -> Self {
        Self::new(value, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_is_tagged_enum() {
        let v = Value::Float(3.14);
        let s = serde_json::to_string(&v).unwrap();
        let j: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert_eq!(j["kind"], "Float");
        assert_eq!(j["value"], 3.14);
    }

    #[test]
    fn log_value_roundtrips() {
        let v = Value::Log(LogValue {
            message: "link down".to_string(),
            source: Some("eth0".to_string()),
            severity: 4,
            event_id: Some(17),
        });

        let s = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn type_names_match_variants() {
        assert_eq!(Value::UInt(1).type_name(), "uint");
        assert_eq!(Value::None.type_name(), "none");
        assert!(Value::Error("x".into()).is_error());
    }
}
