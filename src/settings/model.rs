//! Setting model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::SettingsError;

/// Scalar value of a setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    /// Truthiness used by the templates to toggle sections
    pub fn as_bool(&self) -> bool {
        match self {
            SettingValue::Bool(b) => *b,
            SettingValue::Integer(n) => *n != 0,
            SettingValue::Float(f) => *f != 0.0,
            SettingValue::Text(s) => matches!(s.trim(), "1" | "true" | "on" | "yes"),
        }
    }

    /// JSON text stored in the `value` column
    pub fn to_column(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_column(raw: &str) -> Result<Self, SettingsError> {
        let json: serde_json::Value = serde_json::from_str(raw)?;
        Self::try_from(json)
    }
}

impl TryFrom<serde_json::Value> for SettingValue {
    type Error = SettingsError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Bool(b) => Ok(SettingValue::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(SettingValue::Integer(i)),
                None => n
                    .as_f64()
                    .map(SettingValue::Float)
                    .ok_or_else(|| SettingsError::InvalidValue(n.to_string())),
            },
            serde_json::Value::String(s) => Ok(SettingValue::Text(s)),
            other => Err(SettingsError::InvalidValue(format!(
                "expected a boolean, number or string, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Integer(n) => write!(f, "{}", n),
            SettingValue::Float(x) => write!(f, "{}", x),
            SettingValue::Text(s) => write!(f, "{}", s),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
        _ => "a scalar",
    }
}

/// A key/value configuration row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub id: i64,
    pub key: String,
    pub value: SettingValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Attributes for a new setting
#[derive(Debug, Clone)]
pub struct NewSetting {
    pub key: String,
    pub value: SettingValue,
}

impl NewSetting {
    pub fn new(key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Partial update; `None` keeps the current attribute
#[derive(Debug, Clone, Default)]
pub struct SettingChanges {
    pub key: Option<String>,
    pub value: Option<SettingValue>,
}

impl SettingChanges {
    pub fn value(value: impl Into<SettingValue>) -> Self {
        Self {
            key: None,
            value: Some(value.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_values_accepted() {
        assert_eq!(SettingValue::try_from(json!(true)).unwrap(), SettingValue::Bool(true));
        assert_eq!(SettingValue::try_from(json!(3)).unwrap(), SettingValue::Integer(3));
        assert_eq!(SettingValue::try_from(json!(1.5)).unwrap(), SettingValue::Float(1.5));
        assert_eq!(
            SettingValue::try_from(json!("dark")).unwrap(),
            SettingValue::Text("dark".to_string())
        );
    }

    #[test]
    fn test_non_scalar_values_rejected() {
        assert!(SettingValue::try_from(json!(null)).is_err());
        assert!(SettingValue::try_from(json!([1, 2])).is_err());
        assert!(SettingValue::try_from(json!({"a": 1})).is_err());
    }

    #[test]
    fn test_column_encoding() {
        let value = SettingValue::Bool(false);
        let raw = value.to_column().unwrap();
        assert_eq!(raw, "false");
        assert_eq!(SettingValue::from_column(&raw).unwrap(), value);
    }

    #[test]
    fn test_truthiness() {
        assert!(SettingValue::Bool(true).as_bool());
        assert!(!SettingValue::Integer(0).as_bool());
        assert!(SettingValue::Text("yes".to_string()).as_bool());
        assert!(!SettingValue::Text("no".to_string()).as_bool());
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let setting = Setting {
            id: 1,
            key: "show_contact_section".to_string(),
            value: SettingValue::Bool(false),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        let json = serde_json::to_value(&setting).unwrap();
        assert_eq!(json["value"], json!(false));
        assert!(json.get("deleted_at").is_none());
    }
}
