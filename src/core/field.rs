//! Typed values read from collaborator entities

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A polymorphic value returned by an entity property or field accessor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Image(ImageValue),
    List(Vec<FieldValue>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::DateTime(dt) => Some(dt.timestamp()),
            FieldValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Get the value as an image if it is one
    pub fn as_image(&self) -> Option<&ImageValue> {
        match self {
            FieldValue::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The primary value of a multi-valued field: its first item
    pub fn primary(&self) -> &FieldValue {
        match self {
            FieldValue::List(items) => items.first().unwrap_or(&FieldValue::Null),
            other => other,
        }
    }

    /// Compare against a raw URL filter value
    ///
    /// Query strings carry no type information, so scalars compare through
    /// their canonical text form. Lists match when any item matches.
    pub fn matches_raw(&self, raw: &str) -> bool {
        match self {
            FieldValue::String(s) => s == raw,
            FieldValue::Integer(i) => raw.parse::<i64>().is_ok_and(|r| r == *i),
            FieldValue::Float(v) => raw.parse::<f64>().is_ok_and(|r| r == *v),
            FieldValue::Boolean(b) => match raw {
                "1" | "true" => *b,
                "0" | "false" => !*b,
                _ => false,
            },
            FieldValue::DateTime(dt) => raw.parse::<i64>().is_ok_and(|r| r == dt.timestamp()),
            FieldValue::Image(image) => image.uri == raw,
            FieldValue::List(items) => items.iter().any(|item| item.matches_raw(raw)),
            FieldValue::Null => false,
        }
    }

    /// Render as JSON for a projected row
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::String(s) => json!(s),
            FieldValue::Integer(i) => json!(i),
            FieldValue::Float(f) => json!(f),
            FieldValue::Boolean(b) => json!(b),
            FieldValue::DateTime(dt) => json!(dt.timestamp()),
            FieldValue::Image(image) => json!(image.uri),
            FieldValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            FieldValue::Null => Value::Null,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<ImageValue> for FieldValue {
    fn from(value: ImageValue) -> Self {
        FieldValue::Image(value)
    }
}

/// An image field item: the stored file URI plus its attached sub-fields
/// (alt text, title text, caption, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageValue {
    /// Stream-wrapper URI of the original file, e.g. `public://topics/a.jpg`
    pub uri: String,

    /// Sub-field values keyed by field name
    #[serde(default)]
    pub fields: IndexMap<String, FieldValue>,
}

impl ImageValue {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            fields: IndexMap::new(),
        }
    }

    /// Attach a sub-field value
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}
