use crate::{Error, Result};

use chrono::NaiveDateTime;

#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Signed 32-bit integer
    I32(i32),

    /// Signed 64-bit integer
    I64(i64),

    /// 64-bit float
    F64(f64),

    /// String value
    String(String),

    /// Binary value
    Bytes(Vec<u8>),

    /// Date and time without time zone
    DateTime(NaiveDateTime),

    /// A list of values of the same type
    List(Vec<Value>),
}

/// Text format of stored date-time values (ISO-8601).
pub(crate) const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Integer view of the value, widening `I32` and `Bool`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I64(v) => Some(v),
            Self::I32(v) => Some(v as i64),
            Self::Bool(v) => Some(v as i64),
            _ => None,
        }
    }

    pub fn to_i64(&self) -> Result<i64> {
        self.as_i64()
            .ok_or_else(|| err!("cannot convert value to i64; value={self:?}"))
    }

    pub fn to_bool(&self) -> Result<bool> {
        match *self {
            Self::Bool(v) => Ok(v),
            Self::I64(v) => Ok(v != 0),
            Self::I32(v) => Ok(v != 0),
            _ => Err(err!("cannot convert value to bool; value={self:?}")),
        }
    }

    pub fn to_string_value(&self) -> Result<String> {
        match self {
            Self::String(v) => Ok(v.clone()),
            _ => Err(err!("cannot convert value to string; value={self:?}")),
        }
    }

    /// Optional string: `Null` maps to `None`.
    pub fn to_opt_string(&self) -> Result<Option<String>> {
        match self {
            Self::Null => Ok(None),
            _ => self.to_string_value().map(Some),
        }
    }

    /// Optional integer: `Null` maps to `None`.
    pub fn to_opt_i64(&self) -> Result<Option<i64>> {
        match self {
            Self::Null => Ok(None),
            _ => self.to_i64().map(Some),
        }
    }

    /// Parses an ISO-8601 date-time as stored by the engine.
    pub fn parse_date_time(text: &str) -> Result<Value> {
        NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
            .map(Value::DateTime)
            .map_err(|e| err!("invalid date-time `{text}`: {e}"))
    }

    /// Text form of a date-time value as written to the engine.
    pub fn date_time_text(value: &NaiveDateTime) -> String {
        value.format(DATE_TIME_FORMAT).to_string()
    }

    /// Encodes the value as JSON. Lists of primitives are stored this way.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(v) => Json::Bool(*v),
            Value::I32(v) => Json::from(*v),
            Value::I64(v) => Json::from(*v),
            Value::F64(v) => Json::from(*v),
            Value::String(v) => Json::String(v.clone()),
            Value::Bytes(v) => Json::Array(v.iter().map(|b| Json::from(*b)).collect()),
            Value::DateTime(v) => Json::String(Value::date_time_text(v)),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
        }
    }

    /// Decodes a JSON document written by [`Value::to_json`].
    pub fn from_json(json: &serde_json::Value) -> Value {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(v) => Value::Bool(*v),
            Json::Number(n) => match n.as_i64() {
                Some(v) => Value::I64(v),
                None => Value::F64(n.as_f64().unwrap_or_default()),
            },
            Json::String(v) => Value::String(v.clone()),
            Json::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            Json::Object(_) => Value::String(json.to_string()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Self::Null,
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.to_i64()
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            _ => Err(err!("cannot convert value to string; value={value:?}")),
        }
    }
}
