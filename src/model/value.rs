//! Core value type shared by the evaluator and the diff engine

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;

use super::object::ObjectRecord;

/// A value flowing through expression evaluation and object diffing.
///
/// Simple values (numbers, text, booleans, dates, enumerations) carry
/// intrinsic equality semantics and are diffed as a whole; composite values
/// (`Object`, `Array`) are diffed field by field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value; renders as the empty string
    Null,

    /// Boolean value
    Boolean(bool),

    /// Integer value (64-bit signed)
    Integer(i64),

    /// Decimal value with fixed-point precision
    Decimal(Decimal),

    /// String value
    String(String),

    /// Date value (without time)
    Date(NaiveDate),

    /// DateTime value with timezone offset
    DateTime(DateTime<FixedOffset>),

    /// Enumeration variant, identified by its type and variant names
    Enum {
        /// Enumeration type name
        type_name: String,
        /// Variant name
        variant: String,
    },

    /// Ordered sequence of values
    Array(Vec<Value>),

    /// Composite object described by an explicit field descriptor list
    Object(Arc<ObjectRecord>),
}

impl Value {
    /// Name of this value's type, used in diff results and error messages
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Decimal(_) => "Decimal",
            Value::String(_) => "String",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "DateTime",
            Value::Enum { type_name, .. } => type_name,
            Value::Array(_) => "Array",
            Value::Object(record) => record.type_name(),
        }
    }

    /// Whether this is a simple value type with intrinsic equality semantics
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            Value::Boolean(_)
                | Value::Integer(_)
                | Value::Decimal(_)
                | Value::String(_)
                | Value::Date(_)
                | Value::DateTime(_)
                | Value::Enum { .. }
        )
    }

    /// Whether this value counts as empty for diff classification.
    ///
    /// Absent values and blank strings are equivalent here; the diff engine
    /// relies on that rule when classifying added/deleted fields.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Whether this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract a boolean, if this value is one
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract a decimal view of a numeric value
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Enum { variant, .. } => write!(f, "{variant}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(record) => {
                write!(f, "{}{{", record.type_name())?;
                for (i, field) in record.fields().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", field.name(), field.value())?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<ObjectRecord> for Value {
    fn from(value: ObjectRecord) -> Self {
        Value::Object(Arc::new(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    n.as_f64()
                        .and_then(Decimal::from_f64_retain)
                        .map(Value::Decimal)
                        .unwrap_or(Value::Null)
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                let mut builder = ObjectRecord::builder("Object");
                for (name, item) in map {
                    builder = builder.field(name, Value::from(item));
                }
                builder.build().into()
            }
        }
    }
}
