//! Runtime values accepted by the encoder.
//!
//! [`Value`] is a closed enum over the scalar, temporal and composite shapes
//! a statement parameter can take, plus [`Value::Custom`] for
//! application-defined types carried as a type-erased payload and dispatched
//! through the encoder registry by name.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Stable identifier for a value's runtime type; the encoder registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    Text,
    Bytes,
    Date,
    Time,
    DateTime,
    /// Application-defined type, identified by name.
    Custom(&'static str),
}

/// A value to be substituted into a statement.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    /// Ordered sequence; encodes to a tuple literal `(e1,e2,…)`.
    List(Vec<Value>),
    /// Key/value mapping; each value encodes independently.
    Map(HashMap<String, Value>),
    /// Application-defined value, encoded by a registered function.
    Custom(CustomValue),
}

/// An application-defined value carried as a type-erased payload.
#[derive(Clone)]
pub struct CustomValue {
    type_name: &'static str,
    payload: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    /// The name this value's type was registered under.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the payload as a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl Value {
    /// Wrap an application-defined value for encoding under `type_name`.
    pub fn custom<T: Any + Send + Sync>(type_name: &'static str, payload: T) -> Self {
        Value::Custom(CustomValue {
            type_name,
            payload: Arc::new(payload),
        })
    }

    /// Registry key for this value's runtime type.
    ///
    /// Composites (`List`, `Map`) have no key; the encoder handles them
    /// structurally before any registry lookup.
    pub fn type_key(&self) -> Option<TypeKey> {
        match self {
            Value::Null => Some(TypeKey::Null),
            Value::Bool(_) => Some(TypeKey::Bool),
            Value::Int(_) => Some(TypeKey::Int),
            Value::UInt(_) => Some(TypeKey::UInt),
            Value::Float(_) => Some(TypeKey::Float),
            Value::Text(_) => Some(TypeKey::Text),
            Value::Bytes(_) => Some(TypeKey::Bytes),
            Value::Date(_) => Some(TypeKey::Date),
            Value::Time(_) => Some(TypeKey::Time),
            Value::DateTime(_) => Some(TypeKey::DateTime),
            Value::List(_) | Value::Map(_) => None,
            Value::Custom(c) => Some(TypeKey::Custom(c.type_name)),
        }
    }

    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Custom(c) => c.type_name,
        }
    }

    /// View this value as text, if it is text-like.
    ///
    /// `Text` always is; a custom value is text-like iff its payload is a
    /// `String`. This is the rule behind the registry's text fallback.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Custom(c) => c.downcast_ref::<String>().map(String::as_str),
            _ => None,
        }
    }

    /// Borrow a custom payload as a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Custom(c) => c.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
