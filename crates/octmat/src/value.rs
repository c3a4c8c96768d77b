//! [`Value`]: the dynamic input graph handed to the normalizer.

use crate::array::{Complex64, NdArray};

/// A dynamically typed value as produced by the host side.
///
/// Containers keep insertion order. `Set` makes no ordering promise beyond
/// the order its elements were stored in.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit absence of a value.
    None,
    Bool(bool),
    Int(i64),
    /// Unsigned integer, used for values above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Complex(Complex64),
    Str(String),
    Bytes(Vec<u8>),
    /// Ordered, list-like sequence.
    List(Vec<Value>),
    /// Fixed tuple.
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    /// String-keyed mapping.
    Dict(Vec<(String, Value)>),
    Array(NdArray),
}

impl Value {
    /// Builds a `Dict` from key/value pairs.
    pub fn dict<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Looks up a key of a `Dict`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Dict(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Complex64> for Value {
    fn from(c: Complex64) -> Self {
        Value::Complex(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<NdArray> for Value {
    fn from(array: NdArray) -> Self {
        Value::Array(array)
    }
}
