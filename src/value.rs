//! Compiled values
//!
//! The reduction pass is generic over the value type. [`CompiledValue`]
//! describes how the default aggregation policies build values when a node
//! has no reduce callback of its own.
//!
//! # Example
//!
//! ```rust
//! use ebnfkit::value::{CompiledValue, Value};
//!
//! let v = Value::from_list(vec![Value::from_text("a"), Value::int(1)]);
//! assert_eq!(v.text(), "a1");
//! assert_eq!(Value::concat(vec![Value::int(7)]), Value::int(7));
//! ```

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

/// A value the reduction pass can produce without callbacks
pub trait CompiledValue: Sized + Clone {
    /// Value of a text unit
    fn from_text(text: &str) -> Self;

    /// Value of a list unit
    fn from_list(items: Vec<Self>) -> Self;

    /// Value of erased content
    fn empty() -> Self;

    /// Append the textual form of the value to `out`
    fn write_text(&self, out: &mut String);

    /// Textual form of the value
    fn text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    /// Text aggregation; a single value is returned unchanged
    fn concat(mut items: Vec<Self>) -> Self {
        if items.len() == 1 {
            if let Some(item) = items.pop() {
                return item;
            }
        }
        let mut out = String::new();
        for item in &items {
            item.write_text(&mut out);
        }
        Self::from_text(&out)
    }
}

impl CompiledValue for String {
    fn from_text(text: &str) -> Self {
        text.to_owned()
    }

    fn from_list(items: Vec<Self>) -> Self {
        items.concat()
    }

    fn empty() -> Self {
        String::new()
    }

    fn write_text(&self, out: &mut String) {
        out.push_str(self);
    }
}

impl CompiledValue for serde_json::Value {
    fn from_text(text: &str) -> Self {
        serde_json::Value::String(text.to_owned())
    }

    fn from_list(items: Vec<Self>) -> Self {
        serde_json::Value::Array(items)
    }

    fn empty() -> Self {
        serde_json::Value::Null
    }

    fn write_text(&self, out: &mut String) {
        match self {
            serde_json::Value::Null => {}
            serde_json::Value::String(s) => out.push_str(s),
            serde_json::Value::Array(items) => items.iter().for_each(|i| i.write_text(out)),
            other => out.push_str(&other.to_string()),
        }
    }
}

// ============================================================================
// Value
// ============================================================================

/// A dynamically typed compiled value
///
/// Hash entries keep their insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null/nil value
    #[default]
    Nil,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Ordered key-value pairs
    Hash(Vec<(String, Value)>),
}

impl Value {
    /// Create a nil value
    pub fn nil() -> Self {
        Value::Nil
    }

    /// Create a boolean value
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create an integer value
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// Create a float value
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create an array value
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(items)
    }

    /// Create a hash value
    pub fn hash(pairs: Vec<(impl Into<String>, Value)>) -> Self {
        Value::Hash(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Check if this is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get as ordered pairs
    pub fn as_hash(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Hash(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Get a hash value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_hash()
            .and_then(|pairs| pairs.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v)
    }

    /// Get an array element by index
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl CompiledValue for Value {
    fn from_text(text: &str) -> Self {
        Value::String(text.to_owned())
    }

    fn from_list(items: Vec<Self>) -> Self {
        Value::Array(items)
    }

    fn empty() -> Self {
        Value::Nil
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Value::Nil => {}
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Float(f) => out.push_str(&f.to_string()),
            Value::String(s) => out.push_str(s),
            Value::Array(items) => items.iter().for_each(|i| i.write_text(out)),
            Value::Hash(pairs) => pairs.iter().for_each(|(_, v)| v.write_text(out)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Hash(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?} => {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_single_value_is_unchanged() {
        let v = Value::concat(vec![Value::array(vec![Value::int(1)])]);
        assert_eq!(v, Value::array(vec![Value::int(1)]));
    }

    #[test]
    fn test_concat_joins_text() {
        let v = Value::concat(vec![Value::from_text("ab"), Value::Nil, Value::int(3)]);
        assert_eq!(v.as_str(), Some("ab3"));
        assert_eq!(String::concat(vec![]), "");
    }

    #[test]
    fn test_hash_keeps_order_and_lookup() {
        let v = Value::hash(vec![("z", Value::int(1)), ("a", Value::bool(true))]);
        assert_eq!(v.get("a"), Some(&Value::Bool(true)));
        assert_eq!(v.to_json().unwrap(), r#"{"z":1,"a":true}"#);
    }

    #[test]
    fn test_json_value_text() {
        let v = serde_json::json!(["a", 1, null, true]);
        assert_eq!(v.text(), "a1true");
    }

    #[test]
    fn test_display() {
        let v = Value::array(vec![Value::string("x"), Value::Nil]);
        assert_eq!(v.to_string(), "[\"x\", nil]");
    }
}
