//! Typed configuration values
//!
//! [`ValueType`] is what a schema declares, [`Value`] is what a layer supplies.
//! Scalar parsing from raw text (files, command line) lives here so every
//! layer agrees on the same literal conventions.

use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Ordered mapping of child name to resolved value, used for section values
pub type ValueMap = IndexMap<String, Option<Value>>;

/// Declared type of a configuration element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    List(Box<ValueType>),
}

/// A configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<Value>),
    Map(ValueMap),
}

impl ValueType {
    /// Shorthand for `List(Box::new(item))`
    pub fn list(item: Self) -> Self {
        Self::List(Box::new(item))
    }

    /// Whether this type is a single value rather than a list
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_))
    }

    /// Item type for list types
    #[must_use]
    pub fn item_type(&self) -> Option<&Self> {
        match self {
            Self::List(item) => Some(item),
            _ => None,
        }
    }

    /// Check whether `value` conforms to this type
    ///
    /// Lists are checked item by item; no implicit conversions are made.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_))
            | (Self::Integer, Value::Integer(_))
            | (Self::Float, Value::Float(_))
            | (Self::Boolean, Value::Boolean(_)) => true,
            (Self::List(item), Value::List(items)) => items.iter().all(|v| item.matches(v)),
            _ => false,
        }
    }

    /// Parse a raw scalar literal
    ///
    /// Booleans accept `true/yes/on/1` and `false/no/off/0`, case-insensitive.
    pub fn parse_scalar(&self, raw: &str) -> Result<Value, String> {
        match self {
            Self::String => Ok(Value::String(raw.to_string())),
            Self::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| format!("expected an integer, got {raw:?}")),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("expected a float, got {raw:?}")),
            Self::Boolean => parse_bool(raw)
                .map(Value::Boolean)
                .ok_or_else(|| format!("expected a boolean (true/false/yes/no/on/off/1/0), got {raw:?}")),
            Self::List(_) => Err(format!("cannot parse {raw:?} as a whole list; parse items individually")),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
            Self::List(item) => write!(f, "list of {item}"),
        }
    }
}

/// Parse a boolean literal
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub const fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short description of the value's kind, for error messages
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::List(_) => "list",
            Self::Map(_) => "section",
        }
    }

    /// Ordering used by list sorting
    ///
    /// Values of the same scalar kind compare naturally (floats by total order);
    /// mixed kinds fall back to a fixed kind order.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    let ord = x.sort_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Boolean(_) => 0,
            Self::Integer(_) => 1,
            Self::Float(_) => 2,
            Self::String(_) => 3,
            Self::List(_) => 4,
            Self::Map(_) => 5,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            // Debug keeps the fractional part: 2.0 rather than 2
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match value {
                        Some(value) => write!(f, "{key}: {value}")?,
                        None => write!(f, "{key}: <unset>")?,
                    }
                }
                write!(f, "}}")
            }
        }
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

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_is_strict() {
        assert!(ValueType::Integer.matches(&Value::Integer(5)));
        assert!(!ValueType::Integer.matches(&Value::from("5")));
        assert!(!ValueType::Float.matches(&Value::Integer(5)));
        assert!(ValueType::Float.matches(&Value::Float(5.2)));
        assert!(!ValueType::Boolean.matches(&Value::Integer(0)));
        assert!(!ValueType::Boolean.matches(&Value::from("true")));
    }

    #[test]
    fn test_list_matches_every_item() {
        let strings = ValueType::list(ValueType::String);
        assert!(strings.matches(&Value::from(vec!["a", "b"])));
        assert!(strings.matches(&Value::List(Vec::new())));
        assert!(!strings.matches(&Value::List(vec![Value::from("a"), Value::Integer(1)])));
        assert!(!strings.matches(&Value::from("a")));
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(ValueType::Integer.parse_scalar(" 5 "), Ok(Value::Integer(5)));
        assert_eq!(ValueType::Float.parse_scalar("2.3"), Ok(Value::Float(2.3)));
        assert_eq!(ValueType::Float.parse_scalar("5"), Ok(Value::Float(5.0)));
        assert_eq!(ValueType::String.parse_scalar("x y"), Ok(Value::from("x y")));
        assert!(ValueType::Integer.parse_scalar("five").is_err());
        assert!(ValueType::Float.parse_scalar("").is_err());
        assert!(ValueType::list(ValueType::String).parse_scalar("a").is_err());
    }

    #[test]
    fn test_parse_bool_literals() {
        for raw in ["true", "Yes", "ON", "1"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["false", "no", "Off", "0"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(3.5).to_string(), "3.5");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(ValueType::list(ValueType::Integer).to_string(), "list of integer");
    }

    #[test]
    fn test_sort_cmp() {
        let mut values = vec![Value::from("b"), Value::from("a"), Value::from("c")];
        values.sort_by(Value::sort_cmp);
        assert_eq!(values, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
    }

    #[test]
    fn test_serialize_map() {
        let mut map = ValueMap::new();
        map.insert("name".to_string(), Some(Value::from("test")));
        map.insert("age".to_string(), None);
        let json = serde_json::to_string(&Value::Map(map)).unwrap();
        assert_eq!(json, r#"{"name":"test","age":null}"#);
    }
}
