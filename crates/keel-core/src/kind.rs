//! # Value Kinds
//!
//! Classifies a JSON value into the small set of kinds that type checks and
//! type messages talk about. The display names (`int`, `str`, `dict`, ...)
//! appear verbatim in error text and are therefore part of the wire format.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of a JSON value.
///
/// Numbers representable as `i64` or `u64` are [`Kind::Int`]; every other
/// number is [`Kind::Float`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool,
    /// Integral number.
    Int,
    /// Non-integral number.
    Float,
    /// String.
    Str,
    /// Array.
    List,
    /// Object.
    Dict,
}

impl Kind {
    /// All kinds, in declaration order.
    pub const ALL: [Kind; 7] = [
        Kind::Null,
        Kind::Bool,
        Kind::Int,
        Kind::Float,
        Kind::Str,
        Kind::List,
        Kind::Dict,
    ];

    /// Classify a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => Kind::Int,
            Value::Number(_) => Kind::Float,
            Value::String(_) => Kind::Str,
            Value::Array(_) => Kind::List,
            Value::Object(_) => Kind::Dict,
        }
    }

    /// The name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Str => "str",
            Kind::List => "list",
            Kind::Dict => "dict",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_of_each_json_shape() {
        assert_eq!(Kind::of(&json!(null)), Kind::Null);
        assert_eq!(Kind::of(&json!(true)), Kind::Bool);
        assert_eq!(Kind::of(&json!(3)), Kind::Int);
        assert_eq!(Kind::of(&json!(u64::MAX)), Kind::Int);
        assert_eq!(Kind::of(&json!(-7)), Kind::Int);
        assert_eq!(Kind::of(&json!(3.14)), Kind::Float);
        assert_eq!(Kind::of(&json!("x")), Kind::Str);
        assert_eq!(Kind::of(&json!([1])), Kind::List);
        assert_eq!(Kind::of(&json!({"a": 1})), Kind::Dict);
    }

    #[test]
    fn test_names_are_stable() {
        let names: Vec<&str> = Kind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, ["null", "bool", "int", "float", "str", "list", "dict"]);
    }

    #[test]
    fn test_serde_uses_message_names() {
        let encoded = serde_json::to_string(&Kind::Dict).unwrap();
        assert_eq!(encoded, "\"dict\"");
        let decoded: Kind = serde_json::from_str("\"str\"").unwrap();
        assert_eq!(decoded, Kind::Str);
    }
}
