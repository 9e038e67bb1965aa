//! # Type Checks and Conversions
//!
//! [`Type`] checks a value's [`Kind`]; [`ToInt`] and [`ToFloat`] coerce
//! loosely typed input (form fields, query strings) into numbers.

use keel_core::message::{NOT_AN_INTEGER, NOT_A_NUMBER, WRONG_TYPE, WRONG_TYPE_ONE_OF};
use keel_core::{Failure, FilterError, Kind, Message};
use serde_json::{Number, Value};

/// The failure reported when `value` is none of the `expected` kinds.
///
/// A single expected kind reads "Expected int."; several read
/// "Expected one of int, float.".
pub fn wrong_type(expected: &[Kind], value: &Value) -> Failure {
    let got = Kind::of(value);
    let message = match expected {
        [only] => Message::new(WRONG_TYPE).with("type", only),
        kinds => {
            let names: Vec<&str> = kinds.iter().map(|k| k.name()).collect();
            Message::new(WRONG_TYPE_ONE_OF).with("types", names.join(", "))
        }
    };
    Failure::message(message.with("wrong_type", got))
}

/// Accepts values of the given kinds and passes them through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    kinds: Vec<Kind>,
    loose: bool,
}

impl Type {
    /// Accept any of `kinds`.
    pub fn new(kinds: impl IntoIterator<Item = Kind>) -> Self {
        let mut collected: Vec<Kind> = Vec::new();
        for kind in kinds {
            if !collected.contains(&kind) {
                collected.push(kind);
            }
        }
        Self {
            kinds: collected,
            loose: false,
        }
    }

    /// Accept exactly one kind.
    pub fn of(kind: Kind) -> Self {
        Self::new([kind])
    }

    /// Let integers satisfy a `Float` check.
    pub fn loose(mut self) -> Self {
        self.loose = true;
        self
    }

    /// The accepted kinds.
    pub fn kinds(&self) -> &[Kind] {
        &self.kinds
    }

    fn accepts(&self, kind: Kind) -> bool {
        self.kinds.contains(&kind)
            || (self.loose && kind == Kind::Int && self.kinds.contains(&Kind::Float))
    }
}

impl crate::Filter for Type {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        if self.accepts(Kind::of(&value)) {
            Ok(value)
        } else {
            Err(wrong_type(&self.kinds, &value).into())
        }
    }
}

/// Converts to an integer.
///
/// Integers pass through, floats are truncated toward zero, strings are
/// parsed after trimming whitespace, booleans become 0 or 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToInt;

impl ToInt {
    fn convert(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(i);
                }
                if n.is_u64() {
                    return None;
                }
                let f = n.as_f64()?.trunc();
                (f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
            }
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }
}

impl crate::Filter for ToInt {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        if value.as_u64().is_some() {
            return Ok(value);
        }
        Self::convert(&value)
            .map(Value::from)
            .ok_or_else(|| FilterError::invalid(NOT_AN_INTEGER))
    }
}

/// Converts to a floating point number.
///
/// Numbers and numeric strings (after trimming) are accepted if finite;
/// booleans become 0.0 or 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToFloat;

impl crate::Filter for ToFloat {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        let parsed = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        };
        parsed
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| FilterError::invalid(NOT_A_NUMBER))
    }
}
