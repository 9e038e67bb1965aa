//! # Length and Range Bounds

use keel_core::message::{
    ABOVE_MAXIMUM, BELOW_MINIMUM, EMPTY_VALUE, EXACT_LENGTH, TOO_LONG, TOO_SHORT,
};
use keel_core::{FilterError, Kind, Message};
use serde_json::{Number, Value};

use crate::types::wrong_type;

/// Bounds the length of a string (in characters), a list or a record.
///
/// `min` defaults to 0 and `max` to unbounded. When `min == max` both
/// violations are reported with the exact-length message; a zero length
/// below the minimum is reported as empty.
#[derive(Debug, Clone)]
pub struct Length {
    min: usize,
    max: Option<usize>,
    empty_message: Message,
    too_short_message: Message,
    too_long_message: Message,
    exact_message: Message,
}

impl Default for Length {
    fn default() -> Self {
        Self {
            min: 0,
            max: None,
            empty_message: Message::new(EMPTY_VALUE),
            too_short_message: Message::new(TOO_SHORT),
            too_long_message: Message::new(TOO_LONG),
            exact_message: Message::new(EXACT_LENGTH),
        }
    }
}

impl Length {
    /// No bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortest accepted length.
    pub fn min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    /// Longest accepted length.
    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Message for a length of 0 below the minimum.
    pub fn empty_message(mut self, message: impl Into<Message>) -> Self {
        self.empty_message = message.into();
        self
    }

    /// Message for a too short value. `{min_length}` is available.
    pub fn too_short_message(mut self, message: impl Into<Message>) -> Self {
        self.too_short_message = message.into();
        self
    }

    /// Message for a too long value. `{max_length}` is available.
    pub fn too_long_message(mut self, message: impl Into<Message>) -> Self {
        self.too_long_message = message.into();
        self
    }

    /// Message used when only one length is accepted. `{length}` is
    /// available.
    pub fn exact_message(mut self, message: impl Into<Message>) -> Self {
        self.exact_message = message.into();
        self
    }

    fn exact(&self) -> FilterError {
        FilterError::invalid(self.exact_message.clone().with("length", self.min))
    }

    fn check(&self, length: usize) -> Result<(), FilterError> {
        if length < self.min {
            if length == 0 {
                return Err(FilterError::invalid(self.empty_message.clone()));
            }
            if self.max == Some(self.min) {
                return Err(self.exact());
            }
            return Err(FilterError::invalid(
                self.too_short_message.clone().with("min_length", self.min),
            ));
        }
        match self.max {
            Some(max) if length > max && max == self.min => Err(self.exact()),
            Some(max) if length > max => Err(FilterError::invalid(
                self.too_long_message.clone().with("max_length", max),
            )),
            _ => Ok(()),
        }
    }
}

impl crate::Filter for Length {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        let length = match &value {
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            other => return Err(wrong_type(&[Kind::Str, Kind::List, Kind::Dict], other).into()),
        };
        self.check(length)?;
        Ok(value)
    }
}

/// Bounds a number, inclusive on both ends. Integer values are compared
/// exactly, even beyond the 2^53 range where `f64` loses precision.
#[derive(Debug, Clone)]
pub struct Range {
    min: Option<f64>,
    max: Option<f64>,
    min_message: Message,
    max_message: Message,
}

impl Default for Range {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            min_message: Message::new(BELOW_MINIMUM),
            max_message: Message::new(ABOVE_MAXIMUM),
        }
    }
}

impl Range {
    /// No bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest accepted number.
    pub fn min(mut self, min: impl Into<f64>) -> Self {
        self.min = Some(min.into());
        self
    }

    /// Largest accepted number.
    pub fn max(mut self, max: impl Into<f64>) -> Self {
        self.max = Some(max.into());
        self
    }

    /// Message below the minimum. `{min}` is available.
    pub fn min_message(mut self, message: impl Into<Message>) -> Self {
        self.min_message = message.into();
        self
    }

    /// Message above the maximum. `{max}` is available.
    pub fn max_message(mut self, message: impl Into<Message>) -> Self {
        self.max_message = message.into();
        self
    }
}

fn integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

// For an integer n: n < min iff n < ceil(min), and n > max iff n > floor(max).
// Integers are compared exactly; going through f64 rounds beyond 2^53.

fn below(number: &Number, min: f64) -> bool {
    match integer(number) {
        Some(n) => !min.is_nan() && n < min.ceil() as i128,
        None => number.as_f64().is_some_and(|x| x < min),
    }
}

fn above(number: &Number, max: f64) -> bool {
    match integer(number) {
        Some(n) => !max.is_nan() && n > max.floor() as i128,
        None => number.as_f64().is_some_and(|x| x > max),
    }
}

impl crate::Filter for Range {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        let Value::Number(number) = &value else {
            return Err(wrong_type(&[Kind::Int, Kind::Float], &value).into());
        };
        if let Some(min) = self.min.filter(|min| below(number, *min)) {
            return Err(FilterError::invalid(self.min_message.clone().with("min", min)));
        }
        if let Some(max) = self.max.filter(|max| above(number, *max)) {
            return Err(FilterError::invalid(self.max_message.clone().with("max", max)));
        }
        Ok(value)
    }
}
