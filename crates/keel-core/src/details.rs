//! # Error Details — Rendered Error Tree
//!
//! [`ErrorDetails`] is what API clients see. It serializes to plain JSON:
//! a string for a single failure, an object keyed by field name (or `*`)
//! for record failures, and an array when several whole-record rules fail.
//! The shape is stable; changing it breaks clients.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A translated, serializable error tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    /// A single human-readable message.
    Message(String),
    /// Per-key failures of a record.
    Fields(BTreeMap<String, ErrorDetails>),
    /// Several failures reported under one key.
    Many(Vec<ErrorDetails>),
}

impl ErrorDetails {
    /// The message, if this is a leaf.
    pub fn as_message(&self) -> Option<&str> {
        match self {
            ErrorDetails::Message(text) => Some(text),
            _ => None,
        }
    }

    /// The per-key map, if this is a record failure.
    pub fn as_fields(&self) -> Option<&BTreeMap<String, ErrorDetails>> {
        match self {
            ErrorDetails::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    /// The failure reported under `key`, if this is a record failure.
    pub fn get(&self, key: &str) -> Option<&ErrorDetails> {
        self.as_fields().and_then(|fields| fields.get(key))
    }

    /// Convert into a `serde_json::Value`.
    pub fn to_json(&self) -> Value {
        match self {
            ErrorDetails::Message(text) => Value::String(text.clone()),
            ErrorDetails::Fields(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            ErrorDetails::Many(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

impl PartialEq<str> for ErrorDetails {
    fn eq(&self, other: &str) -> bool {
        self.as_message() == Some(other)
    }
}

impl PartialEq<&str> for ErrorDetails {
    fn eq(&self, other: &&str) -> bool {
        self.as_message() == Some(*other)
    }
}

/// Compact JSON.
impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
