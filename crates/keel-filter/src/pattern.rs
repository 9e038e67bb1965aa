//! # Regex Match

use keel_core::message::INCORRECT_VALUE;
use keel_core::{FilterError, Message};
use serde_json::Value;

/// Accepts strings matching a regular expression in full.
#[derive(Debug, Clone)]
pub struct Regex {
    regex: regex::Regex,
    error_message: Message,
}

impl Regex {
    /// Compile `pattern`, anchored so that it must match the whole string.
    ///
    /// # Errors
    ///
    /// Returns the compile error of an invalid pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Self::compile(&regex::RegexBuilder::new(&anchor(pattern)))
    }

    /// Like [`Regex::new`], ignoring case.
    pub fn case_insensitive(pattern: &str) -> Result<Self, regex::Error> {
        Self::compile(regex::RegexBuilder::new(&anchor(pattern)).case_insensitive(true))
    }

    /// Use an already compiled expression as is, without anchoring.
    pub fn from_compiled(regex: regex::Regex) -> Self {
        Self {
            regex,
            error_message: Message::new(INCORRECT_VALUE),
        }
    }

    fn compile(builder: &regex::RegexBuilder) -> Result<Self, regex::Error> {
        builder.build().map(Self::from_compiled)
    }

    /// Reject with `message` instead of "Incorrect value.".
    pub fn error_message(mut self, message: impl Into<Message>) -> Self {
        self.error_message = message.into();
        self
    }

    /// The compiled pattern text.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

fn anchor(pattern: &str) -> String {
    if pattern.starts_with('^') && pattern.ends_with('$') && !pattern.ends_with("\\$") {
        pattern.to_string()
    } else {
        format!("^(?:{pattern})$")
    }
}

impl crate::Filter for Regex {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        match value.as_str() {
            Some(text) if self.regex.is_match(text) => Ok(value),
            _ => Err(FilterError::invalid(self.error_message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Filter;
    use serde_json::json;

    #[test]
    fn test_regex_matches_whole_string() {
        let filter = Regex::new("[A-Za-z][-_A-Za-z0-9]+").unwrap();
        assert!(filter.run(json!("The-King")).is_ok());
        assert!(filter.run(json!("The King")).is_err());
    }

    #[test]
    fn test_regex_anchors_alternations() {
        let filter = Regex::new("cat|dog").unwrap();
        assert_eq!(filter.as_str(), "^(?:cat|dog)$");
        assert!(filter.run(json!("dog")).is_ok());
        assert!(filter.run(json!("catfish")).is_err());
    }

    #[test]
    fn test_regex_keeps_anchored_pattern() {
        assert_eq!(Regex::new("^a+$").unwrap().as_str(), "^a+$");
    }

    #[test]
    fn test_regex_rejects_non_strings_with_same_message() {
        let filter = Regex::new("[0-9]+").unwrap().error_message("Digits only.");
        match filter.run(json!(12)).unwrap_err() {
            FilterError::Invalid(failure) => assert_eq!(failure.to_details(), "Digits only."),
            FilterError::Fault(fault) => panic!("unexpected fault: {fault}"),
        }
    }

    #[test]
    fn test_regex_case_insensitive() {
        let filter = Regex::case_insensitive("[a-z]+").unwrap();
        assert!(filter.run(json!("ABC")).is_ok());
    }

    #[test]
    fn test_regex_invalid_pattern() {
        assert!(Regex::new("(unclosed").is_err());
    }

    #[test]
    fn test_regex_from_compiled_is_unanchored() {
        let filter = Regex::from_compiled(regex::Regex::new("b").unwrap());
        assert!(filter.run(json!("abc")).is_ok());
    }
}
