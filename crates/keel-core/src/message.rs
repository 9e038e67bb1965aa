//! # Localizable Messages
//!
//! A [`Message`] is a msgid (the English source text, with `{name}`
//! placeholders) plus the named parameters to substitute into it. Messages
//! are built by filters and rendered later, once the caller's language is
//! known, so the same failure can be reported in any language the
//! [`MessageCatalog`] carries.
//!
//! The msgids of every built-in message are exported as constants below.
//! Translation files key on exactly these strings.

use std::borrow::Cow;
use std::fmt;

use crate::catalog::MessageCatalog;

/// Named parameters of a message, in insertion order.
pub type Params = [(Cow<'static, str>, String)];

/// A required field is absent from the input record.
pub const FIELD_MISSING: &str = "Field is missing.";
/// A key of the input record is not covered by any field rule.
pub const UNEXPECTED_KEY: &str = "Unexpected key.";
/// The chain feeding a `SaveAs`/`MoveTo` target failed.
pub const COULD_NOT_COMPUTE: &str = "Couldn't compute field.";
/// Generic rejection used by `Assert`, `In` and `Regex`.
pub const INCORRECT_VALUE: &str = "Incorrect value.";
/// Prefix put in front of the failure of one element of a list.
pub const ITEM_PREFIX: &str = "Item #{position}: ";
/// Type mismatch against a single expected kind.
pub const WRONG_TYPE: &str = "Wrong type. Expected {type}. Got {wrong_type} instead.";
/// Type mismatch against several accepted kinds.
pub const WRONG_TYPE_ONE_OF: &str = "Wrong type. Expected one of {types}. Got {wrong_type} instead.";
/// Length 0 where a minimum length is required.
pub const EMPTY_VALUE: &str = "This value shouldn't be empty.";
/// Length below the minimum.
pub const TOO_SHORT: &str = "The value is too short. Min length is {min_length}.";
/// Length above the maximum.
pub const TOO_LONG: &str = "The value is too long. Max length is {max_length}.";
/// Length differs from the only accepted length.
pub const EXACT_LENGTH: &str = "The length should be {length}.";
/// Number below the lower bound.
pub const BELOW_MINIMUM: &str = "The minimum is {min}.";
/// Number above the upper bound.
pub const ABOVE_MAXIMUM: &str = "The maximum is {max}.";
/// Value cannot be converted to an integer.
pub const NOT_AN_INTEGER: &str = "This should be an integer.";
/// Value cannot be converted to a number.
pub const NOT_A_NUMBER: &str = "This should be a number.";
/// Value is not an email address.
pub const INVALID_EMAIL: &str = "This is not a valid email address.";
/// Value is not a domain name.
pub const INVALID_DOMAIN: &str = "This is not a valid domain name.";
/// Value is not a URL.
pub const INVALID_URL: &str = "This is not a valid url.";

/// A msgid plus named parameters, not yet translated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    msgid: Cow<'static, str>,
    params: Vec<(Cow<'static, str>, String)>,
    verbatim: bool,
}

impl Message {
    /// Create a message with no parameters.
    pub fn new(msgid: impl Into<Cow<'static, str>>) -> Self {
        Self {
            msgid: msgid.into(),
            params: Vec::new(),
            verbatim: false,
        }
    }

    /// Text shown exactly as given, in every language. Used for error text
    /// that comes from caller code rather than from a msgid, so it is never
    /// looked up in a catalog nor scanned for placeholders.
    pub fn verbatim(text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            msgid: text.into(),
            params: Vec::new(),
            verbatim: true,
        }
    }

    /// Whether this message skips translation.
    pub fn is_verbatim(&self) -> bool {
        self.verbatim
    }

    /// Set a named parameter, replacing any earlier value under that name.
    pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: impl fmt::Display) -> Self {
        let name = name.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    /// The untranslated template.
    pub fn msgid(&self) -> &str {
        &self.msgid
    }

    /// All parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Look up one parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| &**k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Translate through `catalog` and substitute the parameters.
    pub fn render(&self, catalog: &MessageCatalog, lang: Option<&str>) -> String {
        if self.verbatim {
            return self.msgid.to_string();
        }
        catalog.resolve(&self.msgid, lang, &self.params)
    }
}

impl From<&'static str> for Message {
    fn from(msgid: &'static str) -> Self {
        Self::new(msgid)
    }
}

impl From<String> for Message {
    fn from(msgid: String) -> Self {
        Self::new(msgid)
    }
}

/// Renders the untranslated source text.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.verbatim {
            return f.write_str(&self.msgid);
        }
        f.write_str(&substitute(&self.msgid, &self.params))
    }
}

/// Replace every `{name}` in `template` with the matching parameter.
///
/// Placeholders without a parameter are kept verbatim, as is an unclosed `{`.
pub(crate) fn substitute(template: &str, params: &Params) -> String {
    if params.is_empty() || !template.contains('{') {
        return template.to_string();
    }
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match params.iter().find(|(k, _)| &**k == name) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_substitutes_params() {
        let m = Message::new(BELOW_MINIMUM).with("min", 7);
        assert_eq!(m.to_string(), "The minimum is 7.");
    }

    #[test]
    fn test_with_replaces_existing_param() {
        let m = Message::new(ABOVE_MAXIMUM).with("max", 1).with("max", 2);
        assert_eq!(m.params().len(), 1);
        assert_eq!(m.param("max"), Some("2"));
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        let m = Message::new("{known} and {unknown}").with("known", "x");
        assert_eq!(m.to_string(), "x and {unknown}");
    }

    #[test]
    fn test_unclosed_brace_kept() {
        let m = Message::new("open { brace").with("brace", "no");
        assert_eq!(m.to_string(), "open { brace");
    }

    #[test]
    fn test_no_params_is_identity() {
        let m = Message::from(WRONG_TYPE);
        assert_eq!(m.to_string(), WRONG_TYPE);
    }

    #[test]
    fn test_verbatim_text_is_never_translated() {
        let catalog = MessageCatalog::builtin();
        assert_eq!(Message::new(INCORRECT_VALUE).render(catalog, Some("fr")), "Valeur incorrecte.");

        let raw = Message::verbatim(INCORRECT_VALUE);
        assert!(raw.is_verbatim());
        assert_eq!(raw.render(catalog, Some("fr")), INCORRECT_VALUE);

        let braces = Message::verbatim("expected {min}").with("min", 3);
        assert_eq!(braces.render(catalog, None), "expected {min}");
        assert_eq!(braces.to_string(), "expected {min}");
    }

    #[test]
    fn test_float_params_render_without_trailing_zero() {
        let m = Message::new(ABOVE_MAXIMUM).with("max", 10000.0_f64);
        assert_eq!(m.to_string(), "The maximum is 10000.");
    }
}
