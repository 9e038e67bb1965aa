//! # Failure — Untranslated Error Tree
//!
//! Built incrementally while filters run. Leaves are [`Message`]s, so the
//! whole tree can be rendered into any language after the fact. The tree's
//! depth mirrors the nesting of schemas and `Each` filters.

use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::MessageCatalog;
use crate::details::ErrorDetails;
use crate::message::{Message, ITEM_PREFIX};

/// A structured validation failure, not yet translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// A single message.
    Message(Message),
    /// One element of a list failed. `position` is already offset by the
    /// numbering base of the filter that produced it.
    Item {
        /// Element number as shown to the user.
        position: usize,
        /// Why the element failed.
        cause: Box<Failure>,
    },
    /// Failures of a record, keyed by field name or `*`.
    Fields(BTreeMap<String, Failure>),
    /// Several failures reported under one key.
    Many(Vec<Failure>),
}

impl Failure {
    /// A leaf failure.
    pub fn message(message: impl Into<Message>) -> Self {
        Failure::Message(message.into())
    }

    /// Render into the caller-facing tree.
    ///
    /// An `Item` whose cause is a single message becomes one string with a
    /// translated `Item #<n>: ` prefix. An `Item` wrapping a nested record
    /// failure is keyed by its element number instead.
    pub fn render(&self, catalog: &MessageCatalog, lang: Option<&str>) -> ErrorDetails {
        match self {
            Failure::Message(message) => ErrorDetails::Message(message.render(catalog, lang)),
            Failure::Item { position, cause } => match cause.render(catalog, lang) {
                ErrorDetails::Message(text) => {
                    let prefix = Message::new(ITEM_PREFIX)
                        .with("position", position)
                        .render(catalog, lang);
                    ErrorDetails::Message(format!("{prefix}{text}"))
                }
                nested => {
                    let mut keyed = BTreeMap::new();
                    keyed.insert(position.to_string(), nested);
                    ErrorDetails::Fields(keyed)
                }
            },
            Failure::Fields(fields) => ErrorDetails::Fields(
                fields
                    .iter()
                    .map(|(key, failure)| (key.clone(), failure.render(catalog, lang)))
                    .collect(),
            ),
            Failure::Many(items) => {
                ErrorDetails::Many(items.iter().map(|f| f.render(catalog, lang)).collect())
            }
        }
    }

    /// Render with the built-in catalog in its default language.
    pub fn to_details(&self) -> ErrorDetails {
        self.render(MessageCatalog::builtin(), None)
    }
}

impl From<Message> for Failure {
    fn from(message: Message) -> Self {
        Failure::Message(message)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_details())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{FIELD_MISSING, WRONG_TYPE};
    use serde_json::json;

    #[test]
    fn test_item_with_message_cause_is_prefixed() {
        let failure = Failure::Item {
            position: 2,
            cause: Box::new(Failure::message(
                Message::new(WRONG_TYPE).with("type", "int").with("wrong_type", "str"),
            )),
        };
        assert_eq!(
            failure.to_details(),
            "Item #2: Wrong type. Expected int. Got str instead."
        );
    }

    #[test]
    fn test_item_with_nested_record_is_keyed() {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), Failure::message(FIELD_MISSING));
        let failure = Failure::Item {
            position: 0,
            cause: Box::new(Failure::Fields(fields)),
        };
        assert_eq!(
            failure.to_details().to_json(),
            json!({"0": {"name": "Field is missing."}})
        );
    }

    #[test]
    fn test_render_translates_every_leaf() {
        let mut fields = BTreeMap::new();
        fields.insert("email".to_string(), Failure::message(FIELD_MISSING));
        fields.insert(
            "*".to_string(),
            Failure::Many(vec![
                Failure::message(FIELD_MISSING),
                Failure::message("Passwords don't match"),
            ]),
        );
        let rendered = Failure::Fields(fields).render(MessageCatalog::builtin(), Some("fr"));
        assert_eq!(
            rendered.to_json(),
            json!({
                "email": "Champ manquant.",
                "*": ["Champ manquant.", "Passwords don't match"]
            })
        );
    }
}
