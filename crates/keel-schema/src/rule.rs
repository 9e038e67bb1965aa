//! # Rules — Targets, Presence and Storage
//!
//! A [`Rule`] binds a chain of steps to a target (one field of the record,
//! or the whole record) and says where a successful result goes.
//!
//! Rules are declared with two builders:
//!
//! ```ignore
//! Rule::field("age").then(ToInt).then(Range::new().min(18)).save();
//! Rule::field("nickname").discard([""]).optional().then(Type::of(Kind::Str));
//! Rule::global().then(Assert::new(|r| r["password"] == r["password2"])).into();
//! ```
//!
//! Presence handling (`optional`, `default_value`, `default_with`) and the
//! discard set are plain fields of the rule, fixed when it is built. The
//! schema never scans a chain for markers while validating.

use std::fmt;
use std::sync::Arc;

use keel_core::{BoxError, Message, Record};
use keel_filter::{Assert, ChainStep};
use serde_json::Value;

/// What a rule reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// One key of the input record.
    Field(String),
    /// The whole input record.
    Global,
}

type Producer = dyn Fn(&Record) -> Value + Send + Sync;

/// Substitute for an absent field.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value.
    Value(Value),
    /// Computed from the input record.
    Computed(Arc<Producer>),
}

impl DefaultValue {
    /// The substitute for `input`.
    pub fn produce(&self, input: &Record) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Computed(producer) => producer(input),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// What happens when a field is absent (or discarded).
#[derive(Debug, Clone, Default)]
pub enum Presence {
    /// Report "Field is missing.".
    #[default]
    Required,
    /// Skip the rule.
    Optional,
    /// Run the chain on a substitute.
    Default(DefaultValue),
}

/// Where a successful result is written in the output record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Under the rule's own key.
    Save,
    /// Under another key; the original entry stays.
    SaveAs(String),
    /// Under another key; the original key is removed.
    MoveTo(String),
    /// Nowhere; the original key is removed.
    Delete,
}

impl Storage {
    /// The key written besides the rule's own, if any.
    pub fn alternate_key(&self) -> Option<&str> {
        match self {
            Storage::SaveAs(key) | Storage::MoveTo(key) => Some(key.as_str()),
            Storage::Save | Storage::Delete => None,
        }
    }
}

/// A chain bound to a target, with its presence handling and storage.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) target: Target,
    pub(crate) discard: Vec<Value>,
    pub(crate) presence: Presence,
    pub(crate) steps: Vec<ChainStep>,
    pub(crate) storage: Option<Storage>,
}

impl Rule {
    /// Start a rule on field `key`.
    pub fn field(key: impl Into<String>) -> FieldRule {
        FieldRule {
            rule: Rule {
                target: Target::Field(key.into()),
                discard: Vec::new(),
                presence: Presence::Required,
                steps: Vec::new(),
                storage: None,
            },
        }
    }

    /// Start a rule on the whole record.
    pub fn global() -> GlobalRule {
        GlobalRule {
            rule: Rule {
                target: Target::Global,
                discard: Vec::new(),
                presence: Presence::Required,
                steps: Vec::new(),
                storage: None,
            },
        }
    }

    /// What the rule reads.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The field key, for field rules.
    pub fn field_key(&self) -> Option<&str> {
        match &self.target {
            Target::Field(key) => Some(key.as_str()),
            Target::Global => None,
        }
    }

    /// Raw values treated as absent.
    pub fn discard_values(&self) -> &[Value] {
        &self.discard
    }

    /// How absence is handled.
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    /// The normalized chain.
    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    /// Where the result goes. `None` only for global rules kept for their
    /// checks.
    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }
}

/// Builder for a field rule. Converting it into a [`Rule`] without a
/// terminal call stores the result under the field's own key.
#[derive(Debug, Clone)]
pub struct FieldRule {
    rule: Rule,
}

impl FieldRule {
    /// Treat these raw values as if the field were absent.
    pub fn discard<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rule.discard.extend(values.into_iter().map(Into::into));
        self
    }

    /// Skip the rule when the field is absent.
    pub fn optional(mut self) -> Self {
        self.rule.presence = Presence::Optional;
        self
    }

    /// Use `value` when the field is absent.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.rule.presence = Presence::Default(DefaultValue::Value(value.into()));
        self
    }

    /// Compute a substitute from the input record when the field is absent.
    /// Not called once the record has already failed another rule.
    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        self.rule.presence = Presence::Default(DefaultValue::Computed(Arc::new(producer)));
        self
    }

    /// Append a step.
    pub fn then(mut self, step: impl Into<ChainStep>) -> Self {
        self.rule.steps.push(step.into());
        self
    }

    /// Append a fallible function; every error it returns is bad input.
    pub fn apply<F, E>(self, function: F) -> Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.then(ChainStep::apply(function))
    }

    /// Append an infallible function.
    pub fn map<F>(self, function: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.then(ChainStep::map(function))
    }

    /// Append a membership test.
    pub fn one_of<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.then(ChainStep::one_of(values))
    }

    /// Store under the field's own key.
    pub fn save(self) -> Rule {
        self.finish(Storage::Save)
    }

    /// Store under `key` as well, keeping the original entry.
    pub fn save_as(self, key: impl Into<String>) -> Rule {
        self.finish(Storage::SaveAs(key.into()))
    }

    /// Store under `key` and remove the original entry.
    pub fn move_to(self, key: impl Into<String>) -> Rule {
        self.finish(Storage::MoveTo(key.into()))
    }

    /// Validate only; remove the entry from the output.
    pub fn delete(self) -> Rule {
        self.finish(Storage::Delete)
    }

    fn finish(mut self, storage: Storage) -> Rule {
        self.rule.storage = Some(storage);
        self.rule
    }
}

impl From<FieldRule> for Rule {
    fn from(builder: FieldRule) -> Self {
        builder.save()
    }
}

/// Builder for a whole-record rule. Its chain receives the original input
/// record. Converting it into a [`Rule`] without a terminal call stores
/// nothing.
#[derive(Debug, Clone)]
pub struct GlobalRule {
    rule: Rule,
}

impl GlobalRule {
    /// Append a step.
    pub fn then(mut self, step: impl Into<ChainStep>) -> Self {
        self.rule.steps.push(step.into());
        self
    }

    /// Append a fallible function; every error it returns is bad input.
    pub fn apply<F, E>(self, function: F) -> Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.then(ChainStep::apply(function))
    }

    /// Append an infallible function.
    pub fn map<F>(self, function: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.then(ChainStep::map(function))
    }

    /// Append a cross-field check reported with `message`.
    pub fn assert<P>(self, predicate: P, message: impl Into<Message>) -> Self
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.then(Assert::new(predicate).error_message(message))
    }

    /// Store the chain's result under `key`. This is the only storage a
    /// global rule has: the output record itself belongs to the field rules
    /// and the unexpected-key policy.
    pub fn save_as(mut self, key: impl Into<String>) -> Rule {
        self.rule.storage = Some(Storage::SaveAs(key.into()));
        self.rule
    }
}

impl From<GlobalRule> for Rule {
    fn from(builder: GlobalRule) -> Self {
        builder.rule
    }
}
