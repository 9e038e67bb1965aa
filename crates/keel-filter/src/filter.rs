//! # The Filter Capability and Chain Steps
//!
//! A [`Filter`] takes a value and either returns it (possibly transformed)
//! or rejects it. Filters hold no mutable state: once built, one instance
//! can be shared by any number of chains and threads.
//!
//! ## Chain Normalization
//!
//! Rule chains are sequences of [`ChainStep`], a closed union built when
//! the chain is declared. Arbitrary filters, closures (via [`Apply`]) and
//! value sets (via [`In`]) are each converted into one variant up front, so
//! running a chain never inspects what kind of element it was given.

use std::fmt;
use std::sync::Arc;

use keel_core::{BoxError, Error, FilterError, MessageCatalog};
use serde_json::Value;

use crate::combinators::{Apply, In};

/// A validation and/or transformation unit.
pub trait Filter: fmt::Debug + Send + Sync {
    /// Check and transform `value`. Failures are untranslated.
    fn run(&self, value: Value) -> Result<Value, FilterError>;

    /// Run and render failures through the built-in catalog.
    fn validate(&self, value: Value, lang: Option<&str>) -> Result<Value, Error> {
        self.validate_with(value, MessageCatalog::builtin(), lang)
    }

    /// Run and render failures through `catalog`.
    fn validate_with(
        &self,
        value: Value,
        catalog: &MessageCatalog,
        lang: Option<&str>,
    ) -> Result<Value, Error> {
        self.run(value).map_err(|err| err.render(catalog, lang))
    }
}

impl<F: Filter + ?Sized> Filter for Arc<F> {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        (**self).run(value)
    }

    fn validate(&self, value: Value, lang: Option<&str>) -> Result<Value, Error> {
        (**self).validate(value, lang)
    }

    fn validate_with(
        &self,
        value: Value,
        catalog: &MessageCatalog,
        lang: Option<&str>,
    ) -> Result<Value, Error> {
        (**self).validate_with(value, catalog, lang)
    }
}

/// One normalized element of a chain.
#[derive(Debug, Clone)]
pub enum ChainStep {
    /// Any filter, shared.
    Filter(Arc<dyn Filter>),
    /// A wrapped function.
    Apply(Apply),
    /// A membership test.
    In(In),
}

impl ChainStep {
    /// Wrap a filter.
    pub fn filter(filter: impl Filter + 'static) -> Self {
        ChainStep::Filter(Arc::new(filter))
    }

    /// Reuse an already shared filter.
    pub fn shared(filter: Arc<dyn Filter>) -> Self {
        ChainStep::Filter(filter)
    }

    /// Wrap a fallible function. Every error it returns is a validation
    /// failure; use [`Apply::catch`] to narrow that.
    pub fn apply<F, E>(function: F) -> Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        ChainStep::Apply(Apply::new(function))
    }

    /// Wrap an infallible function.
    pub fn map<F>(function: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        ChainStep::Apply(Apply::map(function))
    }

    /// Accept only the given values.
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        ChainStep::In(In::new(values))
    }

    /// Run this step.
    pub fn run(&self, value: Value) -> Result<Value, FilterError> {
        match self {
            ChainStep::Filter(filter) => filter.run(value),
            ChainStep::Apply(apply) => apply.run(value),
            ChainStep::In(set) => set.run(value),
        }
    }
}

impl From<Apply> for ChainStep {
    fn from(apply: Apply) -> Self {
        ChainStep::Apply(apply)
    }
}

impl From<In> for ChainStep {
    fn from(set: In) -> Self {
        ChainStep::In(set)
    }
}

impl From<Arc<dyn Filter>> for ChainStep {
    fn from(filter: Arc<dyn Filter>) -> Self {
        ChainStep::Filter(filter)
    }
}

/// Run `steps` left to right, stopping at the first failure.
pub fn run_chain(steps: &[ChainStep], value: Value) -> Result<Value, FilterError> {
    steps.iter().try_fold(value, |value, step| step.run(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Kind, Type};
    use serde_json::json;

    #[test]
    fn test_run_chain_threads_values() {
        let steps = vec![
            ChainStep::map(|v| json!(v.as_i64().unwrap_or(0) + 1)),
            ChainStep::map(|v| json!(v.as_i64().unwrap_or(0) * 10)),
        ];
        assert_eq!(run_chain(&steps, json!(1)).unwrap(), json!(20));
    }

    #[test]
    fn test_run_chain_stops_at_first_failure() {
        let steps = vec![
            ChainStep::from(Type::of(Kind::Int)),
            ChainStep::map(|_| panic!("must not run after a failure")),
        ];
        let err = run_chain(&steps, json!("x")).unwrap_err();
        assert!(matches!(err, FilterError::Invalid(_)));
    }

    #[test]
    fn test_empty_chain_is_identity() {
        assert_eq!(run_chain(&[], json!({"a": 1})).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_one_of_step() {
        let step = ChainStep::one_of(["DEU", "FRA", "ITA"]);
        assert_eq!(step.run(json!("ITA")).unwrap(), json!("ITA"));
        assert!(step.run(json!("ESP")).is_err());
    }

    #[test]
    fn test_shared_filter_validates_through_arc() {
        let shared: Arc<dyn Filter> = Arc::new(Type::of(Kind::Str));
        let step = ChainStep::shared(shared.clone());
        assert!(step.run(json!("ok")).is_ok());
        let err = shared.validate(json!(1), Some("fr")).unwrap_err();
        assert_eq!(
            err.error_details().unwrap(),
            "Type incorrect. Type attendu : str. Type reçu : int."
        );
    }
}
