//! # Combinators
//!
//! Filters built from other filters or from caller-supplied functions:
//! [`Do`] for sequencing, [`Each`] for per-element application, [`Apply`]
//! for functions, [`Assert`] for predicates and [`In`] for membership.

use std::fmt;
use std::sync::Arc;

use keel_core::message::INCORRECT_VALUE;
use keel_core::{BoxError, Failure, FilterError, Kind, Message};
use serde_json::Value;

use crate::filter::{run_chain, ChainStep, Filter};
use crate::types::wrong_type;

// ─── Do ──────────────────────────────────────────────────────────────

/// Runs steps in order as one filter.
///
/// With an error message set, any rejection inside the sequence is
/// replaced by it; otherwise the failing step's own failure propagates.
/// Program faults are never masked.
#[derive(Debug, Clone, Default)]
pub struct Do {
    steps: Vec<ChainStep>,
    error_message: Option<Message>,
}

impl Do {
    /// An empty sequence (the identity filter).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already normalized steps.
    pub fn from_steps(steps: impl IntoIterator<Item = ChainStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            error_message: None,
        }
    }

    /// Append a step.
    pub fn then(mut self, step: impl Into<ChainStep>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Append a fallible function.
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

    /// Mask every rejection with `message`.
    pub fn error_message(mut self, message: impl Into<Message>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

impl Filter for Do {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        run_chain(&self.steps, value).map_err(|err| match (&self.error_message, err) {
            (Some(message), FilterError::Invalid(_)) => FilterError::invalid(message.clone()),
            (_, err) => err,
        })
    }
}

// ─── Each ────────────────────────────────────────────────────────────

/// Applies a step to every element of a list and collects the results.
///
/// Stops at the first failing element and reports it as
/// `Item #<n>: <failure>`. [`Each::new`] numbers elements from 1,
/// [`Each::zero_based`] from 0. A non-list value is rejected with a type
/// failure.
#[derive(Debug, Clone)]
pub struct Each {
    step: ChainStep,
    first_position: usize,
}

impl Each {
    /// Elements numbered from 1.
    pub fn new(step: impl Into<ChainStep>) -> Self {
        Self {
            step: step.into(),
            first_position: 1,
        }
    }

    /// Elements numbered from 0.
    pub fn zero_based(step: impl Into<ChainStep>) -> Self {
        Self {
            step: step.into(),
            first_position: 0,
        }
    }
}

impl Filter for Each {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        let Value::Array(items) = value else {
            return Err(wrong_type(&[Kind::List], &value).into());
        };
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                self.step.run(item).map_err(|err| match err {
                    FilterError::Invalid(cause) => FilterError::Invalid(Failure::Item {
                        position: index + self.first_position,
                        cause: Box::new(cause),
                    }),
                    fault => fault,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

// ─── Apply ───────────────────────────────────────────────────────────

type ApplyFn = dyn Fn(Value) -> Result<Value, BoxError> + Send + Sync;
type ErrorProbe = fn(&(dyn std::error::Error + Send + Sync + 'static)) -> bool;

/// Which errors of a wrapped function count as bad input.
#[derive(Clone, Default)]
pub enum Catch {
    /// Every error is a validation failure.
    #[default]
    All,
    /// Only errors matching one of the probes; anything else is a fault.
    Only(Vec<ErrorProbe>),
}

impl Catch {
    fn matches(&self, err: &(dyn std::error::Error + Send + Sync + 'static)) -> bool {
        match self {
            Catch::All => true,
            Catch::Only(probes) => probes.iter().any(|probe| probe(err)),
        }
    }
}

impl fmt::Debug for Catch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Catch::All => f.write_str("All"),
            Catch::Only(probes) => write!(f, "Only({} kinds)", probes.len()),
        }
    }
}

fn is_kind<E: std::error::Error + 'static>(
    err: &(dyn std::error::Error + Send + Sync + 'static),
) -> bool {
    err.is::<E>()
}

/// Wraps a function as a filter.
///
/// Errors the function returns are converted into validation failures
/// (with the configured message, or the error's own text shown verbatim in
/// every language) when they match
/// the [`Catch`] policy, and surface as program faults otherwise. A
/// function that returns a [`FilterError`] has it passed through as is.
#[derive(Clone)]
pub struct Apply {
    function: Arc<ApplyFn>,
    catch: Catch,
    error_message: Option<Message>,
}

impl Apply {
    /// Wrap a fallible function, catching every error.
    pub fn new<F, E>(function: F) -> Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            function: Arc::new(move |value| function(value).map_err(Into::into)),
            catch: Catch::All,
            error_message: None,
        }
    }

    /// Wrap an infallible function.
    pub fn map<F>(function: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self {
            function: Arc::new(move |value| Ok(function(value))),
            catch: Catch::All,
            error_message: None,
        }
    }

    /// Treat errors of type `E` as bad input. The first call narrows the
    /// policy from "everything" to "only `E`"; later calls add more types.
    pub fn catch<E: std::error::Error + 'static>(mut self) -> Self {
        let probe: ErrorProbe = is_kind::<E>;
        self.catch = match self.catch {
            Catch::All => Catch::Only(vec![probe]),
            Catch::Only(mut probes) => {
                probes.push(probe);
                Catch::Only(probes)
            }
        };
        self
    }

    /// Report caught errors with `message` instead of their own text.
    pub fn error_message(mut self, message: impl Into<Message>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

impl fmt::Debug for Apply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Apply")
            .field("catch", &self.catch)
            .field("error_message", &self.error_message)
            .finish_non_exhaustive()
    }
}

impl Filter for Apply {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        (self.function)(value).map_err(|err| {
            let err = match err.downcast::<FilterError>() {
                Ok(filter_err) => return *filter_err,
                Err(other) => other,
            };
            if !self.catch.matches(err.as_ref()) {
                tracing::warn!(error = %err, "applied function failed with an uncaught error");
                return FilterError::Fault(err);
            }
            let message = match &self.error_message {
                Some(message) => message.clone(),
                None => Message::verbatim(err.to_string()),
            };
            FilterError::invalid(message)
        })
    }
}

// ─── Assert ──────────────────────────────────────────────────────────

type Predicate = dyn Fn(&Value) -> bool + Send + Sync;

/// Passes the value through when a predicate holds.
///
/// At record scope the value is the whole record, which is how cross-field
/// checks are written.
#[derive(Clone)]
pub struct Assert {
    predicate: Arc<Predicate>,
    error_message: Message,
}

impl Assert {
    /// Reject with "Incorrect value." when `predicate` is false.
    pub fn new<P>(predicate: P) -> Self
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            error_message: Message::new(INCORRECT_VALUE),
        }
    }

    /// Reject with `message` instead.
    pub fn error_message(mut self, message: impl Into<Message>) -> Self {
        self.error_message = message.into();
        self
    }
}

impl fmt::Debug for Assert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assert")
            .field("error_message", &self.error_message)
            .finish_non_exhaustive()
    }
}

impl Filter for Assert {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        if (self.predicate)(&value) {
            Ok(value)
        } else {
            Err(FilterError::invalid(self.error_message.clone()))
        }
    }
}

// ─── In ──────────────────────────────────────────────────────────────

/// Accepts only members of a fixed set of values.
#[derive(Debug, Clone)]
pub struct In {
    values: Vec<Value>,
    error_message: Message,
}

impl In {
    /// Accept exactly `values`.
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            error_message: Message::new(INCORRECT_VALUE),
        }
    }

    /// Reject with `message` instead of "Incorrect value.".
    pub fn error_message(mut self, message: impl Into<Message>) -> Self {
        self.error_message = message.into();
        self
    }

    /// The accepted values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl Filter for In {
    fn run(&self, value: Value) -> Result<Value, FilterError> {
        if self.values.contains(&value) {
            Ok(value)
        } else {
            Err(FilterError::invalid(self.error_message.clone()))
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::Type;
    use proptest::prelude::*;

    fn element() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i32>().prop_map(Value::from),
            "[a-z]{1,4}".prop_map(Value::from),
        ]
    }

    proptest! {
        #[test]
        fn each_reports_the_first_failing_position(items in proptest::collection::vec(element(), 0..10)) {
            let first_bad = items.iter().position(|v| !v.is_i64());
            let result = Each::new(Type::of(Kind::Int)).run(Value::Array(items.clone()));
            match (first_bad, result) {
                (None, Ok(out)) => prop_assert_eq!(out, Value::Array(items)),
                (Some(index), Err(FilterError::Invalid(Failure::Item { position, .. }))) => {
                    prop_assert_eq!(position, index + 1);
                }
                (expected, other) => prop_assert!(false, "expected {:?}, got {:?}", expected, other),
            }
        }
    }
}
