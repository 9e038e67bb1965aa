//! # keel-filter — Composable Filters
//!
//! A filter checks one value and may transform it. Filters compose into
//! chains: each step receives the previous step's output, and the first
//! rejection stops the chain.
//!
//! ## Layout
//!
//! - [`filter`]: the [`Filter`] trait, the [`ChainStep`] union, [`run_chain`].
//! - [`combinators`]: [`Do`], [`Each`], [`Apply`], [`Assert`], [`In`].
//! - [`types`]: [`Type`], [`ToInt`], [`ToFloat`].
//! - [`bounds`]: [`Length`], [`Range`].
//! - [`pattern`]: [`Regex`].
//! - [`web`]: [`Email`], [`Domain`], [`Url`].
//!
//! ## Error Classes
//!
//! A filter's `run` returns [`FilterError::Invalid`] for bad input and
//! [`FilterError::Fault`] for program faults escaping caller-supplied
//! functions. Only the former is ever rendered into an error tree.
//!
//! ## Crate Policy
//!
//! - Depends only on `keel-core` internally.
//! - Filters are immutable after construction and `Send + Sync`.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod bounds;
pub mod combinators;
pub mod filter;
pub mod pattern;
pub mod types;
pub mod web;

use std::sync::Arc;

pub use bounds::{Length, Range};
pub use combinators::{Apply, Assert, Catch, Do, Each, In};
pub use filter::{run_chain, ChainStep, Filter};
pub use keel_core::{Error, FilterError, Kind, Message};
pub use pattern::Regex;
pub use types::{wrong_type, ToFloat, ToInt, Type};
pub use web::{Domain, Email, Url};

macro_rules! chain_step_from {
    ($($filter:ty),* $(,)?) => {
        $(
            impl From<$filter> for ChainStep {
                fn from(filter: $filter) -> Self {
                    ChainStep::Filter(Arc::new(filter))
                }
            }
        )*
    };
}

chain_step_from!(
    Do, Each, Assert, Type, ToInt, ToFloat, Length, Range, Regex, Email, Domain, Url,
);
