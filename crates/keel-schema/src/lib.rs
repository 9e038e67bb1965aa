//! # keel-schema — Record Validation with Aggregated Errors
//!
//! Validates and transforms records (`serde_json` objects) against an
//! ordered list of [`Rule`]s. Unlike a single filter chain, a [`Schema`]
//! does not stop at the first failure: every rule runs, and all failures
//! come back together as one error tree.
//!
//! ```ignore
//! use keel_filter::{Kind, Length, Type};
//! use keel_schema::{Rule, Schema};
//!
//! let schema = Schema::builder()
//!     .rule(Rule::field("username").then(Type::of(Kind::Str)).then(Length::new().min(5).max(30)))
//!     .rule(Rule::field("nickname").discard([""]).optional().then(Type::of(Kind::Str)))
//!     .build();
//! let output = schema.validate_record(&input, Some("fr"))?;
//! ```
//!
//! A `Schema` is itself a [`Filter`](keel_filter::Filter), so schemas nest:
//! a failing sub-record is reported as a nested mapping under its field.
//!
//! ## Crate Policy
//!
//! - Validation never mutates the input and never aliases it in the output.
//! - Schemas are immutable after `build()`; clones share their rules.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod rule;
pub mod schema;

pub use keel_core::{Error, ErrorDetails, Record, ValidationError, GLOBAL_KEY};
pub use rule::{DefaultValue, FieldRule, GlobalRule, Presence, Rule, Storage, Target};
pub use schema::{Schema, SchemaBuilder, UnexpectedKeys};
