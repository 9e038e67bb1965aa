//! # keel-core — Foundational Types for keel
//!
//! This crate is the leaf of the keel workspace. It defines the vocabulary
//! every filter and schema speaks: how a value is classified, how a failure
//! is described before translation, how the error tree looks once rendered
//! for a caller, and where translated message text comes from.
//!
//! ## Key Design Principles
//!
//! 1. **Failures are built untranslated.** Filters produce [`Failure`] trees
//!    whose leaves are [`Message`]s (a msgid plus named parameters). Only the
//!    caller-facing `validate` entry points render them into [`ErrorDetails`]
//!    through a [`MessageCatalog`].
//!
//! 2. **Two disjoint error classes.** Bad input is a [`FilterError::Invalid`];
//!    a defect in caller code is a [`FilterError::Fault`]. Faults are never
//!    folded into the error tree.
//!
//! 3. **No hidden global settings.** The catalog is an immutable value passed
//!    in by the caller. [`MessageCatalog::builtin()`] is the read-only default.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `keel-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod catalog;
pub mod config;
pub mod details;
pub mod error;
pub mod failure;
pub mod kind;
pub mod message;

pub use catalog::{CatalogError, MessageCatalog};
pub use config::{ConfigError, ValidatorConfig};
pub use details::ErrorDetails;
pub use error::{BoxError, Error, FilterError, ValidationError};
pub use failure::Failure;
pub use kind::Kind;
pub use message::{Message, Params};

/// A record: the unit of validation. Keys are field names.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Key under which whole-record failures are reported.
pub const GLOBAL_KEY: &str = "*";
