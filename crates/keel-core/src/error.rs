//! # Error Types — Validation Errors and Program Faults
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Bad input is expected. It is collected into the error tree and
//!   reported through [`ValidationError`], never by aborting early.
//! - A program fault is a defect in caller code or filter construction
//!   (a closure returning an error its `Apply` was not told to catch). It
//!   propagates unmodified through every layer and is never part of the
//!   error tree.

use thiserror::Error;

use crate::catalog::MessageCatalog;
use crate::details::ErrorDetails;
use crate::failure::Failure;
use crate::message::Message;

/// Boxed error returned by caller-supplied functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The caller-facing validation failure.
///
/// `error_details` is the de facto wire format for reporting errors to API
/// clients and is directly JSON-encodable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("validation failed: {error_details}")]
pub struct ValidationError {
    /// The rendered error tree.
    pub error_details: ErrorDetails,
}

impl ValidationError {
    /// Wrap a rendered tree.
    pub fn new(error_details: ErrorDetails) -> Self {
        Self { error_details }
    }
}

/// What a filter's `run` returns on failure.
#[derive(Error, Debug)]
pub enum FilterError {
    /// The value was rejected.
    #[error("invalid value: {0}")]
    Invalid(Failure),

    /// A program fault escaped a caller-supplied function.
    #[error("program fault: {0}")]
    Fault(#[source] BoxError),
}

impl FilterError {
    /// Reject the value with a single message.
    pub fn invalid(message: impl Into<Message>) -> Self {
        FilterError::Invalid(Failure::message(message))
    }

    /// Wrap a program fault.
    pub fn fault(error: impl Into<BoxError>) -> Self {
        FilterError::Fault(error.into())
    }

    /// Returns true for program faults.
    pub fn is_fault(&self) -> bool {
        matches!(self, FilterError::Fault(_))
    }

    /// Translate an `Invalid` failure into a caller-facing [`Error`].
    pub fn render(self, catalog: &MessageCatalog, lang: Option<&str>) -> Error {
        match self {
            FilterError::Invalid(failure) => {
                Error::Validation(ValidationError::new(failure.render(catalog, lang)))
            }
            FilterError::Fault(fault) => Error::Fault(fault),
        }
    }
}

impl From<Failure> for FilterError {
    fn from(failure: Failure) -> Self {
        FilterError::Invalid(failure)
    }
}

/// What the caller-facing `validate` entry points return.
#[derive(Error, Debug)]
pub enum Error {
    /// The input did not validate.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A program fault escaped a caller-supplied function.
    #[error("program fault: {0}")]
    Fault(#[source] BoxError),
}

impl Error {
    /// The error tree, for validation failures.
    pub fn error_details(&self) -> Option<&ErrorDetails> {
        match self {
            Error::Validation(err) => Some(&err.error_details),
            Error::Fault(_) => None,
        }
    }

    /// Consume into the validation failure, if this is one.
    pub fn into_validation(self) -> Option<ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            Error::Fault(_) => None,
        }
    }

    /// Returns true for program faults.
    pub fn is_fault(&self) -> bool {
        matches!(self, Error::Fault(_))
    }
}
