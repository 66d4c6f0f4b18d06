//! Structured validation failures.

use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

use crate::error::SchemaError;

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    MissingRequired,
    TypeMismatch,
    FormatMismatch,
    SignMismatch,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::MissingRequired => "missing-required",
            FailureReason::TypeMismatch => "type-mismatch",
            FailureReason::FormatMismatch => "format-mismatch",
            FailureReason::SignMismatch => "sign-mismatch",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FailureReason::MissingRequired => "is required",
            FailureReason::TypeMismatch => "has the wrong type",
            FailureReason::FormatMismatch => "does not match the required format",
            FailureReason::SignMismatch => "has the wrong sign",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rejected field.
///
/// `field` is a dotted path from the validated root: `email`, `author.email`,
/// `items.2.content`. A failure on the root value itself uses `$`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("field '{field}' {}", reason.describe())]
pub struct ValidationFailure {
    pub field: String,
    pub reason: FailureReason,
}

impl ValidationFailure {
    pub const ROOT: &'static str = "$";

    pub fn new(field: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }

    pub fn details(&self) -> Value {
        json!({ "field": self.field, "reason": self.reason })
    }
}

/// Error returned by [`crate::validation::Validator`].
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The input violates the schema.
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),

    /// Every violation found, in encounter order (accumulating mode only).
    #[error("{} fields failed validation", .0.len())]
    InvalidMany(Vec<ValidationFailure>),

    /// The schema itself is unusable (unknown model). A startup-time defect.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ValidateError {
    /// All failures carried by this error. Empty for schema errors.
    pub fn failures(&self) -> Vec<ValidationFailure> {
        match self {
            ValidateError::Invalid(f) => vec![f.clone()],
            ValidateError::InvalidMany(all) => all.clone(),
            ValidateError::Schema(_) => Vec::new(),
        }
    }
}
