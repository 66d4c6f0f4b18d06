//! Validation of untrusted input against registered models.
//!
//! - [`Validator`] - fail-fast and accumulating validation with primitive coercion
//! - [`ModelInstance`] - the validated, coerced field map
//! - [`ValidationFailure`] - one rejected field with its [`FailureReason`]

pub mod failure;
pub mod instance;
pub mod validator;

pub use failure::{FailureReason, ValidateError, ValidationFailure};
pub use instance::ModelInstance;
pub use validator::Validator;
