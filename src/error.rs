//! Error taxonomy and the JSON error envelope.
//!
//! Registry-time errors ([`SchemaError`]) are startup defects and fail the
//! process before the first request. Request-time errors ([`DispatchError`])
//! are produced by the router, which is the only place they are mapped to a
//! status code and an error body:
//!
//! ```json
//! { "error": { "code": "validation_error", "message": "...", "details": {} } }
//! ```

use axum::http::{Method, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

use crate::schema::ModelId;
use crate::validation::ValidationFailure;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Errors raised while declaring or looking up model schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("model '{0}' is already registered with different fields")]
    Conflict(ModelId),

    #[error("model '{0}' is not registered")]
    UnknownModel(ModelId),

    #[error("field '{field}' is declared twice on model '{model}'")]
    DuplicateField { model: ModelId, field: String },

    #[error("constraints on '{model}.{field}' conflict or do not fit the field type")]
    InvalidConstraint { model: ModelId, field: String },
}

/// Which part of a request failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPart {
    Params,
    Body,
}

impl fmt::Display for RequestPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestPart::Params => f.write_str("params"),
            RequestPart::Body => f.write_str("body"),
        }
    }
}

/// Terminal failure of one dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route for {method} {path}")]
    NotFound { method: Method, path: String },

    #[error("invalid {part}: {failure}")]
    BadRequest {
        part: RequestPart,
        failure: ValidationFailure,
    },

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A business error returned by a handler.
    #[error("{message}")]
    Business { status: StatusCode, message: String },

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::BadRequest { .. } | DispatchError::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            DispatchError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DispatchError::Business { status, .. } => *status,
            DispatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        match self {
            DispatchError::NotFound { method, path } => ErrorInfo {
                code: "not_found",
                message: "Route not found".to_string(),
                details: json!({"method": method.as_str(), "path": path}),
            },
            DispatchError::BadRequest { part, failure } => ErrorInfo {
                code: "validation_error",
                message: format!("Invalid {part}: {failure}"),
                details: json!({"part": part, "field": failure.field, "reason": failure.reason}),
            },
            DispatchError::MalformedBody(reason) => ErrorInfo {
                code: "bad_request",
                message: "Request body is not valid JSON".to_string(),
                details: json!({"reason": reason}),
            },
            DispatchError::Unauthorized(reason) => ErrorInfo {
                code: "unauthorized",
                message: "Unauthorized".to_string(),
                details: json!({"reason": reason}),
            },
            DispatchError::Business { status, message } => ErrorInfo {
                code: business_code(*status),
                message: message.clone(),
                details: json!({}),
            },
            // Internal details stay in the logs.
            DispatchError::Internal(_) => ErrorInfo {
                code: "internal_error",
                message: "Internal server error".to_string(),
                details: json!({}),
            },
        }
    }

    /// The JSON error envelope for this failure.
    pub fn to_body(&self) -> Value {
        json!({ "error": self.to_error_info() })
    }
}

fn business_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::CONFLICT => "conflict",
        s if s.is_server_error() => "internal_error",
        _ => "error",
    }
}
