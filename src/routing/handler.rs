//! Request handlers and their results.

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

use super::context::RequestContext;
use crate::error::{DispatchError, RequestPart};
use crate::schema::ModelId;
use crate::serialization::View;
use crate::validation::ModelInstance;

pub type HandlerResult = Result<Reply, HandlerError>;

/// Successful handler output.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Returned to the caller verbatim.
    Plain(Value),
    /// Passed through the serializer as an instance (or sequence) of `model`.
    Model {
        value: Value,
        model: ModelId,
        view: View,
    },
}

impl Reply {
    pub fn plain(value: Value) -> Self {
        Reply::Plain(value)
    }

    /// Tags `value` with a model and view so the router serializes it.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Internal`] if `value` cannot be encoded as JSON.
    pub fn model<T: Serialize + ?Sized>(
        value: &T,
        model: ModelId,
        view: impl Into<View>,
    ) -> Result<Self, HandlerError> {
        Ok(Reply::Model {
            value: serde_json::to_value(value)?,
            model,
            view: view.into(),
        })
    }
}

/// Failure returned by a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An expected business failure, reported to the caller with its message.
    #[error("{message}")]
    Business { status: StatusCode, message: String },

    /// Anything else. Reported as a 500 without detail.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    /// A business failure with status 400.
    pub fn business(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        HandlerError::Business {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::Internal(e.into())
    }
}

impl From<HandlerError> for DispatchError {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::Business { status, message } => {
                DispatchError::Business { status, message }
            }
            HandlerError::Internal(e) => DispatchError::Internal(e),
        }
    }
}

/// Unwraps validated input the route declared a model for.
///
/// # Errors
///
/// Returns [`HandlerError::Internal`] if the route was declared without a
/// model for `part`, which is a wiring defect.
pub fn require(
    input: Option<ModelInstance>,
    part: RequestPart,
) -> Result<ModelInstance, HandlerError> {
    input.ok_or_else(|| HandlerError::Internal(anyhow::anyhow!("route declares no {part} model")))
}

/// A request handler registered against a route.
///
/// Receives the request context plus the validated body and path parameters
/// (present iff the route declares the corresponding model). Any
/// `Fn(RequestContext, Option<ModelInstance>, Option<ModelInstance>) -> impl Future`
/// is a handler.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(
        &self,
        ctx: RequestContext,
        body: Option<ModelInstance>,
        params: Option<ModelInstance>,
    ) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(RequestContext, Option<ModelInstance>, Option<ModelInstance>) -> Fut
        + Send
        + Sync
        + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(
        &self,
        ctx: RequestContext,
        body: Option<ModelInstance>,
        params: Option<ModelInstance>,
    ) -> HandlerResult {
        (self)(ctx, body, params).await
    }
}
