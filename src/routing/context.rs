//! Per-request context and caller identity resolution.

use async_trait::async_trait;
use axum::http::Method;
use serde_json::{Map, Value};
use thiserror::Error;

use super::handler::HandlerError;

/// Resolved caller of a request.
///
/// `subject` is the stable identifier from the credential; `profile` is the
/// caller record the resolver attached (for the forum, the stored user).
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub subject: String,
    pub profile: Value,
}

impl Identity {
    pub fn new(subject: impl Into<String>, profile: Value) -> Self {
        Self {
            subject: subject.into(),
            profile,
        }
    }
}

/// A credential could not be resolved to an identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Unauthenticated(pub String);

/// Resolves a bearer credential to the caller's identity.
///
/// Used by the router's auth gate. Implementations may block on I/O; the
/// router awaits them before invoking the handler.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns [`Unauthenticated`] if the credential is invalid, expired, or
    /// names an unknown caller.
    async fn resolve(&self, credential: &str) -> Result<Identity, Unauthenticated>;
}

/// Everything a handler gets to know about the request it serves.
///
/// Created by the router for one dispatch and dropped once the response is
/// produced.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    path: String,
    route: String,
    raw_body: Option<Value>,
    raw_params: Map<String, Value>,
    identity: Option<Identity>,
}

impl RequestContext {
    pub(crate) fn new(
        method: Method,
        path: String,
        route: String,
        raw_body: Option<Value>,
        raw_params: Map<String, Value>,
        identity: Option<Identity>,
    ) -> Self {
        Self {
            method,
            path,
            route,
            raw_body,
            raw_params,
            identity,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The concrete request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The template of the matched route.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn raw_body(&self) -> Option<&Value> {
        self.raw_body.as_ref()
    }

    pub fn raw_params(&self) -> &Map<String, Value> {
        &self.raw_params
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The caller's identity, or a 401 business error if nobody is logged in.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Business`] with status 401 if no identity is attached.
    pub fn caller(&self) -> Result<&Identity, HandlerError> {
        self.identity
            .as_ref()
            .ok_or_else(|| HandlerError::unauthorized("Login needed"))
    }
}
