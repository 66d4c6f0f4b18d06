//! axum adapter for the [`Router`].
//!
//! Every HTTP request is handed to a single fallback handler which turns it
//! into a [`RouteRequest`], dispatches it and renders the [`RouteResponse`].
//! Matching, validation and the auth gate all live in the router; this layer
//! only deals with the wire:
//!
//! - an empty body is an absent body, anything else must be JSON
//! - `Authorization: Bearer <token>` supplies the credential
//! - `401` responses carry `WWW-Authenticate: Bearer` (RFC 6750)

pub mod tracing;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::error::DispatchError;
use crate::routing::{RouteRequest, RouteResponse, Router};

/// Routes every request through `router`, with request tracing.
pub fn routes(router: Arc<Router>) -> axum::Router {
    axum::Router::new()
        .fallback(forward)
        .with_state(router)
        .layer(tracing::layer())
}

/// The served application: [`routes`] with trailing slashes trimmed before
/// dispatch.
pub fn app_router(router: Arc<Router>) -> NormalizePath<axum::Router> {
    NormalizePathLayer::trim_trailing_slash().layer(routes(router))
}

async fn forward(
    State(router): State<Arc<Router>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = match parse_body(&body) {
        Ok(body) => body,
        Err(e) => {
            ::tracing::warn!(error = %e, "Rejected malformed request body");
            return RouteResponse::from_error(&e).into_response();
        }
    };

    let request = RouteRequest {
        method,
        path: uri.path().to_string(),
        body,
        bearer: bearer_token(&headers),
    };

    router.dispatch(request).await.into_response()
}

fn parse_body(bytes: &Bytes) -> Result<Option<Value>, DispatchError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| DispatchError::MalformedBody(e.to_string()))
}

/// Extracts the credential from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively; any other scheme, or an empty
/// token, counts as no credential.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

impl IntoResponse for RouteResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();

        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}
