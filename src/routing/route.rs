//! Route declarations.

use axum::http::Method;
use std::fmt;
use std::sync::Arc;

use super::handler::Handler;
use crate::schema::ModelId;

/// One declared request handler: verb, path template, auth requirement and
/// the models its body and path parameters are validated against.
///
/// ```rust,ignore
/// Route::get("me").auth().to(me_handler);
/// Route::patch("patchPost")
///     .path("/posts/:postId")
///     .auth()
///     .body(POST_CONTENT_REQUEST)
///     .params(POST_REQUEST)
///     .to(patch_post_handler);
/// ```
///
/// Without an explicit [`RouteBuilder::path`], the route is mounted at `/<name>`.
#[derive(Clone)]
pub struct Route {
    name: String,
    method: Method,
    path: String,
    auth: bool,
    body: Option<ModelId>,
    params: Option<ModelId>,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn new(method: Method, name: impl Into<String>) -> RouteBuilder {
        RouteBuilder {
            name: name.into(),
            method,
            path: None,
            auth: false,
            body: None,
            params: None,
        }
    }

    pub fn get(name: impl Into<String>) -> RouteBuilder {
        Self::new(Method::GET, name)
    }

    pub fn post(name: impl Into<String>) -> RouteBuilder {
        Self::new(Method::POST, name)
    }

    pub fn put(name: impl Into<String>) -> RouteBuilder {
        Self::new(Method::PUT, name)
    }

    pub fn patch(name: impl Into<String>) -> RouteBuilder {
        Self::new(Method::PATCH, name)
    }

    pub fn delete(name: impl Into<String>) -> RouteBuilder {
        Self::new(Method::DELETE, name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn requires_auth(&self) -> bool {
        self.auth
    }

    pub fn body_model(&self) -> Option<ModelId> {
        self.body
    }

    pub fn params_model(&self) -> Option<ModelId> {
        self.params
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("auth", &self.auth)
            .field("body", &self.body)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Builder returned by the [`Route`] verb constructors. Finished with [`RouteBuilder::to`].
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    name: String,
    method: Method,
    path: Option<String>,
    auth: bool,
    body: Option<ModelId>,
    params: Option<ModelId>,
}

impl RouteBuilder {
    pub fn path(mut self, template: impl Into<String>) -> Self {
        self.path = Some(template.into());
        self
    }

    /// Requires a resolvable bearer credential.
    pub fn auth(mut self) -> Self {
        self.auth = true;
        self
    }

    pub fn body(mut self, model: ModelId) -> Self {
        self.body = Some(model);
        self
    }

    pub fn params(mut self, model: ModelId) -> Self {
        self.params = Some(model);
        self
    }

    pub fn to<H: Handler + 'static>(self, handler: H) -> Route {
        let path = self.path.unwrap_or_else(|| format!("/{}", self.name));

        Route {
            name: self.name,
            method: self.method,
            path,
            auth: self.auth,
            body: self.body,
            params: self.params,
            handler: Arc::new(handler),
        }
    }
}
