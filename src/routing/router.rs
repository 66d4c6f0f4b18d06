//! The dispatch table and per-request state machine.
//!
//! Each request moves through
//!
//! ```text
//! Unmatched -> PathMatched -> ParamsValidated -> BodyValidated
//!           -> Authenticated -> Invoked -> Serialized | Failed
//! ```
//!
//! Any failing step ends the dispatch with a [`DispatchError`], which is
//! rendered into the JSON error envelope. The router keeps no per-request
//! state, so any number of dispatches may run concurrently. Dropping the
//! dispatch future abandons the request without further side effects.

use axum::http::{Method, StatusCode};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use super::context::{Identity, IdentityResolver, RequestContext};
use super::handler::Reply;
use super::path::{PathTemplate, TemplateError};
use super::route::Route;
use crate::error::{DispatchError, RequestPart, SchemaError};
use crate::schema::{ModelId, SchemaRegistry};
use crate::serialization::Serializer;
use crate::validation::{ModelInstance, Validator};

/// Transport-neutral description of an incoming request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl RouteRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// Status and JSON payload produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl RouteResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn from_error(err: &DispatchError) -> Self {
        Self {
            status: err.status(),
            body: err.to_body(),
        }
    }
}

/// Startup-time failure while building the dispatch table.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("route '{route}': {source}")]
    Schema {
        route: String,
        #[source]
        source: SchemaError,
    },

    #[error("route '{route}': {source}")]
    Template {
        route: String,
        #[source]
        source: TemplateError,
    },
}

struct CompiledRoute {
    route: Route,
    template: PathTemplate,
}

/// Matches requests against declared routes and drives them to a response.
pub struct Router {
    routes: Vec<CompiledRoute>,
    validator: Validator,
    serializer: Serializer,
    resolver: Arc<dyn IdentityResolver>,
}

impl Router {
    /// Builds the dispatch table.
    ///
    /// Routes are matched in the given order; when two routes match the same
    /// request, the first one registered wins.
    ///
    /// # Errors
    ///
    /// - [`BuildError::Template`] if a route path is not a valid template
    /// - [`BuildError::Schema`] if a route references an unregistered body or
    ///   params model
    pub fn new(
        registry: Arc<SchemaRegistry>,
        resolver: Arc<dyn IdentityResolver>,
        routes: Vec<Route>,
    ) -> Result<Self, BuildError> {
        let mut compiled: Vec<CompiledRoute> = Vec::with_capacity(routes.len());

        for route in routes {
            let template =
                PathTemplate::parse(route.path()).map_err(|source| BuildError::Template {
                    route: route.name().to_string(),
                    source,
                })?;

            for model in [route.body_model(), route.params_model()].into_iter().flatten() {
                registry.lookup(model).map_err(|source| BuildError::Schema {
                    route: route.name().to_string(),
                    source,
                })?;
            }

            if compiled
                .iter()
                .any(|c| c.route.method() == route.method() && c.template == template)
            {
                tracing::warn!(
                    route = route.name(),
                    method = %route.method(),
                    path = %template,
                    "Route is shadowed by an earlier declaration"
                );
            }

            compiled.push(CompiledRoute { route, template });
        }

        Ok(Self {
            routes: compiled,
            validator: Validator::new(registry.clone()),
            serializer: Serializer::new(registry),
            resolver,
        })
    }

    /// Declared `(method, path template)` pairs in match order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes
            .iter()
            .map(|c| (c.route.method(), c.template.as_str()))
    }

    /// Handles one request. Never fails: every failure becomes an error response.
    #[tracing::instrument(
        name = "dispatch",
        skip_all,
        fields(method = %request.method, path = %request.path)
    )]
    pub async fn dispatch(&self, request: RouteRequest) -> RouteResponse {
        let response = match self.run(request).await {
            Ok(body) => {
                tracing::info!(status = 200, "Request completed");
                RouteResponse::ok(body)
            }
            Err(err) => {
                match &err {
                    DispatchError::Internal(e) => {
                        tracing::error!(error = ?e, "Request failed");
                    }
                    other => {
                        tracing::warn!(status = %other.status(), error = %other, "Request rejected");
                    }
                }
                RouteResponse::from_error(&err)
            }
        };

        metrics::counter!(
            "router_requests_total",
            "status" => response.status.as_u16().to_string()
        )
        .increment(1);

        response
    }

    async fn run(&self, request: RouteRequest) -> Result<Value, DispatchError> {
        let RouteRequest {
            method,
            path,
            body: raw_body,
            bearer,
        } = request;

        // Unmatched -> PathMatched
        let (compiled, raw_params) = self
            .routes
            .iter()
            .filter(|c| *c.route.method() == method)
            .find_map(|c| c.template.matches(&path).map(|params| (c, params)))
            .ok_or_else(|| DispatchError::NotFound {
                method: method.clone(),
                path: path.clone(),
            })?;
        let route = &compiled.route;
        tracing::debug!(route = route.name(), template = %compiled.template, "Path matched");

        // PathMatched -> ParamsValidated
        let params = match route.params_model() {
            Some(model) => Some(self.check(
                model,
                &Value::Object(raw_params.clone()),
                RequestPart::Params,
            )?),
            None => None,
        };

        // ParamsValidated -> BodyValidated
        let body = match route.body_model() {
            Some(model) => {
                let empty = Value::Object(Map::new());
                let raw = raw_body.as_ref().unwrap_or(&empty);
                Some(self.check(model, raw, RequestPart::Body)?)
            }
            None => None,
        };

        // BodyValidated -> Authenticated
        let identity = self.authenticate(route, bearer.as_deref()).await?;

        // Authenticated -> Invoked
        let ctx = RequestContext::new(
            method,
            path,
            compiled.template.as_str().to_string(),
            raw_body,
            raw_params,
            identity,
        );
        let reply = route.handler().call(ctx, body, params).await?;
        tracing::debug!(route = route.name(), "Handler completed");

        // Invoked -> Serialized
        match reply {
            Reply::Plain(value) => Ok(value),
            Reply::Model { value, model, view } => self
                .serializer
                .serialize(&value, model, &view)
                .map_err(|e| DispatchError::Internal(e.into())),
        }
    }

    fn check(
        &self,
        model: ModelId,
        raw: &Value,
        part: RequestPart,
    ) -> Result<ModelInstance, DispatchError> {
        // Fail-fast validation carries at most one failure; none means a schema defect.
        self.validator
            .validate(model, raw)
            .map_err(|e| match e.failures().into_iter().next() {
                Some(failure) => DispatchError::BadRequest { part, failure },
                None => DispatchError::Internal(e.into()),
            })
    }

    async fn authenticate(
        &self,
        route: &Route,
        bearer: Option<&str>,
    ) -> Result<Option<Identity>, DispatchError> {
        match (route.requires_auth(), bearer) {
            (true, None) => Err(DispatchError::Unauthorized(
                "Authorization header is missing or invalid".to_string(),
            )),
            (true, Some(token)) => match self.resolver.resolve(token).await {
                Ok(identity) => {
                    tracing::debug!(subject = %identity.subject, "Caller authenticated");
                    Ok(Some(identity))
                }
                Err(e) => Err(DispatchError::Unauthorized(e.0)),
            },
            (false, None) => Ok(None),
            (false, Some(token)) => match self.resolver.resolve(token).await {
                Ok(identity) => Ok(Some(identity)),
                Err(e) => {
                    tracing::debug!(reason = %e, "Ignoring unresolvable credential on public route");
                    Ok(None)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{
        HandlerError, HandlerResult, MockIdentityResolver, Reply, Unauthenticated,
    };
    use crate::schema::{FieldDecl, NumberSign, Visibility};
    use crate::serialization::View;
    use crate::validation::FailureReason;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ITEM_INPUT: ModelId = ModelId::new("ItemInput");
    const ITEM_PARAMS: ModelId = ModelId::new("ItemParams");
    const ACCOUNT: ModelId = ModelId::new("Account");

    fn registry() -> Arc<SchemaRegistry> {
        let registry = SchemaRegistry::new();
        registry
            .register(ITEM_INPUT, vec![FieldDecl::string("content")])
            .unwrap();
        registry
            .register(
                ITEM_PARAMS,
                vec![FieldDecl::number("id").sign(NumberSign::Positive)],
            )
            .unwrap();
        registry
            .register(
                ACCOUNT,
                vec![
                    FieldDecl::string("email"),
                    FieldDecl::string("secret").internal(),
                ],
            )
            .unwrap();
        Arc::new(registry)
    }

    fn resolver() -> Arc<dyn IdentityResolver> {
        let mut mock = MockIdentityResolver::new();
        mock.expect_resolve().returning(|credential: &str| {
            if credential == "good-token" {
                Ok(Identity::new("a@b.com", json!({"email": "a@b.com"})))
            } else {
                Err(Unauthenticated("invalid token".to_string()))
            }
        });
        Arc::new(mock)
    }

    fn counting_route(calls: &Arc<AtomicUsize>) -> Route {
        let calls = calls.clone();
        Route::post("items")
            .auth()
            .body(ITEM_INPUT)
            .to(
                move |ctx: RequestContext,
                      body: Option<ModelInstance>,
                      _params: Option<ModelInstance>| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        let caller = ctx.caller()?.subject.clone();
                        let content = body
                            .and_then(|b| b.get_str("content").map(str::to_string))
                            .unwrap_or_default();
                        Ok::<_, HandlerError>(Reply::plain(json!({
                            "by": caller,
                            "content": content
                        })))
                    }
                },
            )
    }

    async fn echo_params(
        _ctx: RequestContext,
        _body: Option<ModelInstance>,
        params: Option<ModelInstance>,
    ) -> HandlerResult {
        Ok(Reply::plain(params.map(ModelInstance::into_value).unwrap_or_default()))
    }

    async fn whoami(
        ctx: RequestContext,
        _body: Option<ModelInstance>,
        _params: Option<ModelInstance>,
    ) -> HandlerResult {
        Ok(Reply::plain(json!({
            "subject": ctx.identity().map(|i| i.subject.clone())
        })))
    }

    async fn account(
        _ctx: RequestContext,
        _body: Option<ModelInstance>,
        _params: Option<ModelInstance>,
    ) -> HandlerResult {
        Reply::model(
            &json!({"email": "a@b.com", "secret": "x"}),
            ACCOUNT,
            Visibility::Public,
        )
    }

    async fn failing(
        ctx: RequestContext,
        _body: Option<ModelInstance>,
        _params: Option<ModelInstance>,
    ) -> HandlerResult {
        match ctx.path() {
            "/fail/business" => Err(HandlerError::business("Post not found")),
            "/fail/forbidden" => Err(HandlerError::forbidden("Only author can update post")),
            _ => Err(HandlerError::Internal(anyhow::anyhow!("store exploded"))),
        }
    }

    fn router(calls: &Arc<AtomicUsize>) -> Router {
        Router::new(
            registry(),
            resolver(),
            vec![
                counting_route(calls),
                Route::get("item")
                    .path("/items/:id")
                    .params(ITEM_PARAMS)
                    .to(echo_params),
                Route::get("whoami").to(whoami),
                Route::get("account").to(account),
                Route::get("fail").path("/fail/:kind").to(failing),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_unmatched_path_is_not_found() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(RouteRequest::new(Method::GET, "/nowhere"))
            .await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_wrong_method_is_not_found() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(RouteRequest::new(Method::DELETE, "/items"))
            .await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_auth_route_with_credential_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(
                RouteRequest::new(Method::POST, "/items")
                    .with_body(json!({"content": "hi"}))
                    .with_bearer("good-token"),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"by": "a@b.com", "content": "hi"}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auth_route_without_credential_is_unauthorized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(RouteRequest::new(Method::POST, "/items").with_body(json!({"content": "hi"})))
            .await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["error"]["code"], "unauthorized");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auth_route_with_bad_credential_is_unauthorized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(
                RouteRequest::new(Method::POST, "/items")
                    .with_body(json!({"content": "hi"}))
                    .with_bearer("forged"),
            )
            .await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["error"]["details"]["reason"], "invalid token");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_body_is_bad_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(
                RouteRequest::new(Method::POST, "/items")
                    .with_body(json!({"text": "hi"}))
                    .with_bearer("good-token"),
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"]["details"]["part"], "body");
        assert_eq!(response.body["error"]["details"]["field"], "content");
        assert_eq!(
            response.body["error"]["details"]["reason"],
            json!(FailureReason::MissingRequired)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_absent_body_reports_missing_fields() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(RouteRequest::new(Method::POST, "/items").with_bearer("good-token"))
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"]["details"]["field"], "content");
    }

    #[tokio::test]
    async fn test_body_validated_before_auth_gate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(RouteRequest::new(Method::POST, "/items").with_body(json!([])))
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"]["details"]["field"], "$");
    }

    #[tokio::test]
    async fn test_path_params_bound_and_coerced() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(RouteRequest::new(Method::GET, "/items/42"))
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"id": 42}));
    }

    #[tokio::test]
    async fn test_encoded_path_params_are_decoded_before_validation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(RouteRequest::new(Method::GET, "/items/4%32"))
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"id": 42}));
    }

    #[tokio::test]
    async fn test_invalid_path_params_are_bad_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(RouteRequest::new(Method::GET, "/items/-1"))
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"]["details"]["part"], "params");
        assert_eq!(response.body["error"]["details"]["reason"], "sign-mismatch");
    }

    #[tokio::test]
    async fn test_optional_auth_attaches_identity_when_valid() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let anonymous = router.dispatch(RouteRequest::new(Method::GET, "/whoami")).await;
        let known = router
            .dispatch(RouteRequest::new(Method::GET, "/whoami").with_bearer("good-token"))
            .await;
        let forged = router
            .dispatch(RouteRequest::new(Method::GET, "/whoami").with_bearer("forged"))
            .await;

        assert_eq!(anonymous.body, json!({"subject": null}));
        assert_eq!(known.body, json!({"subject": "a@b.com"}));
        assert_eq!(forged.status, StatusCode::OK);
        assert_eq!(forged.body, json!({"subject": null}));
    }

    #[tokio::test]
    async fn test_model_reply_is_serialized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let response = router
            .dispatch(RouteRequest::new(Method::GET, "/account"))
            .await;

        assert_eq!(response.body, json!({"email": "a@b.com"}));
    }

    #[tokio::test]
    async fn test_handler_errors_are_mapped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let business = router
            .dispatch(RouteRequest::new(Method::GET, "/fail/business"))
            .await;
        assert_eq!(business.status, StatusCode::BAD_REQUEST);
        assert_eq!(business.body["error"]["message"], "Post not found");

        let forbidden = router
            .dispatch(RouteRequest::new(Method::GET, "/fail/forbidden"))
            .await;
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

        let internal = router
            .dispatch(RouteRequest::new(Method::GET, "/fail/crash"))
            .await;
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.body["error"]["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_first_registered_route_wins() {
        async fn first(
            _ctx: RequestContext,
            _body: Option<ModelInstance>,
            _params: Option<ModelInstance>,
        ) -> HandlerResult {
            Ok(Reply::plain(json!("first")))
        }
        async fn second(
            _ctx: RequestContext,
            _body: Option<ModelInstance>,
            _params: Option<ModelInstance>,
        ) -> HandlerResult {
            Ok(Reply::plain(json!("second")))
        }

        let router = Router::new(
            registry(),
            resolver(),
            vec![
                Route::get("byId").path("/posts/:postId").to(first),
                Route::get("latest").path("/posts/latest").to(second),
            ],
        )
        .unwrap();

        let response = router
            .dispatch(RouteRequest::new(Method::GET, "/posts/latest"))
            .await;

        assert_eq!(response.body, json!("first"));
    }

    #[tokio::test]
    async fn test_view_override_in_reply() {
        async fn nested(
            _ctx: RequestContext,
            _body: Option<ModelInstance>,
            _params: Option<ModelInstance>,
        ) -> HandlerResult {
            Reply::model(
                &json!([{"email": "a@b.com", "secret": "x"}]),
                ACCOUNT,
                View::internal(),
            )
        }

        let router = Router::new(registry(), resolver(), vec![Route::get("all").to(nested)])
            .unwrap();

        let response = router.dispatch(RouteRequest::new(Method::GET, "/all")).await;

        assert_eq!(response.body, json!([{"email": "a@b.com", "secret": "x"}]));
    }

    #[test]
    fn test_unknown_model_fails_build() {
        let result = Router::new(
            registry(),
            resolver(),
            vec![Route::post("ghost").body(ModelId::new("Ghost")).to(whoami)],
        );

        assert!(matches!(
            result,
            Err(BuildError::Schema {
                source: SchemaError::UnknownModel(_),
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_template_fails_build() {
        let result = Router::new(
            registry(),
            resolver(),
            vec![Route::get("bad").path("/a/:id/:id").to(whoami)],
        );

        assert!(matches!(result, Err(BuildError::Template { .. })));
    }

    #[test]
    fn test_routes_listing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = router(&calls);

        let listed: Vec<_> = router
            .routes()
            .map(|(m, p)| format!("{m} {p}"))
            .collect();

        assert_eq!(listed[0], "POST /items");
        assert_eq!(listed[1], "GET /items/:id");
        assert_eq!(listed.len(), 5);
    }
}
