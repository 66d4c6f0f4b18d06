//! HTTP request/response tracing layer.

use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// HTTP span wrapped around the fallback that forwards into the router.
///
/// Every request gets an `INFO` span carrying method, URI and version. The
/// `dispatch` span from [`Router::dispatch`](crate::routing::Router::dispatch)
/// opens inside it, so rejected validation or auth checks are logged under the
/// HTTP request that caused them. Completion is logged with
/// latency in milliseconds:
///
/// ```text
/// INFO request{method=PATCH uri=/posts/Xk3.. version=HTTP/1.1}:dispatch{method=PATCH path=/posts/Xk3..}: Request completed status=200
/// INFO request{method=PATCH uri=/posts/Xk3.. version=HTTP/1.1}: finished processing request latency=2 ms status=200
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}
