//! Pipeline composition: combines all middleware layers into a single service stack.

use objpub_core::{PublishError, Request, Response};
use tower::ServiceBuilder;

use super::load_shed::LoadShedLayer;
use super::metrics::MetricsLayer;
use super::timeout::TimeoutLayer;
use crate::service::config::PublisherConfig;
use crate::service::publisher::PublishService;

/// Build the publish pipeline by wrapping a `PublishService` with middleware layers.
///
/// Layer order (outermost to innermost):
/// 1. `LoadShedLayer` -- reject when overloaded
/// 2. `TimeoutLayer` -- enforce the per-request timeout
/// 3. `MetricsLayer` -- record timing and outcome
///
/// The returned service implements `tower::Service<Request>`.
#[must_use]
pub fn build_publish_pipeline(
    service: PublishService,
    config: &PublisherConfig,
) -> impl tower::Service<Request, Response = Response, Error = PublishError> {
    ServiceBuilder::new()
        .layer(LoadShedLayer::new(config.max_concurrent_requests))
        .layer(TimeoutLayer::new(config.request_timeout_ms))
        .layer(MetricsLayer)
        .service(service)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
