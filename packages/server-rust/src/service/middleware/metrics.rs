//! Metrics middleware for publish requests.
//!
//! Records request duration and outcome in a `tracing` span and feeds the
//! same figures to the `metrics` facade.

use std::task::{Context, Poll};
use std::time::Instant;

use objpub_core::{PublishError, Request, Response};
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::service::publisher::PublishFuture;

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments requests with timing and outcome.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records request duration and outcome.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<Request> for MetricsService<S>
where
    S: Service<Request, Response = Response, Error = PublishError> + Send,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = PublishError;
    type Future = PublishFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let span = info_span!(
            "request",
            request_id = %request.request_id(),
            method = %request.method(),
            path = %request.path().join("/"),
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(request);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let elapsed = start.elapsed();

                let outcome = match &result {
                    Ok(_) => "ok",
                    Err(error) => error.kind(),
                };

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", outcome);

                ::metrics::counter!("objpub_requests_total", "outcome" => outcome).increment(1);
                ::metrics::histogram!("objpub_request_duration_seconds").record(elapsed.as_secs_f64());

                tracing::info!(
                    duration_ms,
                    outcome,
                    status = result.as_ref().map_or(0, Response::status),
                    "request complete"
                );

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
