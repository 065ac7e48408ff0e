//! Timeout middleware for publish requests.
//!
//! Fails requests that exceed the configured timeout with
//! `PublishError::Timeout`. The inner future is dropped on elapse, which
//! aborts any transaction it still holds open.

use std::task::{Context, Poll};
use std::time::Duration;

use objpub_core::{PublishError, Request, Response};
use tower::{Layer, Service};
use tracing::warn;

use crate::service::publisher::PublishFuture;

// ---------------------------------------------------------------------------
// TimeoutLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps services with a per-request timeout.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    timeout_ms: u64,
}

impl TimeoutLayer {
    #[must_use]
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            timeout_ms: self.timeout_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// TimeoutService
// ---------------------------------------------------------------------------

/// Service wrapper that enforces the request timeout.
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
    timeout_ms: u64,
}

impl<S> Service<Request> for TimeoutService<S>
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
        let timeout_ms = self.timeout_ms;
        let request_id = request.request_id();
        let fut = self.inner.call(request);
        Box::pin(async move {
            match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    warn!(%request_id, timeout_ms, "request timed out");
                    Err(PublishError::Timeout { timeout_ms })
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
