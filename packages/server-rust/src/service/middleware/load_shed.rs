//! Load-shedding middleware for publish requests.
//!
//! Rejects requests with `PublishError::Overloaded` once
//! `max_concurrent_requests` are in flight.

use std::sync::Arc;
use std::task::{Context, Poll};

use objpub_core::{PublishError, Request, Response};
use tokio::sync::Semaphore;
use tower::{Layer, Service};
use tracing::debug;

use crate::service::publisher::PublishFuture;

// ---------------------------------------------------------------------------
// LoadShedLayer
// ---------------------------------------------------------------------------

/// Tower layer that limits concurrent requests via a semaphore.
///
/// When all permits are taken, incoming requests are rejected immediately
/// rather than queued.
#[derive(Debug, Clone)]
pub struct LoadShedLayer {
    semaphore: Arc<Semaphore>,
}

impl LoadShedLayer {
    /// Create a new `LoadShedLayer` with the given concurrency limit.
    #[must_use]
    pub fn new(max_concurrent: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent as usize)),
        }
    }
}

impl<S> Layer<S> for LoadShedLayer {
    type Service = LoadShedService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoadShedService {
            inner,
            semaphore: self.semaphore.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoadShedService
// ---------------------------------------------------------------------------

/// Service wrapper that enforces the concurrency limit.
#[derive(Debug, Clone)]
pub struct LoadShedService<S> {
    inner: S,
    semaphore: Arc<Semaphore>,
}

impl<S> Service<Request> for LoadShedService<S>
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
        let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
            debug!(request_id = %request.request_id(), "shedding request");
            request.close();
            return Box::pin(async { Err(PublishError::Overloaded) });
        };

        let fut = self.inner.call(request);
        Box::pin(async move {
            // Held until the inner request finishes.
            let result = fut.await;
            drop(permit);
            result
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
