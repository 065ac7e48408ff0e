//! Bounded replay of requests that hit a transient conflict.

use objpub_core::{Outcome, PublishError, Request, Response};
use tracing::{debug, info_span, Instrument};

use super::coordinator::PublishCoordinator;
use crate::publication::PublicationContext;

/// A publish that ended in an error, with the response of its final attempt.
#[derive(Debug)]
pub struct PublishFailure {
    pub error: PublishError,
    pub response: Response,
}

/// Runs publish attempts, replaying a request at most once.
///
/// A replay uses [`Request::retry`] to build a fresh request from the same
/// input, closes the original, and starts the attempt over from scratch. A
/// retry signal during the replay is not eligible for another one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryController {
    coordinator: PublishCoordinator,
}

impl RetryController {
    #[must_use]
    pub fn new(max_acquisition_depth: usize) -> Self {
        Self {
            coordinator: PublishCoordinator::new(max_acquisition_depth),
        }
    }

    /// Publishes `request` against `ctx`, closing every request it owns.
    ///
    /// # Errors
    ///
    /// Whatever the final attempt fails with.
    pub async fn publish(
        &self,
        ctx: &PublicationContext,
        request: Request,
    ) -> Result<Response, PublishError> {
        self.publish_with_response(ctx, request)
            .await
            .map_err(|failure| failure.error)
    }

    /// Like [`publish`](Self::publish), but a failure keeps the response the
    /// final attempt prepared, realm and debug flag included.
    ///
    /// # Errors
    ///
    /// Whatever the final attempt fails with, paired with its response.
    pub async fn publish_with_response(
        &self,
        ctx: &PublicationContext,
        request: Request,
    ) -> Result<Response, PublishFailure> {
        let mut request = request;
        let mut attempt: u32 = 1;

        loop {
            let retry_eligible = attempt == 1 && request.supports_retry();
            let span = info_span!(
                "publish",
                module = ctx.module(),
                request_id = %request.request_id(),
                attempt,
            );
            metrics::counter!("objpub_publish_attempts_total", "module" => ctx.module().to_string())
                .increment(1);

            let outcome = self
                .coordinator
                .attempt(ctx, &mut request, retry_eligible)
                .instrument(span)
                .await;

            match outcome {
                Ok(Outcome::Completed(response)) => {
                    request.close();
                    return Ok(response);
                }
                Ok(Outcome::RetryRequested) => {
                    metrics::counter!("objpub_publish_retries_total", "module" => ctx.module().to_string())
                        .increment(1);
                    let replay = request.retry();
                    debug!(
                        original = %request.request_id(),
                        replay = %replay.request_id(),
                        "replaying request"
                    );
                    request.close();
                    request = replay;
                    attempt += 1;
                }
                Err(error) => {
                    let response = request.take_response();
                    request.close();
                    return Err(PublishFailure { error, response });
                }
            }
        }
    }
}
