//! One publish attempt: hooks, transaction, traversal, invocation, commit.

use objpub_core::{CallResult, Outcome, PublishError, Request, Response, Value};
use tracing::{debug, trace, warn};

use super::transaction::TransactionGuard;
use crate::invoke::InvocationBinder;
use crate::publication::PublicationContext;
use crate::traversal::TraversalDriver;

/// Request variable carrying the submit button value.
pub const SUBMIT_VAR: &str = "SUBMIT";
/// Request variable naming where a cancelled form redirects to.
pub const CANCEL_ACTION_VAR: &str = "CANCEL_ACTION";

/// States of a single publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Created,
    BeforeHooks,
    TransactionOpen,
    Traversing,
    Invoking,
    Committing,
    Done,
    ErrorHandling,
}

/// Drives one attempt through [`PublishState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishCoordinator {
    driver: TraversalDriver,
}

impl PublishCoordinator {
    #[must_use]
    pub fn new(max_acquisition_depth: usize) -> Self {
        Self {
            driver: TraversalDriver::new(max_acquisition_depth),
        }
    }

    /// Runs one attempt of `request` against `ctx`.
    ///
    /// On success the request's response is moved out and returned. When
    /// the attempt fails after its transaction opened, the transaction is
    /// aborted before any error handling runs. `retry_eligible` says whether
    /// a retry signal may turn into [`Outcome::RetryRequested`]; otherwise
    /// the error hook gets a second, final call.
    ///
    /// The after hook runs once the attempt has an answer, handled or not,
    /// but not for a cancel redirect or an attempt that requests a replay.
    ///
    /// # Errors
    ///
    /// With no error hook, any failure other than an eligible retry signal.
    /// With an error hook, only the hook's own failures.
    pub async fn attempt(
        &self,
        ctx: &PublicationContext,
        request: &mut Request,
        retry_eligible: bool,
    ) -> Result<Outcome<Response>, PublishError> {
        let mut state = PublishState::Created;

        transition(&mut state, PublishState::BeforeHooks);
        if let Some(hook) = ctx.before_hook() {
            hook();
        }
        apply_response_defaults(ctx, request);
        if let Some(location) = cancel_location(request) {
            debug!(location = %location, "cancel directive, redirecting");
            request.response_mut().set_redirect(&location);
            transition(&mut state, PublishState::Done);
            return Ok(Outcome::Completed(request.take_response()));
        }

        transition(&mut state, PublishState::TransactionOpen);
        let mut txn = TransactionGuard::open(ctx.transactions().clone());

        let result = match self.run(ctx, request, &mut txn, &mut state).await {
            Ok(()) => {
                transition(&mut state, PublishState::Done);
                if let (Some(hook), Some(target)) = (ctx.end_request_hook(), request.published()) {
                    hook(target, request);
                }
                Ok(Outcome::Completed(request.take_response()))
            }
            Err(error) => {
                txn.abort();
                transition(&mut state, PublishState::ErrorHandling);
                handle_error(ctx, request, error, retry_eligible)
            }
        };

        // The replay runs the after hook for a cycle that asked for one.
        if !matches!(result, Ok(Outcome::RetryRequested)) {
            if let Some(hook) = ctx.after_hook() {
                hook();
            }
        }
        result
    }

    async fn run(
        &self,
        ctx: &PublicationContext,
        request: &mut Request,
        txn: &mut TransactionGuard,
        state: &mut PublishState,
    ) -> Result<(), PublishError> {
        transition(state, PublishState::Traversing);
        let target = self
            .driver
            .traverse(ctx.root(), request, ctx.validated_hook())?;
        txn.record_metadata(&target, request);

        transition(state, PublishState::Invoking);
        let binder = InvocationBinder::new(ctx.non_callable());
        match binder.invoke(&target, request).await? {
            CallResult::Value(body) => request.response_mut().set_body(body),
            CallResult::WroteResponse => trace!("handler wrote the response"),
        }

        transition(state, PublishState::Committing);
        txn.commit()
    }
}

fn transition(state: &mut PublishState, next: PublishState) {
    trace!(from = ?*state, to = ?next, "publish state");
    *state = next;
}

/// Copies the context's debug flag and, for anonymous requests, its realm
/// onto the response.
fn apply_response_defaults(ctx: &PublicationContext, request: &mut Request) {
    let anonymous = request.get_str("REMOTE_USER").map_or(true, |user| user.is_empty());
    let response = request.response_mut();
    if ctx.debug_mode() {
        response.debug_mode = true;
    }
    if let (Some(realm), true) = (ctx.realm(), anonymous) {
        response.realm = Some(realm.to_string());
    }
}

fn cancel_location(request: &Request) -> Option<String> {
    let submit = request.get_str(SUBMIT_VAR)?;
    if !submit.trim().eq_ignore_ascii_case("cancel") {
        return None;
    }
    request
        .get_str(CANCEL_ACTION_VAR)
        .filter(|location| !location.is_empty())
}

fn handle_error(
    ctx: &PublicationContext,
    request: &mut Request,
    error: PublishError,
    retry_eligible: bool,
) -> Result<Outcome<Response>, PublishError> {
    if let PublishError::Redirect { location } = &error {
        debug!(location = %location, "redirect");
        request.response_mut().set_redirect(location);
        return Ok(Outcome::Completed(request.take_response()));
    }

    let Some(hook) = ctx.error_hook() else {
        if error.is_retry() && retry_eligible {
            debug!(%error, "retry signal without error hook");
            return Ok(Outcome::RetryRequested);
        }
        warn!(kind = error.kind(), %error, "publish failed");
        return Err(error);
    };

    let chain = request.visited().to_vec();
    debug!(kind = error.kind(), depth = chain.len(), "invoking error hook");
    let signal = match hook.handle(&chain, request, &error) {
        Ok(Outcome::Completed(body)) => return Ok(complete(request, body)),
        Err(hook_error) if hook_error.is_retry() => hook_error,
        Err(hook_error) => return Err(hook_error),
        Ok(Outcome::RetryRequested) if error.is_retry() => error,
        Ok(Outcome::RetryRequested) => {
            PublishError::retry(format!("error hook requested a replay after {}", error.kind()))
        }
    };
    if retry_eligible {
        return Ok(Outcome::RetryRequested);
    }

    // Not replayable: the hook's answer to its own retry signal is final.
    debug!(%signal, "request cannot be replayed, calling error hook again");
    match hook.handle(&chain, request, &signal)? {
        Outcome::Completed(body) => Ok(complete(request, body)),
        Outcome::RetryRequested => Err(signal),
    }
}

fn complete(request: &mut Request, body: Value) -> Outcome<Response> {
    request.response_mut().set_body(body);
    Outcome::Completed(request.take_response())
}
