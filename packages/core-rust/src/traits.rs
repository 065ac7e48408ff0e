use std::sync::Arc;

use crate::error::PublishError;
use crate::node::NodeRef;
use crate::request::Request;
use crate::types::Value;

/// Result of a step that may ask for the whole request to be replayed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    RetryRequested,
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn is_retry_requested(&self) -> bool {
        matches!(self, Self::RetryRequested)
    }
}

/// Transaction boundary around one publish attempt.
///
/// Methods are synchronous so that an open transaction can be aborted from
/// a drop guard when the surrounding future is cancelled.
pub trait TransactionManager: Send + Sync {
    /// Opens a new transaction.
    fn begin(&self);

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// A write conflict is reported as [`PublishError::Retry`]; the
    /// transaction is still open afterwards and must be aborted.
    fn commit(&self) -> Result<(), PublishError>;

    /// Discards the open transaction.
    fn abort(&self);

    /// Annotates the open transaction with the object about to be invoked.
    fn record_metadata(&self, target: &NodeRef, request: &Request);
}

/// Converts a failed attempt into a response.
pub trait ErrorHook: Send + Sync {
    /// Handles `error` raised while publishing `request`.
    ///
    /// `chain` is the traversal chain reached before the failure, root
    /// first; it is empty when the failure happened before traversal.
    ///
    /// # Errors
    ///
    /// An `Err` means the hook itself failed and is propagated as fatal.
    fn handle(
        &self,
        chain: &[NodeRef],
        request: &mut Request,
        error: &PublishError,
    ) -> Result<Outcome<Value>, PublishError>;
}

impl<F> ErrorHook for F
where
    F: Fn(&[NodeRef], &mut Request, &PublishError) -> Result<Outcome<Value>, PublishError>
        + Send
        + Sync,
{
    fn handle(
        &self,
        chain: &[NodeRef],
        request: &mut Request,
        error: &PublishError,
    ) -> Result<Outcome<Value>, PublishError> {
        self(chain, request, error)
    }
}

/// Zero-argument hook run at the start or end of a publish cycle.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// Hook run once traversal has produced its target.
pub type ValidatedHook = Arc<dyn Fn(&Request, &NodeRef) + Send + Sync>;

/// Hook run after a successful commit.
pub type EndRequestHook = Arc<dyn Fn(&NodeRef, &Request) + Send + Sync>;
