//! RAII ownership of the transaction opened for one publish attempt.

use std::sync::Arc;

use objpub_core::{NodeRef, PublishError, Request, TransactionManager};
use tracing::{trace, warn};

/// Open transaction for a single attempt.
///
/// The guard ends the transaction exactly once: by [`commit`](Self::commit),
/// by [`abort`](Self::abort), or, if neither completed, by aborting when it
/// is dropped. A dropped publish future therefore never leaves a
/// transaction open.
pub struct TransactionGuard {
    manager: Arc<dyn TransactionManager>,
    open: bool,
}

impl TransactionGuard {
    /// Begins a transaction on `manager`.
    #[must_use]
    pub fn open(manager: Arc<dyn TransactionManager>) -> Self {
        manager.begin();
        trace!("transaction begun");
        Self { manager, open: true }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Annotates the transaction with the object about to be invoked.
    pub fn record_metadata(&self, target: &NodeRef, request: &Request) {
        self.manager.record_metadata(target, request);
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Closed` if the transaction already ended, or the
    /// manager's commit failure. After a failed commit the transaction is
    /// still open and must be aborted.
    pub fn commit(&mut self) -> Result<(), PublishError> {
        if !self.open {
            return Err(PublishError::Closed);
        }
        self.manager.commit()?;
        self.open = false;
        trace!("transaction committed");
        Ok(())
    }

    /// Aborts the transaction if it is still open.
    pub fn abort(&mut self) {
        if self.open {
            self.open = false;
            self.manager.abort();
            trace!("transaction aborted");
        }
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if self.open {
            warn!("transaction still open at drop, aborting");
            self.abort();
        }
    }
}
