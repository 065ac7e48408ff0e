//! The publish pipeline: a single attempt and its bounded replay.

pub mod coordinator;
pub mod retry;
pub mod transaction;

pub use coordinator::{PublishCoordinator, PublishState, CANCEL_ACTION_VAR, SUBMIT_VAR};
pub use retry::{PublishFailure, RetryController};
pub use transaction::TransactionGuard;
