//! `objpub` server: transactional object publishing over a `tower` service stack.
//!
//! A request's path is traversed from a module's root object, the target is
//! invoked inside a transaction, and transient conflicts are replayed at
//! most once.

pub mod invoke;
pub mod logging;
pub mod publication;
pub mod publish;
pub mod service;
pub mod traversal;

#[cfg(test)]
mod test_support;

pub use invoke::{InvocationBinder, NonCallablePolicy};
pub use publication::{PublicationContext, PublicationRegistry};
pub use publish::{PublishCoordinator, PublishFailure, RetryController, TransactionGuard};
pub use service::{build_publish_pipeline, ManagedService, PublishService, PublisherConfig};
pub use traversal::{PathResolver, TraversalDriver};
