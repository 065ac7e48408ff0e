use std::sync::Arc;

use async_trait::async_trait;

use super::config::PublisherConfig;

// ---------------------------------------------------------------------------
// ServiceContext
// ---------------------------------------------------------------------------

/// Context provided to services during initialization.
#[derive(Debug, Clone, Default)]
pub struct ServiceContext {
    pub config: Arc<PublisherConfig>,
}

impl ServiceContext {
    #[must_use]
    pub fn new(config: PublisherConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

// ---------------------------------------------------------------------------
// ManagedService trait
// ---------------------------------------------------------------------------

/// Lifecycle-managed service trait.
///
/// The embedding process calls `init` once before serving requests, may
/// call `reset` as an administrative action, and calls `shutdown` when
/// stopping.
#[async_trait]
pub trait ManagedService: Send + Sync {
    /// Returns the unique name of this service (e.g., `"publication"`).
    fn name(&self) -> &'static str;

    /// Initialize the service with the given context.
    async fn init(&self, ctx: &ServiceContext) -> anyhow::Result<()>;

    /// Reset the service to its initial state.
    async fn reset(&self) -> anyhow::Result<()>;

    /// Shut down the service. If `terminate` is true, skip graceful cleanup.
    async fn shutdown(&self, terminate: bool) -> anyhow::Result<()>;
}
