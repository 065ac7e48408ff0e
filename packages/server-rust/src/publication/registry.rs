//! Injectable cache of publication contexts keyed by module name.

use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use dashmap::DashMap;
use objpub_core::PublishError;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::context::PublicationContext;
use crate::service::lifecycle::{ManagedService, ServiceContext};

/// Builds the publication context for a module name.
pub type ContextFactory = Arc<dyn Fn(&str) -> anyhow::Result<PublicationContext> + Send + Sync>;

// ---------------------------------------------------------------------------
// PublicationRegistry
// ---------------------------------------------------------------------------

/// Registry of publication contexts.
///
/// Contexts are built lazily on first use and then shared. Concurrent first
/// requests for the same module build it once: lookups go through a
/// `DashMap` and only a miss takes the construction lock, re-checking the
/// map before calling the factory.
pub struct PublicationRegistry {
    contexts: DashMap<String, Arc<PublicationContext>>,
    /// Serializes first construction.
    init_lock: Mutex<()>,
    factory: ContextFactory,
}

impl PublicationRegistry {
    /// Creates an empty registry backed by `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<PublicationContext> + Send + Sync + 'static,
    {
        Self {
            contexts: DashMap::new(),
            init_lock: Mutex::new(()),
            factory: Arc::new(factory),
        }
    }

    /// Returns the context for `module`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Fatal` when the factory fails. Failures are not
    /// cached; the next call tries again.
    pub fn get(&self, module: &str) -> Result<Arc<PublicationContext>, PublishError> {
        if let Some(ctx) = self.contexts.get(module) {
            return Ok(ctx.value().clone());
        }

        let _guard = self.init_lock.lock();
        if let Some(ctx) = self.contexts.get(module) {
            return Ok(ctx.value().clone());
        }

        let ctx = (self.factory)(module)
            .with_context(|| format!("building publication context for module `{module}`"))?;
        let ctx = Arc::new(ctx);
        self.contexts.insert(module.to_string(), ctx.clone());
        info!(module, "publication context built");
        Ok(ctx)
    }

    /// Drops the cached context for `module`. Returns whether one was cached.
    pub fn reset(&self, module: &str) -> bool {
        let removed = self.contexts.remove(module).is_some();
        debug!(module, removed, "publication context reset");
        removed
    }

    /// Drops every cached context.
    pub fn reset_all(&self) {
        self.contexts.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[async_trait]
impl ManagedService for PublicationRegistry {
    fn name(&self) -> &'static str {
        "publication"
    }

    async fn init(&self, ctx: &ServiceContext) -> anyhow::Result<()> {
        for module in &ctx.config.warm_modules {
            self.get(module)
                .with_context(|| format!("warming module `{module}`"))?;
        }
        info!(warmed = ctx.config.warm_modules.len(), "publication registry ready");
        Ok(())
    }

    async fn reset(&self) -> anyhow::Result<()> {
        self.reset_all();
        Ok(())
    }

    async fn shutdown(&self, _terminate: bool) -> anyhow::Result<()> {
        self.reset_all();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
