//! Per-module publication settings.

use std::fmt;
use std::sync::Arc;

use objpub_core::{
    EndRequestHook, ErrorHook, Hook, NodeRef, Request, TransactionManager, ValidatedHook,
};

use crate::invoke::NonCallablePolicy;

/// Everything the pipeline needs to publish one module.
///
/// Built once per module name and shared read-only by every request for
/// that module.
pub struct PublicationContext {
    module: String,
    root: NodeRef,
    realm: Option<String>,
    debug_mode: bool,
    before_hook: Option<Hook>,
    after_hook: Option<Hook>,
    error_hook: Option<Arc<dyn ErrorHook>>,
    validated_hook: Option<ValidatedHook>,
    end_request_hook: Option<EndRequestHook>,
    transactions: Arc<dyn TransactionManager>,
    non_callable: NonCallablePolicy,
}

impl PublicationContext {
    #[must_use]
    pub fn builder(
        module: &str,
        root: NodeRef,
        transactions: Arc<dyn TransactionManager>,
    ) -> PublicationContextBuilder {
        PublicationContextBuilder {
            ctx: Self {
                module: module.to_string(),
                root,
                realm: None,
                debug_mode: false,
                before_hook: None,
                after_hook: None,
                error_hook: None,
                validated_hook: None,
                end_request_hook: None,
                transactions,
                non_callable: NonCallablePolicy::default(),
            },
        }
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Realm advertised to requests without an authenticated user.
    #[must_use]
    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    #[must_use]
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    #[must_use]
    pub fn before_hook(&self) -> Option<&Hook> {
        self.before_hook.as_ref()
    }

    #[must_use]
    pub fn after_hook(&self) -> Option<&Hook> {
        self.after_hook.as_ref()
    }

    #[must_use]
    pub fn error_hook(&self) -> Option<&dyn ErrorHook> {
        self.error_hook.as_deref()
    }

    #[must_use]
    pub fn validated_hook(&self) -> Option<&ValidatedHook> {
        self.validated_hook.as_ref()
    }

    #[must_use]
    pub fn end_request_hook(&self) -> Option<&EndRequestHook> {
        self.end_request_hook.as_ref()
    }

    #[must_use]
    pub fn transactions(&self) -> &Arc<dyn TransactionManager> {
        &self.transactions
    }

    #[must_use]
    pub fn non_callable(&self) -> NonCallablePolicy {
        self.non_callable
    }
}

impl fmt::Debug for PublicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicationContext")
            .field("module", &self.module)
            .field("root", &self.root.id())
            .field("realm", &self.realm)
            .field("debug_mode", &self.debug_mode)
            .field("error_hook", &self.error_hook.is_some())
            .field("non_callable", &self.non_callable)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PublicationContext`].
pub struct PublicationContextBuilder {
    ctx: PublicationContext,
}

impl PublicationContextBuilder {
    #[must_use]
    pub fn realm(mut self, realm: &str) -> Self {
        self.ctx.realm = Some(realm.to_string());
        self
    }

    #[must_use]
    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.ctx.debug_mode = enabled;
        self
    }

    #[must_use]
    pub fn before_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.ctx.before_hook = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn after_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.ctx.after_hook = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn error_hook(mut self, hook: impl ErrorHook + 'static) -> Self {
        self.ctx.error_hook = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn validated_hook(
        mut self,
        hook: impl Fn(&Request, &NodeRef) + Send + Sync + 'static,
    ) -> Self {
        self.ctx.validated_hook = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn end_request_hook(
        mut self,
        hook: impl Fn(&NodeRef, &Request) + Send + Sync + 'static,
    ) -> Self {
        self.ctx.end_request_hook = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn non_callable(mut self, policy: NonCallablePolicy) -> Self {
        self.ctx.non_callable = policy;
        self
    }

    #[must_use]
    pub fn build(self) -> PublicationContext {
        self.ctx
    }
}
