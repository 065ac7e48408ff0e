//! The tower-facing publish service.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use objpub_core::{PublishError, Request, Response};
use tower::Service;
use tracing::warn;

use super::config::PublisherConfig;
use crate::publication::PublicationRegistry;
use crate::publish::{PublishFailure, RetryController};

/// Future returned by every service in the publish stack.
pub type PublishFuture = Pin<Box<dyn Future<Output = Result<Response, PublishError>> + Send>>;

// ---------------------------------------------------------------------------
// PublishService
// ---------------------------------------------------------------------------

/// Publishes requests for one module.
///
/// Cloning is cheap; clones share the registry.
#[derive(Clone)]
pub struct PublishService {
    registry: Arc<PublicationRegistry>,
    module: Arc<str>,
    controller: RetryController,
}

impl PublishService {
    /// Creates a service publishing `config.default_module`.
    #[must_use]
    pub fn new(registry: Arc<PublicationRegistry>, config: &PublisherConfig) -> Self {
        Self {
            registry,
            module: Arc::from(config.default_module.as_str()),
            controller: RetryController::new(config.max_acquisition_depth),
        }
    }

    /// Returns a service publishing `module` instead.
    #[must_use]
    pub fn for_module(mut self, module: &str) -> Self {
        self.module = Arc::from(module);
        self
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Publishes `request`, resolving the module's context first.
    ///
    /// # Errors
    ///
    /// Context construction failures and whatever the publish attempts
    /// end with.
    pub async fn publish(&self, request: Request) -> Result<Response, PublishError> {
        let ctx = self.registry.get(&self.module)?;
        self.controller.publish(&ctx, request).await
    }

    /// Publishes `request` and always produces a response.
    ///
    /// Errors that escape the pipeline are recorded with
    /// [`Response::handle_exception`] on the response the final attempt
    /// prepared, or on a fresh one when no context could be built.
    pub async fn publish_module(&self, request: Request) -> Response {
        let (error, mut response) = match self.registry.get(&self.module) {
            Ok(ctx) => match self.controller.publish_with_response(&ctx, request).await {
                Ok(response) => return response,
                Err(PublishFailure { error, response }) => (error, response),
            },
            Err(error) => (error, Response::new()),
        };
        warn!(module = %self.module, kind = error.kind(), %error, "unhandled publish error");
        response.handle_exception(&error);
        response
    }
}

impl Service<Request> for PublishService {
    type Response = Response;
    type Error = PublishError;
    type Future = PublishFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { service.publish(request).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use objpub_core::{NodeRef, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::publication::PublicationContext;
    use crate::test_support::{abc_tree, RecordingTransactions};

    fn registry(txns: &Arc<RecordingTransactions>) -> Arc<PublicationRegistry> {
        let txns = txns.clone();
        Arc::new(PublicationRegistry::new(move |module: &str| {
            if module != "app" {
                anyhow::bail!("unknown module {module}");
            }
            let root: NodeRef = abc_tree();
            Ok(PublicationContext::builder(module, root, txns.clone()).build())
        }))
    }

    #[tokio::test]
    async fn oneshot_publishes_default_module() {
        let txns = RecordingTransactions::new();
        let service = PublishService::new(registry(&txns), &PublisherConfig::default());

        let response = service
            .oneshot(Request::builder().path("a/b").build())
            .await
            .unwrap();

        assert_eq!(response.body(), Some(&Value::from("b body")));
        assert_eq!(txns.count("commit"), 1);
    }

    #[tokio::test]
    async fn unknown_module_is_fatal() {
        let txns = RecordingTransactions::new();
        let service = PublishService::new(registry(&txns), &PublisherConfig::default()).for_module("nope");
        assert_eq!(service.module(), "nope");

        let err = service
            .oneshot(Request::builder().path("a/b").build())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "fatal");
        assert!(txns.events().is_empty());
    }

    #[tokio::test]
    async fn publish_module_renders_unhandled_errors() {
        let txns = RecordingTransactions::new();
        let service = PublishService::new(registry(&txns), &PublisherConfig::default());

        let response = service
            .publish_module(Request::builder().path("a/missing").build())
            .await;

        assert_eq!(response.status(), 404);
        assert!(response.exception.is_some());
        assert_eq!(txns.events(), ["begin", "abort"]);
    }

    #[tokio::test]
    async fn publish_module_error_keeps_realm_and_debug_mode() {
        let txns = RecordingTransactions::new();
        let factory_txns = txns.clone();
        let registry = Arc::new(PublicationRegistry::new(move |module: &str| {
            let root: NodeRef = abc_tree();
            Ok(PublicationContext::builder(module, root, factory_txns.clone())
                .realm("Intranet")
                .debug_mode(true)
                .build())
        }));
        let service = PublishService::new(registry, &PublisherConfig::default());

        let response = service
            .publish_module(Request::builder().path("a/missing").build())
            .await;

        assert_eq!(response.status(), 404);
        assert_eq!(response.realm.as_deref(), Some("Intranet"));
        assert!(response.debug_mode);
    }

    #[tokio::test]
    async fn publish_module_without_context_uses_fresh_response() {
        let txns = RecordingTransactions::new();
        let service = PublishService::new(registry(&txns), &PublisherConfig::default()).for_module("nope");

        let response = service
            .publish_module(Request::builder().path("a/b").build())
            .await;

        assert_eq!(response.status(), 500);
        assert_eq!(response.realm, None);
    }

    #[tokio::test]
    async fn clones_share_cached_context() {
        let txns = RecordingTransactions::new();
        let registry = registry(&txns);
        let service = PublishService::new(registry.clone(), &PublisherConfig::default());

        service.clone().oneshot(Request::builder().path("a/b").build()).await.unwrap();
        service.oneshot(Request::builder().path("a/b").build()).await.unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(txns.count("commit"), 2);
    }
}
