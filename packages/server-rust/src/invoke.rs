//! Binding request data to a handler's signature and invoking it.

use objpub_core::{BoundArgs, CallResult, NodeRef, PublishError, Request, Signature};
use serde::Deserialize;
use tracing::{debug, trace};

/// What to do when traversal ends on a node that cannot be called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonCallablePolicy {
    /// Fail with [`PublishError::NotPublishable`].
    #[default]
    Reject,
    /// Publish the node's bare value as the response body.
    ReturnValue,
}

/// Calls the traversal target with arguments drawn from the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationBinder {
    policy: NonCallablePolicy,
}

impl InvocationBinder {
    #[must_use]
    pub fn new(policy: NonCallablePolicy) -> Self {
        Self { policy }
    }

    /// Binds `signature` against the request.
    ///
    /// Each declared parameter takes, in order of preference, the positional
    /// argument at its index, the request variable of the same name, or its
    /// default. Positional arguments beyond the declared parameters are kept
    /// in [`BoundArgs::rest`] for variadic signatures and dropped otherwise.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::MissingArgument` naming the first required
    /// parameter that nothing satisfies.
    pub fn bind(&self, signature: &Signature, request: &Request) -> Result<BoundArgs, PublishError> {
        let positional = request.args();
        let mut named = Vec::with_capacity(signature.params.len());

        for (index, param) in signature.params.iter().enumerate() {
            let value = positional
                .get(index)
                .cloned()
                .or_else(|| request.get(&param.name))
                .or_else(|| param.default.clone())
                .ok_or_else(|| PublishError::MissingArgument {
                    name: param.name.clone(),
                })?;
            named.push((param.name.clone(), value));
        }

        let surplus = positional.get(signature.params.len()..).unwrap_or_default();
        let rest = if signature.variadic {
            surplus.to_vec()
        } else {
            if !surplus.is_empty() {
                trace!(dropped = surplus.len(), "dropping surplus positional arguments");
            }
            Vec::new()
        };

        Ok(BoundArgs { named, rest })
    }

    /// Invokes `target`, honouring the non-callable policy.
    ///
    /// # Errors
    ///
    /// Binding failures, `PublishError::NotPublishable` for a node that can
    /// be neither called nor published as a value, and any handler error.
    pub async fn invoke(&self, target: &NodeRef, request: &mut Request) -> Result<CallResult, PublishError> {
        let Some(callable) = target.callable() else {
            return self.publish_value(target);
        };

        let args = self.bind(callable.signature(), request)?;
        debug!(target_id = target.id(), args = args.named.len(), "invoking");
        callable.call(args, request).await
    }

    fn publish_value(&self, target: &NodeRef) -> Result<CallResult, PublishError> {
        let not_publishable = || PublishError::NotPublishable {
            id: target.id().to_string(),
        };
        match self.policy {
            NonCallablePolicy::Reject => Err(not_publishable()),
            NonCallablePolicy::ReturnValue => target
                .value()
                .map(CallResult::Value)
                .ok_or_else(not_publishable),
        }
    }
}
