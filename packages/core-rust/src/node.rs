//! Object hierarchy contract consumed by traversal.
//!
//! Capabilities are exposed through explicit accessors rather than probed
//! for: a node that can override traversal returns a [`CustomTraverse`] from
//! [`Node::traverser`], a node with a pre-publish hook returns a
//! [`BeforeTraverse`] from [`Node::traverse_hook`], and so on.

use std::fmt;
use std::sync::Arc;

use crate::callable::Callable;
use crate::error::PublishError;
use crate::request::Request;
use crate::types::Value;

/// Shared handle to a node in the object hierarchy.
///
/// Nodes belong to the hierarchy; traversal holds these handles only for
/// the duration of one request.
pub type NodeRef = Arc<dyn Node>;

/// Capability variant reported by [`Node::capability`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCapability {
    /// Attribute and item lookup only.
    Plain,
    /// Overrides traversal of its children.
    CustomTraversable,
    /// Runs a hook when traversal reaches it.
    HookedTraversable,
}

/// A node in the published object hierarchy.
pub trait Node: Send + Sync {
    /// Stable identifier, used in error messages and transaction metadata.
    fn id(&self) -> &str;

    /// Logical parent, used for acquisition. Non-owning on the node side.
    fn parent(&self) -> Option<NodeRef> {
        None
    }

    /// Looks up `name` among this node's own declared members only.
    fn own_attribute(&self, name: &str) -> Option<NodeRef>;

    /// Container-style lookup, tried after attribute lookup fails.
    fn item(&self, _key: &str) -> Option<NodeRef> {
        None
    }

    /// Name of the view published when the path ends at this node.
    fn default_view(&self) -> Option<&str> {
        None
    }

    fn traverser(&self) -> Option<&dyn CustomTraverse> {
        None
    }

    fn traverse_hook(&self) -> Option<&dyn BeforeTraverse> {
        None
    }

    /// Invocation capability. `None` means the node is a bare value.
    fn callable(&self) -> Option<&dyn Callable> {
        None
    }

    /// Value published for a non-callable node when policy allows it.
    fn value(&self) -> Option<Value> {
        None
    }

    fn capability(&self) -> NodeCapability {
        if self.traverser().is_some() {
            NodeCapability::CustomTraversable
        } else if self.traverse_hook().is_some() {
            NodeCapability::HookedTraversable
        } else {
            NodeCapability::Plain
        }
    }
}

impl fmt::Debug for dyn Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id())
            .field("capability", &self.capability())
            .finish_non_exhaustive()
    }
}

/// Result of a custom traversal step.
pub enum Traversed {
    One(NodeRef),
    /// Several hops for one segment. Only a single-element chain is accepted.
    Chain(Vec<NodeRef>),
}

/// Failure of a custom traversal step.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The name does not exist under this node.
    #[error("name not found")]
    Missing,
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Traversal override for a node's children.
pub trait CustomTraverse: Send + Sync {
    /// Resolves `name` under the owning node.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Missing`] when the name does not exist, or
    /// [`LookupError::Failed`] for any other failure.
    fn traverse(&self, request: &Request, name: &str) -> Result<Traversed, LookupError>;
}

/// Hook run on a node as soon as traversal resolves it.
pub trait BeforeTraverse: Send + Sync {
    /// # Errors
    ///
    /// Any error aborts traversal.
    fn before_traverse(&self, node: &NodeRef, request: &mut Request) -> Result<(), PublishError>;
}

impl<F> BeforeTraverse for F
where
    F: Fn(&NodeRef, &mut Request) -> Result<(), PublishError> + Send + Sync,
{
    fn before_traverse(&self, node: &NodeRef, request: &mut Request) -> Result<(), PublishError> {
        self(node, request)
    }
}

impl<F> CustomTraverse for F
where
    F: Fn(&Request, &str) -> Result<Traversed, LookupError> + Send + Sync,
{
    fn traverse(&self, request: &Request, name: &str) -> Result<Traversed, LookupError> {
        self(request, name)
    }
}
