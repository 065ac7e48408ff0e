//! Single-segment resolution against the current node.

use http::Method;
use objpub_core::{LookupError, NodeRef, PublishError, Request, Traversed};
use tracing::{trace, warn};

/// Default bound on the number of ancestors acquisition walks.
pub const DEFAULT_MAX_ACQUISITION_DEPTH: usize = 64;

/// One hop of a traversal.
#[derive(Clone)]
pub struct TraversalStep {
    /// Node the hop starts from.
    pub parent: NodeRef,
    pub name: String,
    /// Whether the name may be found on an ancestor of `parent`.
    pub acquire: bool,
}

impl TraversalStep {
    #[must_use]
    pub fn new(parent: NodeRef, name: &str, acquire: bool) -> Self {
        Self {
            parent,
            name: name.to_string(),
            acquire,
        }
    }

    fn not_found(&self) -> PublishError {
        PublishError::not_found(self.parent.id(), &self.name)
    }
}

/// Whether names may be acquired from ancestors for requests using `method`.
///
/// Only GET and POST acquire. Any other method must resolve against the
/// node's own members so that, for instance, a PUT creating `test` under a
/// folder never lands on an existing `test` higher up the hierarchy.
#[must_use]
pub fn acquire_allowed(method: &Method) -> bool {
    method == Method::GET || method == Method::POST
}

/// Resolves one path segment against a node.
///
/// Resolution order:
/// 1. the node's custom traverser, if it has one (its answer is final);
/// 2. attribute lookup on the node's own members, then, when the step
///    allows acquisition, on each ancestor up to the depth bound;
/// 3. container item lookup.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver {
    max_acquisition_depth: usize,
}

impl PathResolver {
    #[must_use]
    pub fn new(max_acquisition_depth: usize) -> Self {
        Self {
            max_acquisition_depth,
        }
    }

    /// Resolves `step.name` under `step.parent`.
    ///
    /// # Errors
    ///
    /// - `PublishError::NotFound` when no lookup succeeds
    /// - `PublishError::Unsupported` when a custom traverser returns several hops
    /// - `PublishError::Fatal` when a custom traverser fails for another reason
    pub fn resolve(&self, step: &TraversalStep, request: &Request) -> Result<NodeRef, PublishError> {
        if let Some(traverser) = step.parent.traverser() {
            return match traverser.traverse(request, &step.name) {
                Ok(Traversed::One(node)) => Ok(node),
                Ok(Traversed::Chain(mut hops)) => match hops.len() {
                    0 | 1 => hops.pop().ok_or_else(|| step.not_found()),
                    n => Err(PublishError::Unsupported {
                        parent: step.parent.id().to_string(),
                        name: step.name.clone(),
                        hops: n,
                    }),
                },
                Err(LookupError::Missing) => Err(step.not_found()),
                Err(LookupError::Failed(err)) => Err(PublishError::Fatal(err)),
            };
        }

        if let Some(node) = self.attribute(step) {
            return Ok(node);
        }

        step.parent.item(&step.name).ok_or_else(|| step.not_found())
    }

    fn attribute(&self, step: &TraversalStep) -> Option<NodeRef> {
        if let Some(node) = step.parent.own_attribute(&step.name) {
            return Some(node);
        }
        if !step.acquire {
            return None;
        }

        let mut ancestor = step.parent.parent();
        let mut depth = 0;
        while let Some(node) = ancestor {
            if depth == self.max_acquisition_depth {
                warn!(
                    name = %step.name,
                    depth,
                    "acquisition depth bound reached"
                );
                return None;
            }
            if let Some(found) = node.own_attribute(&step.name) {
                trace!(name = %step.name, from = node.id(), "acquired");
                return Some(found);
            }
            ancestor = node.parent();
            depth += 1;
        }
        None
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ACQUISITION_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use objpub_core::{Folder, Node};

    use super::*;

    fn step(parent: &Arc<Folder>, name: &str, acquire: bool) -> TraversalStep {
        TraversalStep::new(parent.clone(), name, acquire)
    }

    /// `root{shared, site{docs}}`
    fn tree() -> (Arc<Folder>, Arc<Folder>, Arc<Folder>) {
        let root = Folder::new("root").into_ref();
        root.add_child(Folder::new("shared").into_ref());
        let site = root.add_child(Folder::new("site").into_ref());
        let docs = site.add_child(Folder::new("docs").into_ref());
        (root, site, docs)
    }

    #[test]
    fn resolves_own_member() {
        let (_root, site, _docs) = tree();
        let request = Request::builder().build();
        let node = PathResolver::default()
            .resolve(&step(&site, "docs", false), &request)
            .unwrap();
        assert_eq!(node.id(), "docs");
    }

    #[test]
    fn acquires_from_ancestor_when_allowed() {
        let (_root, _site, docs) = tree();
        let request = Request::builder().build();
        let node = PathResolver::default()
            .resolve(&step(&docs, "shared", true), &request)
            .unwrap();
        assert_eq!(node.id(), "shared");
    }

    #[test]
    fn does_not_acquire_when_forbidden() {
        let (_root, _site, docs) = tree();
        let request = Request::builder().build();
        let err = PathResolver::default()
            .resolve(&step(&docs, "shared", false), &request)
            .unwrap_err();
        assert!(matches!(
            err,
            PublishError::NotFound { parent, name } if parent == "docs" && name == "shared"
        ));
    }

    #[test]
    fn acquisition_respects_depth_bound() {
        let (_root, _site, docs) = tree();
        let request = Request::builder().build();
        // `shared` lives two ancestors up; a bound of one stops at `site`.
        let err = PathResolver::new(1)
            .resolve(&step(&docs, "shared", true), &request)
            .unwrap_err();
        assert!(matches!(err, PublishError::NotFound { .. }));

        let node = PathResolver::new(2)
            .resolve(&step(&docs, "shared", true), &request)
            .unwrap();
        assert_eq!(node.id(), "shared");
    }

    #[test]
    fn falls_back_to_item_lookup() {
        let (root, _site, _docs) = tree();
        root.add_item("7", Folder::new("entry-7").into_ref());
        let request = Request::builder().build();
        let node = PathResolver::default()
            .resolve(&step(&root, "7", false), &request)
            .unwrap();
        assert_eq!(node.id(), "entry-7");
    }

    #[test]
    fn missing_everywhere_is_not_found() {
        let (root, _site, _docs) = tree();
        let request = Request::builder().build();
        let err = PathResolver::default()
            .resolve(&step(&root, "ghost", true), &request)
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn custom_traverser_overrides_lookup() {
        let target: NodeRef = Folder::new("virtual").into_ref();
        let found = target.clone();
        let parent = Folder::new("dynamic")
            .with_traverser(move |_req: &Request, name: &str| -> Result<Traversed, LookupError> {
                if name == "v" {
                    Ok(Traversed::One(found.clone()))
                } else {
                    Err(LookupError::Missing)
                }
            })
            .into_ref();
        parent.add_child(Folder::new("static").into_ref());
        let request = Request::builder().build();
        let resolver = PathResolver::default();

        let node = resolver.resolve(&step(&parent, "v", true), &request).unwrap();
        assert!(Arc::ptr_eq(&node, &target));

        // The traverser's answer is final: members are not consulted.
        let err = resolver
            .resolve(&step(&parent, "static", true), &request)
            .unwrap_err();
        assert!(matches!(err, PublishError::NotFound { .. }));
    }

    #[test]
    fn custom_traverser_single_hop_chain_is_accepted() {
        let hop: NodeRef = Folder::new("hop").into_ref();
        let parent = Folder::new("p")
            .with_traverser(move |_req: &Request, _name: &str| -> Result<Traversed, LookupError> {
                Ok(Traversed::Chain(vec![hop.clone()]))
            })
            .into_ref();
        let request = Request::builder().build();
        let node = PathResolver::default()
            .resolve(&step(&parent, "x", true), &request)
            .unwrap();
        assert_eq!(node.id(), "hop");
    }

    #[test]
    fn custom_traverser_multi_hop_is_unsupported() {
        let parent = Folder::new("p")
            .with_traverser(|_req: &Request, _name: &str| -> Result<Traversed, LookupError> {
                let a: NodeRef = Folder::new("a").into_ref();
                let b: NodeRef = Folder::new("b").into_ref();
                Ok(Traversed::Chain(vec![a, b]))
            })
            .into_ref();
        let request = Request::builder().build();
        let err = PathResolver::default()
            .resolve(&step(&parent, "x", true), &request)
            .unwrap_err();
        assert!(matches!(err, PublishError::Unsupported { hops: 2, .. }));
    }

    #[test]
    fn custom_traverser_failure_is_fatal() {
        let parent = Folder::new("p")
            .with_traverser(|_req: &Request, _name: &str| -> Result<Traversed, LookupError> {
                Err(LookupError::Failed(anyhow::anyhow!("backend offline")))
            })
            .into_ref();
        let request = Request::builder().build();
        let err = PathResolver::default()
            .resolve(&step(&parent, "x", true), &request)
            .unwrap_err();
        assert!(matches!(err, PublishError::Fatal(_)));
    }

    #[test]
    fn only_get_and_post_acquire() {
        assert!(acquire_allowed(&Method::GET));
        assert!(acquire_allowed(&Method::POST));
        assert!(!acquire_allowed(&Method::PUT));
        assert!(!acquire_allowed(&Method::DELETE));
        assert!(!acquire_allowed(&Method::PATCH));
    }

    #[test]
    fn resolved_node_links_to_parent() {
        let (root, _site, _docs) = tree();
        let request = Request::builder().build();
        let node = PathResolver::default()
            .resolve(&step(&root, "site", false), &request)
            .unwrap();
        assert_eq!(node.parent().map(|p| p.id().to_string()).as_deref(), Some("root"));
    }
}
