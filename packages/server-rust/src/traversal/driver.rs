//! Walks a request's path from the publication root to its target.

use objpub_core::{NodeRef, PublishError, Request, ValidatedHook};
use tracing::{debug, trace};

use super::resolver::{acquire_allowed, PathResolver, TraversalStep};

/// Path segment naming the current node.
pub const CURRENT_SEGMENT: &str = ".";

/// Resolves a whole path, recording every hop on the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraversalDriver {
    resolver: PathResolver,
}

impl TraversalDriver {
    #[must_use]
    pub fn new(max_acquisition_depth: usize) -> Self {
        Self {
            resolver: PathResolver::new(max_acquisition_depth),
        }
    }

    /// Traverses `request.path()` starting at `root` and returns the target.
    ///
    /// `root` is pushed onto [`Request::visited`] first, then every resolved
    /// node in order. Each newly resolved node's pre-publish hook runs
    /// before it is appended. Once the path is exhausted the final node's
    /// default view, if it declares one, is resolved as one more hop.
    ///
    /// On success the target is stored with [`Request::set_published`] and
    /// `validated` runs with it.
    ///
    /// # Errors
    ///
    /// Propagates the first resolution or hook failure. `visited` then holds
    /// the chain reached so far.
    pub fn traverse(
        &self,
        root: &NodeRef,
        request: &mut Request,
        validated: Option<&ValidatedHook>,
    ) -> Result<NodeRef, PublishError> {
        let acquire = acquire_allowed(request.method());
        let segments = request.path().to_vec();

        request.push_visited(root.clone());
        let mut current = root.clone();

        for segment in segments.iter().filter(|s| s.as_str() != CURRENT_SEGMENT) {
            current = self.hop(&current, segment, acquire, request)?;
        }

        if let Some(view) = current.default_view().map(str::to_string) {
            trace!(node = current.id(), view = %view, "applying default view");
            current = self.hop(&current, &view, acquire, request)?;
        }

        debug!(
            target_id = current.id(),
            depth = request.visited().len(),
            "traversal complete"
        );
        request.set_published(current.clone());
        if let Some(hook) = validated {
            hook(request, &current);
        }
        Ok(current)
    }

    fn hop(
        &self,
        parent: &NodeRef,
        name: &str,
        acquire: bool,
        request: &mut Request,
    ) -> Result<NodeRef, PublishError> {
        let step = TraversalStep::new(parent.clone(), name, acquire);
        let next = self.resolver.resolve(&step, request)?;
        if let Some(hook) = next.traverse_hook() {
            hook.before_traverse(&next, request)?;
        }
        trace!(from = parent.id(), to = next.id(), name, "resolved");
        request.push_visited(next.clone());
        Ok(next)
    }
}
