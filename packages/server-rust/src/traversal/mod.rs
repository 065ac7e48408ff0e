//! Path traversal: resolving request segments into a chain of nodes.

mod driver;
mod resolver;

pub use driver::{TraversalDriver, CURRENT_SEGMENT};
pub use resolver::{acquire_allowed, PathResolver, TraversalStep, DEFAULT_MAX_ACQUISITION_DEPTH};
