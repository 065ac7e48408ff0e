//! Publication contexts: per-module settings and their registry.

pub mod context;
pub mod registry;

pub use context::{PublicationContext, PublicationContextBuilder};
pub use registry::{ContextFactory, PublicationRegistry};
