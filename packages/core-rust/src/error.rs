//! Error taxonomy for traversal, invocation, and publishing.

/// Errors raised while publishing a request.
///
/// Only [`PublishError::Retry`] can be converted into renewed work; every
/// other kind is terminal for the current attempt.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// A path segment could not be resolved against its parent.
    #[error("not found: {name:?} under {parent}")]
    NotFound { parent: String, name: String },

    /// A custom traverser returned more than one hop for a single segment.
    #[error("unsupported multi-hop traversal: {name:?} under {parent} yielded {hops} objects")]
    Unsupported {
        parent: String,
        name: String,
        hops: usize,
    },

    /// A required handler parameter was satisfiable neither by position nor by name.
    #[error("missing argument: {name}")]
    MissingArgument { name: String },

    /// The traversal target cannot be published under the configured policy.
    #[error("object is not publishable: {id}")]
    NotPublishable { id: String },

    /// Control signal: respond with a redirect to `location`.
    #[error("redirect to {location}")]
    Redirect { location: String },

    /// Transient conflict signal; the request may be replayed.
    #[error("retry requested: {reason}")]
    Retry { reason: String },

    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("publisher overloaded, try again later")]
    Overloaded,

    /// The transaction or request had already ended.
    #[error("request closed")]
    Closed,

    #[error("fatal: {0}")]
    Fatal(#[from] anyhow::Error),
}

impl PublishError {
    /// Creates a `NotFound` error for `name` under the node identified by `parent`.
    pub fn not_found(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            parent: parent.into(),
            name: name.into(),
        }
    }

    /// Creates a `Retry` signal with the given reason.
    pub fn retry(reason: impl Into<String>) -> Self {
        Self::Retry {
            reason: reason.into(),
        }
    }

    /// Returns `true` for the transient-conflict signal.
    #[must_use]
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Retry { .. })
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Unsupported { .. } => "unsupported",
            Self::MissingArgument { .. } => "missing_argument",
            Self::NotPublishable { .. } => "not_publishable",
            Self::Redirect { .. } => "redirect",
            Self::Retry { .. } => "retry",
            Self::Timeout { .. } => "timeout",
            Self::Overloaded => "overloaded",
            Self::Closed => "closed",
            Self::Fatal(_) => "fatal",
        }
    }
}
