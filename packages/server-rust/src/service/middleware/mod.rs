//! Tower middleware layers for the publish pipeline.
//!
//! - [`timeout`]: Per-request timeout enforcement
//! - [`metrics`]: Request timing and outcome via `tracing` spans and `metrics`
//! - [`load_shed`]: Semaphore-based concurrency limiting
//! - [`pipeline`]: Composes all layers into a single service stack

pub mod load_shed;
pub mod metrics;
pub mod pipeline;
pub mod timeout;

pub use load_shed::LoadShedLayer;
pub use self::metrics::MetricsLayer;
pub use pipeline::build_publish_pipeline;
pub use timeout::TimeoutLayer;
