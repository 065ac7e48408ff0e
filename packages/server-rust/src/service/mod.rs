//! The publish service and its supporting framework.
//!
//! 1. **Configuration** (`config`): `PublisherConfig` and its validation
//! 2. **Lifecycle** (`lifecycle`): `ManagedService` init/reset/shutdown
//! 3. **Service** (`publisher`): `PublishService`, the `tower::Service<Request>`
//! 4. **Middleware** (`middleware`): Tower layers (timeout, metrics, load-shedding)

pub mod config;
pub mod lifecycle;
pub mod middleware;
pub mod publisher;

pub use config::{ConfigError, PublisherConfig};
pub use lifecycle::{ManagedService, ServiceContext};
pub use middleware::build_publish_pipeline;
pub use publisher::{PublishFuture, PublishService};
