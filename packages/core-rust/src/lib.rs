//! `objpub` core: the object hierarchy contract, requests, responses, and the
//! error taxonomy shared by the publishing pipeline.

pub mod callable;
pub mod error;
pub mod folder;
pub mod node;
pub mod request;
pub mod response;
pub mod traits;
pub mod types;

pub use callable::{BoundArgs, CallResult, Callable, FnCallable, Param, Signature};
pub use error::PublishError;
pub use folder::Folder;
pub use node::{BeforeTraverse, CustomTraverse, LookupError, Node, NodeCapability, NodeRef, Traversed};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use traits::{EndRequestHook, ErrorHook, Hook, Outcome, TransactionManager, ValidatedHook};
pub use types::Value;
