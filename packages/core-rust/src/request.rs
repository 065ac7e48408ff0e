//! Inbound request carried through one publish cycle.
//!
//! A `Request` owns its variable bag, the chain of nodes visited by
//! traversal, and the [`Response`] it will populate. [`Request::retry`]
//! produces a replacement sharing the same input; the original is then
//! consumed by [`Request::close`], which releases everything it holds.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use http::Method;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::node::NodeRef;
use crate::response::Response;
use crate::types::Value;

/// Number of replays a retry-capable transport allows by default.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

type LazyValue = Box<dyn FnOnce() -> Value + Send>;
type Held = Box<dyn Any + Send + Sync>;

/// Mutable request variables. Lazy entries are promoted on first read.
#[derive(Default)]
struct VariableBag {
    other: HashMap<String, Value>,
    lazies: HashMap<String, LazyValue>,
}

/// One inbound request.
pub struct Request {
    id: Uuid,
    method: Method,
    path: Vec<String>,
    args: Vec<Value>,
    environ: HashMap<String, String>,
    form: HashMap<String, Value>,
    body: Bytes,
    variables: Mutex<VariableBag>,
    visited: Vec<NodeRef>,
    published: Option<NodeRef>,
    response: Response,
    retry_capable: bool,
    retry_count: u32,
    max_retries: u32,
    held: Vec<Held>,
}

impl Request {
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Ordered path segments. Empty segments are never present.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Positional arguments supplied by the transport.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Shared input body. Replacement requests see the same bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Looks up a variable.
    ///
    /// Search order: variables set with [`Request::set`], the environment,
    /// lazy variables (evaluated once and promoted), then form variables.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        if key == "PATH_INFO" {
            return Some(Value::String(format!("/{}", self.path.join("/"))));
        }

        let mut bag = self.variables.lock();
        if let Some(value) = bag.other.get(key) {
            return Some(value.clone());
        }
        if let Some(value) = self.environ.get(key) {
            return Some(Value::String(value.clone()));
        }
        if let Some(lazy) = bag.lazies.remove(key) {
            let value = lazy();
            bag.other.insert(key.to_string(), value.clone());
            return Some(value);
        }
        drop(bag);

        self.form.get(key).cloned()
    }

    /// Like [`Request::get`], falling back to `default` when the key is absent.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Returns the variable as a string, if it is one.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        let bag = self.variables.get_mut();
        bag.lazies.remove(key);
        bag.other.insert(key.to_string(), value);
    }

    /// Registers a variable computed on first read.
    pub fn set_lazy<F>(&mut self, key: &str, compute: F)
    where
        F: FnOnce() -> Value + Send + 'static,
    {
        self.variables
            .get_mut()
            .lazies
            .insert(key.to_string(), Box::new(compute));
    }

    /// Nodes traversed so far, root first.
    #[must_use]
    pub fn visited(&self) -> &[NodeRef] {
        &self.visited
    }

    /// Appends a traversed node. The chain is append-only within a cycle.
    pub fn push_visited(&mut self, node: NodeRef) {
        self.visited.push(node);
    }

    /// Target of a completed traversal.
    #[must_use]
    pub fn published(&self) -> Option<&NodeRef> {
        self.published.as_ref()
    }

    pub fn set_published(&mut self, node: NodeRef) {
        self.published = Some(node);
    }

    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Moves the response out, leaving a fresh one in its place.
    pub fn take_response(&mut self) -> Response {
        std::mem::take(&mut self.response)
    }

    /// Keeps `resource` alive until the request is closed.
    pub fn hold<T: Send + Sync + 'static>(&mut self, resource: T) {
        self.held.push(Box::new(resource));
    }

    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Whether the transport allows this request to be replayed.
    #[must_use]
    pub fn supports_retry(&self) -> bool {
        self.retry_capable && self.retry_count < self.max_retries
    }

    /// Produces the replacement request used for a replay.
    ///
    /// The replacement shares method, path, arguments, environment, form
    /// and body, but starts with a fresh variable bag, an empty visited
    /// chain and a fresh response.
    #[must_use]
    pub fn retry(&self) -> Request {
        Request {
            id: Uuid::new_v4(),
            method: self.method.clone(),
            path: self.path.clone(),
            args: self.args.clone(),
            environ: self.environ.clone(),
            form: self.form.clone(),
            body: self.body.clone(),
            variables: Mutex::new(VariableBag::default()),
            visited: Vec::new(),
            published: None,
            response: Response::new(),
            retry_capable: self.retry_capable,
            retry_count: self.retry_count + 1,
            max_retries: self.max_retries,
            held: Vec::new(),
        }
    }

    /// Releases held resources and variables.
    pub fn close(mut self) {
        debug!(
            request_id = %self.id,
            held = self.held.len(),
            "closing request"
        );
        self.held.clear();
        let bag = self.variables.get_mut();
        bag.other.clear();
        bag.lazies.clear();
        self.visited.clear();
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("visited", &self.visited.len())
            .field("retry_count", &self.retry_count)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Request`].
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: Vec<String>,
    args: Vec<Value>,
    environ: HashMap<String, String>,
    form: HashMap<String, Value>,
    body: Bytes,
    retry_capable: bool,
    max_retries: u32,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: Vec::new(),
            args: Vec::new(),
            environ: HashMap::new(),
            form: HashMap::new(),
            body: Bytes::new(),
            retry_capable: false,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RequestBuilder {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the path from a `/`-delimited string. Empty segments are dropped.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = split_path(path);
        self
    }

    #[must_use]
    pub fn segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = segments
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    #[must_use]
    pub fn form(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.form.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn environ(mut self, key: &str, value: &str) -> Self {
        self.environ.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn retry_capable(mut self, capable: bool) -> Self {
        self.retry_capable = capable;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    #[must_use]
    pub fn build(self) -> Request {
        Request {
            id: Uuid::new_v4(),
            method: self.method,
            path: self.path,
            args: self.args,
            environ: self.environ,
            form: self.form,
            body: self.body,
            variables: Mutex::new(VariableBag::default()),
            visited: Vec::new(),
            published: None,
            response: Response::new(),
            retry_capable: self.retry_capable,
            retry_count: 0,
            max_retries: self.max_retries,
            held: Vec::new(),
        }
    }
}

/// Splits a `/`-delimited path into segments, dropping empty ones.
#[must_use]
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
