//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use objpub_core::{
    BoundArgs, CallResult, Callable, FnCallable, Folder, NodeRef, Param, PublishError, Request,
    Signature, TransactionManager, Value,
};
use parking_lot::Mutex;

/// Transaction manager that records every call in order.
#[derive(Default)]
pub struct RecordingTransactions {
    log: Mutex<Vec<String>>,
    /// Number of upcoming commits that fail with a conflict.
    conflicting_commits: AtomicU32,
}

impl RecordingTransactions {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_commits(count: u32) -> Arc<Self> {
        let txns = Self::default();
        txns.conflicting_commits.store(count, Ordering::SeqCst);
        Arc::new(txns)
    }

    pub fn events(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|e| e.as_str() == event || e.starts_with(&format!("{event}:")))
            .count()
    }
}

impl TransactionManager for RecordingTransactions {
    fn begin(&self) {
        self.log.lock().push("begin".to_string());
    }

    fn commit(&self) -> Result<(), PublishError> {
        let conflict = self
            .conflicting_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if conflict {
            self.log.lock().push("commit-conflict".to_string());
            return Err(PublishError::retry("write conflict"));
        }
        self.log.lock().push("commit".to_string());
        Ok(())
    }

    fn abort(&self) {
        self.log.lock().push("abort".to_string());
    }

    fn record_metadata(&self, target: &NodeRef, _request: &Request) {
        self.log.lock().push(format!("metadata:{}", target.id()));
    }
}

/// Handler that returns `body` and takes no parameters.
pub fn returning(body: &str) -> impl Callable + 'static {
    let body = body.to_string();
    FnCallable::new(Signature::default(), move |_args: &BoundArgs, _req: &mut Request| {
        Ok(CallResult::Value(Value::from(body.as_str())))
    })
}

/// Handler that always fails with `error`, counting its invocations.
pub fn failing_with(
    calls: Arc<AtomicU32>,
    error: fn() -> PublishError,
) -> impl Callable + 'static {
    FnCallable::new(Signature::default(), move |_args: &BoundArgs, _req: &mut Request| {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(error())
    })
}

/// Handler echoing a single required `name` parameter.
pub fn greeting() -> impl Callable + 'static {
    FnCallable::new(
        Signature::new(vec![Param::required("name")]),
        |args: &BoundArgs, _req: &mut Request| {
            let name = args.get("name").and_then(Value::as_str).unwrap_or_default();
            Ok(CallResult::Value(Value::from(format!("hello {name}"))))
        },
    )
}

/// Handler that sleeps before answering, used for cancellation tests.
pub struct SlowHandler {
    pub delay: Duration,
    signature: Signature,
}

impl SlowHandler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            signature: Signature::default(),
        }
    }
}

#[async_trait]
impl Callable for SlowHandler {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    async fn call(&self, _args: BoundArgs, _request: &mut Request) -> Result<CallResult, PublishError> {
        tokio::time::sleep(self.delay).await;
        Ok(CallResult::Value(Value::from("late")))
    }
}

/// `root -> a -> b`, with `b` publishable.
pub fn abc_tree() -> Arc<Folder> {
    let root = Folder::new("root").into_ref();
    let a = root.add_child(Folder::new("a").into_ref());
    a.add_child(Folder::new("b").with_callable(returning("b body")).into_ref());
    root
}

/// Ids of the nodes in `chain`, in order.
pub fn ids(chain: &[NodeRef]) -> Vec<String> {
    chain.iter().map(|node| node.id().to_string()).collect()
}
