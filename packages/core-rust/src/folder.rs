//! In-memory [`Node`] implementation for building object hierarchies.
//!
//! A `Folder` owns its children and items; each child keeps a non-owning
//! link back to the folder it was added to, which is what acquisition walks.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::callable::Callable;
use crate::node::{BeforeTraverse, CustomTraverse, Node, NodeRef};
use crate::types::Value;

/// In-memory container node.
pub struct Folder {
    id: String,
    parent: RwLock<Option<Weak<dyn Node>>>,
    children: RwLock<BTreeMap<String, NodeRef>>,
    items: RwLock<BTreeMap<String, NodeRef>>,
    default_view: Option<String>,
    callable: Option<Box<dyn Callable>>,
    value: Option<Value>,
    traverser: Option<Box<dyn CustomTraverse>>,
    traverse_hook: Option<Box<dyn BeforeTraverse>>,
}

impl Folder {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            parent: RwLock::new(None),
            children: RwLock::new(BTreeMap::new()),
            items: RwLock::new(BTreeMap::new()),
            default_view: None,
            callable: None,
            value: None,
            traverser: None,
            traverse_hook: None,
        }
    }

    #[must_use]
    pub fn with_default_view(mut self, name: &str) -> Self {
        self.default_view = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn with_callable(mut self, callable: impl Callable + 'static) -> Self {
        self.callable = Some(Box::new(callable));
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn with_traverser(mut self, traverser: impl CustomTraverse + 'static) -> Self {
        self.traverser = Some(Box::new(traverser));
        self
    }

    #[must_use]
    pub fn with_traverse_hook(mut self, hook: impl BeforeTraverse + 'static) -> Self {
        self.traverse_hook = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn into_ref(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Adds `child` under its own id and links it back to `self`.
    ///
    /// An existing child with the same id is replaced. Returns the child.
    pub fn add_child(self: &Arc<Self>, child: Arc<Folder>) -> Arc<Folder> {
        child.link_parent(self);
        self.children
            .write()
            .insert(child.id.clone(), child.clone() as NodeRef);
        child
    }

    /// Adds an arbitrary node as a member named `name`, without a parent link.
    pub fn add_node(&self, name: &str, node: NodeRef) {
        self.children.write().insert(name.to_string(), node);
    }

    /// Adds `child` as a container item under `key` and links it back to `self`.
    pub fn add_item(self: &Arc<Self>, key: &str, child: Arc<Folder>) -> Arc<Folder> {
        child.link_parent(self);
        self.items
            .write()
            .insert(key.to_string(), child.clone() as NodeRef);
        child
    }

    pub fn remove_child(&self, name: &str) -> Option<NodeRef> {
        self.children.write().remove(name)
    }

    /// Member names in sorted order.
    #[must_use]
    pub fn child_ids(&self) -> Vec<String> {
        self.children.read().keys().cloned().collect()
    }

    fn link_parent(&self, parent: &Arc<Folder>) {
        let parent: NodeRef = parent.clone();
        *self.parent.write() = Some(Arc::downgrade(&parent));
    }
}

impl Node for Folder {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent(&self) -> Option<NodeRef> {
        self.parent.read().as_ref().and_then(Weak::upgrade)
    }

    fn own_attribute(&self, name: &str) -> Option<NodeRef> {
        self.children.read().get(name).cloned()
    }

    fn item(&self, key: &str) -> Option<NodeRef> {
        self.items.read().get(key).cloned()
    }

    fn default_view(&self) -> Option<&str> {
        self.default_view.as_deref()
    }

    fn traverser(&self) -> Option<&dyn CustomTraverse> {
        self.traverser.as_deref()
    }

    fn traverse_hook(&self) -> Option<&dyn BeforeTraverse> {
        self.traverse_hook.as_deref()
    }

    fn callable(&self) -> Option<&dyn Callable> {
        self.callable.as_deref()
    }

    fn value(&self) -> Option<Value> {
        self.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use crate::node::{NodeCapability, Traversed};
    use crate::request::Request;

    #[test]
    fn children_link_back_to_parent() {
        let root = Folder::new("root").into_ref();
        let docs = root.add_child(Folder::new("docs").into_ref());

        let parent = docs.parent().expect("linked");
        assert_eq!(parent.id(), "root");
        assert!(root.own_attribute("docs").is_some());
        assert!(root.own_attribute("nope").is_none());
    }

    #[test]
    fn parent_link_does_not_keep_parent_alive() {
        let docs = {
            let root = Folder::new("root").into_ref();
            root.add_child(Folder::new("docs").into_ref())
        };
        assert!(docs.parent().is_none());
    }

    #[test]
    fn add_child_replaces_same_id() {
        let root = Folder::new("root").into_ref();
        root.add_child(Folder::new("a").with_value(Value::Int(1)).into_ref());
        root.add_child(Folder::new("a").with_value(Value::Int(2)).into_ref());

        assert_eq!(root.child_ids(), vec!["a".to_string()]);
        assert_eq!(
            root.own_attribute("a").and_then(|n| n.value()),
            Some(Value::Int(2))
        );
    }

    #[test]
    fn items_are_separate_from_members() {
        let root = Folder::new("root").into_ref();
        root.add_item("42", Folder::new("entry-42").into_ref());

        assert!(root.own_attribute("42").is_none());
        assert_eq!(root.item("42").map(|n| n.id().to_string()).as_deref(), Some("entry-42"));
        assert_eq!(root.item("42").and_then(|n| n.parent()).map(|p| p.id().to_string()).as_deref(), Some("root"));
    }

    #[test]
    fn capability_reflects_accessors() {
        let plain = Folder::new("plain");
        assert_eq!(plain.capability(), NodeCapability::Plain);

        let custom = Folder::new("custom").with_traverser(|_req: &Request, _name: &str| {
            Err::<Traversed, _>(crate::node::LookupError::Missing)
        });
        assert_eq!(custom.capability(), NodeCapability::CustomTraversable);

        let hooked = Folder::new("hooked")
            .with_traverse_hook(|_node: &NodeRef, _req: &mut Request| Ok::<(), PublishError>(()));
        assert_eq!(hooked.capability(), NodeCapability::HookedTraversable);
    }
}
