//! The hierarchical event-dispatch tree.
//!
//! ```text
//! root ──► filter? ──pass──► action? ──► children (concurrently)
//!             │                              ├─► child A ──► filter? ...
//!             fail ──► stop (whole subtree)  └─► child B ──► filter? ...
//! ```
//!
//! Siblings run concurrently on the dispatching task. A failure in one
//! subtree never cancels its siblings; every failure from the pass is
//! collected into a single [`DispatchError`].

use std::fmt;
use std::sync::{Arc, Weak};

use futures::future::{join_all, BoxFuture, FutureExt};
use parking_lot::RwLock;
use tracing::{debug_span, trace, Instrument};

use crate::action::{Action, IntoAction};
use crate::context::EventContext;
use crate::error::{DispatchError, HandlerError, HandlerFailure};
use crate::events::Event;
use crate::filter::{Filter, IntoFilter};

struct Node {
    name: Option<String>,
    // Diagnostics and detach only; dispatch never walks upward.
    parent: RwLock<Weak<Node>>,
    filter: RwLock<Option<Arc<dyn Filter>>>,
    action: RwLock<Option<Arc<dyn Action>>>,
    children: RwLock<Vec<Handler>>,
}

/// Shared handle to one node of the dispatch tree.
///
/// Cloning the handle does not copy the node.
#[derive(Clone)]
pub struct Handler {
    node: Arc<Node>,
}

impl Handler {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Node with a name used in paths and logs.
    pub fn named(name: impl Into<String>) -> Self {
        Self::build(Some(name.into()))
    }

    fn build(name: Option<String>) -> Self {
        Self {
            node: Arc::new(Node {
                name,
                parent: RwLock::new(Weak::new()),
                filter: RwLock::new(None),
                action: RwLock::new(None),
                children: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.node.name.as_deref()
    }

    pub fn set_filter(&self, filter: impl IntoFilter) {
        *self.node.filter.write() = Some(filter.into_filter());
    }

    pub fn set_action(&self, action: impl IntoAction) {
        *self.node.action.write() = Some(action.into_action());
    }

    /// Attach `child` under this node.
    ///
    /// Rejects a child that already has a parent, and one that is this node
    /// or one of its ancestors.
    pub fn add_child(&self, child: Handler) -> Result<(), HandlerError> {
        if child.parent().is_some() {
            return Err(HandlerError::AlreadyAttached(child.path()));
        }

        let mut ancestor = Some(self.clone());
        while let Some(node) = ancestor {
            if node.ptr_eq(&child) {
                return Err(HandlerError::Cycle {
                    parent: self.path(),
                    child: child.path(),
                });
            }
            ancestor = node.parent();
        }

        self.attach(child);
        Ok(())
    }

    fn attach(&self, child: Handler) {
        *child.node.parent.write() = Arc::downgrade(&self.node);
        self.node.children.write().push(child);
    }

    /// Set this node's filter, returning a function that takes the action.
    ///
    /// ```ignore
    /// root.set(filter::kind("ChatEvent"))(action::from_fn(|e, _| println!("{e}")));
    /// ```
    pub fn set<F, A>(&self, filter: F) -> impl FnOnce(A)
    where
        F: IntoFilter,
        A: IntoAction,
    {
        let handler = self.clone();
        move |action| {
            handler.set_filter(filter);
            handler.set_action(action);
        }
    }

    /// Create a child with `filter`, returning a function that takes its
    /// action, registers the child, and hands it back for further nesting.
    ///
    /// ```ignore
    /// root.child(filter::kind("ChatEvent"))(action::from_async(reply));
    /// ```
    pub fn child<F, A>(&self, filter: F) -> impl FnOnce(A) -> Handler
    where
        F: IntoFilter,
        A: IntoAction,
    {
        let parent = self.clone();
        move |action| {
            let child = Handler::new();
            child.set_filter(filter);
            child.set_action(action);
            parent.attach(child.clone());
            child
        }
    }

    pub fn parent(&self) -> Option<Handler> {
        self.node
            .parent
            .read()
            .upgrade()
            .map(|node| Handler { node })
    }

    /// Children in insertion order.
    pub fn children(&self) -> Vec<Handler> {
        self.node.children.read().clone()
    }

    /// Number of ancestors above this node.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(node) = current {
            depth += 1;
            current = node.parent();
        }
        depth
    }

    /// Slash-separated location from the root. Unnamed nodes appear as their
    /// index under the parent, an unnamed root as `root`.
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut current = Some(self.clone());
        while let Some(node) = current {
            let parent = node.parent();
            let segment = match (node.name(), &parent) {
                (Some(name), _) => name.to_string(),
                (None, Some(parent)) => parent
                    .children()
                    .iter()
                    .position(|sibling| sibling.ptr_eq(&node))
                    .map_or_else(|| "?".to_string(), |ix| format!("#{ix}")),
                (None, None) => "root".to_string(),
            };
            segments.push(segment);
            current = parent;
        }
        segments.reverse();
        segments.join("/")
    }

    /// Remove this node from its parent. Returns `false` if it had none.
    pub fn detach(&self) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        parent
            .node
            .children
            .write()
            .retain(|sibling| !sibling.ptr_eq(self));
        *self.node.parent.write() = Weak::new();
        true
    }

    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Run one dispatch pass of `event` through this subtree.
    ///
    /// Completes only after every descendant that was reached has finished.
    pub fn run<'a>(
        &'a self,
        event: &'a Event,
        ctx: &'a EventContext,
    ) -> BoxFuture<'a, Result<(), DispatchError>> {
        let span = debug_span!("dispatch", kind = event.kind(), root = %self.path());
        async move {
            let failures = self.dispatch(event, ctx).await;
            if failures.is_empty() {
                Ok(())
            } else {
                Err(DispatchError { failures })
            }
        }
        .instrument(span)
        .boxed()
    }

    fn dispatch<'a>(
        &'a self,
        event: &'a Event,
        ctx: &'a EventContext,
    ) -> BoxFuture<'a, Vec<HandlerFailure>> {
        async move {
            let filter = self.node.filter.read().clone();
            if let Some(filter) = filter {
                match filter.check(event, ctx).await {
                    Ok(true) => {}
                    Ok(false) => {
                        trace!(path = %self.path(), "filter rejected event");
                        return Vec::new();
                    }
                    Err(source) => {
                        return vec![HandlerFailure::Filter {
                            path: self.path(),
                            source,
                        }];
                    }
                }
            }

            let action = self.node.action.read().clone();
            if let Some(action) = action {
                if let Err(source) = action.run(event, ctx).await {
                    return vec![HandlerFailure::Action {
                        path: self.path(),
                        source,
                    }];
                }
            }

            let children = self.children();
            join_all(children.iter().map(|child| child.dispatch(event, ctx)))
                .await
                .into_iter()
                .flatten()
                .collect()
        }
        .boxed()
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("path", &self.path())
            .field("has_filter", &self.node.filter.read().is_some())
            .field("has_action", &self.node.action.read().is_some())
            .field("children", &self.node.children.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action;
    use crate::filter;

    #[test]
    fn add_child_links_parent() {
        let root = Handler::new();
        let child = Handler::named("greeter");
        root.add_child(child.clone()).unwrap();

        assert!(child.parent().unwrap().ptr_eq(&root));
        assert_eq!(root.children().len(), 1);
        assert_eq!(child.depth(), 1);
        assert_eq!(child.path(), "root/greeter");
    }

    #[test]
    fn add_child_rejects_attached_node() {
        let a = Handler::named("a");
        let b = Handler::named("b");
        let child = Handler::named("child");
        a.add_child(child.clone()).unwrap();

        assert_eq!(
            b.add_child(child),
            Err(HandlerError::AlreadyAttached("a/child".to_string()))
        );
    }

    #[test]
    fn add_child_rejects_self() {
        let root = Handler::named("root");
        assert!(matches!(
            root.add_child(root.clone()),
            Err(HandlerError::Cycle { .. })
        ));
    }

    #[test]
    fn add_child_rejects_ancestor() {
        let root = Handler::named("top");
        let mid = Handler::named("mid");
        let leaf = Handler::named("leaf");
        root.add_child(mid.clone()).unwrap();
        mid.add_child(leaf.clone()).unwrap();

        assert_eq!(
            leaf.add_child(root),
            Err(HandlerError::Cycle {
                parent: "top/mid/leaf".to_string(),
                child: "top".to_string(),
            })
        );
    }

    #[test]
    fn child_combinator_registers_node() {
        let root = Handler::new();
        let child = root.child(filter::kind("ChatEvent"))(action::from_fn(|_, _| {}));
        let grandchild = child.child(filter::kind("ChatEvent"))(action::from_fn(|_, _| {}));

        assert_eq!(root.children().len(), 1);
        assert!(root.children()[0].ptr_eq(&child));
        assert_eq!(grandchild.depth(), 2);
        assert_eq!(grandchild.path(), "root/#0/#0");
    }

    #[test]
    fn set_combinator_configures_current_node() {
        let root = Handler::new();
        root.set(filter::kind("ChatEvent"))(action::from_fn(|_, _| {}));

        let rendered = format!("{root:?}");
        assert!(rendered.contains("has_filter: true"));
        assert!(rendered.contains("has_action: true"));
        assert!(root.children().is_empty());
    }

    #[test]
    fn detach_removes_from_parent() {
        let root = Handler::new();
        let child = Handler::named("c");
        root.add_child(child.clone()).unwrap();

        assert!(child.detach());
        assert!(root.children().is_empty());
        assert!(child.parent().is_none());
        assert!(!child.detach());

        // A detached node can be attached elsewhere.
        Handler::new().add_child(child).unwrap();
    }

    #[test]
    fn children_keep_insertion_order() {
        let root = Handler::new();
        for name in ["a", "b", "c"] {
            root.add_child(Handler::named(name)).unwrap();
        }
        let names: Vec<_> = root
            .children()
            .iter()
            .map(|c| c.name().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
