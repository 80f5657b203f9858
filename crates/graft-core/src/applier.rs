//! Cursor-based applier over a [`WidgetNode`] tree.
//!
//! Reconcilers emit edits relative to a cursor they move through the
//! tree (`down` into a child, `up` to the parent, structural ops at the
//! current node). The applier owns the root node and resolves the cursor
//! path on every operation, so a stale path fails loudly instead of
//! editing the wrong subtree.

use smallvec::SmallVec;

use crate::error::NodeError;
use crate::node::WidgetNode;
use crate::update::UpdateScope;
use crate::WidgetHandle;

pub struct Applier<W: WidgetHandle> {
    root: WidgetNode<W>,
    path: SmallVec<[usize; 8]>,
}

impl<W: WidgetHandle> Applier<W> {
    pub fn new(root: WidgetNode<W>) -> Self {
        Self {
            root,
            path: SmallVec::new(),
        }
    }

    pub fn root(&self) -> &WidgetNode<W> {
        &self.root
    }

    /// Depth of the cursor below the root.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    fn cursor_node(&self) -> Result<&WidgetNode<W>, NodeError> {
        let mut node = &self.root;
        for &index in &self.path {
            let len = node.child_count();
            node = node.child(index).ok_or(NodeError::OutOfRange { index, len })?;
        }
        Ok(node)
    }

    fn cursor_node_mut(&mut self) -> Result<&mut WidgetNode<W>, NodeError> {
        let mut node = &mut self.root;
        for &index in &self.path {
            let len = node.child_count();
            node = node
                .child_mut(index)
                .ok_or(NodeError::OutOfRange { index, len })?;
        }
        Ok(node)
    }

    /// The node under the cursor.
    pub fn current(&self) -> Result<&WidgetNode<W>, NodeError> {
        self.cursor_node()
    }

    /// Moves the cursor into the child at `index` of the current node.
    pub fn down(&mut self, index: usize) -> Result<(), NodeError> {
        let len = self.cursor_node()?.child_count();
        if index >= len {
            return Err(NodeError::OutOfRange { index, len });
        }
        self.path.push(index);
        Ok(())
    }

    /// Moves the cursor back to the parent.
    pub fn up(&mut self) -> Result<(), NodeError> {
        self.path.pop().map(|_| ()).ok_or(NodeError::CursorAtRoot)
    }

    /// Returns the cursor to the root.
    pub fn reset(&mut self) {
        self.path.clear();
    }

    /// Inserts `child` at `index` under the current node.
    pub fn insert(&mut self, index: usize, child: WidgetNode<W>) -> Result<(), NodeError> {
        self.cursor_node_mut()?.insert_child(index, child)
    }

    /// Removes the child at `index` of the current node.
    pub fn remove(&mut self, index: usize) -> Result<(), NodeError> {
        self.cursor_node_mut()?.remove_child(index)
    }

    /// Moves the current node's child from `from` to `to`.
    pub fn move_child(&mut self, from: usize, to: usize) -> Result<(), NodeError> {
        self.cursor_node_mut()?.move_child(from, to)
    }

    /// Removes every child of the current node.
    pub fn clear(&mut self) -> Result<(), NodeError> {
        self.cursor_node_mut()?.clear_children()
    }

    /// Runs an update pass against the current node's widget.
    pub fn update_current(
        &mut self,
        f: impl FnOnce(&mut UpdateScope<'_, W>),
    ) -> Result<(), NodeError> {
        self.cursor_node_mut()?.update(f)
    }

    /// Looks up a node by absolute path from the root, for inspection.
    pub fn node_at(&self, path: &[usize]) -> Option<&WidgetNode<W>> {
        let mut node = &self.root;
        for &index in path {
            node = node.child(index)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct Stub(Rc<&'static str>);

    impl Stub {
        fn name(&self) -> &'static str {
            *self.0
        }
    }

    impl PartialEq for Stub {
        fn eq(&self, other: &Self) -> bool {
            Rc::ptr_eq(&self.0, &other.0)
        }
    }

    impl std::fmt::Debug for Stub {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.name())
        }
    }

    fn stub(name: &'static str) -> Stub {
        Stub(Rc::new(name))
    }

    type Order = Rc<RefCell<Vec<Stub>>>;

    fn box_node(name: &'static str) -> (WidgetNode<Stub>, Order) {
        let order: Order = Rc::new(RefCell::new(Vec::new()));
        let node = {
            let ins = Rc::clone(&order);
            let rem = Rc::clone(&order);
            WidgetNode::container(
                stub(name),
                move |child: &Stub, index, _sibling: Option<&Stub>| {
                    ins.borrow_mut().insert(index, child.clone());
                },
                move |child: &Stub| {
                    let mut order = rem.borrow_mut();
                    if let Some(p) = order.iter().position(|w| w == child) {
                        order.remove(p);
                    }
                },
            )
        };
        (node, order)
    }

    fn names(order: &Order) -> Vec<&'static str> {
        order.borrow().iter().map(Stub::name).collect()
    }

    #[test]
    fn test_cursor_edits_nested_children() {
        let (root, root_order) = box_node("root");
        let (inner, inner_order) = box_node("inner");
        let mut applier = Applier::new(root);

        applier.insert(0, WidgetNode::leaf(stub("a"))).unwrap();
        applier.insert(1, inner).unwrap();
        applier.down(1).unwrap();
        applier.insert(0, WidgetNode::leaf(stub("x"))).unwrap();
        applier.insert(1, WidgetNode::leaf(stub("y"))).unwrap();
        applier.up().unwrap();
        applier.insert(2, WidgetNode::leaf(stub("b"))).unwrap();

        assert_eq!(names(&root_order), ["a", "inner", "b"]);
        assert_eq!(names(&inner_order), ["x", "y"]);
    }

    #[test]
    fn test_down_validates_child_index() {
        let (root, _order) = box_node("root");
        let mut applier = Applier::new(root);
        let err = applier.down(0).unwrap_err();
        assert_eq!(err, NodeError::OutOfRange { index: 0, len: 0 });
    }

    #[test]
    fn test_up_at_root_fails() {
        let (root, _order) = box_node("root");
        let mut applier = Applier::new(root);
        assert_eq!(applier.up().unwrap_err(), NodeError::CursorAtRoot);
    }

    #[test]
    fn test_reset_returns_to_root() {
        let (root, root_order) = box_node("root");
        let (inner, _inner_order) = box_node("inner");
        let mut applier = Applier::new(root);
        applier.insert(0, inner).unwrap();
        applier.down(0).unwrap();
        assert_eq!(applier.depth(), 1);
        applier.reset();
        assert_eq!(applier.depth(), 0);
        applier.insert(1, WidgetNode::leaf(stub("tail"))).unwrap();
        assert_eq!(names(&root_order), ["inner", "tail"]);
    }

    #[test]
    fn test_update_current_targets_cursor_node() {
        let (root, _order) = box_node("root");
        let mut applier = Applier::new(root);
        applier.insert(0, WidgetNode::leaf(stub("a"))).unwrap();
        applier.down(0).unwrap();

        let seen: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = Rc::clone(&seen);
            applier
                .update_current(move |scope| {
                    seen.borrow_mut().push(scope.widget().name());
                })
                .unwrap();
        }
        assert_eq!(seen.borrow().as_slice(), ["a"]);
    }

    #[test]
    fn test_node_at_walks_absolute_paths() {
        let (root, _root_order) = box_node("root");
        let (inner, _inner_order) = box_node("inner");
        let mut applier = Applier::new(root);
        applier.insert(0, inner).unwrap();
        applier.down(0).unwrap();
        applier.insert(0, WidgetNode::leaf(stub("x"))).unwrap();

        let found = applier.node_at(&[0, 0]).unwrap();
        assert_eq!(found.widget().map(Stub::name), Some("x"));
        assert!(applier.node_at(&[3]).is_none());
    }
}
