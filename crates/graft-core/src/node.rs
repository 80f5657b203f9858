//! The retained node tree shadowing a native widget hierarchy.
//!
//! A [`WidgetNode`] pairs one declarative node with the native widget it
//! owns and a kind-specific strategy for attaching children. Structural
//! edits (`insert_child`, `remove_child`, `move_child`, `clear_children`)
//! keep the declarative child order and the native child order in
//! lockstep, translating indices into the sibling-relative calls that
//! native toolkits actually expose.

use smallvec::SmallVec;

use crate::binding::BindingTable;
use crate::error::NodeError;
use crate::update::UpdateSlots;
use crate::WidgetHandle;

type SetChildFn<W> = Box<dyn FnMut(Option<&W>)>;
type InsertFn<W> = Box<dyn FnMut(&W, usize, Option<&W>)>;
type AddFn<W> = Box<dyn FnMut(&W)>;
type RemoveFn<W> = Box<dyn FnMut(&W)>;
type RemoveAllFn = Box<dyn FnMut()>;
type BindSlotFn<W> = Box<dyn FnMut(&W) -> NodeKind<W>>;

/// Kind-specific payload of a [`WidgetNode`].
///
/// Wrappers build kinds through the constructors here (or the shorthands
/// on [`WidgetNode`]) and never look inside; the applier dispatches on the
/// variant to perform native child operations.
pub enum NodeKind<W: WidgetHandle> {
    /// No children permitted.
    Leaf,
    /// Zero or one child, attached through a toolkit child setter.
    SingleChild(SingleChildKind<W>),
    /// Ordered children attached through toolkit container calls.
    Container(ContainerKind<W>),
    /// Owns no widget; routes children into a slot of an ancestor widget.
    Virtual(VirtualKind<W>),
}

pub struct SingleChildKind<W: WidgetHandle> {
    set: SetChildFn<W>,
}

pub struct ContainerKind<W: WidgetHandle> {
    strategy: InsertStrategy<W>,
    /// Native children currently attached through this node, in order.
    attached: SmallVec<[W; 4]>,
}

enum InsertStrategy<W: WidgetHandle> {
    /// The toolkit can place a child after an arbitrary sibling (and is
    /// also handed the target index for index-based child APIs).
    Sibling {
        insert: InsertFn<W>,
        remove: RemoveFn<W>,
        remove_all: Option<RemoveAllFn>,
    },
    /// The toolkit can only append to this area (pack-style slots).
    Append { add: AddFn<W>, remove: RemoveFn<W> },
    /// Children are virtual slot routers; no native child calls here.
    SlotHost,
}

pub struct VirtualKind<W: WidgetHandle> {
    bind: BindSlotFn<W>,
    bound: Option<BoundSlot<W>>,
}

struct BoundSlot<W: WidgetHandle> {
    kind: Box<NodeKind<W>>,
    /// Ancestor widget the slot routes into; nested virtual children bind
    /// to the same anchor.
    anchor: W,
}

impl<W: WidgetHandle> NodeKind<W> {
    /// Child setter kind, for slots holding at most one widget.
    pub fn single_child(set: impl FnMut(Option<&W>) + 'static) -> Self {
        NodeKind::SingleChild(SingleChildKind { set: Box::new(set) })
    }

    /// Ordered container kind. `insert` receives the child, the target
    /// index, and the widget currently preceding that index (`None` when
    /// inserting at the front).
    pub fn container(
        insert: impl FnMut(&W, usize, Option<&W>) + 'static,
        remove: impl FnMut(&W) + 'static,
    ) -> Self {
        NodeKind::Container(ContainerKind {
            strategy: InsertStrategy::Sibling {
                insert: Box::new(insert),
                remove: Box::new(remove),
                remove_all: None,
            },
            attached: SmallVec::new(),
        })
    }

    /// Like [`NodeKind::container`], with a bulk remove-all fast path used
    /// by [`WidgetNode::clear_children`].
    pub fn container_with_clear(
        insert: impl FnMut(&W, usize, Option<&W>) + 'static,
        remove: impl FnMut(&W) + 'static,
        remove_all: impl FnMut() + 'static,
    ) -> Self {
        NodeKind::Container(ContainerKind {
            strategy: InsertStrategy::Sibling {
                insert: Box::new(insert),
                remove: Box::new(remove),
                remove_all: Some(Box::new(remove_all)),
            },
            attached: SmallVec::new(),
        })
    }

    /// Container kind for areas whose native API can only append.
    ///
    /// Arbitrary insert and move indices are still honored: the attached
    /// tail is detached and re-appended around the new widget, so declared
    /// order and native order never diverge.
    pub fn append_only(add: impl FnMut(&W) + 'static, remove: impl FnMut(&W) + 'static) -> Self {
        NodeKind::Container(ContainerKind {
            strategy: InsertStrategy::Append {
                add: Box::new(add),
                remove: Box::new(remove),
            },
            attached: SmallVec::new(),
        })
    }

    /// Container kind whose children must all be virtual slot routers.
    pub fn slot_host() -> Self {
        NodeKind::Container(ContainerKind {
            strategy: InsertStrategy::SlotHost,
            attached: SmallVec::new(),
        })
    }

    /// Virtual kind: `bind` is invoked once with the nearest real ancestor
    /// widget and returns the kind the slot behaves as from then on.
    pub fn virtual_slot(bind: impl FnMut(&W) -> NodeKind<W> + 'static) -> Self {
        NodeKind::Virtual(VirtualKind {
            bind: Box::new(bind),
            bound: None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Leaf => "leaf",
            NodeKind::SingleChild(_) => "single-child",
            NodeKind::Container(c) => match c.strategy {
                InsertStrategy::SlotHost => "slot host",
                _ => "container",
            },
            NodeKind::Virtual(_) => "virtual",
        }
    }

    /// Native attach of a real-widget child. `len` is the declarative
    /// child count before the insert.
    fn attach_widget(&mut self, child: &W, index: usize, len: usize) -> Result<(), NodeError> {
        match self {
            NodeKind::Leaf => Err(NodeError::KindMismatch {
                op: "insert_child",
                kind: "leaf",
            }),
            NodeKind::SingleChild(single) => {
                if len > 0 {
                    return Err(NodeError::SingleChildOccupied);
                }
                (single.set)(Some(child));
                Ok(())
            }
            NodeKind::Container(container) => container.attach(child, index),
            NodeKind::Virtual(virt) => match &mut virt.bound {
                Some(slot) => slot.kind.attach_widget(child, index, len),
                // Unbound: the child is staged and attaches when the slot
                // binds to its ancestor.
                None => Ok(()),
            },
        }
    }

    /// Native detach of the real-widget child at `index`.
    fn detach_widget(&mut self, child: &W, index: usize) -> Result<(), NodeError> {
        match self {
            NodeKind::Leaf => Err(NodeError::KindMismatch {
                op: "remove_child",
                kind: "leaf",
            }),
            NodeKind::SingleChild(single) => {
                (single.set)(None);
                Ok(())
            }
            NodeKind::Container(container) => container.detach(child, index),
            NodeKind::Virtual(virt) => match &mut virt.bound {
                Some(slot) => slot.kind.detach_widget(child, index),
                None => Ok(()),
            },
        }
    }

    /// Runs the native bulk clear when this kind has one. Returns `false`
    /// when callers must fall back to per-child detach.
    fn bulk_clear(&mut self) -> bool {
        match self {
            NodeKind::Container(container) => container.bulk_clear(),
            NodeKind::Virtual(virt) => match &mut virt.bound {
                Some(slot) => slot.kind.bulk_clear(),
                None => false,
            },
            NodeKind::Leaf | NodeKind::SingleChild(_) => false,
        }
    }

    fn accepts_virtual_child(&self) -> Result<(), NodeError> {
        match self {
            NodeKind::Container(container) => {
                if matches!(container.strategy, InsertStrategy::SlotHost) {
                    Ok(())
                } else {
                    Err(NodeError::KindMismatch {
                        op: "insert virtual child",
                        kind: "container",
                    })
                }
            }
            NodeKind::Virtual(virt) => match &virt.bound {
                Some(slot) => slot.kind.accepts_virtual_child(),
                // Staged; validated again when the slot binds.
                None => Ok(()),
            },
            other => Err(NodeError::KindMismatch {
                op: "insert virtual child",
                kind: other.name(),
            }),
        }
    }
}

impl<W: WidgetHandle> ContainerKind<W> {
    fn attach(&mut self, child: &W, index: usize) -> Result<(), NodeError> {
        match &mut self.strategy {
            InsertStrategy::Sibling { insert, .. } => {
                let sibling = index.checked_sub(1).map(|i| self.attached[i].clone());
                (insert)(child, index, sibling.as_ref());
                self.attached.insert(index, child.clone());
                Ok(())
            }
            InsertStrategy::Append { add, remove } => {
                if index == self.attached.len() {
                    (add)(child);
                } else {
                    log::debug!(
                        "Append-only area asked to insert at {index} with {} attached, rebuilding tail",
                        self.attached.len()
                    );
                    for widget in &self.attached[index..] {
                        (remove)(widget);
                    }
                    (add)(child);
                    for widget in &self.attached[index..] {
                        (add)(widget);
                    }
                }
                self.attached.insert(index, child.clone());
                Ok(())
            }
            InsertStrategy::SlotHost => Err(NodeError::KindMismatch {
                op: "insert widget child",
                kind: "slot host",
            }),
        }
    }

    fn detach(&mut self, child: &W, index: usize) -> Result<(), NodeError> {
        match &mut self.strategy {
            InsertStrategy::Sibling { remove, .. } | InsertStrategy::Append { remove, .. } => {
                (remove)(child);
                self.attached.remove(index);
                Ok(())
            }
            InsertStrategy::SlotHost => Err(NodeError::KindMismatch {
                op: "remove widget child",
                kind: "slot host",
            }),
        }
    }

    fn bulk_clear(&mut self) -> bool {
        if let InsertStrategy::Sibling {
            remove_all: Some(remove_all),
            ..
        } = &mut self.strategy
        {
            (remove_all)();
            self.attached.clear();
            true
        } else {
            false
        }
    }
}

impl<W: WidgetHandle> VirtualKind<W> {
    fn ensure_bound(&mut self, anchor: &W) {
        if self.bound.is_none() {
            let mut kind = (self.bind)(anchor);
            // A delegate may itself be virtual, routing through the same
            // real ancestor.
            if let NodeKind::Virtual(inner) = &mut kind {
                inner.ensure_bound(anchor);
            }
            self.bound = Some(BoundSlot {
                kind: Box::new(kind),
                anchor: anchor.clone(),
            });
        }
    }

    fn anchor(&self) -> Option<&W> {
        self.bound.as_ref().map(|slot| &slot.anchor)
    }
}

/// One declarative node shadowing one native widget (or, for virtual
/// nodes, a named slot of an ancestor's widget).
pub struct WidgetNode<W: WidgetHandle> {
    widget: Option<W>,
    kind: NodeKind<W>,
    children: Vec<WidgetNode<W>>,
    pub(crate) slots: UpdateSlots,
    pub(crate) bindings: BindingTable,
}

impl<W: WidgetHandle> WidgetNode<W> {
    pub fn new(widget: W, kind: NodeKind<W>) -> Self {
        Self {
            widget: Some(widget),
            kind,
            children: Vec::new(),
            slots: UpdateSlots::default(),
            bindings: BindingTable::default(),
        }
    }

    /// Leaf node: a widget with no child management.
    pub fn leaf(widget: W) -> Self {
        Self::new(widget, NodeKind::Leaf)
    }

    /// Node whose single child is attached through `set` (a toolkit
    /// `set_child`-style call). `set(None)` detaches.
    pub fn single_child(widget: W, set: impl FnMut(Option<&W>) + 'static) -> Self {
        Self::new(widget, NodeKind::single_child(set))
    }

    /// Ordered container node. See [`NodeKind::container`] for the closure
    /// contract.
    pub fn container(
        widget: W,
        insert: impl FnMut(&W, usize, Option<&W>) + 'static,
        remove: impl FnMut(&W) + 'static,
    ) -> Self {
        Self::new(widget, NodeKind::container(insert, remove))
    }

    pub fn container_with_clear(
        widget: W,
        insert: impl FnMut(&W, usize, Option<&W>) + 'static,
        remove: impl FnMut(&W) + 'static,
        remove_all: impl FnMut() + 'static,
    ) -> Self {
        Self::new(widget, NodeKind::container_with_clear(insert, remove, remove_all))
    }

    /// Container over an append-only native area.
    pub fn append_only(
        widget: W,
        add: impl FnMut(&W) + 'static,
        remove: impl FnMut(&W) + 'static,
    ) -> Self {
        Self::new(widget, NodeKind::append_only(add, remove))
    }

    /// Container whose children are exclusively virtual slot routers
    /// (header bars, center boxes and the like).
    pub fn slot_host(widget: W) -> Self {
        Self::new(widget, NodeKind::slot_host())
    }

    /// Virtual node: owns no widget. On insertion under a real ancestor,
    /// `bind` receives that ancestor's widget and returns the kind this
    /// slot behaves as. Children inserted before that point are staged and
    /// attach when the slot binds.
    pub fn virtual_slot(bind: impl FnMut(&W) -> NodeKind<W> + 'static) -> Self {
        Self {
            widget: None,
            kind: NodeKind::virtual_slot(bind),
            children: Vec::new(),
            slots: UpdateSlots::default(),
            bindings: BindingTable::default(),
        }
    }

    pub fn widget(&self) -> Option<&W> {
        self.widget.as_ref()
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn children(&self) -> &[WidgetNode<W>] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> Option<&WidgetNode<W>> {
        self.children.get(index)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut WidgetNode<W>> {
        self.children.get_mut(index)
    }

    /// The widget a virtual child of this node would route into: the
    /// node's own widget, or the bound anchor when the node is virtual.
    pub fn delegate_widget(&self) -> Option<&W> {
        match (&self.widget, &self.kind) {
            (Some(widget), _) => Some(widget),
            (None, NodeKind::Virtual(virt)) => virt.anchor(),
            _ => None,
        }
    }

    /// Inserts `child` so that its native widget ends up immediately after
    /// the native widget at `index - 1` (or first for `index == 0`).
    ///
    /// Virtual children are bound to this node's delegate widget before
    /// any of their staged children attach.
    pub fn insert_child(&mut self, index: usize, mut child: WidgetNode<W>) -> Result<(), NodeError> {
        let len = self.children.len();
        if index > len {
            return Err(NodeError::OutOfRange { index, len });
        }
        match child.widget.clone() {
            Some(widget) => self.kind.attach_widget(&widget, index, len)?,
            None => {
                self.kind.accepts_virtual_child()?;
                if let Some(anchor) = self.delegate_widget().cloned() {
                    child.bind_virtual(&anchor);
                    child.reattach_subtree()?;
                }
            }
        }
        self.children.insert(index, child);
        Ok(())
    }

    /// Detaches the native widget at `index`, then drops the node (which
    /// disconnects its binding handles).
    pub fn remove_child(&mut self, index: usize) -> Result<(), NodeError> {
        let len = self.children.len();
        if index >= len {
            return Err(NodeError::OutOfRange { index, len });
        }
        self.detach_child_native(index)?;
        self.children.remove(index);
        Ok(())
    }

    /// Reorders the child at `from` so it ends up at index `to` (indices
    /// in the post-removal list), reusing the same native widget.
    pub fn move_child(&mut self, from: usize, to: usize) -> Result<(), NodeError> {
        let len = self.children.len();
        if from >= len {
            return Err(NodeError::OutOfRange { index: from, len });
        }
        if to >= len {
            return Err(NodeError::OutOfRange { index: to, len });
        }
        if from == to {
            return Ok(());
        }
        self.detach_child_native(from)?;
        let node = self.children.remove(from);
        if let Some(widget) = node.widget.clone() {
            self.kind.attach_widget(&widget, to, self.children.len())?;
        }
        self.children.insert(to, node);
        if self.children[to].widget.is_none() {
            self.children[to].reattach_subtree()?;
        }
        Ok(())
    }

    /// Detaches every native child, preferring the container's bulk
    /// remove-all when it has one, then drops all child nodes.
    pub fn clear_children(&mut self) -> Result<(), NodeError> {
        if self.children.is_empty() {
            return Ok(());
        }
        if !self.kind.bulk_clear() {
            for index in (0..self.children.len()).rev() {
                self.detach_child_native(index)?;
            }
        }
        self.children.clear();
        Ok(())
    }

    /// Detaches every native child but returns the nodes intact, so they
    /// can be re-inserted later with their state (and signal connections)
    /// untouched.
    pub fn detach_children(&mut self) -> Result<Vec<WidgetNode<W>>, NodeError> {
        for index in (0..self.children.len()).rev() {
            self.detach_child_native(index)?;
        }
        Ok(std::mem::take(&mut self.children))
    }

    fn detach_child_native(&mut self, index: usize) -> Result<(), NodeError> {
        match self.children[index].widget.clone() {
            Some(widget) => self.kind.detach_widget(&widget, index),
            // A virtual child's attachments live on the ancestor; walk its
            // subtree and detach them there.
            None => self.children[index].detach_subtree(),
        }
    }

    fn detach_subtree(&mut self) -> Result<(), NodeError> {
        for index in (0..self.children.len()).rev() {
            self.detach_child_native(index)?;
        }
        Ok(())
    }

    /// Re-attaches retained children natively, in order. Used when a
    /// virtual node binds (staged children) and when detached children are
    /// restored.
    fn reattach_subtree(&mut self) -> Result<(), NodeError> {
        let anchor = match self.delegate_widget() {
            Some(anchor) => anchor.clone(),
            // Still unbound; children stay staged.
            None => return Ok(()),
        };
        for index in 0..self.children.len() {
            match self.children[index].widget.clone() {
                Some(widget) => self.kind.attach_widget(&widget, index, index)?,
                None => {
                    self.kind.accepts_virtual_child()?;
                    self.children[index].bind_virtual(&anchor);
                    self.children[index].reattach_subtree()?;
                }
            }
        }
        Ok(())
    }

    fn bind_virtual(&mut self, anchor: &W) {
        if let NodeKind::Virtual(virt) = &mut self.kind {
            virt.ensure_bound(anchor);
        }
    }
}

impl<W: WidgetHandle> std::fmt::Debug for WidgetNode<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetNode")
            .field("kind", &self.kind_name())
            .field("widget", &self.widget)
            .field("children", &self.children.len())
            .finish()
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
    type Log = Rc<RefCell<Vec<String>>>;

    fn names(order: &Order) -> Vec<&'static str> {
        order.borrow().iter().map(Stub::name).collect()
    }

    /// Container whose insert closure uses only the sibling argument, the
    /// way a toolkit without index-based insertion would.
    fn sibling_container() -> (WidgetNode<Stub>, Order, Log) {
        let order: Order = Rc::new(RefCell::new(Vec::new()));
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let node = {
            let ins_order = Rc::clone(&order);
            let ins_log = Rc::clone(&log);
            let rem_order = Rc::clone(&order);
            let rem_log = Rc::clone(&log);
            WidgetNode::container(
                stub("panel"),
                move |child: &Stub, _index, sibling: Option<&Stub>| {
                    let mut order = ins_order.borrow_mut();
                    let at = match sibling {
                        Some(sibling) => order
                            .iter()
                            .position(|w| w == sibling)
                            .map(|p| p + 1)
                            .unwrap_or(order.len()),
                        None => 0,
                    };
                    order.insert(at, child.clone());
                    ins_log.borrow_mut().push(format!("insert {}", child.name()));
                },
                move |child: &Stub| {
                    let mut order = rem_order.borrow_mut();
                    if let Some(p) = order.iter().position(|w| w == child) {
                        order.remove(p);
                    }
                    rem_log.borrow_mut().push(format!("remove {}", child.name()));
                },
            )
        };
        (node, order, log)
    }

    fn append_area() -> (WidgetNode<Stub>, Order, Log) {
        let order: Order = Rc::new(RefCell::new(Vec::new()));
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let node = {
            let add_order = Rc::clone(&order);
            let add_log = Rc::clone(&log);
            let rem_order = Rc::clone(&order);
            let rem_log = Rc::clone(&log);
            WidgetNode::append_only(
                stub("bar"),
                move |child: &Stub| {
                    add_order.borrow_mut().push(child.clone());
                    add_log.borrow_mut().push(format!("add {}", child.name()));
                },
                move |child: &Stub| {
                    let mut order = rem_order.borrow_mut();
                    if let Some(p) = order.iter().position(|w| w == child) {
                        order.remove(p);
                    }
                    rem_log.borrow_mut().push(format!("remove {}", child.name()));
                },
            )
        };
        (node, order, log)
    }

    #[test]
    fn test_sibling_insert_matches_declared_order() {
        let (mut node, order, _log) = sibling_container();
        node.insert_child(0, WidgetNode::leaf(stub("a"))).unwrap();
        node.insert_child(1, WidgetNode::leaf(stub("b"))).unwrap();
        node.insert_child(2, WidgetNode::leaf(stub("c"))).unwrap();
        node.insert_child(1, WidgetNode::leaf(stub("d"))).unwrap();
        assert_eq!(names(&order), ["a", "d", "b", "c"]);
    }

    #[test]
    fn test_insert_at_front_passes_no_sibling() {
        let (mut node, order, _log) = sibling_container();
        node.insert_child(0, WidgetNode::leaf(stub("a"))).unwrap();
        node.insert_child(0, WidgetNode::leaf(stub("b"))).unwrap();
        assert_eq!(names(&order), ["b", "a"]);
    }

    #[test]
    fn test_remove_then_insert_reuses_index() {
        let (mut node, order, _log) = sibling_container();
        for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
            node.insert_child(i, WidgetNode::leaf(stub(name))).unwrap();
        }
        node.remove_child(1).unwrap();
        node.insert_child(1, WidgetNode::leaf(stub("d"))).unwrap();
        assert_eq!(names(&order), ["a", "d", "c"]);
        assert_eq!(node.child_count(), 3);
    }

    #[test]
    fn test_move_child_repositions_same_widget() {
        let (mut node, order, _log) = sibling_container();
        for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
            node.insert_child(i, WidgetNode::leaf(stub(name))).unwrap();
        }
        let moved = node.child(0).unwrap().widget().unwrap().clone();
        node.move_child(0, 2).unwrap();
        assert_eq!(names(&order), ["b", "c", "a"]);
        // Same native widget, not a recreation.
        assert!(order.borrow()[2] == moved);
    }

    #[test]
    fn test_append_area_honors_mid_insert() {
        let (mut node, order, log) = append_area();
        node.insert_child(0, WidgetNode::leaf(stub("a"))).unwrap();
        node.insert_child(1, WidgetNode::leaf(stub("b"))).unwrap();
        node.insert_child(1, WidgetNode::leaf(stub("c"))).unwrap();
        assert_eq!(names(&order), ["a", "c", "b"]);
        assert_eq!(
            log.borrow().as_slice(),
            ["add a", "add b", "remove b", "add c", "add b"]
        );
    }

    #[test]
    fn test_bulk_clear_skips_per_child_removal() {
        let order: Order = Rc::new(RefCell::new(Vec::new()));
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut node = {
            let ins_order = Rc::clone(&order);
            let rem_log = Rc::clone(&log);
            let clr_order = Rc::clone(&order);
            let clr_log = Rc::clone(&log);
            WidgetNode::container_with_clear(
                stub("list"),
                move |child: &Stub, index, _sibling: Option<&Stub>| {
                    ins_order.borrow_mut().insert(index, child.clone());
                },
                move |child: &Stub| {
                    rem_log.borrow_mut().push(format!("remove {}", child.name()));
                },
                move || {
                    clr_order.borrow_mut().clear();
                    clr_log.borrow_mut().push("remove-all".to_string());
                },
            )
        };
        node.insert_child(0, WidgetNode::leaf(stub("a"))).unwrap();
        node.insert_child(1, WidgetNode::leaf(stub("b"))).unwrap();
        node.clear_children().unwrap();
        assert!(order.borrow().is_empty());
        assert_eq!(node.child_count(), 0);
        assert_eq!(log.borrow().as_slice(), ["remove-all"]);
    }

    #[test]
    fn test_clear_without_bulk_detaches_back_to_front() {
        let (mut node, order, log) = sibling_container();
        node.insert_child(0, WidgetNode::leaf(stub("a"))).unwrap();
        node.insert_child(1, WidgetNode::leaf(stub("b"))).unwrap();
        node.clear_children().unwrap();
        assert!(names(&order).is_empty());
        assert_eq!(
            log.borrow().as_slice(),
            ["insert a", "insert b", "remove b", "remove a"]
        );
    }

    #[test]
    fn test_single_child_sets_and_detaches() {
        let slot: Rc<RefCell<Option<Stub>>> = Rc::new(RefCell::new(None));
        let mut node = {
            let slot = Rc::clone(&slot);
            WidgetNode::single_child(stub("frame"), move |child: Option<&Stub>| {
                *slot.borrow_mut() = child.cloned();
            })
        };
        node.insert_child(0, WidgetNode::leaf(stub("x"))).unwrap();
        assert_eq!(slot.borrow().as_ref().map(Stub::name), Some("x"));

        node.remove_child(0).unwrap();
        assert!(slot.borrow().is_none());

        node.insert_child(0, WidgetNode::leaf(stub("y"))).unwrap();
        assert_eq!(slot.borrow().as_ref().map(Stub::name), Some("y"));
    }

    #[test]
    fn test_single_child_rejects_second_child() {
        let mut node = WidgetNode::single_child(stub("frame"), |_child: Option<&Stub>| {});
        node.insert_child(0, WidgetNode::leaf(stub("x"))).unwrap();
        let err = node.insert_child(1, WidgetNode::leaf(stub("y"))).unwrap_err();
        assert_eq!(err, NodeError::SingleChildOccupied);
        let err = node.insert_child(0, WidgetNode::leaf(stub("y"))).unwrap_err();
        assert_eq!(err, NodeError::SingleChildOccupied);
    }

    #[test]
    fn test_leaf_rejects_children() {
        let mut node = WidgetNode::leaf(stub("label"));
        let err = node.insert_child(0, WidgetNode::leaf(stub("x"))).unwrap_err();
        assert_eq!(
            err,
            NodeError::KindMismatch {
                op: "insert_child",
                kind: "leaf"
            }
        );
    }

    #[test]
    fn test_out_of_range_indices_fail_loudly() {
        let (mut node, _order, _log) = sibling_container();
        let err = node.insert_child(1, WidgetNode::leaf(stub("a"))).unwrap_err();
        assert_eq!(err, NodeError::OutOfRange { index: 1, len: 0 });

        node.insert_child(0, WidgetNode::leaf(stub("a"))).unwrap();
        let err = node.remove_child(3).unwrap_err();
        assert_eq!(err, NodeError::OutOfRange { index: 3, len: 1 });
        let err = node.move_child(0, 5).unwrap_err();
        assert_eq!(err, NodeError::OutOfRange { index: 5, len: 1 });
    }

    fn slot_router(host_log: &Log, slot: &'static str) -> WidgetNode<Stub> {
        let log = Rc::clone(host_log);
        WidgetNode::virtual_slot(move |anchor: &Stub| {
            let add_log = Rc::clone(&log);
            let rem_log = Rc::clone(&log);
            let host = anchor.name();
            NodeKind::append_only(
                move |child: &Stub| {
                    add_log
                        .borrow_mut()
                        .push(format!("{host}.{slot} add {}", child.name()));
                },
                move |child: &Stub| {
                    rem_log
                        .borrow_mut()
                        .push(format!("{host}.{slot} remove {}", child.name()));
                },
            )
        })
    }

    #[test]
    fn test_virtual_slots_route_to_host_widget() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut host = WidgetNode::slot_host(stub("header"));
        host.insert_child(0, slot_router(&log, "start")).unwrap();
        host.insert_child(1, slot_router(&log, "end")).unwrap();

        let start = host.child_mut(0).unwrap();
        start.insert_child(0, WidgetNode::leaf(stub("a"))).unwrap();
        start.insert_child(1, WidgetNode::leaf(stub("b"))).unwrap();
        let end = host.child_mut(1).unwrap();
        end.insert_child(0, WidgetNode::leaf(stub("x"))).unwrap();

        assert_eq!(
            log.borrow().as_slice(),
            [
                "header.start add a",
                "header.start add b",
                "header.end add x"
            ]
        );

        // Clearing one slot never touches the sibling slot.
        host.child_mut(0).unwrap().clear_children().unwrap();
        assert_eq!(
            log.borrow()[3..],
            ["header.start remove b", "header.start remove a"]
        );
    }

    #[test]
    fn test_staged_virtual_children_attach_on_bind() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut slot = slot_router(&log, "start");
        // Built bottom-up: children inserted while the slot is unbound.
        slot.insert_child(0, WidgetNode::leaf(stub("a"))).unwrap();
        slot.insert_child(1, WidgetNode::leaf(stub("b"))).unwrap();
        assert!(log.borrow().is_empty());

        let mut host = WidgetNode::slot_host(stub("header"));
        host.insert_child(0, slot).unwrap();
        assert_eq!(
            log.borrow().as_slice(),
            ["header.start add a", "header.start add b"]
        );
    }

    #[test]
    fn test_virtual_child_rejected_by_plain_container() {
        let (mut node, _order, log) = sibling_container();
        let err = node.insert_child(0, slot_router(&log, "start")).unwrap_err();
        assert_eq!(
            err,
            NodeError::KindMismatch {
                op: "insert virtual child",
                kind: "container"
            }
        );
    }

    #[test]
    fn test_widget_child_rejected_by_slot_host() {
        let mut host = WidgetNode::slot_host(stub("header"));
        let err = host.insert_child(0, WidgetNode::leaf(stub("a"))).unwrap_err();
        assert_eq!(
            err,
            NodeError::KindMismatch {
                op: "insert widget child",
                kind: "slot host"
            }
        );
    }

    #[test]
    fn test_detach_children_keeps_nodes_reinsertable() {
        let (mut node, order, _log) = sibling_container();
        node.insert_child(0, WidgetNode::leaf(stub("a"))).unwrap();
        node.insert_child(1, WidgetNode::leaf(stub("b"))).unwrap();

        let kept = node.detach_children().unwrap();
        assert!(names(&order).is_empty());
        assert_eq!(kept.len(), 2);

        for (index, child) in kept.into_iter().enumerate() {
            node.insert_child(index, child).unwrap();
        }
        assert_eq!(names(&order), ["a", "b"]);
    }

    #[test]
    fn test_single_child_slot_via_virtual() {
        let slot: Rc<RefCell<Option<Stub>>> = Rc::new(RefCell::new(None));
        let mut host = WidgetNode::slot_host(stub("row"));
        let title = {
            let slot = Rc::clone(&slot);
            WidgetNode::virtual_slot(move |_anchor: &Stub| {
                let slot = Rc::clone(&slot);
                NodeKind::single_child(move |child: Option<&Stub>| {
                    *slot.borrow_mut() = child.cloned();
                })
            })
        };
        host.insert_child(0, title).unwrap();

        let title = host.child_mut(0).unwrap();
        title.insert_child(0, WidgetNode::leaf(stub("t"))).unwrap();
        assert_eq!(slot.borrow().as_ref().map(Stub::name), Some("t"));
        let err = title.insert_child(0, WidgetNode::leaf(stub("u"))).unwrap_err();
        assert_eq!(err, NodeError::SingleChildOccupied);

        title.remove_child(0).unwrap();
        assert!(slot.borrow().is_none());
    }
}
