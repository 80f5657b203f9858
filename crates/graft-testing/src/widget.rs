//! The in-memory widget toolkit.
//!
//! [`TestWidget`] stands in for a native widget: identity-compared,
//! cheaply cloneable, with string props, ordered children, named slots,
//! and named signals. Every native-level call is recorded in a per-widget
//! op log so tests can assert not just the final state but the exact
//! sequence of toolkit calls a tree edit produced.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::signal::TestSignal;

static NEXT_WIDGET_ID: AtomicU64 = AtomicU64::new(0);

struct WidgetInner {
    id: u64,
    kind: &'static str,
    props: RefCell<IndexMap<&'static str, String>>,
    children: RefCell<Vec<TestWidget>>,
    slots: RefCell<IndexMap<&'static str, Vec<TestWidget>>>,
    signals: RefCell<IndexMap<&'static str, TestSignal>>,
    ops: RefCell<Vec<String>>,
}

#[derive(Clone)]
pub struct TestWidget {
    inner: Rc<WidgetInner>,
}

impl TestWidget {
    pub fn new(kind: &'static str) -> Self {
        Self {
            inner: Rc::new(WidgetInner {
                id: NEXT_WIDGET_ID.fetch_add(1, Ordering::Relaxed),
                kind,
                props: RefCell::new(IndexMap::new()),
                children: RefCell::new(Vec::new()),
                slots: RefCell::new(IndexMap::new()),
                signals: RefCell::new(IndexMap::new()),
                ops: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.inner.kind
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Stores a prop and records the write. Emits nothing; widgets whose
    /// native setters notify do so explicitly through [`TestWidget::emit`].
    pub fn set_prop(&self, name: &'static str, value: &str) {
        self.inner.props.borrow_mut().insert(name, value.to_string());
        self.record(format!("set {name}={value}"));
    }

    pub fn prop(&self, name: &str) -> Option<String> {
        self.inner.props.borrow().get(name).cloned()
    }

    pub fn remove_prop(&self, name: &str) {
        self.inner.props.borrow_mut().shift_remove(name);
        self.record(format!("unset {name}"));
    }

    /// The named signal, created on first use.
    pub fn signal(&self, name: &'static str) -> TestSignal {
        self.inner
            .signals
            .borrow_mut()
            .entry(name)
            .or_default()
            .clone()
    }

    pub fn emit(&self, name: &'static str, payload: &str) {
        let signal = self.signal(name);
        signal.emit(payload);
    }

    pub fn append_child(&self, child: &TestWidget) {
        self.inner.children.borrow_mut().push(child.clone());
        self.record(format!("append {}", op_name(child)));
    }

    /// Places `child` right after `sibling`, or first when `sibling` is
    /// `None`. This is the only positioned insert many toolkits offer.
    pub fn insert_child_after(&self, child: &TestWidget, sibling: Option<&TestWidget>) {
        let mut children = self.inner.children.borrow_mut();
        let at = match sibling {
            Some(sibling) => children
                .iter()
                .position(|w| w == sibling)
                .map(|p| p + 1)
                .unwrap_or(children.len()),
            None => 0,
        };
        children.insert(at, child.clone());
        drop(children);
        self.record(match sibling {
            Some(sibling) => format!("insert {} after {}", op_name(child), op_name(sibling)),
            None => format!("insert {} first", op_name(child)),
        });
    }

    /// Index-based insert, for toolkits that do expose one.
    pub fn insert_child_at(&self, child: &TestWidget, index: usize) {
        self.inner.children.borrow_mut().insert(index, child.clone());
        self.record(format!("insert {} at {index}", op_name(child)));
    }

    pub fn remove_child(&self, child: &TestWidget) {
        let mut children = self.inner.children.borrow_mut();
        if let Some(p) = children.iter().position(|w| w == child) {
            children.remove(p);
        }
        drop(children);
        self.record(format!("remove {}", op_name(child)));
    }

    pub fn remove_all_children(&self) {
        self.inner.children.borrow_mut().clear();
        self.record("remove-all".to_string());
    }

    pub fn children(&self) -> Vec<TestWidget> {
        self.inner.children.borrow().clone()
    }

    pub fn child_texts(&self) -> Vec<String> {
        self.inner
            .children
            .borrow()
            .iter()
            .map(|child| op_name(child))
            .collect()
    }

    /// Fills or empties a single-widget slot.
    pub fn set_slot(&self, slot: &'static str, child: Option<&TestWidget>) {
        let mut slots = self.inner.slots.borrow_mut();
        match child {
            Some(child) => {
                slots.insert(slot, vec![child.clone()]);
                drop(slots);
                self.record(format!("{slot} set {}", op_name(child)));
            }
            None => {
                slots.shift_remove(slot);
                drop(slots);
                self.record(format!("{slot} unset"));
            }
        }
    }

    pub fn add_to_slot(&self, slot: &'static str, child: &TestWidget) {
        self.inner
            .slots
            .borrow_mut()
            .entry(slot)
            .or_default()
            .push(child.clone());
        self.record(format!("{slot} add {}", op_name(child)));
    }

    pub fn remove_from_slot(&self, slot: &'static str, child: &TestWidget) {
        if let Some(children) = self.inner.slots.borrow_mut().get_mut(slot) {
            if let Some(p) = children.iter().position(|w| w == child) {
                children.remove(p);
            }
        }
        self.record(format!("{slot} remove {}", op_name(child)));
    }

    pub fn slot_children(&self, slot: &str) -> Vec<TestWidget> {
        self.inner
            .slots
            .borrow()
            .get(slot)
            .cloned()
            .unwrap_or_default()
    }

    /// Every native call recorded on this widget, oldest first.
    pub fn ops(&self) -> Vec<String> {
        self.inner.ops.borrow().clone()
    }

    pub fn clear_ops(&self) {
        self.inner.ops.borrow_mut().clear();
    }

    fn record(&self, op: String) {
        self.inner.ops.borrow_mut().push(op);
    }

    /// Indented snapshot of this widget, its props, children, and slots.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0, None);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize, slot: Option<&str>) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        if let Some(slot) = slot {
            out.push_str(&format!("[{slot}] "));
        }
        out.push_str(self.kind());
        for (name, value) in self.inner.props.borrow().iter() {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        out.push('\n');
        for child in self.inner.children.borrow().iter() {
            child.render_into(out, depth + 1, None);
        }
        for (slot_name, children) in self.inner.slots.borrow().iter() {
            for child in children {
                child.render_into(out, depth + 1, Some(slot_name));
            }
        }
    }
}

/// How a widget shows up in op logs: its text when it has one, its kind
/// otherwise.
fn op_name(widget: &TestWidget) -> String {
    widget
        .prop("text")
        .unwrap_or_else(|| widget.kind().to_string())
}

impl PartialEq for TestWidget {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for TestWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.inner.kind, self.inner.id)
    }
}
