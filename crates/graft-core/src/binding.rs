//! Two-way binding between model values and widget-emitted changes.
//!
//! Writing a model value into a widget and listening for user edits on
//! the same widget is circular by default: the programmatic write fires
//! the same signal a user edit would. The protocol here breaks the cycle
//! without dropping real input:
//!
//! * [`UpdateScope::bind_value`] blocks the binding's signal handlers
//!   around the native write, so programmatic writes never echo.
//! * Handlers report through [`UserChange::emit`], which records the edit
//!   on a per-binding counter before invoking the app callback. A bumped
//!   counter forces the next `bind_value` to rewrite even when the model
//!   value equals the last applied one, converging widget state after
//!   edits the model chose to ignore.
//! * [`UpdateScope::bind_change`] swaps app callbacks without dropping
//!   edits: old handlers are disconnected before new ones connect.
//!
//! All handles live in [`Connections`]; dropping a node disconnects its
//! handlers in registration order.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::node::WidgetNode;
use crate::update::UpdateScope;
use crate::WidgetHandle;

/// A connected native signal handler that can be blocked and torn down.
///
/// Toolkit layers implement this over their connection ids.
pub trait SignalHandle {
    fn block(&self);
    fn unblock(&self);
    fn disconnect(&mut self);
}

/// Owns one [`SignalHandle`]; disconnects exactly once, at the first of
/// explicit [`disconnect`](SignalConnection::disconnect) or drop.
pub struct SignalConnection {
    inner: Option<Box<dyn SignalHandle>>,
}

impl SignalConnection {
    pub fn new(handle: impl SignalHandle + 'static) -> Self {
        Self {
            inner: Some(Box::new(handle)),
        }
    }

    pub fn block(&self) {
        if let Some(handle) = &self.inner {
            handle.block();
        }
    }

    pub fn unblock(&self) {
        if let Some(handle) = &self.inner {
            handle.unblock();
        }
    }

    pub fn disconnect(&mut self) {
        if let Some(mut handle) = self.inner.take() {
            handle.disconnect();
        }
    }
}

impl Drop for SignalConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// The signal connections backing one binding. A binding may hold several
/// (an editable text widget reports through both its insert and delete
/// signals); block and disconnect act on all of them.
#[derive(Default)]
pub struct Connections {
    handles: SmallVec<[SignalConnection; 2]>,
}

impl Connections {
    pub fn add(&mut self, handle: impl SignalHandle + 'static) {
        self.handles.push(SignalConnection::new(handle));
    }

    pub fn push(&mut self, connection: SignalConnection) {
        self.handles.push(connection);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn block_all(&self) {
        for handle in &self.handles {
            handle.block();
        }
    }

    pub fn unblock_all(&self) {
        for handle in &self.handles {
            handle.unblock();
        }
    }

    /// Disconnects and drops every handle.
    pub fn clear(&mut self) {
        for handle in &mut self.handles {
            handle.disconnect();
        }
        self.handles.clear();
    }
}

/// Shared app callback, compared by identity so re-passing the same
/// callback across passes never reconnects handlers.
pub struct Callback<A>(Rc<dyn Fn(A)>);

impl<A> Callback<A> {
    pub fn new(f: impl Fn(A) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn invoke(&self, arg: A) {
        (self.0)(arg);
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<A> Clone for Callback<A> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<A> PartialEq for Callback<A> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<A> std::fmt::Debug for Callback<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callback(..)")
    }
}

/// Handed to connect closures; the single legal way for a signal handler
/// to report a user edit.
pub struct UserChange<A> {
    pending: Rc<Cell<u64>>,
    callback: Callback<A>,
}

impl<A> UserChange<A> {
    /// Records the edit on the binding's counter, then invokes the app
    /// callback. The counter moves first so a callback that re-enters an
    /// update pass already sees the edit.
    pub fn emit(&self, arg: A) {
        self.pending.set(self.pending.get().wrapping_add(1));
        self.callback.invoke(arg);
    }
}

impl<A> Clone for UserChange<A> {
    fn clone(&self) -> Self {
        Self {
            pending: Rc::clone(&self.pending),
            callback: self.callback.clone(),
        }
    }
}

#[derive(Default)]
struct Binding {
    /// Last model value written natively, type-erased.
    last: Option<Box<dyn Any>>,
    /// Value of `pending` consumed by the last native write.
    counter_at_apply: u64,
    /// Bumped by [`UserChange::emit`]; shared with handed-out handles.
    pending: Rc<Cell<u64>>,
    /// Current app callback, type-erased `Callback<A>`.
    callback: Option<Box<dyn Any>>,
    connections: Connections,
}

/// Per-node table of named bindings. Iteration and drop follow
/// registration order, so teardown is deterministic.
#[derive(Default)]
pub(crate) struct BindingTable {
    entries: IndexMap<&'static str, Binding>,
}

impl BindingTable {
    fn entry(&mut self, name: &'static str) -> &mut Binding {
        self.entries.entry(name).or_default()
    }

    fn pending(&self, name: &str) -> u64 {
        self.entries
            .get(name)
            .map(|binding| binding.pending.get())
            .unwrap_or(0)
    }
}

impl<'a, W: WidgetHandle> UpdateScope<'a, W> {
    /// Writes `value` natively through `write` with the binding's signal
    /// handlers blocked.
    ///
    /// The write is skipped only when `value` equals the last applied
    /// value *and* no user change was recorded since that apply. After a
    /// user edit the next pass always writes, pulling the widget back to
    /// whatever the model decided.
    pub fn bind_value<T>(&mut self, name: &'static str, value: T, write: impl FnOnce(&W, &T))
    where
        T: PartialEq + 'static,
    {
        let binding = self.bindings.entry(name);
        let pending_now = binding.pending.get();
        let same_value = binding
            .last
            .as_ref()
            .and_then(|last| last.downcast_ref::<T>())
            == Some(&value);
        if same_value && binding.counter_at_apply == pending_now {
            return;
        }
        binding.connections.block_all();
        write(&self.widget, &value);
        binding.connections.unblock_all();
        binding.last = Some(Box::new(value));
        binding.counter_at_apply = pending_now;
    }

    /// Installs `callback` as the app listener for `name`, connecting
    /// native handlers through `connect` on first install and whenever the
    /// callback identity changes.
    ///
    /// On a change the old handlers are fully disconnected before
    /// `connect` runs, so no signal can reach two generations of
    /// handlers.
    pub fn bind_change<A>(
        &mut self,
        name: &'static str,
        callback: Callback<A>,
        connect: impl FnOnce(&W, UserChange<A>, &mut Connections),
    ) where
        A: 'static,
    {
        let binding = self.bindings.entry(name);
        let same = binding
            .callback
            .as_ref()
            .and_then(|installed| installed.downcast_ref::<Callback<A>>())
            .map(|installed| installed.ptr_eq(&callback))
            .unwrap_or(false);
        if same {
            return;
        }
        binding.connections.clear();
        let user_change = UserChange {
            pending: Rc::clone(&binding.pending),
            callback: callback.clone(),
        };
        connect(&self.widget, user_change, &mut binding.connections);
        binding.callback = Some(Box::new(callback));
    }

    /// Uninstalls the change listener for `name`: disconnects its handlers
    /// and forgets the callback, so a later [`bind_change`] with any
    /// callback connects fresh.
    ///
    /// [`bind_change`]: UpdateScope::bind_change
    pub fn clear_change(&mut self, name: &'static str) {
        let binding = self.bindings.entry(name);
        binding.connections.clear();
        binding.callback = None;
    }
}

impl<W: WidgetHandle> WidgetNode<W> {
    /// Total user changes recorded for the binding `name` on this node.
    /// Embedders watch deltas between passes to react to edits out of
    /// band.
    pub fn pending_changes(&self, name: &str) -> u64 {
        self.bindings.pending(name)
    }
}
