//! Positional update slots.
//!
//! A wrapper's update function runs on every pass and describes the full
//! desired widget state, but native setters must only fire when a value
//! actually changed (many toolkit setters emit signals or relayout even
//! for no-op writes). [`UpdateScope::set`] gives each call site a slot,
//! addressed positionally in call order, that remembers the last applied
//! value and skips the native write when the new value is equal.
//!
//! The positional contract is the same one slot-addressed UIs use: an
//! update function must call `set`/`swap` in the same order every pass.
//! Wrappers meet it by unconditionally setting every property.

use std::any::Any;

use crate::binding::BindingTable;
use crate::error::NodeError;
use crate::node::WidgetNode;
use crate::WidgetHandle;

/// Marker stored in freshly created slots, before the first write.
struct Unset;

#[derive(Default)]
pub(crate) struct UpdateSlots {
    values: Vec<Box<dyn Any>>,
    cursor: usize,
}

impl UpdateSlots {
    pub(crate) fn begin(&mut self) {
        self.cursor = 0;
    }

    fn advance(&mut self) -> usize {
        let index = self.cursor;
        if index == self.values.len() {
            self.values.push(Box::new(Unset));
        }
        self.cursor += 1;
        index
    }
}

/// Handed to a node's update function; carries the target widget and the
/// node's slot storage for one pass.
pub struct UpdateScope<'a, W: WidgetHandle> {
    pub(crate) widget: W,
    pub(crate) slots: &'a mut UpdateSlots,
    pub(crate) bindings: &'a mut BindingTable,
}

impl<'a, W: WidgetHandle> UpdateScope<'a, W> {
    /// The widget this update pass targets. For virtual nodes this is the
    /// bound ancestor widget.
    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Applies `value` through `apply` only when it differs from the value
    /// this call site applied last pass.
    pub fn set<T>(&mut self, value: T, apply: impl FnOnce(&W, &T))
    where
        T: PartialEq + 'static,
    {
        self.swap(value, |widget, _prev, next| apply(widget, next));
    }

    /// Like [`UpdateScope::set`], but the change handler also sees the
    /// previously applied value (`None` on the first write), for wrappers
    /// that must undo the old value before applying the new one.
    pub fn swap<T>(&mut self, value: T, on_change: impl FnOnce(&W, Option<&T>, &T))
    where
        T: PartialEq + 'static,
    {
        let index = self.slots.advance();
        let slot = &mut self.slots.values[index];
        if !slot.is::<Unset>() && !slot.is::<T>() {
            log::debug!("Update slot {index} holds a different type. Treating write as initial.");
        }
        let prev = slot.downcast_ref::<T>();
        if prev == Some(&value) {
            return;
        }
        on_change(&self.widget, prev, &value);
        *slot = Box::new(value);
    }
}

impl<W: WidgetHandle> WidgetNode<W> {
    /// Runs `f` with an [`UpdateScope`] over this node's widget (or, for a
    /// virtual node, its bound ancestor widget).
    ///
    /// Fails with [`NodeError::UnboundVirtual`] when called on a virtual
    /// node that has not been inserted under a real ancestor yet.
    pub fn update(&mut self, f: impl FnOnce(&mut UpdateScope<'_, W>)) -> Result<(), NodeError> {
        let widget = self
            .delegate_widget()
            .cloned()
            .ok_or(NodeError::UnboundVirtual)?;
        self.slots.begin();
        let mut scope = UpdateScope {
            widget,
            slots: &mut self.slots,
            bindings: &mut self.bindings,
        };
        f(&mut scope);
        Ok(())
    }
}
