//! Row recycling for virtualized list widgets.
//!
//! Virtualized lists create a small pool of rows and rebind them to
//! different items as the viewport scrolls. An [`ItemFactory`] owns the
//! render function; each [`PooledRow`] owns a stable content node that the
//! list widget keeps attached across rebinds, so only the row's children
//! are rebuilt.
//!
//! A rebind that fails must not leave the row half built: the previous
//! children are detached first (with their signal connections intact) and
//! put back if rendering the new item errors. The row then still shows,
//! and reports, the item it showed before.

use std::rc::Rc;

use graft_core::{NodeError, WidgetHandle, WidgetNode};

type RenderFn<W, T> = dyn Fn(&mut WidgetNode<W>, &T) -> Result<(), NodeError>;

pub struct ItemFactory<W: WidgetHandle, T> {
    render: Rc<RenderFn<W, T>>,
}

impl<W: WidgetHandle, T> ItemFactory<W, T> {
    pub fn new(render: impl Fn(&mut WidgetNode<W>, &T) -> Result<(), NodeError> + 'static) -> Self {
        Self {
            render: Rc::new(render),
        }
    }

    /// Wraps a list-provided content node into a recyclable row.
    pub fn create_row(&self, content: WidgetNode<W>) -> PooledRow<W, T> {
        PooledRow {
            content,
            state: RowState::Unbound,
            render: Rc::clone(&self.render),
        }
    }
}

impl<W: WidgetHandle, T> Clone for ItemFactory<W, T> {
    fn clone(&self) -> Self {
        Self {
            render: Rc::clone(&self.render),
        }
    }
}

enum RowState<T> {
    Unbound,
    Bound(T),
}

pub struct PooledRow<W: WidgetHandle, T> {
    content: WidgetNode<W>,
    state: RowState<T>,
    render: Rc<RenderFn<W, T>>,
}

impl<W: WidgetHandle, T> PooledRow<W, T> {
    /// Renders `item` into the row's content node, replacing whatever item
    /// the row showed before.
    ///
    /// On render failure the previous children are restored and the row
    /// keeps its previous binding; the render error is returned.
    pub fn bind(&mut self, item: T) -> Result<(), NodeError> {
        let kept = self.content.detach_children()?;
        match (self.render)(&mut self.content, &item) {
            Ok(()) => {
                // Dropping the previous children disconnects their signal
                // handlers.
                drop(kept);
                self.state = RowState::Bound(item);
                Ok(())
            }
            Err(err) => {
                log::warn!("Rebinding a pooled row failed: {err}. Restoring previous content.");
                if let Err(restore_err) = self.restore(kept) {
                    log::warn!("Restoring previous row content failed: {restore_err}.");
                }
                Err(err)
            }
        }
    }

    fn restore(&mut self, kept: Vec<WidgetNode<W>>) -> Result<(), NodeError> {
        self.content.clear_children()?;
        for (index, child) in kept.into_iter().enumerate() {
            self.content.insert_child(index, child)?;
        }
        Ok(())
    }

    /// Clears the row when the list parks it back in the pool.
    pub fn unbind(&mut self) -> Result<(), NodeError> {
        self.content.clear_children()?;
        self.state = RowState::Unbound;
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.state, RowState::Bound(_))
    }

    /// The item currently rendered, if any.
    pub fn item(&self) -> Option<&T> {
        match &self.state {
            RowState::Bound(item) => Some(item),
            RowState::Unbound => None,
        }
    }

    pub fn content(&self) -> &WidgetNode<W> {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut WidgetNode<W> {
        &mut self.content
    }
}
