//! Reusable decoration chains.
//!
//! A [`Modifier`] is an ordered list of apply/undo pairs (css classes,
//! margins, size requests) that wrappers attach to any widget next to its
//! own properties. Chains compare by element identity: passing the same
//! chain value across passes costs nothing, while a rebuilt chain undoes
//! the old elements before applying the new ones.

use std::rc::Rc;

use graft_core::{UpdateScope, WidgetHandle};

struct Element<W> {
    apply: Rc<dyn Fn(&W)>,
    undo: Rc<dyn Fn(&W)>,
}

impl<W> Clone for Element<W> {
    fn clone(&self) -> Self {
        Self {
            apply: Rc::clone(&self.apply),
            undo: Rc::clone(&self.undo),
        }
    }
}

impl<W> PartialEq for Element<W> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.apply, &other.apply) && Rc::ptr_eq(&self.undo, &other.undo)
    }
}

pub struct Modifier<W: WidgetHandle> {
    elements: Vec<Element<W>>,
}

impl<W: WidgetHandle> Modifier<W> {
    pub fn empty() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Single-element chain. `undo` must reverse whatever `apply` did, so
    /// a replaced chain leaves no residue on the widget.
    pub fn of(apply: impl Fn(&W) + 'static, undo: impl Fn(&W) + 'static) -> Self {
        Self {
            elements: vec![Element {
                apply: Rc::new(apply),
                undo: Rc::new(undo),
            }],
        }
    }

    /// Appends one apply/undo pair, returning the extended chain.
    pub fn combine(mut self, apply: impl Fn(&W) + 'static, undo: impl Fn(&W) + 'static) -> Self {
        self.elements.push(Element {
            apply: Rc::new(apply),
            undo: Rc::new(undo),
        });
        self
    }

    /// Concatenates two chains; `self`'s elements stay first.
    pub fn then(mut self, other: Modifier<W>) -> Self {
        self.elements.extend(other.elements);
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Applies every element to `widget`, first to last.
    pub fn apply_to(&self, widget: &W) {
        for element in &self.elements {
            (element.apply)(widget);
        }
    }

    /// Undoes every element from `widget`, last to first.
    pub fn undo_from(&self, widget: &W) {
        for element in self.elements.iter().rev() {
            (element.undo)(widget);
        }
    }
}

impl<W: WidgetHandle> Clone for Modifier<W> {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
        }
    }
}

impl<W: WidgetHandle> Default for Modifier<W> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<W: WidgetHandle> PartialEq for Modifier<W> {
    fn eq(&self, other: &Self) -> bool {
        self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(a, b)| a == b)
    }
}

impl<W: WidgetHandle> std::fmt::Debug for Modifier<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Modifier({} elements)", self.elements.len())
    }
}

/// Adds modifier handling to update scopes.
pub trait ModifierExt<W: WidgetHandle> {
    /// Diffs `modifier` against the chain applied last pass; on change,
    /// undoes the old chain and applies the new one.
    fn set_modifier(&mut self, modifier: &Modifier<W>);
}

impl<'a, W: WidgetHandle> ModifierExt<W> for UpdateScope<'a, W> {
    fn set_modifier(&mut self, modifier: &Modifier<W>) {
        self.swap(modifier.clone(), |widget, prev, next| {
            if let Some(prev) = prev {
                prev.undo_from(widget);
            }
            next.apply_to(widget);
        });
    }
}
