//! Signals for the in-memory toolkit.
//!
//! [`TestSignal`] mimics the part of a native signal that the binding
//! protocol depends on: handlers connect and disconnect by id, can be
//! blocked per handler, and emission skips blocked handlers. Payloads are
//! plain strings; wrappers parse them into their own types the way they
//! would unpack native signal arguments.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use graft_core::SignalHandle;

struct Handler {
    id: u64,
    blocked: u32,
    func: Rc<dyn Fn(&str)>,
}

#[derive(Default)]
struct SignalState {
    handlers: Vec<Handler>,
    next_id: u64,
}

#[derive(Clone, Default)]
pub struct TestSignal {
    state: Rc<RefCell<SignalState>>,
}

impl TestSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, func: impl Fn(&str) + 'static) -> TestSignalHandle {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.handlers.push(Handler {
            id,
            blocked: 0,
            func: Rc::new(func),
        });
        TestSignalHandle {
            state: Rc::downgrade(&self.state),
            id,
        }
    }

    /// Invokes every currently unblocked handler with `payload`.
    pub fn emit(&self, payload: &str) {
        // Snapshot before invoking: a handler may connect or disconnect
        // while it runs.
        let funcs: Vec<Rc<dyn Fn(&str)>> = self
            .state
            .borrow()
            .handlers
            .iter()
            .filter(|handler| handler.blocked == 0)
            .map(|handler| Rc::clone(&handler.func))
            .collect();
        for func in funcs {
            func(payload);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.state.borrow().handlers.len()
    }
}

/// Connection id handed back by [`TestSignal::connect`]; holds the signal
/// weakly so a dropped widget does not keep handlers alive.
pub struct TestSignalHandle {
    state: Weak<RefCell<SignalState>>,
    id: u64,
}

impl SignalHandle for TestSignalHandle {
    fn block(&self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.borrow_mut();
            if let Some(handler) = state.handlers.iter_mut().find(|h| h.id == self.id) {
                handler.blocked += 1;
            }
        }
    }

    fn unblock(&self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.borrow_mut();
            if let Some(handler) = state.handlers.iter_mut().find(|h| h.id == self.id) {
                handler.blocked = handler.blocked.saturating_sub(1);
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.borrow_mut().handlers.retain(|h| h.id != self.id);
        }
    }
}
