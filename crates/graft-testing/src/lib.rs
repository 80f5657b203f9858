//! In-memory widget toolkit and control wrappers for exercising graft
//! trees without a display server.

pub mod controls;
pub mod signal;
pub mod widget;

pub use controls::*;
pub use signal::{TestSignal, TestSignalHandle};
pub use widget::TestWidget;

pub mod prelude {
    pub use crate::controls::*;
    pub use crate::signal::{TestSignal, TestSignalHandle};
    pub use crate::widget::TestWidget;
}
