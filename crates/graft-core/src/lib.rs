#![doc = r"Node tree, applier, and binding protocol for grafting declarative UI trees onto retained widget toolkits."]

pub mod applier;
pub mod binding;
pub mod error;
pub mod node;
pub mod update;

pub use applier::Applier;
pub use binding::{Callback, Connections, SignalConnection, SignalHandle, UserChange};
pub use error::NodeError;
pub use node::{NodeKind, WidgetNode};
pub use update::UpdateScope;

/// Handle to one native widget: cheap to clone, compared by identity,
/// printable in diagnostics. Toolkit object references (and the test
/// doubles standing in for them) satisfy this blanket impl as-is.
pub trait WidgetHandle: Clone + PartialEq + std::fmt::Debug + 'static {}

impl<T: Clone + PartialEq + std::fmt::Debug + 'static> WidgetHandle for T {}
