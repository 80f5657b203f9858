//! Errors produced by structural operations on the widget tree.
//!
//! Every variant signals misuse by the calling wrapper layer. Indices are
//! never clamped here; clamping is reserved for recoverable binding-domain
//! values and masks real diff bugs when it leaks into tree edits.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// A child index was outside the current child range.
    OutOfRange { index: usize, len: usize },
    /// The operation is not defined for the node kind it was applied to.
    KindMismatch { op: &'static str, kind: &'static str },
    /// A single-child node already holds its one child.
    SingleChildOccupied,
    /// A virtual node was asked to act before any ancestor widget bound it.
    UnboundVirtual,
    /// The cursor was asked to move above the root node.
    CursorAtRoot,
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeError::OutOfRange { index, len } => {
                write!(f, "child index {index} out of range for {len} children")
            }
            NodeError::KindMismatch { op, kind } => {
                write!(f, "operation `{op}` is not supported by {kind} nodes")
            }
            NodeError::SingleChildOccupied => {
                write!(f, "single-child node already holds a child")
            }
            NodeError::UnboundVirtual => {
                write!(f, "virtual node has no bound ancestor widget")
            }
            NodeError::CursorAtRoot => write!(f, "cursor is already at the root node"),
        }
    }
}

impl std::error::Error for NodeError {}
