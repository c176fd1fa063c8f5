//! Error types for the stardrift-dsp crate.

use crate::node::NodeId;
use crate::param::ParamKind;
use thiserror::Error;

/// Errors that can occur while building or driving a synthesis graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthError {
    /// A synthesis context could not be acquired.
    #[error("Synthesis context unavailable: {0}")]
    Unavailable(String),

    /// The node does not exist, or has already been released.
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// The node has no parameter of the requested kind.
    #[error("Node {node} has no {param} parameter")]
    NoSuchParam { node: NodeId, param: ParamKind },

    /// The operation is not valid in the node's current state.
    #[error("Invalid state for node {node}: {reason}")]
    InvalidState { node: NodeId, reason: &'static str },

    /// The requested connection would create a feedback loop.
    #[error("Connecting {from} to {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },

    /// An automation value or time was out of range.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The context has been closed.
    #[error("Synthesis context is closed")]
    Closed,
}

/// Result type alias using SynthError.
pub type Result<T> = std::result::Result<T, SynthError>;
