//! Error types for node construction, wiring and execution.

use crate::graph::ValidationError;
use crate::node::NodeId;

/// Errors raised by a wrapped callable.
///
/// Only two of these are recoverable: [`CallError::DivisionByZero`] is
/// replaced by [`Value::infinity`](crate::value::Value::infinity), and
/// [`CallError::InvalidState`] restarts a generator-backed callable. Every
/// other variant aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// The callable's iterator reached a state it cannot continue from.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An operation was applied to incompatible value types.
    #[error("unsupported operand types for {op}: '{left}' and '{right}'")]
    TypeMismatch {
        /// The operation name.
        op: &'static str,
        /// Type of the left operand.
        left: &'static str,
        /// Type of the right operand.
        right: &'static str,
    },

    /// Any other failure reported by user code.
    #[error("{0}")]
    Failed(String),

    /// A callable running on the blocking pool panicked or was cancelled.
    #[error("blocking task did not complete: {0}")]
    Panicked(String),
}

impl CallError {
    /// Convenience constructor for [`CallError::Failed`].
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        CallError::Failed(message.into())
    }

    /// Convenience constructor for [`CallError::InvalidState`].
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        CallError::InvalidState(message.into())
    }
}

/// Errors detected while constructing a node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The callable's declared arity differs from the node's input count.
    #[error("node '{name}' declares {expected} inputs but its callable takes {actual}")]
    ArityMismatch {
        /// The node name.
        name: String,
        /// Declared input slot count.
        expected: usize,
        /// Callable arity.
        actual: usize,
    },

    /// Both the drop and replace flags were set.
    #[error("drop and replace backpressure policies are mutually exclusive")]
    ConflictingBackpressure,
}

/// Errors raised while wiring nodes together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WiringError {
    /// A node handle does not belong to this graph.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Every input slot of the consumer is already wired.
    #[error("all {inputs} input slots of {node} are already wired")]
    SlotsExhausted {
        /// The consumer node.
        node: NodeId,
        /// The consumer's input slot count.
        inputs: usize,
    },
}

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// A referenced node was not found in the graph.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The graph failed validation before the first round.
    #[error("graph is invalid: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    /// A callable failed with a non-recoverable error.
    #[error("callable of node '{name}' ({node}) failed: {source}")]
    Callable {
        /// The failing node.
        node: NodeId,
        /// The failing node's label.
        name: String,
        /// The underlying error.
        #[source]
        source: CallError,
    },

    /// The sink did not finish within the configured number of rounds.
    #[error("sink did not finish within {max} rounds")]
    RoundLimitExceeded {
        /// The configured limit.
        max: usize,
    },

    /// The blocking driver could not start its runtime.
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// Attaching the output collector failed.
    #[error(transparent)]
    Wiring(#[from] WiringError),

    /// Constructing an internal node failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
