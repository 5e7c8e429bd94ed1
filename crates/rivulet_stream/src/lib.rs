//! Push-based streaming dataflow engine for Rivulet.
//!
//! `rivulet_stream` executes directed graphs of nodes, each wrapping a unit
//! of work, wired so that values emitted upstream are pushed downstream as
//! they become available. Each node synchronizes its inputs per tick,
//! applies a backpressure policy instead of buffering without bound, and
//! propagates end-of-stream once it terminates.
//!
//! # Core Concepts
//!
//! - [`Signal`] - A payload [`Value`] or one of the `NoValue`/`Repeat`/`End` markers
//! - [`Callable`] - The unit of work: function, generator, future, stream or blocking call
//! - [`Node`] - Input slots, one callable and downstream edges, plus the tick state machine
//! - [`Graph`] - Arena of nodes with wiring and traversal (`collect`, `levels`, `validate`)
//! - [`StreamExecutor`] - Drives rounds of ticks until the sink finishes
//!
//! # Example
//!
//! ```ignore
//! use rivulet_stream::prelude::*;
//!
//! let mut graph = Graph::new();
//! let numbers = graph.add_node(NodeConfig::new("Numbers"), Callable::values(1..=5))?;
//! let double = graph.pipe(
//!     numbers,
//!     NodeConfig::new("Double").inputs(1),
//!     Callable::unary(|v| v.checked_mul(&Value::Int(2))),
//! )?;
//!
//! assert_eq!(rivulet_stream::run(&mut graph, double)?.len(), 5);
//! ```

/// Units of work wrapped by nodes.
pub mod callable;

/// Downstream edges.
pub mod edge;

/// Error types.
pub mod error;

/// Stream execution engine.
pub mod executor;

/// Graph arena and topology operations.
pub mod graph;

/// Lifecycle hooks for stream execution.
pub mod hooks;

/// Node configuration and the tick state machine.
pub mod node;

/// Executor plugins.
pub mod plugin;

/// Stream signals.
pub mod signal;

/// Output collection.
pub mod sink;

/// Input slots.
pub mod slot;

/// Payload values.
pub mod value;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::callable::{Args, CallResult, Callable, CallableKind, Kwargs};
    pub use crate::error::{CallError, ConfigError, ExecutionError, WiringError};
    pub use crate::executor::{ExecutionResult, RunStats, StreamExecutor, TickOrder};
    pub use crate::graph::{Graph, ValidationError};
    pub use crate::hooks::schedule::{
        OnNodeBlocked, OnNodeExecuted, OnNodeFinished, OnRoundComplete, OnRunComplete,
        OnRunFailure, OnRunStart,
    };
    pub use crate::hooks::{HooksAPI, StreamEvent};
    pub use crate::node::{Backpressure, Node, NodeConfig, NodeId, NodeState, TickOutcome};
    pub use crate::plugin::{Plugin, PluginId};
    pub use crate::signal::Signal;
    pub use crate::sink::Collector;
    pub use crate::value::Value;
}

// Re-export key types at crate root for convenience
pub use callable::{Callable, CallableKind};
pub use error::{CallError, ConfigError, ExecutionError, WiringError};
pub use executor::{ExecutionResult, RunStats, StreamExecutor, TickOrder, run};
pub use graph::{Graph, ValidationError};
pub use node::{Backpressure, Node, NodeConfig, NodeId, TickOutcome};
pub use signal::Signal;
pub use sink::Collector;
pub use value::Value;
