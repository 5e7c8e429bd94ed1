//! A push-based streaming dataflow engine in Rust.
//!
//! Graphs of nodes pass values downstream as soon as they are produced. Each
//! node waits until every input slot holds a value, runs its callable once,
//! and applies a backpressure policy (`block`, `drop` or `replace`) when a
//! consumer falls behind. End-of-stream propagates through the graph and the
//! run stops once the output node has finished.
//!
//! # Quick Start
//!
//! ```ignore
//! use rivulet::prelude::*;
//!
//! let mut graph = Graph::new();
//! let a = graph.add_node(NodeConfig::new("A"), Callable::values([1, 2]))?;
//! let b = graph.add_node(NodeConfig::new("B"), Callable::values([10, 20]))?;
//! let sum = graph.add_node(
//!     NodeConfig::new("Sum").inputs(2),
//!     Callable::binary(|x, y| x.checked_add(y)),
//! )?;
//! graph.connect(a, sum)?;
//! graph.connect(b, sum)?;
//!
//! let mut executor = StreamExecutor::new();
//! executor.add_plugins(TracingPlugin::default());
//! let result = executor.run_blocking(&mut graph, sum)?;
//! assert_eq!(result.output, vec![Value::Int(11), Value::Int(22)]);
//! ```

pub use rivulet_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use rivulet_internal::prelude::*;
}
