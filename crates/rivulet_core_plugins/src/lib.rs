//! Core infrastructure plugins for Rivulet.
//!
//! - [`TracingPlugin`] - Logging and observability via the `tracing` crate
//!
//! # Example
//!
//! ```ignore
//! use rivulet_core_plugins::TracingPlugin;
//! use rivulet_stream::StreamExecutor;
//! use tracing::Level;
//!
//! let mut executor = StreamExecutor::new();
//! executor.add_plugins(TracingPlugin::default().with_level(Level::DEBUG));
//! ```

mod tracing_plugin;

pub use tracing_plugin::{OBSERVER_NAME, TracingConfig, TracingFormat, TracingPlugin};
