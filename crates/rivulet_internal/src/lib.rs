//! # Rivulet Internal Library
//!
//! Re-exports the core Rivulet crates for convenience.

/// The streaming dataflow engine.
pub use rivulet_stream;

/// Infrastructure plugins.
pub use rivulet_core_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use rivulet_core_plugins::{TracingConfig, TracingFormat, TracingPlugin};
    pub use rivulet_stream::prelude::*;
}
