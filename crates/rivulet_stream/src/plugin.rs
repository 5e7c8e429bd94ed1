//! Plugins extend a [`StreamExecutor`] at build time.
//!
//! A plugin typically registers hooks and configures process-wide
//! infrastructure such as logging.
//!
//! # Example
//!
//! ```ignore
//! struct RoundCounter;
//!
//! impl Plugin for RoundCounter {
//!     fn build(&self, executor: &mut StreamExecutor) {
//!         executor
//!             .hooks()
//!             .register_observer::<OnRoundComplete, _>("rounds", |event| {
//!                 tracing::trace!(%event);
//!             })
//!             .ok();
//!     }
//! }
//!
//! let mut executor = StreamExecutor::new();
//! executor.add_plugins(RoundCounter);
//! ```

use core::any::TypeId;

use crate::executor::StreamExecutor;

/// Unique identifier for a plugin type.
///
/// Used for duplicate detection. Based on [`TypeId`], so each plugin type
/// has exactly one `PluginId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Creates the ID of plugin type `P`.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// A unit of executor configuration.
pub trait Plugin: Send + Sync + 'static {
    /// Configures the executor. Called once, when the plugin is added.
    fn build(&self, executor: &mut StreamExecutor);

    /// Returns this plugin's ID.
    fn id(&self) -> PluginId
    where
        Self: Sized,
    {
        PluginId::of::<Self>()
    }

    /// Human-readable name, the type name by default.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}
