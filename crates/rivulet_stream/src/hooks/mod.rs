//! Lifecycle hooks for stream execution.
//!
//! Plugins extend the executor by registering observers on schedules. Hooks
//! run between rounds, in registration order, and never influence how nodes
//! tick.
//!
//! # Architecture
//!
//! - **Schedule markers** ([`schedule`]): empty types that identify hook points
//! - **Events** ([`events`]): the `StreamEvent` enum carrying context to hooks
//! - **API** ([`api`]): registration and invocation
//!
//! # Example
//!
//! ```ignore
//! use rivulet_stream::hooks::events::StreamEvent;
//! use rivulet_stream::hooks::schedule::OnNodeFinished;
//!
//! executor.hooks().register_observer::<OnNodeFinished, _>("logger", |event: &StreamEvent| {
//!     if let StreamEvent::NodeFinished { label, .. } = event {
//!         tracing::info!("{label} finished");
//!     }
//! })?;
//! ```

pub mod api;
pub mod events;
pub mod schedule;

pub use api::{BoxedHook, HookRegistrationError, HooksAPI};
pub use events::StreamEvent;
pub use schedule::{IntoScheduleIds, Schedule, ScheduleId};
