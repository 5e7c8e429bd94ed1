//! Schedule markers for stream execution lifecycle events.
//!
//! A schedule is identified by a marker type wrapped in a [`ScheduleId`].
//! Register hooks with [`register_observer::<OnNodeExecuted>`](super::HooksAPI::register_observer)
//! or with a tuple of markers to cover several points at once.
//!
//! Event data is carried by the unified [`StreamEvent`](super::events::StreamEvent)
//! enum, which all hooks receive.

use core::any::TypeId;
use variadics_please::all_tuples;

/// Identifier for a hook schedule, derived from a marker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ScheduleId {
    /// Creates a `ScheduleId` for the given schedule marker type.
    #[must_use]
    pub fn of<S: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: core::any::type_name::<S>(),
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

/// Marker trait for schedule types.
pub trait Schedule: 'static {}

/// Types that can be converted into a list of schedule IDs.
///
/// Implemented for every [`Schedule`] and for tuples of up to 16 of them.
pub trait IntoScheduleIds {
    /// Returns the schedule IDs for this type.
    fn schedule_ids() -> Vec<ScheduleId>;
}

impl<S: Schedule> IntoScheduleIds for S {
    fn schedule_ids() -> Vec<ScheduleId> {
        vec![ScheduleId::of::<S>()]
    }
}

macro_rules! impl_into_schedule_ids_for_tuple {
    ($($S:ident),*) => {
        impl<$($S: Schedule),*> IntoScheduleIds for ($($S,)*) {
            fn schedule_ids() -> Vec<ScheduleId> {
                vec![$(ScheduleId::of::<$S>()),*]
            }
        }
    };
}

all_tuples!(impl_into_schedule_ids_for_tuple, 2, 16, S);

// ─────────────────────────────────────────────────────────────────────────────
// Run Schedules
// ─────────────────────────────────────────────────────────────────────────────

/// Marker type for hooks called once before the first round.
///
/// Event data: [`StreamEvent::RunStart`](super::events::StreamEvent::RunStart)
pub struct OnRunStart;
impl Schedule for OnRunStart {}

/// Marker type for hooks called once the sink has finished.
///
/// Event data: [`StreamEvent::RunComplete`](super::events::StreamEvent::RunComplete)
pub struct OnRunComplete;
impl Schedule for OnRunComplete {}

/// Marker type for hooks called when a run aborts with an error.
///
/// Event data: [`StreamEvent::RunFailure`](super::events::StreamEvent::RunFailure)
pub struct OnRunFailure;
impl Schedule for OnRunFailure {}

/// Marker type for hooks called after every round.
///
/// Event data: [`StreamEvent::RoundComplete`](super::events::StreamEvent::RoundComplete)
pub struct OnRoundComplete;
impl Schedule for OnRoundComplete {}

// ─────────────────────────────────────────────────────────────────────────────
// Node Schedules
// ─────────────────────────────────────────────────────────────────────────────

/// Marker type for hooks called when a node skips a tick because a
/// downstream slot still holds queued values.
///
/// Event data: [`StreamEvent::NodeBlocked`](super::events::StreamEvent::NodeBlocked)
pub struct OnNodeBlocked;
impl Schedule for OnNodeBlocked {}

/// Marker type for hooks called after a node's callable ran and its result
/// was propagated.
///
/// Event data: [`StreamEvent::NodeExecuted`](super::events::StreamEvent::NodeExecuted)
pub struct OnNodeExecuted;
impl Schedule for OnNodeExecuted {}

/// Marker type for hooks called when a node transitions to finished.
///
/// Fires once per node.
///
/// Event data: [`StreamEvent::NodeFinished`](super::events::StreamEvent::NodeFinished)
pub struct OnNodeFinished;
impl Schedule for OnNodeFinished {}
