//! Unified event enum for stream execution hooks.
//!
//! All hooks receive `&StreamEvent` and can match on variants for typed access.
//!
//! # Example
//!
//! ```ignore
//! use rivulet_stream::hooks::events::StreamEvent;
//!
//! fn handle_event(event: &StreamEvent) {
//!     match event {
//!         StreamEvent::NodeExecuted { label, value, .. } => {
//!             println!("{label} produced {value:?}");
//!         }
//!         StreamEvent::RunComplete { rounds, .. } => {
//!             println!("done after {rounds} rounds");
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use core::fmt;
use core::time::Duration;

use crate::node::NodeId;
use crate::signal::Signal;

/// Unified event enum for all stream execution hooks.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    // ─────────────────────────────────────────────────────────────────────────
    // Run-Level Events
    // ─────────────────────────────────────────────────────────────────────────
    /// Fired before the first round.
    RunStart {
        /// Number of nodes discovered from the sink.
        node_count: usize,
    },

    /// Fired once the sink has finished.
    RunComplete {
        /// Rounds driven.
        rounds: usize,
        /// Node ticks performed across all rounds.
        ticks: usize,
        /// Wall-clock duration of the run.
        duration: Duration,
    },

    /// Fired when the run aborts.
    RunFailure {
        /// The error message.
        error: String,
    },

    /// Fired after each round.
    RoundComplete {
        /// One-based round number.
        round: usize,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Node Events
    // ─────────────────────────────────────────────────────────────────────────
    /// A node skipped its tick because of backpressure.
    NodeBlocked {
        /// The node ID.
        node_id: NodeId,
        /// The node's label.
        label: String,
    },

    /// A node executed its callable.
    NodeExecuted {
        /// The node ID.
        node_id: NodeId,
        /// The node's label.
        label: String,
        /// The node's last value after execution.
        value: Signal,
    },

    /// A node transitioned to finished.
    NodeFinished {
        /// The node ID.
        node_id: NodeId,
        /// The node's label.
        label: String,
    },
}

impl StreamEvent {
    /// Returns the name of the schedule this event is fired on.
    #[must_use]
    pub fn schedule_name(&self) -> &'static str {
        match self {
            StreamEvent::RunStart { .. } => "OnRunStart",
            StreamEvent::RunComplete { .. } => "OnRunComplete",
            StreamEvent::RunFailure { .. } => "OnRunFailure",
            StreamEvent::RoundComplete { .. } => "OnRoundComplete",
            StreamEvent::NodeBlocked { .. } => "OnNodeBlocked",
            StreamEvent::NodeExecuted { .. } => "OnNodeExecuted",
            StreamEvent::NodeFinished { .. } => "OnNodeFinished",
        }
    }

    /// Returns the node this event concerns, if any.
    #[must_use]
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            StreamEvent::RunStart { .. }
            | StreamEvent::RunComplete { .. }
            | StreamEvent::RunFailure { .. }
            | StreamEvent::RoundComplete { .. } => None,
            StreamEvent::NodeBlocked { node_id, .. }
            | StreamEvent::NodeExecuted { node_id, .. }
            | StreamEvent::NodeFinished { node_id, .. } => Some(*node_id),
        }
    }
}

impl fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamEvent::RunStart { node_count } => {
                write!(f, "RunStart(nodes: {node_count})")
            }
            StreamEvent::RunComplete {
                rounds,
                ticks,
                duration,
            } => {
                write!(
                    f,
                    "RunComplete(rounds: {rounds}, ticks: {ticks}, duration: {duration:?})"
                )
            }
            StreamEvent::RunFailure { error } => write!(f, "RunFailure(error: {error})"),
            StreamEvent::RoundComplete { round } => write!(f, "RoundComplete({round})"),
            StreamEvent::NodeBlocked { node_id, label } => {
                write!(f, "NodeBlocked({label} @ {node_id})")
            }
            StreamEvent::NodeExecuted {
                node_id,
                label,
                value,
            } => {
                write!(f, "NodeExecuted({label} @ {node_id}, value: {value:?})")
            }
            StreamEvent::NodeFinished { node_id, label } => {
                write!(f, "NodeFinished({label} @ {node_id})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_events_carry_their_node() {
        let event = StreamEvent::NodeFinished {
            node_id: NodeId::new(2),
            label: "Sum#abcde".into(),
        };
        assert_eq!(event.node_id(), Some(NodeId::new(2)));
        assert_eq!(event.schedule_name(), "OnNodeFinished");
        assert_eq!(event.to_string(), "NodeFinished(Sum#abcde @ node_2)");
    }

    #[test]
    fn run_events_have_no_node() {
        let event = StreamEvent::RoundComplete { round: 4 };
        assert_eq!(event.node_id(), None);
        assert_eq!(event.to_string(), "RoundComplete(4)");
    }
}
