//! Downstream edges.
//!
//! An edge is stored on the producer and points at one input slot of the
//! consumer. It carries a shared handle to that slot, so a producer can
//! deliver without touching the consumer node itself.

use core::fmt;
use std::sync::Arc;

use crate::node::{Backpressure, NodeId};
use crate::signal::Signal;
use crate::slot::{Delivery, InputSlot};

/// A producer-side connection to one consumer input slot.
pub struct Edge {
    to: NodeId,
    slot: usize,
    inbox: Arc<InputSlot>,
}

impl Edge {
    pub(crate) fn new(to: NodeId, slot: usize, inbox: Arc<InputSlot>) -> Self {
        Self { to, slot, inbox }
    }

    /// The consumer node.
    #[must_use]
    pub fn to(&self) -> NodeId {
        self.to
    }

    /// The consumer's input slot index.
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Returns true if the consumer's slot has queued signals.
    #[must_use]
    pub fn is_congested(&self) -> bool {
        self.inbox.has_pending()
    }

    /// Delivers a signal according to the producer's backpressure policy.
    pub(crate) fn deliver(&self, policy: Backpressure, signal: Signal) -> Delivery {
        match policy {
            Backpressure::Block => self.inbox.push(signal),
            Backpressure::Drop => self.inbox.offer_drop(signal),
            Backpressure::Replace => self.inbox.offer_replace(signal),
        }
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("to", &self.to)
            .field("slot", &self.slot)
            .field("pending", &self.inbox.pending())
            .finish()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-> {}[{}]", self.to, self.slot)
    }
}
