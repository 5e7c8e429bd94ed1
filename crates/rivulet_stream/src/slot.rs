//! Input slots.
//!
//! Each consumer input is an [`InputSlot`]: an unbounded FIFO of pending
//! signals plus the slot's active value. The producer appends and the
//! consumer claims; both sides go through the same per-slot lock, so no lock
//! is ever held across two slots.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::signal::Signal;
use crate::value::Value;

/// Result of trying to claim a value for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    /// The slot holds an active value.
    Ready,
    /// Nothing has arrived yet.
    Pending,
    /// The upstream stream ended.
    End,
}

/// How a producer delivers to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// Appended to the queue.
    Queued,
    /// Discarded.
    Dropped,
    /// Written over the active value.
    Replaced,
}

#[derive(Debug, Default)]
struct SlotState {
    queue: VecDeque<Signal>,
    active: Signal,
}

/// One input of a node.
#[derive(Debug, Default)]
pub struct InputSlot {
    state: Mutex<SlotState>,
}

impl InputSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued signals.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Returns true if at least one signal is queued.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.state.lock().queue.is_empty()
    }

    /// The current active value.
    #[must_use]
    pub fn active(&self) -> Signal {
        self.state.lock().active.clone()
    }

    /// Appends to the queue.
    ///
    /// An `End` behind an already queued `End` is discarded, so a finished
    /// producer re-emitting on every tick leaves at most one marker behind.
    pub(crate) fn push(&self, signal: Signal) -> Delivery {
        let mut state = self.state.lock();
        if signal.is_end() && state.queue.back().is_some_and(Signal::is_end) {
            return Delivery::Dropped;
        }
        state.queue.push_back(signal);
        Delivery::Queued
    }

    /// Appends only if nothing is queued and no value is active.
    pub(crate) fn offer_drop(&self, signal: Signal) -> Delivery {
        let mut state = self.state.lock();
        if !state.queue.is_empty() || !matches!(state.active, Signal::NoValue) {
            return Delivery::Dropped;
        }
        state.queue.push_back(signal);
        Delivery::Queued
    }

    /// Keeps the slot's live state as recent as possible.
    ///
    /// A queued value is discarded together with the new one; an active
    /// value is overwritten in place; otherwise the value is queued.
    pub(crate) fn offer_replace(&self, signal: Signal) -> Delivery {
        let mut state = self.state.lock();
        if state.queue.pop_front().is_some() {
            return Delivery::Dropped;
        }
        if !matches!(state.active, Signal::NoValue) {
            state.active = signal;
            return Delivery::Replaced;
        }
        state.queue.push_back(signal);
        Delivery::Queued
    }

    /// Claims the next queued value if the slot is not already active.
    ///
    /// `Repeat` markers are skipped and never become active.
    pub(crate) fn claim(&self) -> Claim {
        let mut state = self.state.lock();
        match state.active {
            Signal::Value(_) => return Claim::Ready,
            Signal::End => return Claim::End,
            Signal::NoValue | Signal::Repeat => {}
        }
        loop {
            match state.queue.pop_front() {
                None => {
                    state.active = Signal::NoValue;
                    return Claim::Pending;
                }
                Some(Signal::Repeat | Signal::NoValue) => continue,
                Some(Signal::End) => return Claim::End,
                Some(value @ Signal::Value(_)) => {
                    state.active = value;
                    return Claim::Ready;
                }
            }
        }
    }

    /// The active payload, if the slot is ready.
    pub(crate) fn active_value(&self) -> Option<Value> {
        self.state.lock().active.as_value().cloned()
    }

    /// Resets the active value for the next round.
    pub(crate) fn clear_active(&self) {
        self.state.lock().active = Signal::NoValue;
    }
}
