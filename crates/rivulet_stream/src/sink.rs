//! Output collection.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::callable::Callable;
use crate::value::Value;

/// Shared handle to the values received by a collector node.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    values: Arc<Mutex<Vec<Value>>>,
}

impl Collector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything collected so far, in arrival order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.values.lock().clone()
    }

    /// Number of values collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Returns true if nothing was collected yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    /// Drains the collected values.
    pub fn take(&self) -> Vec<Value> {
        core::mem::take(&mut *self.values.lock())
    }

    /// A unary callable that records its input and passes it through.
    #[must_use]
    pub fn callable(&self) -> Callable {
        let values = Arc::clone(&self.values);
        Callable::unary(move |value| {
            values.lock().push(value.clone());
            Ok(value.clone())
        })
    }
}
