//! Stream signals.
//!
//! Every slot, queue and result in the engine holds a [`Signal`]: either an
//! ordinary payload or one of three reserved markers that are never confused
//! with payloads.

use crate::value::Value;

/// A single item moving through the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Signal {
    /// Nothing available this tick.
    #[default]
    NoValue,
    /// Keep the previous value for this slot.
    Repeat,
    /// The stream is exhausted. Terminal.
    End,
    /// An ordinary payload.
    Value(Value),
}

impl Signal {
    /// Returns true if this carries a payload.
    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(self, Signal::Value(_))
    }

    /// Returns true for [`Signal::End`].
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Signal::End)
    }

    /// Returns true for [`Signal::NoValue`] and [`Signal::Repeat`].
    ///
    /// Placeholders are never pushed downstream.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Signal::NoValue | Signal::Repeat)
    }

    /// Returns the payload, if any.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Signal::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Consumes the signal and returns the payload, if any.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Signal::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for Signal {
    fn from(value: Value) -> Self {
        Signal::Value(value)
    }
}

macro_rules! impl_from_for_signal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Signal {
                fn from(value: $ty) -> Self {
                    Signal::Value(Value::from(value))
                }
            }
        )*
    };
}

impl_from_for_signal!(bool, i32, i64, u32, usize, f64, &str, String, Vec<Value>);
