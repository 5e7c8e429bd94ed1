//! Payload values carried along graph edges.
//!
//! Edges are dynamically typed: every node consumes and produces [`Value`]s,
//! and arithmetic between them is checked so that numeric domain errors can
//! be surfaced to the engine as a [`CallError`] instead of panicking.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CallError;

/// A payload value flowing through the graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absence of a payload. Distinct from [`Signal::NoValue`](crate::signal::Signal::NoValue),
    /// which means "nothing arrived", not "null arrived".
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A double precision float.
    Float(f64),
    /// A UTF-8 string.
    Str(String),
    /// An ordered list of values.
    List(Vec<Value>),
}

impl Value {
    /// The positive-infinity representative of the value set.
    ///
    /// Substituted by the engine when a callable divides by zero.
    #[must_use]
    pub fn infinity() -> Self {
        Value::Float(f64::INFINITY)
    }

    /// Returns a short name for the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
        }
    }

    /// Returns the value as an integer, if it is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value as a list slice, if it is one.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true for `Int` and `Float`.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Adds two values. Strings and lists concatenate.
    ///
    /// Integer results that overflow `i64` are promoted to `Float`.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::TypeMismatch`] for unsupported operand types.
    pub fn checked_add(&self, rhs: &Value) -> Result<Value, CallError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(a
                .checked_add(*b)
                .map_or_else(|| Value::Float(*a as f64 + *b as f64), Value::Int)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                Ok(Value::List(a.iter().chain(b).cloned().collect()))
            }
            _ => self.float_op("add", rhs, |a, b| a + b),
        }
    }

    /// Subtracts `rhs` from `self`, promoting overflowing integers to `Float`.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::TypeMismatch`] for non-numeric operands.
    pub fn checked_sub(&self, rhs: &Value) -> Result<Value, CallError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(a
                .checked_sub(*b)
                .map_or_else(|| Value::Float(*a as f64 - *b as f64), Value::Int)),
            _ => self.float_op("sub", rhs, |a, b| a - b),
        }
    }

    /// Multiplies two values, promoting overflowing integers to `Float`.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::TypeMismatch`] for non-numeric operands.
    pub fn checked_mul(&self, rhs: &Value) -> Result<Value, CallError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(a
                .checked_mul(*b)
                .map_or_else(|| Value::Float(*a as f64 * *b as f64), Value::Int)),
            _ => self.float_op("mul", rhs, |a, b| a * b),
        }
    }

    /// True division. The result is always a `Float`.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::DivisionByZero`] when `rhs` is zero and
    /// [`CallError::TypeMismatch`] for non-numeric operands.
    pub fn checked_div(&self, rhs: &Value) -> Result<Value, CallError> {
        let (a, b) = self.numeric_pair("div", rhs)?;
        if b == 0.0 {
            return Err(CallError::DivisionByZero);
        }
        Ok(Value::Float(a / b))
    }

    /// Remainder, following the sign of the divisor.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::DivisionByZero`] when `rhs` is zero and
    /// [`CallError::TypeMismatch`] for non-numeric operands.
    pub fn checked_rem(&self, rhs: &Value) -> Result<Value, CallError> {
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(CallError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(floored_rem(*a, *b))),
            _ => {
                let (a, b) = self.numeric_pair("rem", rhs)?;
                if b == 0.0 {
                    return Err(CallError::DivisionByZero);
                }
                Ok(Value::Float(a - b * (a / b).floor()))
            }
        }
    }

    fn numeric_pair(&self, op: &'static str, rhs: &Value) -> Result<(f64, f64), CallError> {
        match (self.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(CallError::TypeMismatch {
                op,
                left: self.type_name(),
                right: rhs.type_name(),
            }),
        }
    }

    fn float_op(
        &self,
        op: &'static str,
        rhs: &Value,
        f: impl FnOnce(f64, f64) -> f64,
    ) -> Result<Value, CallError> {
        let (a, b) = self.numeric_pair(op, rhs)?;
        Ok(Value::Float(f(a, b)))
    }
}

/// Integer remainder taking the sign of `b`. `b` must be non-zero.
fn floored_rem(a: i64, b: i64) -> i64 {
    // wrapping_rem yields 0 for i64::MIN % -1 instead of panicking.
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) { r + b } else { r }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => |v| Value::Bool(v),
    i32 => |v| Value::Int(i64::from(v)),
    i64 => |v| Value::Int(v),
    u32 => |v| Value::Int(i64::from(v)),
    usize => |v| i64::try_from(v).map_or(Value::Float(v as f64), Value::Int),
    f64 => |v| Value::Float(v),
    &str => |v| Value::Str(v.to_owned()),
    String => |v| Value::Str(v),
    Vec<Value> => |v| Value::List(v),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_arithmetic_stays_int() {
        let a = Value::Int(7);
        let b = Value::Int(3);
        assert_eq!(a.checked_add(&b).unwrap(), Value::Int(10));
        assert_eq!(a.checked_sub(&b).unwrap(), Value::Int(4));
        assert_eq!(a.checked_mul(&b).unwrap(), Value::Int(21));
        assert_eq!(a.checked_rem(&b).unwrap(), Value::Int(1));
    }

    #[test]
    fn remainder_follows_divisor_sign() {
        let rem = |a: i64, b: i64| Value::Int(a).checked_rem(&Value::Int(b)).unwrap();
        assert_eq!(rem(7, -3), Value::Int(-2));
        assert_eq!(rem(-7, 3), Value::Int(2));
        assert_eq!(rem(-7, -3), Value::Int(-1));
        assert_eq!(rem(6, -3), Value::Int(0));
        assert_eq!(rem(i64::MIN, -1), Value::Int(0));

        let r = Value::Float(7.0).checked_rem(&Value::Int(-3)).unwrap();
        assert_eq!(r, Value::Float(-2.0));
    }

    #[test]
    fn int_overflow_promotes_to_float() {
        let max = Value::Int(i64::MAX);
        let min = Value::Int(i64::MIN);

        assert_eq!(
            max.checked_add(&Value::Int(1)).unwrap(),
            Value::Float(i64::MAX as f64 + 1.0)
        );
        assert_eq!(
            min.checked_sub(&Value::Int(1)).unwrap(),
            Value::Float(i64::MIN as f64 - 1.0)
        );
        assert_eq!(
            max.checked_mul(&Value::Int(2)).unwrap(),
            Value::Float(i64::MAX as f64 * 2.0)
        );
        assert_eq!(
            max.checked_add(&Value::Int(-1)).unwrap(),
            Value::Int(i64::MAX - 1)
        );
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn large_usize_becomes_float() {
        assert_eq!(Value::from(5usize), Value::Int(5));
        assert_eq!(Value::from(usize::MAX), Value::Float(usize::MAX as f64));
    }

    #[test]
    fn mixed_arithmetic_promotes_to_float() {
        let sum = Value::Int(1).checked_add(&Value::Float(0.5)).unwrap();
        assert_eq!(sum, Value::Float(1.5));
    }

    #[test]
    fn division_is_true_division() {
        let q = Value::Int(1).checked_div(&Value::Int(2)).unwrap();
        assert_eq!(q, Value::Float(0.5));
    }

    #[test]
    fn division_by_zero_is_reported() {
        let err = Value::Int(1).checked_div(&Value::Int(0)).unwrap_err();
        assert!(matches!(err, CallError::DivisionByZero));

        let err = Value::Int(1).checked_rem(&Value::Int(0)).unwrap_err();
        assert!(matches!(err, CallError::DivisionByZero));
    }

    #[test]
    fn type_mismatch_names_operands() {
        let err = Value::Str("a".into()).checked_mul(&Value::Int(2)).unwrap_err();
        match err {
            CallError::TypeMismatch { op, left, right } => {
                assert_eq!(op, "mul");
                assert_eq!(left, "str");
                assert_eq!(right, "int");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strings_and_lists_concatenate() {
        let s = Value::from("ab").checked_add(&Value::from("cd")).unwrap();
        assert_eq!(s, Value::from("abcd"));

        let l = Value::List(vec![1.into()])
            .checked_add(&Value::List(vec![2.into()]))
            .unwrap();
        assert_eq!(l, Value::List(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn display_renders_lists() {
        let v = Value::List(vec![Value::Int(1), Value::from("x"), Value::Bool(true)]);
        assert_eq!(v.to_string(), "[1, x, true]");
    }

    #[test]
    fn untagged_serde_round_trip() {
        let v = Value::List(vec![Value::Int(3), Value::Float(1.5), Value::Null]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "[3,1.5,null]");
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
