use crate::var::Var;
use num::{One, Zero};
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Scalar types that surface geometry and weak forms can be written against.
///
/// Implemented by `f64` for plain evaluation and by [`Var`] for recorded evaluation, so the
/// same kernel serves both diagnostics and Jacobian assembly.
pub trait Real:
    Copy
    + Debug
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign<f64>
{
    /// Lifts a plain value into a constant.
    fn from_f64(value: f64) -> Self;

    fn value(&self) -> f64;

    fn sqrt(self) -> Self;

    /// Raises to a real power, with `x^0 = 1` for every `x` (including zero).
    fn powf(self, exponent: f64) -> Self;
}

impl Real for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }

    fn value(&self) -> f64 {
        *self
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn powf(self, exponent: f64) -> Self {
        if exponent == 0.0 {
            1.0
        } else {
            f64::powf(self, exponent)
        }
    }
}

impl<'t> Real for Var<'t> {
    fn from_f64(value: f64) -> Self {
        Var::constant(value)
    }

    fn value(&self) -> f64 {
        Var::value(self)
    }

    fn sqrt(self) -> Self {
        Var::sqrt(self)
    }

    fn powf(self, exponent: f64) -> Self {
        Var::powf(self, exponent)
    }
}
