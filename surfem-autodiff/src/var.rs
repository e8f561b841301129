use crate::tape::Tape;
use num::{One, Zero};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::ptr;

/// A scalar that is either a constant or a node recorded on a [`Tape`].
///
/// Constants carry no reference to a tape, which means they can be created anywhere
/// (e.g. through [`Zero::zero`]) and mixed freely with recorded variables.
#[derive(Clone, Copy)]
pub struct Var<'t> {
    value: f64,
    slot: Option<(&'t Tape, usize)>,
}

impl<'t> Var<'t> {
    pub fn constant(value: f64) -> Self {
        Self { value, slot: None }
    }

    pub(crate) fn recorded(tape: &'t Tape, index: usize, value: f64) -> Self {
        Self {
            value,
            slot: Some((tape, index)),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Whether the variable depends on an independent variable.
    pub fn is_recorded(&self) -> bool {
        self.slot.is_some()
    }

    pub(crate) fn index_on(&self, tape: &Tape) -> Option<usize> {
        self.slot
            .filter(|(owner, _)| ptr::eq(*owner, tape))
            .map(|(_, index)| index)
    }

    fn unary(self, value: f64, partial: f64) -> Self {
        match self.slot {
            Some((tape, index)) => Self::recorded(tape, tape.push_unary(index, partial), value),
            None => Self::constant(value),
        }
    }

    fn binary(a: Self, b: Self, value: f64, da: f64, db: f64) -> Self {
        match (a.slot, b.slot) {
            (Some((tape, ia)), Some((other, ib))) => {
                debug_assert!(ptr::eq(tape, other), "Variables must be recorded on the same tape");
                Self::recorded(tape, tape.push_binary(ia, da, ib, db), value)
            }
            (Some(_), None) => a.unary(value, da),
            (None, Some(_)) => b.unary(value, db),
            (None, None) => Self::constant(value),
        }
    }

    pub fn sqrt(self) -> Self {
        let value = self.value.sqrt();
        self.unary(value, 0.5 / value)
    }

    /// Raises the variable to a real power.
    ///
    /// A zero exponent yields the constant `1` without recording anything, so that
    /// `0^0` has a zero (instead of undefined) derivative.
    pub fn powf(self, exponent: f64) -> Self {
        if exponent == 0.0 {
            return Self::constant(1.0);
        }
        let value = self.value.powf(exponent);
        self.unary(value, exponent * self.value.powf(exponent - 1.0))
    }
}

impl<'t> fmt::Debug for Var<'t> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot {
            Some((_, index)) => write!(f, "Var({} @ {})", self.value, index),
            None => write!(f, "Var({})", self.value),
        }
    }
}

impl<'t> From<f64> for Var<'t> {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

// ---------------- Operators begin

impl<'t> Add for Var<'t> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::binary(self, rhs, self.value + rhs.value, 1.0, 1.0)
    }
}

impl<'t> Add<f64> for Var<'t> {
    type Output = Self;

    fn add(self, rhs: f64) -> Self {
        self.unary(self.value + rhs, 1.0)
    }
}

impl<'t> Add<Var<'t>> for f64 {
    type Output = Var<'t>;

    fn add(self, rhs: Var<'t>) -> Var<'t> {
        rhs + self
    }
}

impl<'t> Sub for Var<'t> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::binary(self, rhs, self.value - rhs.value, 1.0, -1.0)
    }
}

impl<'t> Sub<f64> for Var<'t> {
    type Output = Self;

    fn sub(self, rhs: f64) -> Self {
        self.unary(self.value - rhs, 1.0)
    }
}

impl<'t> Sub<Var<'t>> for f64 {
    type Output = Var<'t>;

    fn sub(self, rhs: Var<'t>) -> Var<'t> {
        rhs.unary(self - rhs.value, -1.0)
    }
}

impl<'t> Mul for Var<'t> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::binary(self, rhs, self.value * rhs.value, rhs.value, self.value)
    }
}

impl<'t> Mul<f64> for Var<'t> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.unary(self.value * rhs, rhs)
    }
}

impl<'t> Mul<Var<'t>> for f64 {
    type Output = Var<'t>;

    fn mul(self, rhs: Var<'t>) -> Var<'t> {
        rhs * self
    }
}

impl<'t> Div for Var<'t> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let inv = 1.0 / rhs.value;
        let value = self.value * inv;
        Self::binary(self, rhs, value, inv, -value * inv)
    }
}

impl<'t> Div<f64> for Var<'t> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        self.unary(self.value / rhs, 1.0 / rhs)
    }
}

impl<'t> Div<Var<'t>> for f64 {
    type Output = Var<'t>;

    fn div(self, rhs: Var<'t>) -> Var<'t> {
        let value = self / rhs.value;
        rhs.unary(value, -value / rhs.value)
    }
}

impl<'t> Neg for Var<'t> {
    type Output = Self;

    fn neg(self) -> Self {
        self.unary(-self.value, -1.0)
    }
}

impl<'t> AddAssign for Var<'t> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<'t> AddAssign<f64> for Var<'t> {
    fn add_assign(&mut self, rhs: f64) {
        *self = *self + rhs;
    }
}

impl<'t> SubAssign for Var<'t> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<'t> SubAssign<f64> for Var<'t> {
    fn sub_assign(&mut self, rhs: f64) {
        *self = *self - rhs;
    }
}

impl<'t> MulAssign for Var<'t> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<'t> MulAssign<f64> for Var<'t> {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl<'t> DivAssign<f64> for Var<'t> {
    fn div_assign(&mut self, rhs: f64) {
        *self = *self / rhs;
    }
}

impl<'t> Sum for Var<'t> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

// ---------------- Operators end

impl<'t> Zero for Var<'t> {
    fn zero() -> Self {
        Self::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.value == 0.0 && self.slot.is_none()
    }
}

impl<'t> One for Var<'t> {
    fn one() -> Self {
        Self::constant(1.0)
    }
}
