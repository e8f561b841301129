//! Quadrature rules for finite element reference domains.
//!
//! Conventions for the reference domains:
//!
//! - segment: `[-1, 1]`
//! - triangle: the simplex with vertices `(0, 0)`, `(1, 0)`, `(0, 1)`
//! - quadrilateral: `[-1, 1]^2`
//! - hexahedron: `[-1, 1]^3`

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod simplex;
pub mod tensor;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(f, "There is no quadrature rule satisfying the requirements available")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional rule, given as weights and points.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

pub type Rule1d = Rule<1>;
pub type Rule2d = Rule<2>;
pub type Rule3d = Rule<3>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights.iter().zip(points).map(|(w, p)| w * f(p)).sum()
}
