//! Moving-least-squares interpolation on tensor-product grids.
//!
//! Every grid node carries a small polynomial reproducing basis built from tensor-product
//! Chebyshev polynomials of bounded total degree. The basis coefficients of a node are found by
//! solving the normal equations assembled from the sample (material) points in the cells
//! adjacent to the node, which guarantees that polynomials up to the chosen degree are
//! reproduced exactly at the nodes.

use std::error::Error;
use std::fmt;

pub mod builder;
pub mod chebyshev;
pub mod elimination;
pub mod grid;
pub mod index_set;

pub use builder::{MlsSettings, MovingLeastSquares};
pub use grid::TensorGrid;

#[derive(Debug, Clone, PartialEq)]
pub enum MlsError {
    /// The normal equations of the given node have no unique solution.
    SingularSystem { node: usize },
    /// The grid description is inconsistent.
    InvalidGrid(String),
    /// The number of sampled cells does not match the grid.
    SampleMismatch { expected: usize, actual: usize },
}

impl fmt::Display for MlsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlsError::SingularSystem { node } => write!(f, "The moment matrix of node {} is singular", node),
            MlsError::InvalidGrid(reason) => write!(f, "Invalid grid: {}", reason),
            MlsError::SampleMismatch { expected, actual } => {
                write!(f, "Expected samples for {} cells, got {}", expected, actual)
            }
        }
    }
}

impl Error for MlsError {}
