//! Finite element assembly for evolving surfaces.
//!
//! Every problem in this crate follows the same pattern: a per-cell residual is written once for
//! any [`Real`](autodiff::Real) scalar, recorded on a fresh tape per cell to obtain its exact
//! Jacobian, scattered into a global CSR system and driven to zero by Newton's method. The
//! problems are a Laplace solver, the curvature initializer, the P-Willmore flow and the
//! conformal reparametrization of surfaces.

pub mod assembly;
pub mod element;
pub mod field;
pub mod geometry;
pub mod laplace;
pub mod mesh;
pub mod simulation;
pub mod solver;
pub mod willmore;

pub use mesh::procedural;

pub mod autodiff {
    pub use surfem_autodiff::*;
}

pub mod quadrature {
    pub use surfem_quadrature::*;
}

pub mod optimize {
    pub use surfem_optimize::*;
}

pub mod mls {
    pub use surfem_mls::*;
}

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
