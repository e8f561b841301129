//! Reference elements with Lagrange bases of lowest order.
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use surfem_quadrature::{simplex, tensor, univariate, Rule};

/// The geometric kind of a mesh cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Segment on `[-1, 1]`.
    Segment2,
    /// Triangle with reference vertices `(0, 0)`, `(1, 0)`, `(0, 1)`.
    Tri3,
    /// Quadrilateral on `[-1, 1]^2`, vertices ordered counter-clockwise from `(-1, -1)`.
    Quad4,
    /// Hexahedron on `[-1, 1]^3`, the bottom face `z = -1` first, each face counter-clockwise.
    Hex8,
}

impl CellKind {
    pub fn num_vertices(&self) -> usize {
        match self {
            CellKind::Segment2 => 2,
            CellKind::Tri3 => 3,
            CellKind::Quad4 => 4,
            CellKind::Hex8 => 8,
        }
    }

    /// The dimension of the reference domain.
    pub fn reference_dim(&self) -> usize {
        match self {
            CellKind::Segment2 => 1,
            CellKind::Tri3 | CellKind::Quad4 => 2,
            CellKind::Hex8 => 3,
        }
    }

    /// Evaluates each basis function at the given reference coordinates.
    ///
    /// # Panics
    ///
    /// Panics if `basis` does not have one entry per vertex, or if `xi` has fewer entries than
    /// the reference dimension.
    #[rustfmt::skip]
    pub fn populate_basis(&self, basis: &mut [f64], xi: &[f64]) {
        assert_eq!(basis.len(), self.num_vertices());
        assert!(xi.len() >= self.reference_dim());
        match self {
            CellKind::Segment2 => {
                basis[0] = 0.5 * (1.0 - xi[0]);
                basis[1] = 0.5 * (1.0 + xi[0]);
            }
            CellKind::Tri3 => {
                basis[0] = 1.0 - xi[0] - xi[1];
                basis[1] = xi[0];
                basis[2] = xi[1];
            }
            CellKind::Quad4 => {
                for (phi, [a, b]) in basis.iter_mut().zip(QUAD_VERTICES) {
                    *phi = (1.0 + a * xi[0]) * (1.0 + b * xi[1]) / 4.0;
                }
            }
            CellKind::Hex8 => {
                for (phi, [a, b, c]) in basis.iter_mut().zip(HEX_VERTICES) {
                    *phi = (1.0 + a * xi[0]) * (1.0 + b * xi[1]) * (1.0 + c * xi[2]) / 8.0;
                }
            }
        }
    }

    /// Evaluates the reference gradients of each basis function.
    ///
    /// Column `i` of the `r x n` matrix holds the gradient of basis function `i`.
    #[rustfmt::skip]
    pub fn populate_basis_gradients(&self, gradients: &mut DMatrix<f64>, xi: &[f64]) {
        assert_eq!(gradients.nrows(), self.reference_dim());
        assert_eq!(gradients.ncols(), self.num_vertices());
        match self {
            CellKind::Segment2 => {
                gradients[(0, 0)] = -0.5;
                gradients[(0, 1)] = 0.5;
            }
            CellKind::Tri3 => {
                gradients.copy_from_slice(&[
                    -1.0, -1.0,
                    1.0, 0.0,
                    0.0, 1.0,
                ]);
            }
            CellKind::Quad4 => {
                for (i, [a, b]) in QUAD_VERTICES.into_iter().enumerate() {
                    gradients[(0, i)] = a * (1.0 + b * xi[1]) / 4.0;
                    gradients[(1, i)] = b * (1.0 + a * xi[0]) / 4.0;
                }
            }
            CellKind::Hex8 => {
                for (i, [a, b, c]) in HEX_VERTICES.into_iter().enumerate() {
                    gradients[(0, i)] = a * (1.0 + b * xi[1]) * (1.0 + c * xi[2]) / 8.0;
                    gradients[(1, i)] = b * (1.0 + a * xi[0]) * (1.0 + c * xi[2]) / 8.0;
                    gradients[(2, i)] = c * (1.0 + a * xi[0]) * (1.0 + b * xi[1]) / 8.0;
                }
            }
        }
    }

    /// The reference coordinates of the vertices.
    pub fn reference_vertices(&self) -> Vec<Vec<f64>> {
        match self {
            CellKind::Segment2 => vec![vec![-1.0], vec![1.0]],
            CellKind::Tri3 => vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
            CellKind::Quad4 => QUAD_VERTICES.iter().map(|v| v.to_vec()).collect(),
            CellKind::Hex8 => HEX_VERTICES.iter().map(|v| v.to_vec()).collect(),
        }
    }

    /// The default quadrature rule, flattened to weights and points.
    ///
    /// 2-point Gauss for segments, the 3-point rule of strength 2 for triangles,
    /// and tensor Gauss rules with 2 points per axis for quadrilaterals and hexahedra.
    pub fn default_quadrature(&self) -> Result<(Vec<f64>, Vec<Vec<f64>>), surfem_quadrature::Error> {
        Ok(match self {
            CellKind::Segment2 => flatten_rule(univariate::gauss(2)),
            CellKind::Tri3 => flatten_rule(simplex::triangle(2)?),
            CellKind::Quad4 => flatten_rule(tensor::quadrilateral_gauss(2)),
            CellKind::Hex8 => flatten_rule(tensor::hexahedron_gauss(2)),
        })
    }
}

const QUAD_VERTICES: [[f64; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

#[rustfmt::skip]
const HEX_VERTICES: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0],
];

fn flatten_rule<const D: usize>((weights, points): Rule<D>) -> (Vec<f64>, Vec<Vec<f64>>) {
    (weights, points.into_iter().map(|p| p.to_vec()).collect())
}

/// Basis values and reference gradients tabulated at the points of a quadrature rule.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedElement {
    kind: CellKind,
    weights: Vec<f64>,
    points: Vec<Vec<f64>>,
    basis: Vec<DVector<f64>>,
    gradients: Vec<DMatrix<f64>>,
}

impl TabulatedElement {
    /// Tabulates the basis of `kind` at the given quadrature points.
    ///
    /// # Panics
    ///
    /// Panics if the number of weights and points differ.
    pub fn from_rule(kind: CellKind, weights: Vec<f64>, points: Vec<Vec<f64>>) -> Self {
        assert_eq!(weights.len(), points.len(), "Weights and points must have the same length");
        let n = kind.num_vertices();
        let r = kind.reference_dim();
        let mut basis = Vec::with_capacity(points.len());
        let mut gradients = Vec::with_capacity(points.len());
        for xi in &points {
            let mut phi = DVector::zeros(n);
            kind.populate_basis(phi.as_mut_slice(), xi);
            let mut grad = DMatrix::zeros(r, n);
            kind.populate_basis_gradients(&mut grad, xi);
            basis.push(phi);
            gradients.push(grad);
        }
        Self {
            kind,
            weights,
            points,
            basis,
            gradients,
        }
    }

    pub fn with_default_quadrature(kind: CellKind) -> Result<Self, surfem_quadrature::Error> {
        let (weights, points) = kind.default_quadrature()?;
        Ok(Self::from_rule(kind, weights, points))
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn num_nodes(&self) -> usize {
        self.kind.num_vertices()
    }

    pub fn num_quadrature_points(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    /// Basis values at quadrature point `q`.
    pub fn basis(&self, q: usize) -> &DVector<f64> {
        &self.basis[q]
    }

    /// Reference gradients at quadrature point `q`, one column per basis function.
    pub fn gradients(&self, q: usize) -> &DMatrix<f64> {
        &self.gradients[q]
    }
}

/// Tabulated elements for every cell kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTables {
    segment: TabulatedElement,
    triangle: TabulatedElement,
    quadrilateral: TabulatedElement,
    hexahedron: TabulatedElement,
}

impl ElementTables {
    /// Tabulates every cell kind with its default quadrature.
    pub fn new() -> Result<Self, surfem_quadrature::Error> {
        Ok(Self {
            segment: TabulatedElement::with_default_quadrature(CellKind::Segment2)?,
            triangle: TabulatedElement::with_default_quadrature(CellKind::Tri3)?,
            quadrilateral: TabulatedElement::with_default_quadrature(CellKind::Quad4)?,
            hexahedron: TabulatedElement::with_default_quadrature(CellKind::Hex8)?,
        })
    }

    /// Replaces the table of the element's kind.
    pub fn with_element(mut self, element: TabulatedElement) -> Self {
        match element.kind() {
            CellKind::Segment2 => self.segment = element,
            CellKind::Tri3 => self.triangle = element,
            CellKind::Quad4 => self.quadrilateral = element,
            CellKind::Hex8 => self.hexahedron = element,
        }
        self
    }

    pub fn get(&self, kind: CellKind) -> &TabulatedElement {
        match kind {
            CellKind::Segment2 => &self.segment,
            CellKind::Tri3 => &self.triangle,
            CellKind::Quad4 => &self.quadrilateral,
            CellKind::Hex8 => &self.hexahedron,
        }
    }
}
