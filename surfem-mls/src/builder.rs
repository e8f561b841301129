use crate::chebyshev::{chebyshev, chebyshev_into};
use crate::elimination::gaussian_elimination;
use crate::grid::{CellSamples, TensorGrid};
use crate::index_set::compute_index_set;
use crate::MlsError;
use log::{debug, info};
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlsSettings {
    /// Node coordinates along every axis.
    pub nodes: Vec<f64>,
    /// Support size of the basis attached to each node coordinate.
    pub supports: Vec<f64>,
    pub degree: usize,
    pub dimension: usize,
    /// Samples per cell in addition to the size of the polynomial space.
    pub extra_samples_per_cell: usize,
}

impl Default for MlsSettings {
    fn default() -> Self {
        Self {
            nodes: vec![0.0, 0.1, 0.5, 1.0, 1.3],
            supports: vec![0.1, 0.4, 0.5, 0.5, 0.3],
            degree: 3,
            dimension: 2,
            extra_samples_per_cell: 5,
        }
    }
}

impl MlsSettings {
    pub fn grid(&self) -> Result<TensorGrid, MlsError> {
        TensorGrid::new(self.nodes.clone(), self.supports.clone(), self.dimension)
    }

    pub fn samples_per_cell(&self) -> usize {
        compute_index_set(self.degree, self.dimension).len() + self.extra_samples_per_cell
    }

    /// Samples the grid cells with the given RNG and builds the interpolant from the samples.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(MovingLeastSquares, Vec<CellSamples>), MlsError> {
        let grid = self.grid()?;
        let samples = grid.sample_cells(self.samples_per_cell(), rng);
        let mls = MovingLeastSquares::build(grid, self.degree, &samples)?;
        Ok((mls, samples))
    }
}

/// Moving-least-squares basis with one polynomial correction per grid node.
///
/// The shape function of node `i` evaluated at a sample point `x` in cell `e` is
/// `W_i(x) * alpha_i . T_i(x)`, where `W_i` is the tensor-product hat weight relative to the size
/// of `e`, and `T_i` holds the products of Chebyshev polynomials evaluated at the offset
/// `(X_i - x) / h_i` for every multi-index of the index set.
#[derive(Debug, Clone)]
pub struct MovingLeastSquares {
    grid: TensorGrid,
    degree: usize,
    index_set: Vec<Vec<usize>>,
    coefficients: Vec<DVector<f64>>,
}

impl MovingLeastSquares {
    /// Assembles and solves the normal equations of every node from the samples of each cell.
    pub fn build(grid: TensorGrid, degree: usize, samples: &[CellSamples]) -> Result<Self, MlsError> {
        if samples.len() != grid.num_cells() {
            return Err(MlsError::SampleMismatch {
                expected: grid.num_cells(),
                actual: samples.len(),
            });
        }

        let index_set = compute_index_set(degree, grid.dimension());
        let m = index_set.len();
        info!(
            "Building MLS basis of degree {} on {} nodes ({} basis functions per node)",
            degree,
            grid.num_nodes(),
            m
        );

        let mut mls = Self {
            grid,
            degree,
            index_set,
            coefficients: Vec::new(),
        };

        // The right-hand side evaluates the local basis at the node itself
        let t_origin = chebyshev(degree, 0.0);
        let rhs: Vec<f64> = mls
            .index_set
            .iter()
            .map(|a| a.iter().map(|&a_d| t_origin[a_d]).product())
            .collect();

        let mut moments: Vec<DMatrix<f64>> = (0..mls.grid.num_nodes())
            .map(|_| {
                let mut moment = DMatrix::zeros(m, m + 1);
                for (k, &rhs_k) in rhs.iter().enumerate() {
                    moment[(k, m)] = rhs_k;
                }
                moment
            })
            .collect();

        let mut basis = DVector::zeros(m);
        for (cell, cell_samples) in samples.iter().enumerate() {
            let cell_idx = mls.grid.cell_multi_index(cell);
            for node in mls.grid.cell_dofs(cell) {
                let moment = &mut moments[node];
                for point in cell_samples {
                    let weight = mls.evaluate_local_basis(node, &cell_idx, point, &mut basis);
                    for k in 0..m {
                        for l in 0..m {
                            moment[(k, l)] += weight * basis[k] * basis[l];
                        }
                    }
                }
            }
        }

        mls.coefficients = moments
            .into_iter()
            .enumerate()
            .map(|(node, moment)| gaussian_elimination(moment).map_err(|_| MlsError::SingularSystem { node }))
            .collect::<Result<_, _>>()?;
        debug!("Solved {} MLS moment systems", mls.coefficients.len());

        Ok(mls)
    }

    pub fn grid(&self) -> &TensorGrid {
        &self.grid
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn index_set(&self) -> &[Vec<usize>] {
        &self.index_set
    }

    /// The solved basis coefficients of the given node.
    pub fn coefficients(&self, node: usize) -> &DVector<f64> {
        &self.coefficients[node]
    }

    /// Evaluates the shape function of `node` at a point sampled in `cell`.
    pub fn shape_value(&self, node: usize, cell: usize, point: &[f64]) -> f64 {
        let cell_idx = self.grid.cell_multi_index(cell);
        let mut basis = DVector::zeros(self.index_set.len());
        let weight = self.evaluate_local_basis(node, &cell_idx, point, &mut basis);
        weight * self.coefficients[node].dot(&basis)
    }

    /// Projects the sampled function values onto the grid nodes.
    ///
    /// For any polynomial `f` of total degree at most the basis degree, the result holds the
    /// exact nodal values of `f`.
    pub fn reconstruct<F>(&self, samples: &[CellSamples], f: F) -> DVector<f64>
    where
        F: Fn(&[f64]) -> f64,
    {
        let mut nodal_values = DVector::zeros(self.grid.num_nodes());
        let mut basis = DVector::zeros(self.index_set.len());
        for (cell, cell_samples) in samples.iter().enumerate() {
            let cell_idx = self.grid.cell_multi_index(cell);
            for node in self.grid.cell_dofs(cell) {
                for point in cell_samples {
                    let weight = self.evaluate_local_basis(node, &cell_idx, point, &mut basis);
                    nodal_values[node] += weight * self.coefficients[node].dot(&basis) * f(point);
                }
            }
        }
        nodal_values
    }

    /// Writes the local polynomial basis of `node` at `point` into `basis` and returns the
    /// kernel weight.
    fn evaluate_local_basis(&self, node: usize, cell_idx: &[usize], point: &[f64], basis: &mut DVector<f64>) -> f64 {
        let position = self.grid.node_position(node);
        let supports = self.grid.node_supports(node);

        let mut weight = 1.0;
        let mut chebyshev_per_dim = Vec::with_capacity(self.grid.dimension());
        for d in 0..self.grid.dimension() {
            let offset = position[d] - point[d];
            let mut t = Vec::with_capacity(self.degree + 1);
            chebyshev_into(&mut t, self.degree, offset / supports[d]);
            chebyshev_per_dim.push(t);
            weight *= 1.0 - offset.abs() / self.grid.cell_width(cell_idx[d]);
        }

        for (k, a) in self.index_set.iter().enumerate() {
            basis[k] = a
                .iter()
                .zip(&chebyshev_per_dim)
                .map(|(&a_d, t)| t[a_d])
                .product();
        }
        weight
    }
}
