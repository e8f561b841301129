use crate::MlsError;
use rand::Rng;

/// The sample points of a single cell, each point given by its `dimension` coordinates.
pub type CellSamples = Vec<Vec<f64>>;

/// Decomposes a flat index into `dimension` indices in `0 .. n`, most significant first.
pub fn multi_index(index: usize, n: usize, dimension: usize) -> Vec<usize> {
    (0..dimension)
        .map(|d| {
            let outer = n.pow((dimension - d) as u32);
            let inner = n.pow((dimension - 1 - d) as u32);
            (index % outer) / inner
        })
        .collect()
}

/// The flat indices of the `2^dimension` corner nodes of the cell with the given multi-index.
///
/// Corner `j` takes the offset `0` or `1` along each axis from the binary digits of `j`, with the
/// first axis corresponding to the most significant digit.
pub fn cell_dofs(cell: &[usize], nodes_per_dim: usize) -> Vec<usize> {
    let dimension = cell.len();
    let num_corners = 1 << dimension;
    let mut dofs = vec![0; num_corners];
    let mut half = num_corners / 2;
    for (d, &idx) in cell.iter().enumerate() {
        let stride = nodes_per_dim.pow((dimension - 1 - d) as u32);
        for (j, dof) in dofs.iter_mut().enumerate() {
            let offset = (j % (2 * half)) / half;
            *dof += (idx + offset) * stride;
        }
        half /= 2;
    }
    dofs
}

/// A tensor-product grid with identical node coordinates along each axis.
///
/// Each 1D node coordinate carries a support size, which scales the local polynomial basis of the
/// nodes with that coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorGrid {
    nodes: Vec<f64>,
    supports: Vec<f64>,
    dimension: usize,
}

impl TensorGrid {
    pub fn new(nodes: Vec<f64>, supports: Vec<f64>, dimension: usize) -> Result<Self, MlsError> {
        if nodes.len() < 2 {
            return Err(MlsError::InvalidGrid(format!(
                "need at least 2 nodes per axis, got {}",
                nodes.len()
            )));
        }
        if supports.len() != nodes.len() {
            return Err(MlsError::InvalidGrid(format!(
                "{} supports given for {} nodes",
                supports.len(),
                nodes.len()
            )));
        }
        if dimension == 0 {
            return Err(MlsError::InvalidGrid("dimension must be positive".to_string()));
        }
        if nodes.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MlsError::InvalidGrid("node coordinates must be strictly increasing".to_string()));
        }
        if supports.iter().any(|&h| h <= 0.0) {
            return Err(MlsError::InvalidGrid("supports must be positive".to_string()));
        }
        Ok(Self {
            nodes,
            supports,
            dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn nodes_per_dim(&self) -> usize {
        self.nodes.len()
    }

    pub fn cells_per_dim(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes_per_dim().pow(self.dimension as u32)
    }

    pub fn num_cells(&self) -> usize {
        self.cells_per_dim().pow(self.dimension as u32)
    }

    pub fn node_multi_index(&self, node: usize) -> Vec<usize> {
        multi_index(node, self.nodes_per_dim(), self.dimension)
    }

    pub fn cell_multi_index(&self, cell: usize) -> Vec<usize> {
        multi_index(cell, self.cells_per_dim(), self.dimension)
    }

    pub fn cell_dofs(&self, cell: usize) -> Vec<usize> {
        cell_dofs(&self.cell_multi_index(cell), self.nodes_per_dim())
    }

    /// The coordinates of the given node.
    pub fn node_position(&self, node: usize) -> Vec<f64> {
        self.node_multi_index(node)
            .into_iter()
            .map(|i| self.nodes[i])
            .collect()
    }

    /// The support sizes of the given node along each axis.
    pub fn node_supports(&self, node: usize) -> Vec<f64> {
        self.node_multi_index(node)
            .into_iter()
            .map(|i| self.supports[i])
            .collect()
    }

    /// Extent of the 1D cell interval with the given index.
    pub fn cell_width(&self, cell_index_1d: usize) -> f64 {
        self.nodes[cell_index_1d + 1] - self.nodes[cell_index_1d]
    }

    /// Draws `count` uniformly distributed points in every cell.
    pub fn sample_cells<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<CellSamples> {
        (0..self.num_cells())
            .map(|cell| {
                let idx = self.cell_multi_index(cell);
                (0..count)
                    .map(|_| {
                        idx.iter()
                            .map(|&i| self.nodes[i] + self.cell_width(i) * rng.gen::<f64>())
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }
}
