use crate::assembly::local::{AssemblyContext, ElementAssembler, ElementContribution, LocalLayout};
use eyre::eyre;
use log::debug;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::csr::CsrRowMut;
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// The Jacobian and residual of a nonlinear system at a given iterate.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSystem {
    pub matrix: CsrMatrix<f64>,
    pub residual: DVector<f64>,
}

impl GlobalSystem {
    pub fn num_dofs(&self) -> usize {
        self.residual.len()
    }

    /// A dense copy of the matrix.
    pub fn dense_matrix(&self) -> DMatrix<f64> {
        DMatrix::from(&self.matrix)
    }
}

/// An assembler for CSR systems.
///
/// Element systems are computed in parallel, then added to the global system sequentially in
/// cell order, so repeated assembly of the same state gives bitwise identical results.
#[derive(Debug, Clone, Default)]
pub struct CsrAssembler {
    pattern: Option<SparsityPattern>,
}

impl CsrAssembler {
    /// Builds the sparsity pattern coupling all dofs that share a cell.
    pub fn assemble_pattern(num_dofs: usize, layouts: &[LocalLayout]) -> eyre::Result<SparsityPattern> {
        // Collecting into a BTreeSet stores each entry exactly once, already sorted by row
        let mut matrix_entries = BTreeSet::new();
        for layout in layouts {
            for &i in layout.global_dofs() {
                for &j in layout.global_dofs() {
                    matrix_entries.insert((i, j));
                }
            }
        }

        let mut offsets = Vec::with_capacity(num_dofs + 1);
        let mut column_indices = Vec::with_capacity(matrix_entries.len());
        offsets.push(0);
        for (i, j) in matrix_entries {
            if i >= num_dofs {
                return Err(eyre!("Dof {} out of bounds for a system of {} dofs", i, num_dofs));
            }
            while i + 1 > offsets.len() {
                // Also handles consecutive empty rows
                offsets.push(column_indices.len());
            }
            column_indices.push(j);
        }
        while offsets.len() < num_dofs + 1 {
            offsets.push(column_indices.len());
        }

        SparsityPattern::try_from_offsets_and_indices(num_dofs, num_dofs, offsets, column_indices)
            .map_err(|err| eyre!("Invalid sparsity pattern: {}", err))
    }

    /// Assembles the system of every cell of the context's mesh.
    ///
    /// The sparsity pattern is computed on first use and reused afterwards, so an assembler
    /// must only be used with layouts of the same dof numbering.
    pub fn assemble<A>(
        &mut self,
        element_assembler: &A,
        context: &AssemblyContext,
        layouts: &[LocalLayout],
        num_dofs: usize,
    ) -> eyre::Result<GlobalSystem>
    where
        A: ElementAssembler + ?Sized,
    {
        if layouts.len() != context.mesh.num_cells() {
            return Err(eyre!(
                "Expected one local layout per cell ({}), got {}",
                context.mesh.num_cells(),
                layouts.len()
            ));
        }

        let pattern = match &self.pattern {
            Some(pattern) if pattern.major_dim() == num_dofs => pattern.clone(),
            _ => {
                let pattern = Self::assemble_pattern(num_dofs, layouts)?;
                self.pattern = Some(pattern.clone());
                pattern
            }
        };

        let contributions = layouts
            .par_iter()
            .enumerate()
            .map(|(cell, layout)| element_assembler.assemble_element(context, layout, cell))
            .collect::<eyre::Result<Vec<ElementContribution>>>()?;

        let nnz = pattern.nnz();
        let mut matrix = CsrMatrix::try_from_pattern_and_values(pattern, vec![0.0; nnz])
            .map_err(|err| eyre!("Failed to create CSR matrix: {}", err))?;
        let mut residual = DVector::zeros(num_dofs);

        let mut permutation = Vec::new();
        for (layout, contribution) in layouts.iter().zip(&contributions) {
            let dofs = layout.global_dofs();
            if contribution.residual.len() != dofs.len()
                || contribution.jacobian.shape() != (dofs.len(), dofs.len())
            {
                return Err(eyre!("Element contribution does not match its local layout"));
            }

            permutation.clear();
            permutation.extend(0..dofs.len());
            permutation.sort_unstable_by_key(|&i| dofs[i]);

            for (local_row, &global_row) in dofs.iter().enumerate() {
                residual[global_row] += contribution.residual[local_row];
                let mut csr_row = matrix.row_mut(global_row);
                add_element_row_to_csr_row(&mut csr_row, dofs, &permutation, &contribution.jacobian, local_row)?;
            }
        }

        debug!(
            "Assembled {} cells into a system with {} dofs and {} nonzeros",
            layouts.len(),
            num_dofs,
            nnz
        );

        Ok(GlobalSystem { matrix, residual })
    }
}

/// Zeroes the rows and columns of the given dofs and puts a representative scale on the
/// diagonal, so that the corresponding increments vanish.
pub fn apply_homogeneous_dirichlet_bc_csr(matrix: &mut CsrMatrix<f64>, dofs: &[usize]) {
    // The first nonzero diagonal entry serves as a representative scale
    let scale = (0..matrix.nrows())
        .map(|i| diagonal_entry(matrix, i))
        .find(|&x| x != 0.0)
        .map(f64::abs)
        .unwrap_or(1.0);

    let mut dirichlet_membership = vec![false; matrix.nrows()];
    for &dof in dofs {
        dirichlet_membership[dof] = true;
    }

    // Zero every entry in a Dirichlet row or column. All rows are visited since the pattern
    // need not be symmetric
    for row_index in 0..matrix.nrows() {
        let row_is_dirichlet = dirichlet_membership[row_index];
        let mut row = matrix.row_mut(row_index);
        let (cols, values) = row.cols_and_values_mut();
        for (&col_index, value) in cols.iter().zip(values) {
            if row_is_dirichlet && col_index == row_index {
                *value = scale;
            } else if row_is_dirichlet || dirichlet_membership[col_index] {
                *value = 0.0;
            }
        }
    }
}

pub fn apply_homogeneous_dirichlet_bc_rhs(rhs: &mut DVector<f64>, dofs: &[usize]) {
    for &dof in dofs {
        rhs[dof] = 0.0;
    }
}

fn diagonal_entry(matrix: &CsrMatrix<f64>, i: usize) -> f64 {
    let row = matrix.row(i);
    row.col_indices()
        .iter()
        .position(|&j| j == i)
        .map(|k| row.values()[k])
        .unwrap_or(0.0)
}

/// Adds a row of a local element matrix to the corresponding row of a CSR matrix.
///
/// `sorted_permutation` lists the local dofs ordered such that their global indices are
/// sorted, which allows a single forward pass over the CSR row.
fn add_element_row_to_csr_row(
    row: &mut CsrRowMut<f64>,
    global_dofs: &[usize],
    sorted_permutation: &[usize],
    local_matrix: &DMatrix<f64>,
    local_row: usize,
) -> eyre::Result<()> {
    let (column_indices, values) = row.cols_and_values_mut();
    let mut csr_col_iter = column_indices.iter().copied().enumerate();

    let mut previous = None;
    let mut previous_position = 0;
    for &local_col in sorted_permutation {
        let global_col = global_dofs[local_col];
        // A global dof may appear more than once in a layout
        let position = if previous == Some(global_col) {
            previous_position
        } else {
            let (position, _) = csr_col_iter
                .find(|&(_, col)| col == global_col)
                .ok_or_else(|| eyre!("Column {} is missing from the sparsity pattern", global_col))?;
            position
        };
        values[position] += local_matrix[(local_row, local_col)];
        previous = Some(global_col);
        previous_position = position;
    }
    Ok(())
}
