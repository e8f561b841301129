//! Linear and nonlinear solution of assembled systems.
use crate::assembly::{
    apply_homogeneous_dirichlet_bc_csr, apply_homogeneous_dirichlet_bc_rhs, AssemblyContext, CsrAssembler, DofMap,
    ElementAssembler, GlobalSystem, LocalLayout,
};
use crate::element::ElementTables;
use crate::field::FieldRegistry;
use crate::mesh::Mesh;
use eyre::eyre;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut};
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use surfem_optimize::calculus::{DifferentiableVectorFunction, VectorFunction};
use surfem_optimize::newton::{newton, NewtonError, NewtonSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveError {
    SingularMatrix,
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::SingularMatrix => write!(f, "Linear system matrix is singular"),
        }
    }
}

impl Error for SolveError {}

pub trait LinearSolver {
    fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, SolveError>;
}

/// Dense LU factorization with partial pivoting, for small systems.
///
/// The sparse matrix is converted to a dense one on every solve, which takes O(n²) memory.
/// Meant for the small meshes of tests and demos.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseLuSolver;

impl LinearSolver for DenseLuSolver {
    fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, SolveError> {
        DMatrix::from(matrix)
            .lu()
            .solve(rhs)
            .filter(|solution| solution.iter().all(|x| x.is_finite()))
            .ok_or(SolveError::SingularMatrix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NonlinearSettings {
    pub max_iterations: usize,
    /// The solve has converged once the Euclidean norm of the residual falls below this value.
    pub tolerance: f64,
    /// Accept the last iterate when the iteration limit is reached, logging a warning.
    pub accept_unconverged: bool,
}

impl Default for NonlinearSettings {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            tolerance: 1e-10,
            accept_unconverged: false,
        }
    }
}

impl NonlinearSettings {
    /// A fixed number of Newton steps whose result is accepted whether or not it converged.
    pub fn fixed_steps(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            accept_unconverged: true,
        }
    }
}

/// Summary of a completed nonlinear solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonlinearReport {
    pub iterations: usize,
    pub residual_norm: f64,
    pub converged: bool,
}

/// The nonlinear system `F(x) = 0` of an element assembler, seen as a differentiable vector
/// function of all unknown dofs.
///
/// Evaluating the function writes the iterate into the field registry, assembles the global
/// system and keeps it for the subsequent Jacobian solve at the same iterate. Residual
/// entries of Dirichlet dofs are zero, since those dofs are fixed on the iterate.
pub struct NonlinearProblem<'a, A: ?Sized, S> {
    assembler: &'a A,
    solver: S,
    mesh: &'a Mesh,
    elements: &'a ElementTables,
    fields: &'a mut FieldRegistry,
    time: f64,
    dofs: DofMap,
    layouts: Vec<LocalLayout>,
    dirichlet_dofs: Vec<usize>,
    csr_assembler: CsrAssembler,
    current: Option<(DVector<f64>, GlobalSystem)>,
}

impl<'a, A, S> NonlinearProblem<'a, A, S>
where
    A: ElementAssembler + ?Sized,
    S: LinearSolver,
{
    pub fn new(
        assembler: &'a A,
        solver: S,
        mesh: &'a Mesh,
        elements: &'a ElementTables,
        fields: &'a mut FieldRegistry,
        time: f64,
    ) -> Self {
        let dofs = DofMap::new(fields, &assembler.unknowns());
        let layouts = dofs.local_layouts(mesh);
        let dirichlet_dofs = dofs
            .dirichlet_values(fields, mesh, time)
            .into_iter()
            .map(|(dof, _)| dof)
            .collect();
        Self {
            assembler,
            solver,
            mesh,
            elements,
            fields,
            time,
            dofs,
            layouts,
            dirichlet_dofs,
            csr_assembler: CsrAssembler::default(),
            current: None,
        }
    }

    pub fn dof_map(&self) -> &DofMap {
        &self.dofs
    }

    /// The current values of all unknowns, with prescribed values imposed on Dirichlet dofs.
    pub fn initial_iterate(&self) -> DVector<f64> {
        let mut x = self.dofs.gather(self.fields);
        for (dof, value) in self.dofs.dirichlet_values(self.fields, self.mesh, self.time) {
            x[dof] = value;
        }
        x
    }

    /// Assembles the system at `x`, reusing the last assembly if `x` has not changed.
    pub fn assemble_at(&mut self, x: &DVectorView<f64>) -> eyre::Result<&GlobalSystem> {
        let is_current = matches!(&self.current, Some((x_current, _)) if x_current == x);
        if !is_current {
            self.dofs.scatter(x, self.fields);
            let context = AssemblyContext {
                mesh: self.mesh,
                elements: self.elements,
                fields: &*self.fields,
                time: self.time,
            };
            let mut system =
                self.csr_assembler
                    .assemble(self.assembler, &context, &self.layouts, self.dofs.num_dofs())?;
            apply_homogeneous_dirichlet_bc_csr(&mut system.matrix, &self.dirichlet_dofs);
            apply_homogeneous_dirichlet_bc_rhs(&mut system.residual, &self.dirichlet_dofs);
            self.current = Some((x.clone_owned(), system));
        }
        match &self.current {
            Some((_, system)) => Ok(system),
            None => Err(eyre!("No system has been assembled")),
        }
    }

    /// Writes `x` into the fields without assembling.
    pub fn store(&mut self, x: &DVectorView<f64>) {
        self.dofs.scatter(x, self.fields);
    }
}

impl<'a, A, S> VectorFunction<f64> for NonlinearProblem<'a, A, S>
where
    A: ElementAssembler + ?Sized,
    S: LinearSolver,
{
    fn dimension(&self) -> usize {
        self.dofs.num_dofs()
    }

    fn eval_into(&mut self, f: &mut DVectorViewMut<f64>, x: &DVectorView<f64>) -> Result<(), Box<dyn Error>> {
        let system = self.assemble_at(x)?;
        f.copy_from(&system.residual);
        Ok(())
    }
}

impl<'a, A, S> DifferentiableVectorFunction<f64> for NonlinearProblem<'a, A, S>
where
    A: ElementAssembler + ?Sized,
    S: LinearSolver,
{
    fn solve_jacobian_system(
        &mut self,
        sol: &mut DVectorViewMut<f64>,
        x: &DVectorView<f64>,
        rhs: &DVectorView<f64>,
    ) -> Result<(), Box<dyn Error>> {
        self.assemble_at(x)?;
        let system = match &self.current {
            Some((_, system)) => system,
            None => return Err(Box::from("No system has been assembled")),
        };
        let solution = self.solver.solve(&system.matrix, &rhs.clone_owned())?;
        sol.copy_from(&solution);
        Ok(())
    }
}

/// Solves the nonlinear system of an element assembler with Newton's method, starting from and
/// writing back to the values stored in `fields`.
pub fn solve_nonlinear<A, S>(
    assembler: &A,
    solver: S,
    mesh: &Mesh,
    elements: &ElementTables,
    fields: &mut FieldRegistry,
    time: f64,
    settings: &NonlinearSettings,
) -> eyre::Result<NonlinearReport>
where
    A: ElementAssembler + ?Sized,
    S: LinearSolver,
{
    let mut problem = NonlinearProblem::new(assembler, solver, mesh, elements, fields, time);
    let n = problem.dof_map().num_dofs();
    let mut x = problem.initial_iterate();
    let mut f = DVector::zeros(n);
    let mut dx = DVector::zeros(n);

    let newton_settings = NewtonSettings {
        max_iterations: Some(settings.max_iterations),
        tolerance: settings.tolerance,
    };
    let result = newton(&mut problem, &mut x, &mut f, &mut dx, newton_settings);
    let residual_norm = f.norm();
    problem.store(&DVectorView::from(&x));

    match result {
        Ok(iterations) => {
            debug!(
                "Newton converged after {} iterations with residual norm {:e}",
                iterations, residual_norm
            );
            Ok(NonlinearReport {
                iterations,
                residual_norm,
                converged: true,
            })
        }
        Err(NewtonError::MaximumIterationsReached(iterations)) if settings.accept_unconverged => {
            warn!(
                "Accepting unconverged solution after {} iterations (residual norm {:e}, tolerance {:e})",
                iterations, residual_norm, settings.tolerance
            );
            Ok(NonlinearReport {
                iterations,
                residual_norm,
                converged: false,
            })
        }
        Err(err) => Err(eyre!("Nonlinear solve failed: {}", err)),
    }
}
