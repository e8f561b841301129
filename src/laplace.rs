//! The Poisson problem `-Δu = f` with homogeneous Dirichlet data.
//!
//! Cells of any reference dimension embedded in 3D are supported. With the Jacobian `J` of the
//! reference map, physical gradients are `J (JᵀJ)⁻¹ ∇̂φ` and the measure is
//! `w sqrt(det JᵀJ)`, so lines, surfaces and volumes are treated alike.
use crate::assembly::{AssemblyContext, ElementAssembler, ElementContribution, LocalLayout};
use crate::element::ElementTables;
use crate::field::{BoundaryQuery, FieldId, FieldKind, FieldRegistry};
use crate::geometry::GeometryError;
use crate::mesh::Mesh;
use crate::solver::{solve_nonlinear, DenseLuSolver, NonlinearReport, NonlinearSettings};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaplaceSettings {
    /// Constant source term `f`.
    pub source: f64,
    /// Boundary faces on which `u = 0`.
    pub dirichlet_faces: Vec<i32>,
    pub nonlinear: NonlinearSettings,
}

impl Default for LaplaceSettings {
    fn default() -> Self {
        Self {
            source: 1.0,
            dirichlet_faces: vec![1],
            nonlinear: NonlinearSettings::default(),
        }
    }
}

/// Assembles `K u - f M 1` and the stiffness matrix `K`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaplaceAssembler {
    u: FieldId,
    source: f64,
}

impl LaplaceAssembler {
    pub fn new(u: FieldId, source: f64) -> Self {
        Self { u, source }
    }
}

impl ElementAssembler for LaplaceAssembler {
    fn unknowns(&self) -> Vec<FieldId> {
        vec![self.u]
    }

    fn assemble_element(
        &self,
        context: &AssemblyContext,
        layout: &LocalLayout,
        cell: usize,
    ) -> eyre::Result<ElementContribution> {
        let element = context.element(cell);
        let n = element.num_nodes();
        let r = element.kind().reference_dim();

        let mut x = DMatrix::zeros(3, n);
        for (mut column, v) in x.column_iter_mut().zip(context.mesh.cell_vertices(cell)) {
            column.copy_from(&v.coords);
        }
        let u_values = layout.gather(context.fields);
        let u = DVector::from_vec(u_values);

        let mut stiffness = DMatrix::zeros(n, n);
        let mut load = DVector::zeros(n);
        for (q, &weight) in element.weights().iter().enumerate() {
            let phi = element.basis(q);
            let phi_grad_ref = element.gradients(q);

            // Jacobian of the reference map and its metric
            let jacobian = &x * phi_grad_ref.transpose();
            let metric = jacobian.transpose() * &jacobian;
            let determinant = metric.determinant();
            let metric_inverse = metric
                .clone()
                .try_inverse()
                .filter(|_| determinant > 0.0)
                .ok_or(GeometryError::DegenerateMetric { determinant })?;
            debug_assert_eq!(metric_inverse.nrows(), r);

            let measure = weight * determinant.sqrt();
            stiffness += phi_grad_ref.transpose() * metric_inverse * phi_grad_ref * measure;
            load.axpy(self.source * measure, phi, 1.0);
        }

        let residual = &stiffness * u - load;
        Ok(ElementContribution {
            residual,
            jacobian: stiffness,
        })
    }
}

/// The solution of a Laplace problem together with the fields it lives in.
#[derive(Debug)]
pub struct LaplaceSolution {
    pub fields: FieldRegistry,
    pub u: FieldId,
    pub report: NonlinearReport,
}

impl LaplaceSolution {
    /// Nodal values of `u`.
    pub fn values(&self) -> &DVector<f64> {
        self.fields.field(self.u).values()
    }
}

pub fn solve_laplace(mesh: &Mesh, settings: &LaplaceSettings) -> eyre::Result<LaplaceSolution> {
    mesh.validate()?;
    let elements = ElementTables::new()?;
    let mut fields = FieldRegistry::new();
    let u = fields.register(mesh, "u", FieldKind::Nodal, 1)?;

    let faces = settings.dirichlet_faces.clone();
    fields.attach_boundary_condition(
        u,
        Box::new(move |query: &BoundaryQuery| faces.contains(&query.face).then_some(0.0)),
    );

    let assembler = LaplaceAssembler::new(u, settings.source);
    let report = solve_nonlinear(
        &assembler,
        DenseLuSolver,
        mesh,
        &elements,
        &mut fields,
        0.0,
        &settings.nonlinear,
    )?;
    Ok(LaplaceSolution { fields, u, report })
}
