//! Weak forms of the P-Willmore flow of closed surfaces.
//!
//! The surface is the image of the mesh under `x = x̂ + Dx`, where `x̂` are the mesh vertices and
//! `Dx` a nodal displacement. Besides `Dx` the flow carries the curvature vector `Y ≈ Δx` and the
//! auxiliary field `W = ∂e/∂Y` of the energy density `e`. A conformal reparametrization keeps
//! the mesh quality in check between time steps.
use crate::assembly::AssemblyContext;
use crate::element::CellKind;
use crate::field::{FieldId, FieldKind, FieldRegistry};
use crate::geometry::{dot, interpolate, parametric_gradient, SurfaceGeometry};
use crate::mesh::Mesh;
use eyre::eyre;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

pub mod conformal;
pub mod curvature;
pub mod flow;
pub mod triangle;

pub use conformal::{ConformalKernel, ConformalSettings};
pub use curvature::CurvatureInitializer;
pub use flow::{FlowKernel, FlowScheme};
pub use triangle::TriangleHeuristic;

use surfem_autodiff::Real;

/// The energy density `e(Y) = Σ_p a_p |Y|^p`.
///
/// For odd exponents the term is multiplied by the sign of `Y·N`, so that the sign of the
/// density follows the orientation of the curvature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyDensity {
    pub exponents: [f64; 3],
    pub weights: [f64; 3],
}

impl Default for EnergyDensity {
    fn default() -> Self {
        Self {
            exponents: [2.0, 3.0, 4.0],
            weights: [1.0, 0.0, 0.0],
        }
    }
}

/// The sums over the terms of an [`EnergyDensity`] that enter the weak forms.
#[derive(Debug, Clone, Copy)]
pub struct PowerSums<T> {
    /// `Σ s_p a_p p |Y|^(p-2)`, so that `W = sum_p1 Y`.
    pub sum_p1: T,
    /// `Σ s_p a_p (1 - p) |Y|^p`.
    pub sum_p2: T,
    /// `Σ s_p a_p |Y|^p`, the energy density itself.
    pub sum_p3: T,
}

impl EnergyDensity {
    /// Evaluates the power sums for `y_dot_y = Y·Y`, with odd terms signed by `y_dot_n = Y·N`.
    ///
    /// Terms with zero weight are skipped.
    pub fn power_sums<T: Real>(&self, y_dot_y: T, y_dot_n: f64) -> PowerSums<T> {
        let sign_y_dot_n = if y_dot_n >= 0.0 { 1.0 } else { -1.0 };
        let mut sums = PowerSums {
            sum_p1: T::zero(),
            sum_p2: T::zero(),
            sum_p3: T::zero(),
        };
        for (&p, &a) in self.exponents.iter().zip(&self.weights) {
            if a == 0.0 {
                continue;
            }
            let sign = if p % 2.0 == 0.0 { 1.0 } else { sign_y_dot_n };
            let y_norm_p = y_dot_y.powf(p / 2.0);
            sums.sum_p1 += y_dot_y.powf((p - 2.0) / 2.0) * (sign * a * p);
            sums.sum_p2 += y_norm_p * (sign * a * (1.0 - p));
            sums.sum_p3 += y_norm_p * (sign * a);
        }
        sums
    }
}

/// The fields of a Willmore simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WillmoreFields {
    /// Displacement of the surface from the mesh vertices.
    pub dx: FieldId,
    /// Displacement after conformal reparametrization.
    pub ndx: FieldId,
    /// Curvature vector.
    pub y: FieldId,
    /// Auxiliary field `W = ∂e/∂Y`.
    pub w: FieldId,
    /// Per-cell multiplier keeping the reparametrization tangential.
    pub tangential_multiplier: FieldId,
    pub lambda_volume: Option<FieldId>,
    pub lambda_area: Option<FieldId>,
}

impl WillmoreFields {
    pub fn register(
        registry: &mut FieldRegistry,
        mesh: &Mesh,
        volume_constraint: bool,
        area_constraint: bool,
    ) -> eyre::Result<Self> {
        let lambda_volume = if volume_constraint {
            Some(registry.register(mesh, "LambdaVolume", FieldKind::Global, 1)?)
        } else {
            None
        };
        let lambda_area = if area_constraint {
            Some(registry.register(mesh, "LambdaArea", FieldKind::Global, 1)?)
        } else {
            None
        };
        Ok(Self {
            dx: registry.register(mesh, "Dx", FieldKind::Nodal, 3)?,
            ndx: registry.register(mesh, "nDx", FieldKind::Nodal, 3)?,
            y: registry.register(mesh, "Y", FieldKind::Nodal, 3)?,
            w: registry.register(mesh, "W", FieldKind::Nodal, 3)?,
            tangential_multiplier: registry.register(mesh, "L", FieldKind::Elementwise, 1)?,
            lambda_volume,
            lambda_area,
        })
    }

    pub fn all(&self) -> Vec<FieldId> {
        let mut ids = vec![self.dx, self.ndx, self.y, self.w, self.tangential_multiplier];
        ids.extend(self.lambda_volume);
        ids.extend(self.lambda_area);
        ids
    }
}

/// Checks that every cell of the mesh is a surface cell.
pub fn check_surface_mesh(mesh: &Mesh) -> eyre::Result<()> {
    mesh.validate()?;
    match mesh
        .cells()
        .iter()
        .position(|cell| !matches!(cell.kind(), CellKind::Tri3 | CellKind::Quad4))
    {
        Some(i) => Err(eyre!("Cell {} is not a surface cell", i)),
        None => Ok(()),
    }
}

/// Current or previous values of a 3-component nodal field on a cell.
pub(crate) fn cell_vectors(context: &AssemblyContext, field: FieldId, cell: usize, old: bool) -> Vec<[f64; 3]> {
    let field = context.fields.field(field);
    context.mesh.cells()[cell]
        .vertices()
        .iter()
        .map(|&v| if old { field.old_vector(v) } else { field.vector(v) })
        .collect()
}

/// Mesh vertices of a cell.
pub(crate) fn cell_reference_positions(mesh: &Mesh, cell: usize) -> Vec<[f64; 3]> {
    mesh.cell_vertices(cell)
        .map(|p: &Point3<f64>| [p.x, p.y, p.z])
        .collect()
}

/// `x̂ + d` per node.
pub(crate) fn displaced<T: Real>(reference: &[[f64; 3]], displacement: &[[T; 3]]) -> Vec<[T; 3]> {
    reference
        .iter()
        .zip(displacement)
        .map(|(x_hat, d)| [0, 1, 2].map(|k| d[k] + x_hat[k]))
        .collect()
}

/// Integral quantities of the surface `x̂ + Dx` that are monitored during the flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDiagnostics {
    pub surface: f64,
    /// Enclosed volume, positive for outward oriented cells.
    pub volume: f64,
    pub energy: f64,
}

impl SurfaceDiagnostics {
    pub fn ratios(&self, reference: &SurfaceDiagnostics) -> SurfaceDiagnostics {
        SurfaceDiagnostics {
            surface: self.surface / reference.surface,
            volume: self.volume / reference.volume,
            energy: self.energy / reference.energy,
        }
    }
}

/// Computes surface area, enclosed volume and energy with the default quadrature.
pub fn compute_diagnostics(
    context: &AssemblyContext,
    fields: &WillmoreFields,
    density: &EnergyDensity,
    normal_sign: f64,
) -> eyre::Result<SurfaceDiagnostics> {
    let mut diagnostics = SurfaceDiagnostics {
        surface: 0.0,
        volume: 0.0,
        energy: 0.0,
    };
    for cell in 0..context.mesh.num_cells() {
        let element = context.element(cell);
        let reference = cell_reference_positions(context.mesh, cell);
        let x = displaced(&reference, &cell_vectors(context, fields.dx, cell, false));
        let y = cell_vectors(context, fields.y, cell, false);

        for (q, &weight) in element.weights().iter().enumerate() {
            let phi = element.basis(q);
            let x_uv = parametric_gradient(element.gradients(q), &x);
            let geometry = SurfaceGeometry::from_tangents(&x_uv, normal_sign)?;
            let area = geometry.area(weight);

            let x_g = interpolate(phi, &x);
            let y_g = interpolate(phi, &y);
            let sums = density.power_sums(dot(&y_g, &y_g), dot(&y_g, &geometry.normal));

            // x · (x_u × x_v) does not depend on the sign convention of the normal
            let outward = geometry.normal.map(|n| n * normal_sign * geometry.sqrt_det);
            diagnostics.surface += area;
            diagnostics.volume += weight * dot(&x_g, &outward) / 3.0;
            diagnostics.energy += sums.sum_p3 * area;
        }
    }
    Ok(diagnostics)
}
