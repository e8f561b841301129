//! Conformal reparametrization of the displaced surface.
//!
//! The new displacement `nDx` minimizes a discrete conformal energy of `x̂ + nDx` on the
//! parametrization of the current surface `x̂ + Dx`, while the per-cell multiplier `L` keeps
//! `nDx - Dx` tangential. The penalty `ε L` regularizes the multiplier block.
//!
//! Quadrilaterals are parametrized by their reference square. Triangles are parametrized by a
//! [`TriangleHeuristic`] reference triangle shaped by the valences of their vertices.
use crate::assembly::{AssemblyContext, LocalResidual, LocalValues, ResidualKernel};
use crate::element::CellKind;
use crate::field::FieldId;
use crate::geometry::{interpolate, parametric_gradient, tangent_cross, SurfaceGeometry};
use crate::mesh::Mesh;
use crate::willmore::triangle::physical_gradients;
use crate::willmore::{cell_reference_positions, cell_vectors, displaced, TriangleHeuristic, WillmoreFields};
use eyre::eyre;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use surfem_autodiff::Real;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConformalSettings {
    /// Penalty on the tangential multiplier.
    pub epsilon: f64,
    /// Weight of the additional Dirichlet energy of `x̂ + nDx`.
    pub delta: f64,
    pub triangle: TriangleHeuristic,
}

impl Default for ConformalSettings {
    fn default() -> Self {
        Self {
            epsilon: 1e-5,
            delta: 0.0,
            triangle: TriangleHeuristic::default(),
        }
    }
}

const NDX: usize = 0;
const MULTIPLIER: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct ConformalKernel {
    fields: WillmoreFields,
    settings: ConformalSettings,
    valences: Vec<usize>,
}

impl ConformalKernel {
    pub fn new(mesh: &Mesh, fields: WillmoreFields, settings: ConformalSettings) -> Self {
        Self {
            fields,
            settings,
            valences: mesh.vertex_valences(),
        }
    }

    pub fn settings(&self) -> &ConformalSettings {
        &self.settings
    }

    fn reference_triangle(&self, mesh: &Mesh, cell: usize) -> Option<[[f64; 2]; 3]> {
        let cell = &mesh.cells()[cell];
        match cell.kind() {
            CellKind::Tri3 => {
                let v = cell.vertices();
                let valences = [self.valences[v[0]], self.valences[v[1]], self.valences[v[2]]];
                Some(self.settings.triangle.reference_triangle(valences))
            }
            _ => None,
        }
    }
}

impl ResidualKernel for ConformalKernel {
    fn unknowns(&self) -> Vec<FieldId> {
        vec![self.fields.ndx, self.fields.tangential_multiplier]
    }

    #[allow(non_snake_case)]
    fn residual<'l, T: Real>(
        &self,
        context: &AssemblyContext,
        cell: usize,
        unknowns: &LocalValues<'l, T>,
    ) -> eyre::Result<LocalResidual<'l, T>> {
        let element = context.element(cell);
        let triangle = self.reference_triangle(context.mesh, cell);
        let epsilon = self.settings.epsilon;
        let delta = self.settings.delta;

        let reference = cell_reference_positions(context.mesh, cell);
        let dx = cell_vectors(context, self.fields.dx, cell, false);
        let ndx = unknowns.vectors(NDX);
        let multiplier = unknowns.scalar(MULTIPLIER, 0, 0);

        let x = displaced(&reference, &dx);
        let x_new = displaced(&reference, &ndx);
        let x_mid: Vec<[T; 3]> = midpoint_positions(&reference, &dx, &ndx);

        let mut residual = LocalResidual::zeros(unknowns.layout());
        for (q, &reference_weight) in element.weights().iter().enumerate() {
            let phi = element.basis(q);
            let (gradients, weight): (Cow<DMatrix<f64>>, f64) = match &triangle {
                Some(vertices) => {
                    let (gradients, det) = physical_gradients(vertices, element.gradients(q))
                        .ok_or_else(|| eyre!("Degenerate reference triangle for cell {}", cell))?;
                    (Cow::Owned(gradients), reference_weight * det)
                }
                None => (Cow::Borrowed(element.gradients(q)), reference_weight),
            };
            let phi_uv: &DMatrix<f64> = &gradients;

            let x_uv = parametric_gradient(phi_uv, &x);
            let geometry = SurfaceGeometry::from_tangents(&x_uv, 1.0)?;
            let area = geometry.area(weight);
            let n = geometry.normal;
            let gi = geometry.metric_inverse;
            let phi_tan = geometry.shape_tangential_gradients(phi_uv);

            let normal_mid = tangent_cross(&parametric_gradient(phi_uv, &x_mid));
            let nx_uv = parametric_gradient(phi_uv, &x_new);
            let nx_tan = geometry.lift::<T>().tangential_gradient(&nx_uv);

            let v: [T; 3] = [0, 1, 2].map(|K| {
                let (K1, K2) = ((K + 1) % 3, (K + 2) % 3);
                nx_uv[K][1] - nx_uv[K2][0] * n[K1] + nx_uv[K1][0] * n[K2]
            });
            let w: [T; 3] = [0, 1, 2].map(|K| {
                let (K1, K2) = ((K + 1) % 3, (K + 2) % 3);
                nx_uv[K][0] + nx_uv[K2][1] * n[K1] - nx_uv[K1][1] * n[K2]
            });
            let Q: [[T; 2]; 3] = [0, 1, 2].map(|K| {
                let (K1, K2) = ((K + 1) % 3, (K + 2) % 3);
                [
                    w[K] * gi[1][1]
                        + (v[K2] * n[K1] - v[K1] * n[K2]) * gi[0][0]
                        + (w[K1] * n[K2] - w[K2] * n[K1] - v[K]) * gi[0][1],
                    v[K] * gi[0][0]
                        + (w[K1] * n[K2] - w[K2] * n[K1]) * gi[1][1]
                        + (v[K2] * n[K1] - v[K1] * n[K2] - w[K]) * gi[0][1],
                ]
            });

            for K in 0..3 {
                for (i, &phi_i) in phi.iter().enumerate() {
                    let mut conformal = T::zero();
                    for j in 0..2 {
                        conformal += Q[K][j] * phi_uv[(j, i)];
                    }
                    let mut smoothing = T::zero();
                    for J in 0..3 {
                        smoothing += nx_tan[K][J] * phi_tan[i][J];
                    }
                    let value = (conformal + smoothing * delta) * area + multiplier * normal_mid[K] * (phi_i * weight);
                    residual.add(NDX, K, i, value);
                }
            }

            let ndx_g = interpolate(phi, &ndx);
            let dx_g = interpolate(phi, &dx);
            let mut normal_offset = T::zero();
            for K in 0..3 {
                normal_offset -= (ndx_g[K] - dx_g[K]) * normal_mid[K];
            }
            residual.add(MULTIPLIER, 0, 0, normal_offset * weight + multiplier * (epsilon * area));
        }
        Ok(residual)
    }
}

/// `x̂ + (Dx + nDx) / 2` per node.
fn midpoint_positions<T: Real>(reference: &[[f64; 3]], dx: &[[f64; 3]], ndx: &[[T; 3]]) -> Vec<[T; 3]> {
    reference
        .iter()
        .zip(dx)
        .zip(ndx)
        .map(|((x_hat, d), n)| [0, 1, 2].map(|k| (n[k] + d[k]) * 0.5 + x_hat[k]))
        .collect()
}
