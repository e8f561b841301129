//! Computes the curvature vector `Y = Δx` and `W = ∂e/∂Y` of a fixed surface.
use crate::assembly::{AssemblyContext, LocalResidual, LocalValues, ResidualKernel};
use crate::field::FieldId;
use crate::geometry::{dot, interpolate, parametric_gradient, SurfaceGeometry};
use crate::willmore::{cell_reference_positions, cell_vectors, displaced, EnergyDensity, WillmoreFields};
use surfem_autodiff::Real;

const Y: usize = 0;
const W: usize = 1;

/// Residual of
///
/// ```text
/// ∫ Y·φ + δ ∇Y:∇φ + ∇x:∇φ dA = 0,
/// ∫ (W - sum_p1(Y) Y)·φ dA = 0,
/// ```
///
/// on the surface `x = x̂ + Dx`, with `Y` and `W` as unknowns.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvatureInitializer {
    fields: WillmoreFields,
    density: EnergyDensity,
    normal_sign: f64,
    delta: f64,
}

impl CurvatureInitializer {
    pub fn new(fields: WillmoreFields, density: EnergyDensity, normal_sign: f64, delta: f64) -> Self {
        Self {
            fields,
            density,
            normal_sign,
            delta,
        }
    }
}

impl ResidualKernel for CurvatureInitializer {
    fn unknowns(&self) -> Vec<FieldId> {
        vec![self.fields.y, self.fields.w]
    }

    fn residual<'l, T: Real>(
        &self,
        context: &AssemblyContext,
        cell: usize,
        unknowns: &LocalValues<'l, T>,
    ) -> eyre::Result<LocalResidual<'l, T>> {
        let element = context.element(cell);
        let reference = cell_reference_positions(context.mesh, cell);
        let x = displaced(&reference, &cell_vectors(context, self.fields.dx, cell, false));
        let y = unknowns.vectors(Y);
        let w = unknowns.vectors(W);

        let mut residual = LocalResidual::zeros(unknowns.layout());
        for (q, &weight) in element.weights().iter().enumerate() {
            let phi = element.basis(q);
            let phi_uv = element.gradients(q);

            let x_uv = parametric_gradient(phi_uv, &x);
            let geometry = SurfaceGeometry::from_tangents(&x_uv, self.normal_sign)?;
            let area = geometry.area(weight);
            let x_tan = geometry.tangential_gradient(&x_uv);
            let phi_tan = geometry.shape_tangential_gradients(phi_uv);

            let geometry_t = geometry.lift::<T>();
            let y_g = interpolate(phi, &y);
            let w_g = interpolate(phi, &w);
            let y_tan = geometry_t.tangential_gradient(&parametric_gradient(phi_uv, &y));

            let y_dot_n = dot(&y_g, &geometry_t.normal).value();
            let sums = self.density.power_sums(dot(&y_g, &y_g), y_dot_n);

            for k in 0..3 {
                for (i, &phi_i) in phi.iter().enumerate() {
                    let mut laplace = T::zero();
                    let mut smoothing = T::zero();
                    for j in 0..3 {
                        laplace += T::from_f64(x_tan[k][j] * phi_tan[i][j]);
                        smoothing += y_tan[k][j] * phi_tan[i][j];
                    }
                    let y_row = (y_g[k] * phi_i + smoothing * self.delta + laplace) * area;
                    let w_row = (w_g[k] - sums.sum_p1 * y_g[k]) * (phi_i * weight);
                    residual.add(Y, k, i, y_row);
                    residual.add(W, k, i, w_row);
                }
            }
        }
        Ok(residual)
    }
}
