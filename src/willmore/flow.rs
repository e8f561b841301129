//! One time step of the P-Willmore flow.
use crate::assembly::{AssemblyContext, LocalResidual, LocalValues, ResidualKernel};
use crate::field::FieldId;
use crate::geometry::{dot, interpolate, parametric_gradient, SurfaceGeometry};
use crate::willmore::{cell_reference_positions, cell_vectors, displaced, EnergyDensity, WillmoreFields};
use itertools::izip;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use surfem_autodiff::Real;

/// Time level of the curvature quantities in the flow equations.
///
/// The geometry (metric, normal, tangential gradients) is always evaluated on the midpoint
/// surface `(x_old + x_new) / 2`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowScheme {
    /// `Y` and `W` at the midpoint of the step, and the sign and norm of `Y` as well.
    Midpoint,
    /// `Y` and `W` at the end of the step, with the sign and norm of `Y` lagged at the start.
    Backward,
}

impl Default for FlowScheme {
    fn default() -> Self {
        FlowScheme::Backward
    }
}

const X: usize = 0;
const Y: usize = 1;
const W: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct FlowKernel {
    fields: WillmoreFields,
    density: EnergyDensity,
    normal_sign: f64,
    dt: f64,
    scheme: FlowScheme,
}

impl FlowKernel {
    pub fn new(fields: WillmoreFields, density: EnergyDensity, normal_sign: f64, dt: f64, scheme: FlowScheme) -> Self {
        Self {
            fields,
            density,
            normal_sign,
            dt,
            scheme,
        }
    }

    fn volume_block(&self) -> Option<usize> {
        self.fields.lambda_volume.map(|_| 3)
    }

    fn area_block(&self) -> Option<usize> {
        self.fields
            .lambda_area
            .map(|_| if self.fields.lambda_volume.is_some() { 4 } else { 3 })
    }
}

#[replace_float_literals(T::from_f64(literal))]
fn average<T: Real>(a: &[[T; 3]], b: &[[T; 3]]) -> Vec<[T; 3]> {
    a.iter()
        .zip(b)
        .map(|(a, b)| [0, 1, 2].map(|k| (a[k] + b[k]) * 0.5))
        .collect()
}

fn constants<T: Real>(values: &[[f64; 3]]) -> Vec<[T; 3]> {
    values.iter().map(|v| v.map(T::from_f64)).collect()
}

impl ResidualKernel for FlowKernel {
    fn unknowns(&self) -> Vec<FieldId> {
        let mut unknowns = vec![self.fields.dx, self.fields.y, self.fields.w];
        unknowns.extend(self.fields.lambda_volume);
        unknowns.extend(self.fields.lambda_area);
        unknowns
    }

    #[allow(non_snake_case)]
    fn residual<'l, T: Real>(
        &self,
        context: &AssemblyContext,
        cell: usize,
        unknowns: &LocalValues<'l, T>,
    ) -> eyre::Result<LocalResidual<'l, T>> {
        let element = context.element(cell);
        let reference = cell_reference_positions(context.mesh, cell);

        let dx_new = unknowns.vectors(X);
        let dx_old: Vec<[T; 3]> = constants(&cell_vectors(context, self.fields.dx, cell, true));
        let x_new = displaced(&reference, &dx_new);
        let x_old = displaced(&reference, &dx_old);
        let x_mid = average(&x_new, &x_old);

        let y_new = unknowns.vectors(Y);
        let y_old: Vec<[T; 3]> = constants(&cell_vectors(context, self.fields.y, cell, true));
        let w_new = unknowns.vectors(W);
        let w_old: Vec<[T; 3]> = constants(&cell_vectors(context, self.fields.w, cell, true));
        let y_mid = average(&y_new, &y_old);
        let w_mid = average(&w_new, &w_old);

        let lambda_volume = self
            .volume_block()
            .map(|b| unknowns.scalar(b, 0, 0))
            .unwrap_or_else(T::zero);
        let lambda_area = self
            .area_block()
            .map(|b| unknowns.scalar(b, 0, 0))
            .unwrap_or_else(T::zero);

        let mut residual = LocalResidual::zeros(unknowns.layout());
        for (q, &weight) in element.weights().iter().enumerate() {
            let phi = element.basis(q);
            let phi_uv = element.gradients(q);

            let x_mid_uv = parametric_gradient(phi_uv, &x_mid);
            let geometry = SurfaceGeometry::from_tangents(&x_mid_uv, self.normal_sign)?;
            let area = geometry.area(weight);
            let normal = geometry.normal;
            let phi_tan = geometry.shape_tangential_gradients(phi_uv);

            let x_new_tan = geometry.tangential_gradient(&parametric_gradient(phi_uv, &x_new));
            let x_old_tan = geometry.tangential_gradient(&parametric_gradient(phi_uv, &x_old));
            let x_mid_tan = geometry.tangential_gradient(&x_mid_uv);
            let w_new_tan = geometry.tangential_gradient(&parametric_gradient(phi_uv, &w_new));
            let w_old_tan = geometry.tangential_gradient(&parametric_gradient(phi_uv, &w_old));
            let w_mid_tan = geometry.tangential_gradient(&parametric_gradient(phi_uv, &w_mid));

            // Curvature quantities at the time level of the scheme
            let (y_g, w_g, y_sign_source, x_tan_term, w_tan_trace) = match self.scheme {
                FlowScheme::Backward => {
                    let y_g = interpolate(phi, &y_new);
                    let w_g = interpolate(phi, &w_new);
                    let y_old_g = interpolate(phi, &y_old);
                    (y_g, w_g, y_old_g, x_new_tan, w_new_tan)
                }
                FlowScheme::Midpoint => {
                    let y_g = interpolate(phi, &y_mid);
                    let w_g = interpolate(phi, &w_mid);
                    (y_g, w_g, y_g, x_mid_tan, w_mid_tan)
                }
            };
            let trace = w_tan_trace[0][0] + w_tan_trace[1][1] + w_tan_trace[2][2];

            let y_dot_n = dot(&y_sign_source, &normal).value();
            let sums = self
                .density
                .power_sums(dot(&y_sign_source, &y_sign_source), y_dot_n);

            let x_new_g = interpolate(phi, &x_new);
            let x_old_g = interpolate(phi, &x_old);
            let displacement = [0, 1, 2].map(|k| x_new_g[k] - x_old_g[k]);

            for (i, (&phi_i, phi_tan_i)) in izip!(phi.iter(), &phi_tan).enumerate() {
                for K in 0..3 {
                    let mut term0 = T::zero();
                    let mut term1 = T::zero();
                    let mut laplace_new = T::zero();
                    let mut term3 = T::zero();
                    for J in 0..3 {
                        term0 += w_new_tan[K][J] * phi_tan_i[J];
                        term1 += x_tan_term[K][J] * phi_tan_i[J];
                        laplace_new += x_new_tan[K][J] * phi_tan_i[J];
                        let mut coupling = T::zero();
                        for L in 0..3 {
                            coupling += x_old_tan[L][J] * w_old_tan[L][K] + x_old_tan[L][K] * w_old_tan[L][J];
                        }
                        term3 += phi_tan_i[J] * coupling;
                    }

                    let x_row = (y_g[K] * phi_i + laplace_new) * area;
                    let y_row = (w_g[K] - sums.sum_p1 * y_g[K]) * (area * phi_i);
                    let w_row = ((lambda_volume * normal[K] + displacement[K] / self.dt) * phi_i + lambda_area * term1 - term0
                        + sums.sum_p2 * term1
                        - trace * phi_tan_i[K]
                        + term3)
                        * area;

                    residual.add(X, K, i, x_row);
                    residual.add(Y, K, i, y_row);
                    residual.add(W, K, i, w_row);
                }
            }

            if let Some(block) = self.volume_block() {
                residual.add(block, 0, 0, dot(&displacement, &normal) * area);
            }
            if let Some(block) = self.area_block() {
                let mut area_variation = T::zero();
                for K in 0..3 {
                    for J in 0..3 {
                        area_variation += x_mid_tan[K][J] * (x_new_tan[K][J] - x_old_tan[K][J]);
                    }
                }
                residual.add(block, 0, 0, area_variation * area);
            }
        }
        Ok(residual)
    }
}
