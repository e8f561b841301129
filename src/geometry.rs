//! Differential geometry of parametric surface elements.
//!
//! All quantities are small fixed-size arrays over a [`Real`] scalar, so the same code evaluates
//! plain values (`f64`) and recorded values ([`Var`](surfem_autodiff::Var)). Index conventions:
//!
//! - parametric tangents `x_uv[K][j] = dx_K / du_j` with `K` in `0..3`, `j` in `0..2`,
//! - tangential gradients `f_Xtan[I][J]`, the `J`-th Cartesian component of the surface gradient
//!   of the `I`-th component of `f`.
use nalgebra::{DMatrix, DVector};
use std::error::Error;
use std::fmt;
use surfem_autodiff::Real;

/// Parametric derivatives of a 3-vector field, `[K][j]`.
pub type Tangents<T> = [[T; 2]; 3];

/// Tangential gradient of a 3-vector field, `[I][J]`.
pub type SurfaceGradient<T> = [[T; 3]; 3];

/// The metric determinant is considered degenerate below this fraction of `g_00 g_11`.
const DEGENERACY_TOLERANCE: f64 = 1e-14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// The first fundamental form is (numerically) singular, as for a collapsed or inverted
    /// element.
    DegenerateMetric { determinant: f64 },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::DegenerateMetric { determinant } => {
                write!(f, "Degenerate surface metric (determinant {:e})", determinant)
            }
        }
    }
}

impl Error for GeometryError {}

/// Geometric quantities of a surface element at a single quadrature point.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceGeometry<T> {
    /// Covariant metric `g_ij = x_u_i . x_u_j`.
    pub metric: [[T; 2]; 2],
    pub metric_inverse: [[T; 2]; 2],
    pub det: T,
    pub sqrt_det: T,
    /// Unit normal, scaled by the sign convention.
    pub normal: [T; 3],
    /// `Jir[i][J] = sum_k g^ik dx_J / du_k`, which maps parametric derivatives to tangential ones.
    pub reduced_jacobian: [[T; 3]; 2],
}

impl<T: Real> SurfaceGeometry<T> {
    pub fn from_tangents(x_uv: &Tangents<T>, normal_sign: f64) -> Result<Self, GeometryError> {
        let mut g = [[T::zero(); 2]; 2];
        for i in 0..2 {
            for j in 0..2 {
                for x_k in x_uv {
                    g[i][j] += x_k[i] * x_k[j];
                }
            }
        }

        let det = g[0][0] * g[1][1] - g[0][1] * g[1][0];
        let det_value = det.value();
        let scale = g[0][0].value() * g[1][1].value();
        if !det_value.is_finite() || det_value <= DEGENERACY_TOLERANCE * scale {
            return Err(GeometryError::DegenerateMetric {
                determinant: det_value,
            });
        }

        let gi = [[g[1][1] / det, -g[0][1] / det], [-g[1][0] / det, g[0][0] / det]];
        let sqrt_det = det.sqrt();

        let cross = tangent_cross(x_uv);
        let normal = [0, 1, 2].map(|k| cross[k] * normal_sign / sqrt_det);

        let mut jir = [[T::zero(); 3]; 2];
        for i in 0..2 {
            for (big_j, x_j) in x_uv.iter().enumerate() {
                for k in 0..2 {
                    jir[i][big_j] += gi[i][k] * x_j[k];
                }
            }
        }

        Ok(Self {
            metric: g,
            metric_inverse: gi,
            det,
            sqrt_det,
            normal,
            reduced_jacobian: jir,
        })
    }

    /// The measure `w sqrt(det g)` of a quadrature point with weight `w`.
    pub fn area(&self, weight: f64) -> T {
        self.sqrt_det * weight
    }

    /// Tangential gradient of a vector field from its parametric derivatives.
    pub fn tangential_gradient(&self, f_uv: &Tangents<T>) -> SurfaceGradient<T> {
        let jir = &self.reduced_jacobian;
        let mut f_tan = [[T::zero(); 3]; 3];
        for (f_i, f_uv_i) in f_tan.iter_mut().zip(f_uv) {
            for (big_j, f_ij) in f_i.iter_mut().enumerate() {
                *f_ij = f_uv_i[0] * jir[0][big_j] + f_uv_i[1] * jir[1][big_j];
            }
        }
        f_tan
    }

    /// Tangential gradients of scalar shape functions, one 3-vector per basis function.
    ///
    /// `phi_uv` holds the reference gradients with one column per basis function.
    pub fn shape_tangential_gradients(&self, phi_uv: &DMatrix<f64>) -> Vec<[T; 3]> {
        let jir = &self.reduced_jacobian;
        (0..phi_uv.ncols())
            .map(|i| [0, 1, 2].map(|big_j| jir[0][big_j] * phi_uv[(0, i)] + jir[1][big_j] * phi_uv[(1, i)]))
            .collect()
    }
}

impl SurfaceGeometry<f64> {
    /// Converts plain geometry into constants of another scalar type.
    pub fn lift<T: Real>(&self) -> SurfaceGeometry<T> {
        SurfaceGeometry {
            metric: self.metric.map(|row| row.map(T::from_f64)),
            metric_inverse: self.metric_inverse.map(|row| row.map(T::from_f64)),
            det: T::from_f64(self.det),
            sqrt_det: T::from_f64(self.sqrt_det),
            normal: self.normal.map(T::from_f64),
            reduced_jacobian: self.reduced_jacobian.map(|row| row.map(T::from_f64)),
        }
    }
}

/// Converts an array of plain values into constants.
pub fn lift<T: Real, const N: usize>(values: [f64; N]) -> [T; N] {
    values.map(T::from_f64)
}

/// The (unnormalized) normal `x_u x x_v`.
pub fn tangent_cross<T: Real>(x_uv: &Tangents<T>) -> [T; 3] {
    [
        x_uv[1][0] * x_uv[2][1] - x_uv[2][0] * x_uv[1][1],
        x_uv[2][0] * x_uv[0][1] - x_uv[0][0] * x_uv[2][1],
        x_uv[0][0] * x_uv[1][1] - x_uv[1][0] * x_uv[0][1],
    ]
}

/// Interpolates nodal 3-vectors with the given basis values.
pub fn interpolate<T: Real>(phi: &DVector<f64>, values: &[[T; 3]]) -> [T; 3] {
    debug_assert_eq!(phi.len(), values.len());
    let mut result = [T::zero(); 3];
    for (&phi_i, v_i) in phi.iter().zip(values) {
        for k in 0..3 {
            result[k] += v_i[k] * phi_i;
        }
    }
    result
}

/// Interpolates nodal scalars with the given basis values.
pub fn interpolate_scalar<T: Real>(phi: &DVector<f64>, values: &[T]) -> T {
    debug_assert_eq!(phi.len(), values.len());
    let mut result = T::zero();
    for (&phi_i, &v_i) in phi.iter().zip(values) {
        result += v_i * phi_i;
    }
    result
}

/// Parametric derivatives `[K][j]` of nodal 3-vectors, given reference gradients with one column
/// per basis function.
pub fn parametric_gradient<T: Real>(phi_uv: &DMatrix<f64>, values: &[[T; 3]]) -> Tangents<T> {
    debug_assert_eq!(phi_uv.nrows(), 2);
    debug_assert_eq!(phi_uv.ncols(), values.len());
    let mut result = [[T::zero(); 2]; 3];
    for (i, v_i) in values.iter().enumerate() {
        for (k, result_k) in result.iter_mut().enumerate() {
            for (j, result_kj) in result_k.iter_mut().enumerate() {
                *result_kj += v_i[k] * phi_uv[(j, i)];
            }
        }
    }
    result
}

pub fn dot<T: Real>(a: &[T; 3], b: &[T; 3]) -> T {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
