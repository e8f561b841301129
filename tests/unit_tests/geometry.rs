use matrixcompare::assert_scalar_eq;
use nalgebra::DMatrix;
use proptest::prelude::*;
use surfem::autodiff::{Real, Tape};
use surfem::geometry::{dot, parametric_gradient, GeometryError, SurfaceGeometry, Tangents};

fn tangents_strategy() -> impl Strategy<Value = Tangents<f64>> {
    let entry = -2.0..2.0f64;
    [[entry.clone(), entry.clone()], [entry.clone(), entry.clone()], [entry.clone(), entry]]
}

fn is_well_conditioned(x_uv: &Tangents<f64>) -> bool {
    let u = nalgebra::Vector3::new(x_uv[0][0], x_uv[1][0], x_uv[2][0]);
    let v = nalgebra::Vector3::new(x_uv[0][1], x_uv[1][1], x_uv[2][1]);
    u.cross(&v).norm() > 0.1 * u.norm() * v.norm() && u.norm() > 0.1 && v.norm() > 0.1
}

proptest! {
    #[test]
    fn metric_times_inverse_is_identity(x_uv in tangents_strategy()) {
        prop_assume!(is_well_conditioned(&x_uv));
        let geometry = SurfaceGeometry::from_tangents(&x_uv, 1.0).unwrap();
        let (g, gi) = (geometry.metric, geometry.metric_inverse);
        for i in 0..2 {
            for j in 0..2 {
                let product: f64 = (0..2).map(|k| g[i][k] * gi[k][j]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                prop_assert!((product - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn normal_is_unit_and_orthogonal(x_uv in tangents_strategy(), sign in prop::sample::select(vec![-1.0, 1.0])) {
        prop_assume!(is_well_conditioned(&x_uv));
        let geometry = SurfaceGeometry::from_tangents(&x_uv, sign).unwrap();
        let n = geometry.normal;
        prop_assert!((dot(&n, &n) - 1.0).abs() < 1e-10);
        for j in 0..2 {
            let t = [x_uv[0][j], x_uv[1][j], x_uv[2][j]];
            prop_assert!(dot(&n, &t).abs() < 1e-10);
        }
    }

    #[test]
    fn tangential_gradient_of_position_is_tangent_projector(x_uv in tangents_strategy()) {
        prop_assume!(is_well_conditioned(&x_uv));
        let geometry = SurfaceGeometry::from_tangents(&x_uv, 1.0).unwrap();
        let projector = geometry.tangential_gradient(&x_uv);
        let n = geometry.normal;
        for i in 0..3 {
            for j in 0..3 {
                let expected = (if i == j { 1.0 } else { 0.0 }) - n[i] * n[j];
                prop_assert!((projector[i][j] - expected).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn flat_unit_square_geometry() {
    // The bilinear map of [-1, 1]^2 onto [0, 1]^2 has x_u = (1/2, 0, 0) and x_v = (0, 1/2, 0)
    let x_uv = [[0.5, 0.0], [0.0, 0.5], [0.0, 0.0]];
    let geometry = SurfaceGeometry::from_tangents(&x_uv, -1.0).unwrap();
    assert_scalar_eq!(geometry.det, 1.0 / 16.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(geometry.area(4.0), 1.0, comp = abs, tol = 1e-15);
    assert_eq!(geometry.normal, [0.0, 0.0, -1.0]);
}

#[test]
fn collapsed_tangents_are_degenerate() {
    let x_uv = [[1.0, 2.0], [1.0, 2.0], [0.0, 0.0]];
    let result = SurfaceGeometry::from_tangents(&x_uv, 1.0);
    assert!(matches!(result, Err(GeometryError::DegenerateMetric { .. })));
}

#[test]
fn recorded_geometry_matches_plain_geometry() {
    let positions = [[0.0, 0.0, 0.1], [1.0, 0.2, 0.0], [0.1, 0.9, 0.3]];
    #[rustfmt::skip]
    let phi_uv = DMatrix::from_column_slice(2, 3, &[
        -1.0, -1.0,
        1.0, 0.0,
        0.0, 1.0,
    ]);
    let plain = SurfaceGeometry::from_tangents(&parametric_gradient(&phi_uv, &positions), 1.0).unwrap();

    let tape = Tape::new();
    let flat: Vec<f64> = positions.iter().flatten().copied().collect();
    let vars = tape.independents(&flat);
    let recorded_positions: Vec<[_; 3]> = vars.chunks(3).map(|c| [c[0], c[1], c[2]]).collect();
    let recorded = SurfaceGeometry::from_tangents(&parametric_gradient(&phi_uv, &recorded_positions), 1.0).unwrap();

    assert_scalar_eq!(recorded.sqrt_det.value(), plain.sqrt_det, comp = abs, tol = 1e-14);
    for k in 0..3 {
        assert_scalar_eq!(recorded.normal[k].value(), plain.normal[k], comp = abs, tol = 1e-14);
    }
}
