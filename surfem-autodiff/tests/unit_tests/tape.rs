use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::DMatrix;
use proptest::prelude::*;
use surfem_autodiff::{Real, Tape, Var};

/// f(x) = x0^2 + 3 x0 x1 - x2^2 + 2 x1 x2 + 5
fn quadratic<T: Real>(x: &[T]) -> T {
    x[0] * x[0] + x[0] * x[1] * 3.0 - x[2] * x[2] + x[1] * x[2] * 2.0 + 5.0
}

#[test]
fn jacobian_of_quadratic_matches_analytic_gradient() {
    let tape = Tape::new();
    let values = [1.5, -2.0, 0.25];
    let x = tape.independents(&values);
    let f = quadratic(&x);

    assert_scalar_eq!(f.value(), quadratic(&values), comp = abs, tol = 1e-14);

    let jacobian = tape.jacobian(&[f], &x);
    let [x0, x1, x2] = values;
    let expected = DMatrix::from_row_slice(1, 3, &[2.0 * x0 + 3.0 * x1, 3.0 * x0 + 2.0 * x2, -2.0 * x2 + 2.0 * x1]);
    assert_matrix_eq!(jacobian, expected, comp = abs, tol = 1e-14);
}

#[test]
fn jacobian_of_vector_residual_is_row_per_dependent() {
    let tape = Tape::new();
    let x = tape.independents(&[2.0, 3.0, 4.0]);
    let residual = [x[0] / x[1], x[2].sqrt(), x[0].powf(3.0) - x[2] * 2.0];

    let jacobian = tape.jacobian(&residual, &x);

    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(3, 3, &[
        1.0 / 3.0, -2.0 / 9.0, 0.0,
        0.0,        0.0,       0.25,
        12.0,       0.0,      -2.0,
    ]);
    assert_matrix_eq!(jacobian, expected, comp = abs, tol = 1e-14);
}

#[test]
fn constant_dependents_give_zero_rows() {
    let tape = Tape::new();
    let x = tape.independents(&[1.0, 2.0]);
    let residual = [Var::constant(7.0), x[0] * x[1]];

    let jacobian = tape.jacobian(&residual, &x);
    assert_matrix_eq!(jacobian, DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 2.0, 1.0]));
}

#[test]
fn zero_exponent_power_has_zero_derivative_at_origin() {
    let tape = Tape::new();
    let x = tape.independents(&[0.0]);
    let y = x[0].powf(0.0) * 2.0 + x[0] * 3.0;

    let jacobian = tape.jacobian(&[y], &x);
    assert_eq!(jacobian[(0, 0)], 3.0);
}

#[test]
fn unused_singular_branch_does_not_produce_nan() {
    let tape = Tape::new();
    let x = tape.independents(&[0.0, 1.0]);
    // sqrt has an infinite derivative at zero, but the branch is multiplied by zero
    let y = x[0].sqrt() * 0.0 + x[1];

    let jacobian = tape.jacobian(&[y], &x);
    assert_eq!(jacobian[(0, 0)], 0.0);
    assert_eq!(jacobian[(0, 1)], 1.0);
}

#[test]
fn operations_on_constants_are_not_recorded() {
    let tape = Tape::new();
    let x = tape.independent(1.0);
    let before = tape.len();
    let c = Var::constant(2.0) * 3.0 + 1.0;
    assert_eq!(tape.len(), before);
    assert!(!c.is_recorded());
    let _ = x * c;
    assert_eq!(tape.len(), before + 1);
}

#[test]
fn cleared_tape_can_be_reused() {
    let mut tape = Tape::new();
    {
        let x = tape.independents(&[1.0, 2.0]);
        let _ = x[0] * x[1];
    }
    assert!(!tape.is_empty());
    tape.clear();
    assert!(tape.is_empty());

    let x = tape.independents(&[3.0]);
    let jacobian = tape.jacobian(&[x[0] * x[0]], &x);
    assert_eq!(jacobian[(0, 0)], 6.0);
}

proptest! {
    #[test]
    fn product_and_quotient_rules_hold(a in -10.0..10.0f64, b in 0.5..10.0f64) {
        let tape = Tape::new();
        let x = tape.independents(&[a, b]);
        let f = x[0] * x[1] + x[0] / x[1] - 1.0 / x[1];

        let jacobian = tape.jacobian(&[f], &x);
        let expected_da = b + 1.0 / b;
        let expected_db = a - a / (b * b) + 1.0 / (b * b);
        prop_assert!((jacobian[(0, 0)] - expected_da).abs() <= 1e-12 * (1.0 + expected_da.abs()));
        prop_assert!((jacobian[(0, 1)] - expected_db).abs() <= 1e-12 * (1.0 + expected_db.abs()));
    }
}
