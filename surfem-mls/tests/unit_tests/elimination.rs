use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use surfem_mls::elimination::{gaussian_elimination, SingularSystem};

#[test]
fn solves_system_requiring_pivoting() {
    // The leading entry is zero, so a row swap is needed
    let augmented = DMatrix::from_row_slice(3, 4, &[
        0.0, 2.0, 1.0, 7.0,
        1.0, 1.0, 1.0, 6.0,
        2.0, 1.0, 3.0, 13.0,
    ]);
    let x = gaussian_elimination(augmented).unwrap();
    let expected = DVector::from_column_slice(&[1.0, 2.0, 3.0]);
    assert_matrix_eq!(x, expected, comp = abs, tol = 1e-12);
}

#[test]
fn solves_random_well_conditioned_system() {
    let a = DMatrix::from_fn(5, 5, |i, j| if i == j { 10.0 } else { 1.0 / (1.0 + i as f64 + 2.0 * j as f64) });
    let x_expected = DVector::from_fn(5, |i, _| i as f64 - 2.0);
    let b = &a * &x_expected;

    let mut augmented = DMatrix::zeros(5, 6);
    augmented.columns_mut(0, 5).copy_from(&a);
    augmented.column_mut(5).copy_from(&b);

    let x = gaussian_elimination(augmented).unwrap();
    assert_matrix_eq!(x, x_expected, comp = abs, tol = 1e-12);
}

#[test]
fn reports_singular_matrix() {
    let augmented = DMatrix::from_row_slice(3, 4, &[
        1.0, 2.0, 3.0, 1.0,
        2.0, 4.0, 6.0, 2.0,
        1.0, 1.0, 1.0, 3.0,
    ]);
    let result = gaussian_elimination(augmented);
    assert!(matches!(result, Err(SingularSystem { .. })));
}

#[test]
fn reports_zero_matrix() {
    let result = gaussian_elimination(DMatrix::zeros(2, 3));
    assert_eq!(result, Err(SingularSystem { column: 0 }));
}
