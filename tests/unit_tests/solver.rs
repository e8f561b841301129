use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use surfem::solver::{DenseLuSolver, LinearSolver, SolveError};

#[test]
fn dense_lu_solves_small_sparse_system() {
    #[rustfmt::skip]
    let dense = DMatrix::from_row_slice(3, 3, &[
        4.0, -1.0, 0.0,
        -1.0, 4.0, -1.0,
        0.0, -1.0, 4.0,
    ]);
    let matrix = CsrMatrix::from(&dense);
    let expected = DVector::from_column_slice(&[1.0, -2.0, 3.0]);
    let rhs = &dense * &expected;

    let solution = DenseLuSolver.solve(&matrix, &rhs).unwrap();
    assert_matrix_eq!(solution, expected, comp = abs, tol = 1e-14);
}

#[test]
fn dense_lu_reports_singular_matrix() {
    let dense = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
    let matrix = CsrMatrix::from(&dense);
    let result = DenseLuSolver.solve(&matrix, &DVector::from_element(2, 1.0));
    assert_eq!(result, Err(SolveError::SingularMatrix));
}
