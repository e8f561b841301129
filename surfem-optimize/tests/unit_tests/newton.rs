use nalgebra::{DVector, DVectorView, DVectorViewMut, Matrix3, Vector3};
use numeric_literals::replace_numeric_literals;
use std::error::Error;
use surfem_optimize::calculus::{DifferentiableVectorFunction, VectorFunction};
use surfem_optimize::newton::*;

struct MockLinearVectorFunction;

#[replace_numeric_literals(f64::from(literal))]
fn mock_matrix() -> Matrix3<f64> {
    Matrix3::new(5, 1, 2, 1, 4, 2, 2, 2, 4)
}

impl VectorFunction<f64> for MockLinearVectorFunction {
    fn dimension(&self) -> usize {
        3
    }

    fn eval_into(&mut self, f: &mut DVectorViewMut<f64>, x: &DVectorView<f64>) -> Result<(), Box<dyn Error>> {
        let b = Vector3::new(1.0, 2.0, 3.0);
        let r = mock_matrix() * x - b;
        f.copy_from(&r);
        Ok(())
    }
}

impl DifferentiableVectorFunction<f64> for MockLinearVectorFunction {
    fn solve_jacobian_system(
        &mut self,
        sol: &mut DVectorViewMut<f64>,
        _x: &DVectorView<f64>,
        rhs: &DVectorView<f64>,
    ) -> Result<(), Box<dyn Error>> {
        let a_inv = mock_matrix().try_inverse().ok_or("matrix must be invertible")?;
        sol.copy_from(&(a_inv * rhs));
        Ok(())
    }
}

/// F(x) = x^3 - 8 componentwise, with root x = 2.
struct MockCubic;

impl VectorFunction<f64> for MockCubic {
    fn dimension(&self) -> usize {
        2
    }

    fn eval_into(&mut self, f: &mut DVectorViewMut<f64>, x: &DVectorView<f64>) -> Result<(), Box<dyn Error>> {
        for i in 0..2 {
            f[i] = x[i].powi(3) - 8.0;
        }
        Ok(())
    }
}

impl DifferentiableVectorFunction<f64> for MockCubic {
    fn solve_jacobian_system(
        &mut self,
        sol: &mut DVectorViewMut<f64>,
        x: &DVectorView<f64>,
        rhs: &DVectorView<f64>,
    ) -> Result<(), Box<dyn Error>> {
        for i in 0..2 {
            sol[i] = rhs[i] / (3.0 * x[i] * x[i]);
        }
        Ok(())
    }
}

/// A function whose evaluation always fails.
struct FailingFunction;

impl VectorFunction<f64> for FailingFunction {
    fn dimension(&self) -> usize {
        1
    }

    fn eval_into(&mut self, _f: &mut DVectorViewMut<f64>, _x: &DVectorView<f64>) -> Result<(), Box<dyn Error>> {
        Err(Box::from("evaluation failed"))
    }
}

impl DifferentiableVectorFunction<f64> for FailingFunction {
    fn solve_jacobian_system(
        &mut self,
        _sol: &mut DVectorViewMut<f64>,
        _x: &DVectorView<f64>,
        _rhs: &DVectorView<f64>,
    ) -> Result<(), Box<dyn Error>> {
        unreachable!()
    }
}

#[test]
fn newton_converges_in_single_iteration_for_linear_system() {
    let expected_solution = Vector3::new(-0.125, 0.16666667, 0.72916667);

    let settings = NewtonSettings {
        max_iterations: Some(2),
        tolerance: Vector3::new(1.0, 2.0, 3.0).norm() * 1e-6,
    };

    let mut f = DVector::zeros(3);
    let mut x = DVector::zeros(3);
    let mut dx = DVector::zeros(3);

    let iterations =
        newton(MockLinearVectorFunction, &mut x, &mut f, &mut dx, settings).expect("Newton iterations must succeed");
    let diff = x - expected_solution;
    assert!(diff.norm() < 1e-6);
    assert_eq!(iterations, 1);
}

#[test]
fn newton_with_backtracking_converges_for_cubic() {
    let settings = NewtonSettings {
        max_iterations: Some(50),
        tolerance: 1e-12,
    };

    let mut f = DVector::zeros(2);
    let mut x = DVector::from_column_slice(&[1.0, 5.0]);
    let mut dx = DVector::zeros(2);

    newton_line_search(MockCubic, &mut x, &mut f, &mut dx, settings, &mut BacktrackingLineSearch::default())
        .expect("Newton iterations must succeed");
    assert!((x[0] - 2.0).abs() < 1e-12);
    assert!((x[1] - 2.0).abs() < 1e-12);
}

#[test]
fn newton_reports_maximum_iterations() {
    let settings = NewtonSettings {
        max_iterations: Some(1),
        tolerance: 1e-14,
    };

    let mut f = DVector::zeros(2);
    let mut x = DVector::from_column_slice(&[1.0, 5.0]);
    let mut dx = DVector::zeros(2);

    let result = newton(MockCubic, &mut x, &mut f, &mut dx, settings);
    assert!(matches!(result, Err(NewtonError::MaximumIterationsReached(1))));
    // One step has been taken, and the residual corresponds to the final iterate
    assert!((x[0] - 1.0).abs() > 1e-3);
    assert!((f[0] - (x[0].powi(3) - 8.0)).abs() < 1e-12);
}

#[test]
fn newton_propagates_function_errors() {
    let settings = NewtonSettings {
        max_iterations: None,
        tolerance: 1e-8,
    };

    let mut f = DVector::zeros(1);
    let mut x = DVector::zeros(1);
    let mut dx = DVector::zeros(1);

    let result = newton(FailingFunction, &mut x, &mut f, &mut dx, settings);
    assert!(matches!(result, Err(NewtonError::FunctionError(_))));
}
