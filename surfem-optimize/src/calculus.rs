use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut, RealField, Scalar};
use numeric_literals::replace_float_literals;
use std::error::Error;

/// A function `F: R^n -> R^m` whose evaluation may fail.
pub trait VectorFunction<T>
where
    T: Scalar,
{
    fn dimension(&self) -> usize;
    fn eval_into(&mut self, f: &mut DVectorViewMut<T>, x: &DVectorView<T>) -> Result<(), Box<dyn Error>>;
}

impl<T, X> VectorFunction<T> for &mut X
where
    T: Scalar,
    X: VectorFunction<T>,
{
    fn dimension(&self) -> usize {
        X::dimension(self)
    }

    fn eval_into(&mut self, f: &mut DVectorViewMut<T>, x: &DVectorView<T>) -> Result<(), Box<dyn Error>> {
        X::eval_into(self, f, x)
    }
}

pub trait DifferentiableVectorFunction<T>: VectorFunction<T>
where
    T: Scalar,
{
    /// Solves `J(x) sol = rhs`, where `J` is the Jacobian of the function at `x`.
    fn solve_jacobian_system(
        &mut self,
        sol: &mut DVectorViewMut<T>,
        x: &DVectorView<T>,
        rhs: &DVectorView<T>,
    ) -> Result<(), Box<dyn Error>>;
}

impl<T, X> DifferentiableVectorFunction<T> for &mut X
where
    T: Scalar,
    X: DifferentiableVectorFunction<T>,
{
    fn solve_jacobian_system(
        &mut self,
        sol: &mut DVectorViewMut<T>,
        x: &DVectorView<T>,
        rhs: &DVectorView<T>,
    ) -> Result<(), Box<dyn Error>> {
        X::solve_jacobian_system(self, sol, x, rhs)
    }
}

/// Approximates the `m x n` Jacobian of `f` at `x` with central differences of step `h`.
///
/// `f(x, out)` writes the function value into `out`. Every column costs two evaluations, and
/// `x` is perturbed in place, one entry at a time, but holds its original values on return.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn approximate_jacobian_fd<T>(
    m: usize,
    mut f: impl FnMut(DVectorView<T>, DVectorViewMut<T>),
    x: &mut DVector<T>,
    h: T,
) -> DMatrix<T>
where
    T: RealField + Copy,
{
    let mut jacobian = DMatrix::zeros(m, x.len());
    let mut forward = DVector::zeros(m);
    let mut backward = DVector::zeros(m);

    for (j, mut column) in jacobian.column_iter_mut().enumerate() {
        let center = x[j];
        for (offset, value) in [(h, &mut forward), (-h, &mut backward)] {
            x[j] = center + offset;
            f(DVectorView::from(&*x), DVectorViewMut::from(value));
        }
        x[j] = center;
        column.copy_from(&((&forward - &backward) / (2.0 * h)));
    }

    jacobian
}
