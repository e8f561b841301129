use crate::calculus::{DifferentiableVectorFunction, VectorFunction};
use log::debug;
use nalgebra::{DVectorView, DVectorViewMut, RealField, Scalar};
use numeric_literals::replace_float_literals;
use std::error::Error;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NewtonSettings<T> {
    /// `None` iterates until convergence.
    pub max_iterations: Option<usize>,
    pub tolerance: T,
}

#[derive(Debug)]
pub enum NewtonError {
    /// The residual was still above the tolerance after the given number of iterations.
    MaximumIterationsReached(usize),
    /// Solving with the Jacobian failed.
    JacobianError(Box<dyn Error>),
    /// The line search found no acceptable step.
    LineSearchError(Box<dyn Error>),
    /// The function could not be evaluated at the initial iterate.
    FunctionError(Box<dyn Error>),
}

impl fmt::Display for NewtonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewtonError::MaximumIterationsReached(iterations) => {
                write!(f, "No convergence after {} Newton iterations", iterations)
            }
            NewtonError::JacobianError(err) => write!(f, "Jacobian solve failed: {}", err),
            NewtonError::LineSearchError(err) => write!(f, "Line search failed: {}", err),
            NewtonError::FunctionError(err) => write!(f, "Function evaluation failed: {}", err),
        }
    }
}

impl Error for NewtonError {}

/// Solves `F(x) = 0` with full Newton steps.
///
/// See [`newton_line_search`].
pub fn newton<'a, T, F>(
    function: F,
    x: impl Into<DVectorViewMut<'a, T>>,
    f: impl Into<DVectorViewMut<'a, T>>,
    dx: impl Into<DVectorViewMut<'a, T>>,
    settings: NewtonSettings<T>,
) -> Result<usize, NewtonError>
where
    T: RealField + Copy,
    F: DifferentiableVectorFunction<T>,
{
    newton_line_search(function, x, f, dx, settings, &mut NoLineSearch)
}

/// Solves `F(x) = 0` with Newton's method, starting from the initial value of `x`.
///
/// Converged means `|F(x)|_2 <= tolerance`, which is checked before every step, so an initial
/// guess that already satisfies the tolerance takes zero steps. Returns the number of steps.
///
/// On return `f` holds `F(x)` at the final iterate, also when the iteration limit is reached.
/// `dx` is scratch space for the Newton increment.
pub fn newton_line_search<'a, T, F>(
    mut function: F,
    x: impl Into<DVectorViewMut<'a, T>>,
    f: impl Into<DVectorViewMut<'a, T>>,
    dx: impl Into<DVectorViewMut<'a, T>>,
    settings: NewtonSettings<T>,
    line_search: &mut impl LineSearch<T, F>,
) -> Result<usize, NewtonError>
where
    T: RealField + Copy,
    F: DifferentiableVectorFunction<T>,
{
    let (mut x, mut f, mut direction) = (x.into(), f.into(), dx.into());
    assert_eq!(x.nrows(), f.nrows(), "Iterate and residual must have the same dimension");
    assert_eq!(direction.nrows(), f.nrows(), "Increment and residual must have the same dimension");

    function
        .eval_into(&mut f, &DVectorView::from(&x))
        .map_err(NewtonError::FunctionError)?;

    let mut iterations = 0;
    while f.norm() > settings.tolerance {
        if settings.max_iterations == Some(iterations) {
            return Err(NewtonError::MaximumIterationsReached(iterations));
        }

        // J d = F, the step is -d
        function
            .solve_jacobian_system(&mut direction, &DVectorView::from(&x), &DVectorView::from(&f))
            .map_err(NewtonError::JacobianError)?;
        direction.neg_mut();

        let step_length = line_search
            .step(
                &mut function,
                DVectorViewMut::from(&mut f),
                DVectorViewMut::from(&mut x),
                DVectorView::from(&direction),
            )
            .map_err(NewtonError::LineSearchError)?;
        iterations += 1;
        debug!(
            "Newton iteration {}: step length {}, residual norm {}",
            iterations,
            step_length,
            f.norm()
        );
    }

    Ok(iterations)
}

/// Chooses how far to move along a Newton direction.
///
/// Implementations update `x` in place and leave `F(x)` of the accepted iterate in `f`.
pub trait LineSearch<T: Scalar, F: VectorFunction<T>> {
    /// Returns the accepted step length.
    fn step(
        &mut self,
        function: &mut F,
        f: DVectorViewMut<T>,
        x: DVectorViewMut<T>,
        direction: DVectorView<T>,
    ) -> Result<T, Box<dyn Error>>;
}

/// Always takes the full step.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLineSearch;

impl<T, F> LineSearch<T, F> for NoLineSearch
where
    T: RealField + Copy,
    F: VectorFunction<T>,
{
    fn step(
        &mut self,
        function: &mut F,
        mut f: DVectorViewMut<T>,
        mut x: DVectorViewMut<T>,
        direction: DVectorView<T>,
    ) -> Result<T, Box<dyn Error>> {
        x += direction;
        function.eval_into(&mut f, &DVectorView::from(&x))?;
        Ok(T::one())
    }
}

/// Backtracking on the merit function `g(x) = |F(x)|² / 2`.
///
/// A step length `α` is accepted once `g(x + α d) <= (1 - c α) g(x)`, which is the Armijo
/// condition for a direction `d` solving the Newton system. Otherwise `α` is multiplied by
/// `shrink` until it falls below `min_step`.
#[derive(Clone, Copy, Debug)]
pub struct BacktrackingLineSearch {
    pub sufficient_decrease: f64,
    pub shrink: f64,
    pub min_step: f64,
}

impl Default for BacktrackingLineSearch {
    fn default() -> Self {
        Self {
            sufficient_decrease: 1e-4,
            shrink: 0.5,
            min_step: 1e-6,
        }
    }
}

impl<T, F> LineSearch<T, F> for BacktrackingLineSearch
where
    T: RealField + Copy,
    F: VectorFunction<T>,
{
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn step(
        &mut self,
        function: &mut F,
        mut f: DVectorViewMut<T>,
        mut x: DVectorViewMut<T>,
        direction: DVectorView<T>,
    ) -> Result<T, Box<dyn Error>> {
        let from_f64 = |v: f64| T::from_f64(v).ok_or("Line search parameter is not representable");
        let (c, shrink, min_step) = (
            from_f64(self.sufficient_decrease)?,
            from_f64(self.shrink)?,
            from_f64(self.min_step)?,
        );
        let merit_initial = 0.5 * f.norm_squared();

        // x holds x_k + alpha_taken * d at every trial
        let mut alpha_taken = 0.0;
        let mut alpha = 1.0;
        loop {
            x.axpy(alpha - alpha_taken, &direction, 1.0);
            alpha_taken = alpha;
            function.eval_into(&mut f, &DVectorView::from(&x))?;

            if 0.5 * f.norm_squared() <= (1.0 - c * alpha) * merit_initial {
                return Ok(alpha);
            }
            alpha *= shrink;
            if alpha < min_step {
                return Err(Box::from(format!(
                    "Step length {} fell below the minimum of {} without sufficient decrease",
                    alpha, min_step
                )));
            }
        }
    }
}
