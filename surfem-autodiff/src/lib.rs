//! Reverse-mode automatic differentiation tailored to element-local assembly.
//!
//! A [`Tape`] records every arithmetic operation performed on [`Var`]s that descend from
//! an independent variable. Once the local residual has been computed, the exact Jacobian of
//! the residual with respect to the independent variables is extracted with one reverse sweep
//! per residual entry.
//!
//! The tape is an explicit value rather than global state: every variable borrows the tape it
//! was recorded on, so the borrow checker rejects any attempt to clear or drop a tape while
//! variables recorded on it are still alive.
//!
//! ```
//! use surfem_autodiff::Tape;
//!
//! let tape = Tape::new();
//! let x = tape.independents(&[2.0, 3.0]);
//! let f = [x[0] * x[1], x[0] * x[0] + 1.0];
//! let jacobian = tape.jacobian(&f, &x);
//! assert_eq!(jacobian[(0, 0)], 3.0);
//! assert_eq!(jacobian[(0, 1)], 2.0);
//! assert_eq!(jacobian[(1, 0)], 4.0);
//! assert_eq!(jacobian[(1, 1)], 0.0);
//! ```

mod real;
mod tape;
mod var;

pub use real::Real;
pub use tape::Tape;
pub use var::Var;
