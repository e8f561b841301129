/// Vector function traits and finite-difference approximations
pub mod calculus;
/// Newton's method with different line search strategies
pub mod newton;
