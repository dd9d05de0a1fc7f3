// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! newuoa is a pure Rust implementation of M. J. D. Powell's NEWUOA algorithm
//! for unconstrained minimization without derivatives.
//!
//! NEWUOA maintains a quadratic model which interpolates the objective
//! function at `npt` points (typically `2n + 1` for `n` variables) and
//! alternates between trust-region steps, which reduce the objective, and
//! geometry steps, which keep the interpolation set well poised. Only
//! function values are required; no gradients, no finite differencing by the
//! caller.
//!
//! The problem is defined by implementing
//! [`CostFunction`](`crate::core::CostFunction`), the solver is driven by an
//! [`Executor`](`crate::core::Executor`), and progress can be watched
//! through [observers](`crate::core::observers`).
//!
//! # Example
//!
//! ```
//! use newuoa::core::{CostFunction, Error, Executor, State};
//! use newuoa::solver::newuoa::Newuoa;
//!
//! struct Sphere {}
//!
//! impl CostFunction for Sphere {
//!     type Param = Vec<f64>;
//!     type Output = f64;
//!
//!     fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
//!         Ok(p.iter().map(|x| x * x).sum())
//!     }
//! }
//!
//! # fn main() -> Result<(), Error> {
//! let solver: Newuoa<f64> = Newuoa::new()
//!     .with_rho(1.0, 1e-6)?
//!     .with_max_fun(500);
//!
//! let res = Executor::new(Sphere {}, solver)
//!     .configure(|state| state.param(vec![3.0, -2.0, 1.0]))
//!     .run()?;
//!
//! assert!(res.state().get_best_cost() < 1e-8);
//! # Ok(())
//! # }
//! ```
//!
//! # Reference
//!
//! M. J. D. Powell (2006). The NEWUOA software for unconstrained
//! optimization without derivatives. In: Large-Scale Nonlinear Optimization,
//! Springer, pp. 255-297.
//!
//! # License
//!
//! Licensed under either of
//!
//!   * Apache License, Version 2.0 (<http://www.apache.org/licenses/LICENSE-2.0>)
//!   * MIT License (<http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![allow(unused_attributes)]
// Explicitly disallow EQ comparison of floats. (This clippy lint is denied by default; however,
// this is just to make sure that it will always stay this way.)
#![deny(clippy::float_cmp)]

#[macro_use]
pub mod core;

/// Solvers
pub mod solver;

#[cfg(test)]
mod tests;
