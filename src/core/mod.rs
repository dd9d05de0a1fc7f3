// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Core toolbox
//!
//! This module contains the traits and types necessary for running the
//! solver and for observing the state of an optimization run: the problem
//! wrapper which counts function evaluations, the iteration state, the
//! executor, observers, errors and termination handling.

/// Macros
#[macro_use]
pub mod macros;
/// Error handling
mod errors;
/// Executor
mod executor;
/// Trait alias for float types
mod float;
/// Key value datastructure
mod kv;
/// Observers
pub mod observers;
/// Traits and structs for defining and handling optimization problems
mod problem;
/// Definition of the return type of the solvers
mod result;
/// `Solver` trait
mod solver;
/// Iteration state
mod state;
/// Definition of exit statuses and termination
mod termination;
/// Utilities for testing
pub mod test_utils;

pub use anyhow::Error;
pub use errors::NewuoaError;
pub use executor::Executor;
pub use float::{NewuoaFloat, SerializeAlias};
pub use kv::KV;
pub use observers::{Observe, ObserverMode, Observers, Stage};
pub use problem::{CostFunction, Problem};
pub use result::OptimizationResult;
pub use solver::Solver;
pub use state::{IterState, State};
pub use termination::{ExitStatus, TerminationStatus};
