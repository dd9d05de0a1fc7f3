// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Iteration state
//!
//! The [`IterState`] struct keeps track of everything which evolves from one
//! iteration to the next and is shared between the solver, the executor and
//! the observers. The [`State`] trait is the interface the executor and the
//! observers program against.

mod iterstate;

pub use iterstate::IterState;

use crate::core::{NewuoaFloat, Problem, TerminationStatus};
use std::collections::HashMap;
use web_time::Duration;

/// Minimal interface a state used by the executor and the observers must
/// implement
pub trait State {
    /// Type of the parameter vector
    type Param: Clone;
    /// Floating point precision
    type Float: NewuoaFloat;

    /// Construct a new state with default values
    fn new() -> Self;

    /// This method is called after each iteration and checks if the new parameter vector is better
    /// than the previous one. If so, it will update the current best parameter vector and current
    /// best cost function value.
    fn update(&mut self);

    /// Returns a reference to the best parameter vector
    fn get_best_param(&self) -> Option<&Self::Param>;

    /// Returns maximum number of iterations
    fn get_max_iters(&self) -> u64;

    /// Increment the number of iterations by one
    fn increment_iter(&mut self);

    /// Returns current number of iterations
    fn get_iter(&self) -> u64;

    /// Returns current cost function value
    fn get_cost(&self) -> Self::Float;

    /// Returns best cost function value
    fn get_best_cost(&self) -> Self::Float;

    /// Returns target cost
    fn get_target_cost(&self) -> Self::Float;

    /// Set all function evaluation counts to the evaluation counts of another problem.
    fn func_counts<O>(&mut self, problem: &Problem<O>);

    /// Returns function evaluation counts
    fn get_func_counts(&self) -> &HashMap<String, u64>;

    /// Return whether the algorithm has terminated or not
    fn terminated(&self) -> bool;

    /// Set termination status
    #[must_use]
    fn terminate_with(self, termination_status: TerminationStatus) -> Self;

    /// Returns termination status
    fn get_termination_status(&self) -> &TerminationStatus;

    /// Set time required so far
    fn time(&mut self, time: Option<Duration>) -> &mut Self;

    /// Get time required so far
    fn get_time(&self) -> Option<Duration>;

    /// Returns iteration number where the last best parameter vector was found
    fn get_last_best_iter(&self) -> u64;

    /// Returns whether the current parameter vector is also the best parameter vector found so
    /// far.
    fn is_best(&self) -> bool;
}
