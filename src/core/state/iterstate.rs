// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::core::{NewuoaFloat, Problem, State, TerminationStatus};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use web_time::Duration;

/// Maintains the state from iteration to iteration of a solver
///
/// Keeps track of
///
/// * parameter vector of current and previous iteration
/// * best parameter vector of current and previous iteration
/// * cost function value of current and previous iteration
/// * current and previous best cost function value
/// * target cost function value
/// * current iteration number
/// * iteration number where the last best parameter vector was found
/// * maximum number of iterations that will be executed
/// * cost function evaluation counts
/// * elapsed time
/// * termination status
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct IterState<P, F> {
    /// Current parameter vector
    pub param: Option<P>,
    /// Previous parameter vector
    pub prev_param: Option<P>,
    /// Current best parameter vector
    pub best_param: Option<P>,
    /// Previous best parameter vector
    pub prev_best_param: Option<P>,
    /// Current cost function value
    pub cost: F,
    /// Previous cost function value
    pub prev_cost: F,
    /// Current best cost function value
    pub best_cost: F,
    /// Previous best cost function value
    pub prev_best_cost: F,
    /// Target cost function value
    pub target_cost: F,
    /// Current iteration
    pub iter: u64,
    /// Iteration number of last best cost
    pub last_best_iter: u64,
    /// Maximum number of iterations
    pub max_iters: u64,
    /// Evaluation counts
    pub counts: HashMap<String, u64>,
    /// Time required so far
    pub time: Option<Duration>,
    /// Status of optimization execution
    pub termination_status: TerminationStatus,
}

impl<P, F> IterState<P, F>
where
    P: Clone,
    F: NewuoaFloat,
{
    /// Set parameter vector. This shifts the stored parameter vector to the previous parameter
    /// vector.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::core::{IterState, State};
    /// # let state: IterState<Vec<f64>, f64> = IterState::new();
    /// let state = state.param(vec![1.0f64, 2.0f64]);
    /// # assert_eq!(state.param.as_ref().unwrap()[0].to_ne_bytes(), 1.0f64.to_ne_bytes());
    /// ```
    #[must_use]
    pub fn param(mut self, param: P) -> Self {
        std::mem::swap(&mut self.prev_param, &mut self.param);
        self.param = Some(param);
        self
    }

    /// Set target cost.
    ///
    /// When this cost is reached, the algorithm will stop with
    /// [`ExitStatus::FtargetReached`](`crate::core::ExitStatus::FtargetReached`).
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::core::{IterState, State};
    /// # let state: IterState<Vec<f64>, f64> = IterState::new();
    /// let state = state.target_cost(1e-12);
    /// # assert_eq!(state.target_cost.to_ne_bytes(), 1e-12f64.to_ne_bytes());
    /// ```
    #[must_use]
    pub fn target_cost(mut self, target_cost: F) -> Self {
        self.target_cost = target_cost;
        self
    }

    /// Set maximum number of iterations
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::core::{IterState, State};
    /// # let state: IterState<Vec<f64>, f64> = IterState::new();
    /// let state = state.max_iters(1000);
    /// # assert_eq!(state.max_iters, 1000);
    /// ```
    #[must_use]
    pub fn max_iters(mut self, iters: u64) -> Self {
        self.max_iters = iters;
        self
    }

    /// Set the current cost function value. This shifts the stored cost function value to the
    /// previous cost function value.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::core::{IterState, State};
    /// # let state: IterState<Vec<f64>, f64> = IterState::new();
    /// let state = state.cost(2.0);
    /// # assert_eq!(state.cost.to_ne_bytes(), 2.0f64.to_ne_bytes());
    /// ```
    #[must_use]
    pub fn cost(mut self, cost: F) -> Self {
        std::mem::swap(&mut self.prev_cost, &mut self.cost);
        self.cost = cost;
        self
    }

    /// Returns the current parameter vector, taking ownership and leaving `None` in its place.
    pub fn take_param(&mut self) -> Option<P> {
        self.param.take()
    }

    /// Returns a reference to the current parameter vector.
    pub fn get_param(&self) -> Option<&P> {
        self.param.as_ref()
    }
}

impl<P, F> State for IterState<P, F>
where
    P: Clone,
    F: NewuoaFloat,
{
    type Param = P;
    type Float = F;

    /// Create a new `IterState` instance
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::core::{IterState, State};
    /// let state: IterState<Vec<f64>, f64> = IterState::new();
    /// ```
    fn new() -> Self {
        IterState {
            param: None,
            prev_param: None,
            best_param: None,
            prev_best_param: None,
            cost: F::infinity(),
            prev_cost: F::infinity(),
            best_cost: F::infinity(),
            prev_best_cost: F::infinity(),
            target_cost: F::neg_infinity(),
            iter: 0,
            last_best_iter: 0,
            max_iters: u64::MAX,
            counts: HashMap::new(),
            time: Some(Duration::new(0, 0)),
            termination_status: TerminationStatus::NotTerminated,
        }
    }

    /// Checks whether the current parameter vector is better than the previous best parameter
    /// vector and updates the best parameter vector and the best cost accordingly.
    ///
    /// A current cost of NaN is considered better than a best cost of NaN
    /// only when no finite best cost was recorded before; this keeps the
    /// "preserve best-so-far" guarantee intact when the very first
    /// evaluation already fails.
    fn update(&mut self) {
        if let Some(param) = self.param.as_ref() {
            if self.cost < self.best_cost
                || (self.best_cost.is_nan() && !self.cost.is_nan())
                || (self.best_param.is_none() && self.best_cost.is_infinite())
            {
                std::mem::swap(&mut self.prev_best_param, &mut self.best_param);
                self.best_param = Some(param.clone());
                std::mem::swap(&mut self.prev_best_cost, &mut self.best_cost);
                self.best_cost = self.cost;
                self.last_best_iter = self.iter;
            }
        }
    }

    fn get_best_param(&self) -> Option<&P> {
        self.best_param.as_ref()
    }

    fn get_max_iters(&self) -> u64 {
        self.max_iters
    }

    fn increment_iter(&mut self) {
        self.iter += 1;
    }

    fn get_iter(&self) -> u64 {
        self.iter
    }

    fn get_cost(&self) -> Self::Float {
        self.cost
    }

    fn get_best_cost(&self) -> Self::Float {
        self.best_cost
    }

    fn get_target_cost(&self) -> Self::Float {
        self.target_cost
    }

    fn func_counts<O>(&mut self, problem: &Problem<O>) {
        for (k, &v) in problem.counts.iter() {
            let count = self.counts.entry(k.to_string()).or_insert(0);
            *count = v
        }
    }

    fn get_func_counts(&self) -> &HashMap<String, u64> {
        &self.counts
    }

    fn terminated(&self) -> bool {
        self.termination_status.terminated()
    }

    fn terminate_with(mut self, termination_status: TerminationStatus) -> Self {
        self.termination_status = termination_status;
        self
    }

    fn get_termination_status(&self) -> &TerminationStatus {
        &self.termination_status
    }

    fn time(&mut self, time: Option<Duration>) -> &mut Self {
        self.time = time;
        self
    }

    fn get_time(&self) -> Option<Duration> {
        self.time
    }

    fn get_last_best_iter(&self) -> u64 {
        self.last_best_iter
    }

    fn is_best(&self) -> bool {
        self.last_best_iter == self.iter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExitStatus;

    send_sync_test!(iterstate, IterState<Vec<f64>, f64>);

    #[test]
    fn test_new() {
        let state: IterState<Vec<f64>, f64> = IterState::new();

        assert!(state.param.is_none());
        assert!(state.best_param.is_none());
        assert_eq!(state.cost.to_ne_bytes(), f64::INFINITY.to_ne_bytes());
        assert_eq!(state.best_cost.to_ne_bytes(), f64::INFINITY.to_ne_bytes());
        assert_eq!(
            state.target_cost.to_ne_bytes(),
            f64::NEG_INFINITY.to_ne_bytes()
        );
        assert_eq!(state.iter, 0);
        assert_eq!(state.max_iters, u64::MAX);
        assert!(!state.terminated());
    }

    #[test]
    fn test_update_tracks_best() {
        let mut state: IterState<Vec<f64>, f64> = IterState::new();
        state = state.param(vec![1.0, 1.0]).cost(10.0);
        state.update();
        assert_eq!(state.best_cost.to_ne_bytes(), 10.0f64.to_ne_bytes());

        state = state.param(vec![2.0, 2.0]).cost(12.0);
        state.update();
        // worse cost must not replace the best
        assert_eq!(state.best_cost.to_ne_bytes(), 10.0f64.to_ne_bytes());
        assert_eq!(state.get_best_param().unwrap()[0].to_ne_bytes(), 1.0f64.to_ne_bytes());

        state = state.param(vec![0.5, 0.5]).cost(3.0);
        state.update();
        assert_eq!(state.best_cost.to_ne_bytes(), 3.0f64.to_ne_bytes());
    }

    #[test]
    fn test_update_nan_first_eval() {
        // A NaN cost on the very first evaluation still yields a well defined
        // best param (the initial point with the NaN sentinel cost).
        let mut state: IterState<Vec<f64>, f64> = IterState::new();
        state = state.param(vec![1.0, 2.0]).cost(f64::NAN);
        state.update();
        assert!(state.get_best_cost().is_nan());
        assert_eq!(state.get_best_param().unwrap()[1].to_ne_bytes(), 2.0f64.to_ne_bytes());
    }

    #[test]
    fn test_terminate_with() {
        let state: IterState<Vec<f64>, f64> = IterState::new();
        let state = state.terminate_with(TerminationStatus::Terminated(ExitStatus::MaxfunReached));
        assert!(state.terminated());
        assert_eq!(
            *state.get_termination_status(),
            TerminationStatus::Terminated(ExitStatus::MaxfunReached)
        );
    }
}
