// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::core::observers::{Observe, ObserverMode, Observers};
use crate::core::{Error, OptimizationResult, Problem, Solver, State};
use web_time::Instant;

/// Solves an optimization problem with a solver
pub struct Executor<O, S, I> {
    /// Solver
    solver: S,
    /// Problem
    problem: Problem<O>,
    /// State
    state: Option<I>,
    /// Storage for observers
    observers: Observers<I>,
    /// Indicates whether to time execution or not
    timer: bool,
}

impl<O, S, I> Executor<O, S, I>
where
    S: Solver<O, I>,
    I: State,
{
    /// Constructs an `Executor` from a user defined problem and a solver.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::core::Executor;
    /// # use newuoa::core::test_utils::{TestProblem, TestSolver};
    /// # let solver = TestSolver::new();
    /// # let problem = TestProblem::new();
    /// let executor = Executor::new(problem, solver);
    /// ```
    pub fn new(problem: O, solver: S) -> Self {
        Executor {
            solver,
            problem: Problem::new(problem),
            state: Some(I::new()),
            observers: Observers::new(),
            timer: true,
        }
    }

    /// This method gives mutable access to the internal state of the executor. This allows for
    /// initializing the state before running the `Executor`, for instance by providing the initial
    /// parameter vector or by setting the target cost.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::core::Executor;
    /// # use newuoa::core::test_utils::{TestProblem, TestSolver};
    /// # let solver = TestSolver::new();
    /// # let problem = TestProblem::new();
    /// let executor = Executor::new(problem, solver)
    ///     .configure(|state| state.param(vec![1.0f64, 1.0]).target_cost(1e-12));
    /// ```
    #[must_use]
    pub fn configure<F: FnOnce(I) -> I>(mut self, init: F) -> Self {
        let state = self.state.take().unwrap();
        let state = init(state);
        self.state = Some(state);
        self
    }

    /// Runs the executor by applying the solver to the optimization problem.
    pub fn run(mut self) -> Result<OptimizationResult<O, S, I>, Error> {
        let total_time = if self.timer {
            Some(Instant::now())
        } else {
            None
        };

        let state = self.state.take().unwrap();

        let (mut state, kv) = self.solver.init(&mut self.problem, state)?;
        state.func_counts(&self.problem);
        state.update();

        if !self.observers.is_empty() {
            let mut logs = kv!("max_iters" => state.get_max_iters(););

            if let Some(mut kv) = kv {
                logs = logs.merge(&mut kv);
            }

            // Observe after init
            self.observers.notify_init(self.solver.name(), &logs)?;
        }

        loop {
            // check first if it has already terminated
            // If it isn't already terminated, evaluate the stopping criteria; calling
            // `terminate_internal` unconditionally could overwrite a termination set
            // within `init()` or `next_iter()`.
            if !state.terminated() {
                let term = self.solver.terminate_internal(&state);
                if term.terminated() {
                    state = state.terminate_with(term);
                }
            }
            if state.terminated() {
                break;
            }

            // Start time measurement
            let start = if self.timer { Some(Instant::now()) } else { None };

            let (state_t, kv) = self.solver.next_iter(&mut self.problem, state)?;
            state = state_t;

            state.func_counts(&self.problem);

            // End time measurement
            let duration = start.map(|start| start.elapsed());

            state.update();

            if !self.observers.is_empty() {
                let mut log = kv.unwrap_or_default();

                if let Some(duration) = duration {
                    log.push("time", duration.as_secs_f64());
                }
                self.observers.notify_iter(&state, &log)?;
            }

            // increment iteration number
            state.increment_iter();

            if self.timer {
                if let Some(total_time) = total_time {
                    state.time(Some(total_time.elapsed()));
                }
            }
        }

        Ok(OptimizationResult::new(self.problem, self.solver, state))
    }

    /// Adds an observer to the executor. Observers are required to implement the
    /// [`Observe`](`crate::core::observers::Observe`) trait.
    /// The parameter `mode` defines the conditions under which the observer will be called. See
    /// [`ObserverMode`](`crate::core::observers::ObserverMode`) for details.
    #[must_use]
    pub fn add_observer<OBS: Observe<I> + 'static>(
        mut self,
        observer: OBS,
        mode: ObserverMode,
    ) -> Self {
        self.observers.push(observer, mode);
        self
    }

    /// Turn timer on or off (default: on)
    #[must_use]
    pub fn timer(mut self, timer: bool) -> Self {
        self.timer = timer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::{TestProblem, TestSolver};
    use crate::core::{ExitStatus, IterState, TerminationStatus};

    #[test]
    fn test_executor_runs_to_max_iters() {
        let problem = TestProblem::new();
        let solver = TestSolver::new();

        let result = Executor::new(problem, solver)
            .configure(|state: IterState<Vec<f64>, f64>| {
                state.param(vec![1.0, 2.0]).max_iters(10)
            })
            .timer(false)
            .run()
            .unwrap();

        assert_eq!(result.state().get_iter(), 10);
        assert_eq!(
            *result.state().get_termination_status(),
            TerminationStatus::Terminated(ExitStatus::MaxtrReached)
        );
    }
}
