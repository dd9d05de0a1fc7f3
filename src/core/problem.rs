// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::core::Error;
use std::collections::HashMap;

/// Defines computation of a cost function value
///
/// The implementing type carries whatever context the cost function needs
/// (problem data, buffers, counters behind interior mutability); the solver
/// only ever sees this trait. A cost function is allowed to return NaN or
/// infinity; the solver treats these as a terminal condition and returns the
/// best point found so far instead of propagating an error.
///
/// # Example
///
/// ```
/// use newuoa::core::{CostFunction, Error};
///
/// struct Rosenbrock {}
///
/// impl CostFunction for Rosenbrock {
///     type Param = Vec<f64>;
///     type Output = f64;
///
///     fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
///         Ok(argmin_testfunctions::rosenbrock(p))
///     }
/// }
/// ```
pub trait CostFunction {
    /// Type of the parameter vector
    type Param;
    /// Type of the return value of the cost function
    type Output;

    /// Compute cost function
    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error>;
}

/// Wrapper around problems defined by users.
///
/// Keeps track of how many times the cost function has been called. It is
/// used to pass the problem from one iteration of a solver to the next and
/// is the source of the evaluation counter `nf`.
#[derive(Clone, Debug, Default)]
pub struct Problem<O> {
    /// Problem defined by user
    pub problem: Option<O>,
    /// Keeps track of how often methods of `problem` have been called.
    pub counts: HashMap<&'static str, u64>,
}

impl<O> Problem<O> {
    /// Wraps a problem into an instance of `Problem`.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::core::Problem;
    /// # #[derive(Eq, PartialEq, Debug)]
    /// # struct UserDefinedProblem {}
    /// let wrapped_problem = Problem::new(UserDefinedProblem {});
    /// ```
    pub fn new(problem: O) -> Self {
        Problem {
            problem: Some(problem),
            counts: HashMap::new(),
        }
    }

    /// Gives access to the stored `problem` via the closure `func` and keeps track of how many
    /// times the function has been called. The function counts will be passed to observers labeled
    /// with `counts_string`. Per convention, `counts_string` is chosen as `<something>_count`.
    pub fn problem<T, F: FnOnce(&O) -> Result<T, Error>>(
        &mut self,
        counts_string: &'static str,
        func: F,
    ) -> Result<T, Error> {
        let count = self.counts.entry(counts_string).or_insert(0);
        *count += 1;
        func(self.problem.as_ref().unwrap())
    }

    /// Returns the internally stored problem and replaces it with `None`.
    pub fn take_problem(&mut self) -> Option<O> {
        self.problem.take()
    }

    /// Returns the number of cost function evaluations performed so far.
    pub fn cost_count(&self) -> u64 {
        self.counts.get("cost_count").copied().unwrap_or(0)
    }
}

impl<O: CostFunction> Problem<O> {
    /// Evaluates the cost function at `param` and increments the evaluation
    /// count.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::core::{CostFunction, Error, Problem};
    /// # use newuoa::core::test_utils::TestProblem;
    /// # fn main() -> Result<(), Error> {
    /// # let mut problem = Problem::new(TestProblem::new());
    /// # let param = vec![2.0f64, 1.0f64];
    /// let cost = problem.cost(&param)?;
    /// # assert_eq!(problem.counts["cost_count"], 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn cost(&mut self, param: &O::Param) -> Result<O::Output, Error> {
        self.problem("cost_count", |problem| problem.cost(param))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::TestProblem;

    send_sync_test!(problem, Problem<TestProblem>);

    #[test]
    fn test_cost_count() {
        let mut problem = Problem::new(TestProblem::new());
        assert_eq!(problem.cost_count(), 0);
        for i in 1..4 {
            let _ = problem.cost(&vec![1.0f64, 2.0]).unwrap();
            assert_eq!(problem.cost_count(), i);
        }
    }
}
