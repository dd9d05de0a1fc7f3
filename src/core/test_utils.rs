// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Utilities for testing (mainly used in doc tests)

use crate::core::{CostFunction, Error, IterState, Problem, Solver, KV};

/// Sphere test problem
///
/// Implements [`CostFunction`] with the cost being the squared Euclidean
/// norm of the parameter vector.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub struct TestProblem {}

impl TestProblem {
    /// Construct a new instance of `TestProblem`
    ///
    /// # Example
    ///
    /// ```
    /// use newuoa::core::test_utils::TestProblem;
    ///
    /// let problem = TestProblem::new();
    /// ```
    pub fn new() -> Self {
        TestProblem {}
    }
}

impl CostFunction for TestProblem {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        Ok(p.iter().map(|x| x * x).sum())
    }
}

/// A solver which does nothing but keeping the state as it is. Used for tests.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub struct TestSolver {}

impl TestSolver {
    /// Construct a new instance of `TestSolver`
    ///
    /// # Example
    ///
    /// ```
    /// use newuoa::core::test_utils::TestSolver;
    ///
    /// let solver = TestSolver::new();
    /// ```
    pub fn new() -> Self {
        TestSolver {}
    }
}

impl<O> Solver<O, IterState<Vec<f64>, f64>> for TestSolver {
    fn name(&self) -> &str {
        "TestSolver"
    }

    fn next_iter(
        &mut self,
        _problem: &mut Problem<O>,
        state: IterState<Vec<f64>, f64>,
    ) -> Result<(IterState<Vec<f64>, f64>, Option<KV>), Error> {
        Ok((state, None))
    }
}
