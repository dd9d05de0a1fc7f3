// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! End-to-end runs of the solver on classic test problems.

use crate::core::observers::{Observe, ObserverMode, Stage};
use crate::core::{
    CostFunction, Error, Executor, ExitStatus, IterState, State, TerminationStatus,
};
use crate::solver::newuoa::Newuoa;
use approx::assert_relative_eq;
use std::sync::{Arc, Mutex};

fn nf(state: &IterState<Vec<f64>, f64>) -> u64 {
    state.get_func_counts()["cost_count"]
}

/// Records (rho, delta, ratio) per iteration, for assertions on the radius
/// schedule.
#[derive(Clone)]
struct RadiusTrace {
    data: Arc<Mutex<Vec<(f64, f64, f64)>>>,
}

impl RadiusTrace {
    fn new() -> Self {
        RadiusTrace {
            data: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<I> Observe<I> for RadiusTrace {
    fn observe(&mut self, stage: Stage<'_, I>) -> Result<(), Error> {
        if let Stage::Iter { record, .. } = stage {
            let get = |key: &str| record.get(key).map(|v| v.parse::<f64>().unwrap());
            if let (Some(rho), Some(delta), Some(ratio)) = (get("rho"), get("delta"), get("ratio"))
            {
                self.data.lock().unwrap().push((rho, delta, ratio));
            }
        }
        Ok(())
    }
}

struct Quadratic {
    /// Householder direction defining the rotation `Q = I - 2 v v^T / v^T v`.
    v: Vec<f64>,
    /// Eigenvalues of the Hessian.
    diag: Vec<f64>,
    /// Linear term.
    b: Vec<f64>,
}

impl Quadratic {
    /// Trid-like SPD 5x5 with condition number 100.
    fn trid() -> Self {
        Quadratic {
            v: vec![1.0; 5],
            diag: vec![1.0, 3.0, 10.0, 30.0, 100.0],
            b: vec![1.0; 5],
        }
    }

    fn reflect(&self, x: &[f64]) -> Vec<f64> {
        let vv: f64 = self.v.iter().map(|v| v * v).sum();
        let vx: f64 = self.v.iter().zip(x.iter()).map(|(v, x)| v * x).sum();
        x.iter()
            .zip(self.v.iter())
            .map(|(&xi, &vi)| xi - 2.0 * vx * vi / vv)
            .collect()
    }

    /// `A x` with `A = Q diag Q^T`.
    fn a_mul(&self, x: &[f64]) -> Vec<f64> {
        let mut y = self.reflect(x);
        for (yi, di) in y.iter_mut().zip(self.diag.iter()) {
            *yi *= di;
        }
        self.reflect(&y)
    }

    /// The exact minimizer `A^{-1} b`.
    fn solution(&self) -> Vec<f64> {
        let mut y = self.reflect(&self.b);
        for (yi, di) in y.iter_mut().zip(self.diag.iter()) {
            *yi /= di;
        }
        self.reflect(&y)
    }
}

impl CostFunction for Quadratic {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        let ap = self.a_mul(p);
        let pap: f64 = p.iter().zip(ap.iter()).map(|(x, y)| x * y).sum();
        let bp: f64 = self.b.iter().zip(p.iter()).map(|(x, y)| x * y).sum();
        Ok(0.5 * pap - bp)
    }
}

struct Rosenbrock {}

impl CostFunction for Rosenbrock {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        Ok(argmin_testfunctions::rosenbrock(p))
    }
}

struct PowellSingular {}

impl CostFunction for PowellSingular {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        let (a, b, c, d) = (p[0], p[1], p[2], p[3]);
        Ok((a + 10.0 * b).powi(2)
            + 5.0 * (c - d).powi(2)
            + (b - 2.0 * c).powi(4)
            + 10.0 * (a - d).powi(4))
    }
}

struct Constant {}

impl CostFunction for Constant {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, _p: &Self::Param) -> Result<Self::Output, Error> {
        Ok(42.0)
    }
}

/// Returns NaN on the `at`-th evaluation (1-based), counting calls.
struct NanAtCall {
    at: u64,
    count: Mutex<u64>,
}

impl CostFunction for NanAtCall {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        if *count == self.at {
            Ok(f64::NAN)
        } else {
            Ok(p.iter().map(|x| x * x).sum())
        }
    }
}

#[test]
fn test_trid_quadratic() {
    let problem = Quadratic::trid();
    let solution = problem.solution();
    let solver: Newuoa<f64> = Newuoa::new().with_rho(1.0, 1e-8).unwrap().with_max_fun(500);
    let res = Executor::new(problem, solver)
        .configure(|state| state.param(vec![0.0; 5]))
        .timer(false)
        .run()
        .unwrap();
    let state = res.state();
    assert_eq!(
        *state.get_termination_status(),
        TerminationStatus::Terminated(ExitStatus::SmallTrRadius)
    );
    assert!(nf(state) <= 300);
    let best = state.get_best_param().unwrap();
    for (xi, si) in best.iter().zip(solution.iter()) {
        assert_relative_eq!(xi, si, epsilon = 1e-6);
    }
}

#[test]
fn test_rosenbrock() {
    let solver: Newuoa<f64> = Newuoa::new().with_rho(0.5, 1e-6).unwrap().with_max_fun(500);
    let res = Executor::new(Rosenbrock {}, solver)
        .configure(|state| state.param(vec![-1.2, 1.0]))
        .timer(false)
        .run()
        .unwrap();
    let state = res.state();
    assert_eq!(
        *state.get_termination_status(),
        TerminationStatus::Terminated(ExitStatus::SmallTrRadius)
    );
    let best = state.get_best_param().unwrap();
    assert_relative_eq!(best[0], 1.0, epsilon = 1e-4);
    assert_relative_eq!(best[1], 1.0, epsilon = 1e-4);
}

#[test]
fn test_powell_singular() {
    let solver: Newuoa<f64> = Newuoa::new().with_rho(1.0, 1e-6).unwrap().with_max_fun(2000);
    let res = Executor::new(PowellSingular {}, solver)
        .configure(|state| state.param(vec![3.0, -1.0, 0.0, 1.0]))
        .timer(false)
        .run()
        .unwrap();
    let state = res.state();
    assert!(state.get_best_cost() <= 1e-8);
}

#[test]
fn test_objective_nan_at_first_call() {
    let problem = NanAtCall {
        at: 1,
        count: Mutex::new(0),
    };
    let solver: Newuoa<f64> = Newuoa::new();
    let res = Executor::new(problem, solver)
        .configure(|state| state.param(vec![0.5, 0.5]))
        .timer(false)
        .run()
        .unwrap();
    let state = res.state();
    assert_eq!(
        *state.get_termination_status(),
        TerminationStatus::Terminated(ExitStatus::NanInfF)
    );
    assert_eq!(nf(state), 1);
    // the initial guess is returned together with the sentinel value
    let best = state.get_best_param().unwrap();
    assert_relative_eq!(best[0], 0.5, epsilon = f64::EPSILON);
    assert_relative_eq!(best[1], 0.5, epsilon = f64::EPSILON);
    assert!(state.get_best_cost().is_nan());
}

#[test]
fn test_objective_nan_mid_run() {
    let problem = NanAtCall {
        at: 10,
        count: Mutex::new(0),
    };
    let solver: Newuoa<f64> = Newuoa::new();
    let res = Executor::new(problem, solver)
        .configure(|state| state.param(vec![2.0, -1.0]))
        .timer(false)
        .run()
        .unwrap();
    let state = res.state();
    assert_eq!(
        *state.get_termination_status(),
        TerminationStatus::Terminated(ExitStatus::NanInfF)
    );
    assert_eq!(nf(state), 10);
    // the best value seen before the failure survives
    assert!(state.get_best_cost().is_finite());
}

#[test]
fn test_constant_objective() {
    let n = 3;
    let npt = 2 * n + 1;
    let solver: Newuoa<f64> = Newuoa::new().with_rho(1.0, 1e-4).unwrap();
    let res = Executor::new(Constant {}, solver)
        .configure(|state| state.param(vec![1.0; n]))
        .timer(false)
        .run()
        .unwrap();
    let state = res.state();
    assert_eq!(
        *state.get_termination_status(),
        TerminationStatus::Terminated(ExitStatus::SmallTrRadius)
    );
    assert_relative_eq!(state.get_best_cost(), 42.0, epsilon = f64::EPSILON);
    assert!(nf(state) <= (npt + 3) as u64);
}

#[test]
fn test_maxfun_budget_is_sharp() {
    // budget npt + 1: exactly one evaluation after initialization
    let n = 2;
    let npt = 2 * n + 1;
    let solver: Newuoa<f64> = Newuoa::new()
        .with_rho(1.0, 1e-8)
        .unwrap()
        .with_max_fun((npt + 1) as u64);
    let res = Executor::new(crate::core::test_utils::TestProblem::new(), solver)
        .configure(|state| state.param(vec![3.0, 4.0]))
        .timer(false)
        .run()
        .unwrap();
    let state = res.state();
    assert_eq!(
        *state.get_termination_status(),
        TerminationStatus::Terminated(ExitStatus::MaxfunReached)
    );
    assert_eq!(nf(state), (npt + 1) as u64);
}

#[test]
fn test_ftarget_plus_infinity_triggers_immediately() {
    let solver: Newuoa<f64> = Newuoa::new();
    let res = Executor::new(crate::core::test_utils::TestProblem::new(), solver)
        .configure(|state| state.param(vec![1.0, 1.0]).target_cost(f64::INFINITY))
        .timer(false)
        .run()
        .unwrap();
    let state = res.state();
    assert_eq!(
        *state.get_termination_status(),
        TerminationStatus::Terminated(ExitStatus::FtargetReached)
    );
    assert_eq!(nf(state), 1);
}

#[test]
fn test_ftarget_minus_infinity_never_triggers() {
    let solver: Newuoa<f64> = Newuoa::new().with_rho(1.0, 1e-6).unwrap();
    let res = Executor::new(crate::core::test_utils::TestProblem::new(), solver)
        .configure(|state| state.param(vec![1.0, 1.0]).target_cost(f64::NEG_INFINITY))
        .timer(false)
        .run()
        .unwrap();
    assert_eq!(
        *res.state().get_termination_status(),
        TerminationStatus::Terminated(ExitStatus::SmallTrRadius)
    );
}

#[test]
fn test_radius_schedule_on_exact_quadratic() {
    // the initial model of a separable quadratic is exact: the first
    // trust-region step must have ratio close to one and expand the radius,
    // and rho must march down monotonically to rho_end
    let trace = RadiusTrace::new();
    let data = trace.data.clone();
    let rho_end = 1e-6;
    let solver: Newuoa<f64> = Newuoa::new().with_rho(1.0, rho_end).unwrap();
    let res = Executor::new(crate::core::test_utils::TestProblem::new(), solver)
        .configure(|state| state.param(vec![3.0, -2.0]))
        .add_observer(trace, ObserverMode::EveryIter)
        .timer(false)
        .run()
        .unwrap();
    assert_eq!(
        *res.state().get_termination_status(),
        TerminationStatus::Terminated(ExitStatus::SmallTrRadius)
    );

    let trace = data.lock().unwrap();
    assert!(!trace.is_empty());
    let (_, first_delta, first_ratio) = trace[0];
    assert_relative_eq!(first_ratio, 1.0, epsilon = 1e-6);
    assert!(first_delta > 1.0);

    let mut prev_rho = f64::INFINITY;
    for &(rho, delta, _) in trace.iter() {
        // rho never increases and stays above its final bound
        assert!(rho <= prev_rho);
        assert!(rho >= rho_end * (1.0 - 1e-12));
        // delta >= rho at every iteration
        assert!(delta >= rho * (1.0 - 1e-12));
        prev_rho = rho;
    }
}
