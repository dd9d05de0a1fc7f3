// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # NEWUOA
//!
//! Powell's trust-region method for unconstrained minimization without
//! derivatives. A quadratic model interpolating the objective at `npt`
//! points is maintained throughout; each iteration either takes a
//! trust-region step to reduce the objective or a geometry step to keep the
//! interpolation set well poised, and the pair of radii `(delta, rho)`
//! controls the resolution of the search.
//!
//! ## Reference
//!
//! M. J. D. Powell (2006). The NEWUOA software for unconstrained
//! optimization without derivatives. In: Large-Scale Nonlinear
//! Optimization, Springer, pp. 255-297.

mod geometry;
mod hmatrix;
mod initialize;
mod math;
mod model;
mod trustregion;

use crate::core::{
    CostFunction, Error, ExitStatus, IterState, NewuoaFloat, Problem, Solver, State,
    TerminationStatus, KV,
};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use self::geometry::geostep;
use self::hmatrix::HMatrix;
use self::initialize::initialize;
use self::math::{dist_sq, norm, norm_sq};
use self::model::Model;
use self::trustregion::trsapp;

/// What the driver does with the rest of an iteration once the trust-region
/// step has been dealt with. At most one of the geometry and resolution
/// branches is ever taken.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum NextAction {
    /// Proceed to the next trust-region step.
    Continue,
    /// Replace the farthest interpolation point to improve poisedness.
    ImproveGeo,
    /// Lower the resolution bound rho.
    ReduceRho,
}

/// Evaluates the objective at `x` and classifies terminal conditions:
/// NaN in `x`, NaN or +Inf from the objective, the target value, and the
/// evaluation budget, in that order.
pub(crate) fn evaluate<O, F>(
    problem: &mut Problem<O>,
    x: &Vec<F>,
    maxfun: u64,
    ftarget: F,
) -> Result<(F, Option<ExitStatus>), Error>
where
    O: CostFunction<Param = Vec<F>, Output = F>,
    F: NewuoaFloat,
{
    if x.iter().any(|xi| xi.is_nan()) {
        return Ok((F::nan(), Some(ExitStatus::NanInput)));
    }
    let f = problem.cost(x)?;
    if f.is_nan() || (f.is_infinite() && f.is_sign_positive()) {
        return Ok((f, Some(ExitStatus::NanInfF)));
    }
    if f <= ftarget {
        return Ok((f, Some(ExitStatus::FtargetReached)));
    }
    if problem.cost_count() >= maxfun {
        return Ok((f, Some(ExitStatus::MaxfunReached)));
    }
    Ok((f, None))
}

/// # NEWUOA
///
/// Derivative-free unconstrained minimization by trust regions over a
/// quadratic interpolation model.
///
/// The number of interpolation conditions `npt` defaults to `2n + 1` and
/// must stay within `[n + 2, (n + 1)(n + 2) / 2]`. The pair
/// `(rho_beg, rho_end)` brackets the resolution of the search: `rho_beg`
/// should be about a tenth of the expected distance from the initial guess
/// to the solution, `rho_end` the requested final accuracy in the
/// variables.
///
/// ## Requirements on the optimization problem
///
/// The optimization problem is required to implement
/// [`CostFunction`](`crate::core::CostFunction`). No gradients are used.
///
/// ## Example
///
/// ```
/// # use newuoa::core::Error;
/// use newuoa::solver::newuoa::Newuoa;
///
/// # fn main() -> Result<(), Error> {
/// let solver: Newuoa<f64> = Newuoa::new()
///     .with_rho(0.5, 1e-8)?
///     .with_npt(5)
///     .with_max_fun(2000);
/// # Ok(())
/// # }
/// ```
///
/// ## Reference
///
/// M. J. D. Powell (2006). The NEWUOA software for unconstrained
/// optimization without derivatives. In: Large-Scale Nonlinear
/// Optimization, Springer, pp. 255-297.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct Newuoa<F> {
    /// Number of interpolation conditions; `2n + 1` when not set.
    npt: Option<usize>,
    /// Initial value of the trust region radius lower bound.
    rho_beg: F,
    /// Final value of the trust region radius lower bound.
    rho_end: F,
    /// Ratio threshold below which a step counts as a failure.
    eta1: F,
    /// Ratio threshold above which the radius is expanded.
    eta2: F,
    /// Radius contraction factor.
    gamma1: F,
    /// Radius expansion factor.
    gamma2: F,
    /// Cap on objective evaluations; `500 n` when not set.
    max_fun: Option<u64>,

    /// Interpolation set and quadratic model of the current run.
    model: Option<Model<F>>,
    /// Inverse KKT matrix of the current run.
    hmat: Option<HMatrix<F>>,
    /// Current trust region radius.
    delta: F,
    /// Current lower bound on the trust region radius.
    rho: F,
    /// The three most recent step lengths at the current rho.
    dnormsav: [F; 3],
    /// The three most recent model prediction errors at the current rho.
    moderrsav: [F; 3],
    /// Counter of consecutive poor iterations feeding the
    /// alternative-model test.
    itest: usize,
    /// Resolved evaluation budget of the current run.
    maxfun_run: u64,
}

impl<F> Default for Newuoa<F>
where
    F: NewuoaFloat,
{
    fn default() -> Self {
        Newuoa::new()
    }
}

impl<F> Newuoa<F>
where
    F: NewuoaFloat,
{
    /// Construct a new instance of [`Newuoa`] with the default parameters
    /// of the reference implementation.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::solver::newuoa::Newuoa;
    /// let nw: Newuoa<f64> = Newuoa::new();
    /// ```
    pub fn new() -> Self {
        Newuoa {
            npt: None,
            rho_beg: float!(1.0),
            rho_end: float!(1e-6),
            eta1: float!(0.1),
            eta2: float!(0.7),
            gamma1: float!(0.5),
            gamma2: float!(2.0),
            max_fun: None,
            model: None,
            hmat: None,
            delta: F::nan(),
            rho: F::nan(),
            dnormsav: [F::infinity(); 3],
            moderrsav: [F::infinity(); 3],
            itest: 0,
            maxfun_run: 0,
        }
    }

    /// Set the initial and final lower bounds on the trust region radius.
    ///
    /// `rho_beg` is also the sampling radius of the initial interpolation
    /// set. Requires `rho_beg >= rho_end > 0`; defaults to `(1.0, 1e-6)`.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::solver::newuoa::Newuoa;
    /// # use newuoa::core::Error;
    /// # fn main() -> Result<(), Error> {
    /// let nw: Newuoa<f64> = Newuoa::new().with_rho(0.5, 1e-8)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_rho(mut self, rho_beg: F, rho_end: F) -> Result<Self, Error> {
        if !(rho_end > F::zero()) || rho_beg < rho_end {
            return Err(newuoa_error!(
                InvalidParameter,
                "`Newuoa`: rho_beg >= rho_end > 0 is required."
            ));
        }
        self.rho_beg = rho_beg;
        self.rho_end = rho_end;
        Ok(self)
    }

    /// Set the number of interpolation conditions.
    ///
    /// Must lie in `[n + 2, (n + 1)(n + 2) / 2]`, which is checked once the
    /// dimension is known. Defaults to `2n + 1`, the recommended value.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::solver::newuoa::Newuoa;
    /// let nw: Newuoa<f64> = Newuoa::new().with_npt(7);
    /// ```
    #[must_use]
    pub fn with_npt(mut self, npt: usize) -> Self {
        self.npt = Some(npt);
        self
    }

    /// Set the acceptance thresholds on the reduction ratio.
    ///
    /// A step with ratio at most `eta1` shrinks the radius, one above
    /// `eta2` may expand it. Requires `0 <= eta1 <= eta2 < 1`; defaults to
    /// `(0.1, 0.7)`.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::solver::newuoa::Newuoa;
    /// # use newuoa::core::Error;
    /// # fn main() -> Result<(), Error> {
    /// let nw: Newuoa<f64> = Newuoa::new().with_eta(0.25, 0.75)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_eta(mut self, eta1: F, eta2: F) -> Result<Self, Error> {
        if eta1 < F::zero() || eta2 < eta1 || !(eta2 < F::one()) {
            return Err(newuoa_error!(
                InvalidParameter,
                "`Newuoa`: 0 <= eta1 <= eta2 < 1 is required."
            ));
        }
        self.eta1 = eta1;
        self.eta2 = eta2;
        Ok(self)
    }

    /// Set the trust region contraction and expansion factors.
    ///
    /// Requires `0 < gamma1 < 1 < gamma2`; defaults to `(0.5, 2.0)`, which
    /// reproduces the radius schedule of the reference implementation.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::solver::newuoa::Newuoa;
    /// # use newuoa::core::Error;
    /// # fn main() -> Result<(), Error> {
    /// let nw: Newuoa<f64> = Newuoa::new().with_gamma(0.25, 4.0)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_gamma(mut self, gamma1: F, gamma2: F) -> Result<Self, Error> {
        if !(gamma1 > F::zero()) || !(gamma1 < F::one()) || !(gamma2 > F::one()) {
            return Err(newuoa_error!(
                InvalidParameter,
                "`Newuoa`: 0 < gamma1 < 1 < gamma2 is required."
            ));
        }
        self.gamma1 = gamma1;
        self.gamma2 = gamma2;
        Ok(self)
    }

    /// Set the cap on objective evaluations. Defaults to `500 n`.
    ///
    /// # Example
    ///
    /// ```
    /// # use newuoa::solver::newuoa::Newuoa;
    /// let nw: Newuoa<f64> = Newuoa::new().with_max_fun(2000);
    /// ```
    #[must_use]
    pub fn with_max_fun(mut self, max_fun: u64) -> Self {
        self.max_fun = Some(max_fun);
        self
    }

    /// Snap the radius up to rho when it falls within 1.5 rho, keeping
    /// `delta >= rho` and preventing the radius from starving the geometry
    /// logic through repeated contractions.
    fn snap_delta(&mut self) {
        if self.delta <= float!(1.5) * self.rho {
            self.delta = self.rho;
        }
    }

    fn push_history(&mut self, dnorm: F, moderr: F) {
        self.dnormsav = [self.dnormsav[1], self.dnormsav[2], dnorm];
        self.moderrsav = [self.moderrsav[1], self.moderrsav[2], moderr];
    }

    fn clear_history(&mut self) {
        self.dnormsav = [F::infinity(); 3];
        self.moderrsav = [F::infinity(); 3];
    }

    /// Index of the interpolation point to drop for the trust-region trial
    /// point, by the weighted denominator rule. Returns `None` when no
    /// candidate qualifies (only possible without an objective
    /// improvement).
    fn setdrop_tr(
        &self,
        model: &Model<F>,
        hmat: &HMatrix<F>,
        vlag: &[F],
        beta: F,
        ximproved: bool,
    ) -> Option<usize> {
        let rho_guess = (float!(0.1) * self.delta).max(self.rho);
        let rhosq = rho_guess * rho_guess;
        let xopt = model.xopt();

        let mut knew = None;
        let mut detrat = if ximproved { F::zero() } else { F::one() };
        for k in 0..model.npt() {
            if !ximproved && k == model.kopt {
                continue;
            }
            let hdiag = hmat.omega_diag(k);
            let mut score = (beta * hdiag + vlag[k] * vlag[k]).abs();
            let distsq = dist_sq(&model.xpt[k], xopt);
            if distsq > rhosq {
                score = score * (distsq / rhosq).powi(3);
            }
            if score > detrat {
                detrat = score;
                knew = Some(k);
            }
        }
        knew
    }

    /// The alternative-model test: after a trust-region step with a poor
    /// ratio, count iterations in which the current model gradient is far
    /// larger than that of the least-Frobenius-norm interpolant; on the
    /// third one in a row, swap the model. Uses the signed ratio, not its
    /// magnitude.
    fn try_alt_model(&mut self, model: &mut Model<F>, hmat: &HMatrix<F>, ratio: F) {
        if ratio > float!(1e-2) {
            self.itest = 0;
            return;
        }
        let (gq_alt, pq_alt) = model.alt_model(hmat);
        let gisq = norm_sq(&model.grad_at_opt_of(&gq_alt, &pq_alt));
        let gqsq = norm_sq(&model.gopt());
        if gqsq < float!(1e2) * gisq {
            self.itest = 0;
            return;
        }
        self.itest += 1;
        if self.itest >= 3 {
            model.install_alt(gq_alt, pq_alt);
            self.itest = 0;
        }
    }

    #[allow(clippy::type_complexity)]
    fn iterate<O>(
        &mut self,
        problem: &mut Problem<O>,
        mut state: IterState<Vec<F>, F>,
        model: &mut Model<F>,
        hmat: &mut HMatrix<F>,
    ) -> Result<(IterState<Vec<F>, F>, Option<KV>), Error>
    where
        O: CostFunction<Param = Vec<F>, Output = F>,
    {
        let zero = F::zero();
        let half = float!(0.5);
        let tenth = float!(0.1);

        // Defensive scan for a poisoned model before the trust-region
        // solve.
        if model.has_nan() || hmat.has_nan() {
            return Ok((
                state.terminate_with(TerminationStatus::Terminated(ExitStatus::NanModel)),
                None,
            ));
        }

        let rho = self.rho;

        // Trust-region step.
        let (d, crvmin) = trsapp(model, self.delta, float!(1e-2));
        let dnorm = self.delta.min(norm(&d));
        let shortd = dnorm < half * rho;
        let qred = -model.quad_inc(&d);

        // Set when no evaluation takes place; every predicate below treats
        // that as a failed step.
        let mut ratio = -F::one();
        let mut knew_tr = None;

        if shortd {
            // The model predicts a negligible move; shrink the radius and
            // re-solve instead of spending an evaluation.
            self.delta = tenth * self.delta;
            self.snap_delta();
        } else if !(qred > zero) {
            // A full-length step that fails to reduce the model means the
            // subproblem solver has broken down numerically.
            return Ok((
                state.terminate_with(TerminationStatus::Terminated(ExitStatus::TrStepFailed)),
                None,
            ));
        } else {
            let x = model.x_at(&d);
            let (f, signal) = evaluate(problem, &x, self.maxfun_run, state.get_target_cost())?;
            let fopt = model.fopt();
            let moderr = f - fopt + qred;
            self.push_history(dnorm, moderr);

            match signal {
                Some(status @ (ExitStatus::NanInput | ExitStatus::NanInfF)) => {
                    return Ok((
                        state.terminate_with(TerminationStatus::Terminated(status)),
                        None,
                    ));
                }
                Some(status @ ExitStatus::FtargetReached) => {
                    state = state.param(x).cost(f);
                    return Ok((
                        state.terminate_with(TerminationStatus::Terminated(status)),
                        None,
                    ));
                }
                Some(status @ ExitStatus::MaxfunReached) => {
                    if f < fopt {
                        state = state.param(x).cost(f);
                    }
                    return Ok((
                        state.terminate_with(TerminationStatus::Terminated(status)),
                        None,
                    ));
                }
                _ => {}
            }

            ratio = (fopt - f) / qred;
            self.delta = if ratio <= self.eta1 {
                self.gamma1 * self.delta.min(dnorm)
            } else if ratio <= self.eta2 {
                (self.gamma1 * self.delta).max(dnorm)
            } else {
                (self.gamma1 * self.delta).max(self.gamma2 * dnorm)
            };
            self.snap_delta();

            let ximproved = f < fopt;
            if ximproved {
                state = state.param(x.clone()).cost(f);
            }

            let (vlag, beta) = hmat.vlag_beta(&model.xpt, model.xopt(), model.kopt, &d);
            knew_tr = self.setdrop_tr(model, hmat, &vlag, beta, ximproved);
            if let Some(knew) = knew_tr {
                if !hmat.update(knew, &vlag, beta) {
                    return Ok((
                        state.terminate_with(TerminationStatus::Terminated(ExitStatus::NanModel)),
                        None,
                    ));
                }
                let xnew: Vec<F> = model
                    .xopt()
                    .iter()
                    .zip(d.iter())
                    .map(|(&o, &di)| o + di)
                    .collect();
                model.replace_point(knew, xnew, f, moderr, hmat);
                self.try_alt_model(model, hmat, ratio);
            }
        }

        // Indicators for the rest of the iteration.
        let (kfar, max_distsq) = model.max_dist_sq();
        let accurate_mod = self
            .moderrsav
            .iter()
            .all(|e| e.abs() <= float!(0.125) * crvmin * rho * rho)
            && self.dnormsav.iter().all(|dn| *dn <= rho);
        let close_itpset = max_distsq <= float!(4.0) * self.delta * self.delta;
        let adequate_geo = (shortd && accurate_mod) || close_itpset;
        let small_trrad = self.delta.max(dnorm) <= rho;
        let bad_trstep_geo = shortd || !(qred > zero) || ratio <= self.eta1 || knew_tr.is_none();
        let bad_trstep_rho = shortd || !(qred > zero) || ratio <= zero || knew_tr.is_none();

        let improve_geo = bad_trstep_geo && !adequate_geo;
        let reduce_rho = bad_trstep_rho && adequate_geo && small_trrad;
        debug_assert!(!(improve_geo && reduce_rho));
        let action = if improve_geo {
            NextAction::ImproveGeo
        } else if reduce_rho {
            NextAction::ReduceRho
        } else {
            NextAction::Continue
        };

        match action {
            NextAction::ImproveGeo => {
                // Defensive scan for a poisoned model before the geometry
                // step.
                if model.has_nan() || hmat.has_nan() {
                    return Ok((
                        state.terminate_with(TerminationStatus::Terminated(ExitStatus::NanModel)),
                        None,
                    ));
                }

                let delbar = (tenth * max_distsq.sqrt()).min(half * self.delta).max(rho);
                let d = geostep(kfar, delbar, model, hmat);
                let x = model.x_at(&d);
                let (f, signal) =
                    evaluate(problem, &x, self.maxfun_run, state.get_target_cost())?;
                let fopt = model.fopt();
                let moderr = f - fopt - model.quad_inc(&d);
                self.push_history(delbar.min(norm(&d)), moderr);

                match signal {
                    Some(status @ (ExitStatus::NanInput | ExitStatus::NanInfF)) => {
                        return Ok((
                            state.terminate_with(TerminationStatus::Terminated(status)),
                            None,
                        ));
                    }
                    Some(status @ ExitStatus::FtargetReached) => {
                        state = state.param(x).cost(f);
                        return Ok((
                            state.terminate_with(TerminationStatus::Terminated(status)),
                            None,
                        ));
                    }
                    Some(status @ ExitStatus::MaxfunReached) => {
                        if f < fopt {
                            state = state.param(x).cost(f);
                        }
                        return Ok((
                            state.terminate_with(TerminationStatus::Terminated(status)),
                            None,
                        ));
                    }
                    _ => {}
                }

                if f < fopt {
                    state = state.param(x.clone()).cost(f);
                }

                let (vlag, beta) = hmat.vlag_beta(&model.xpt, model.xopt(), model.kopt, &d);
                if !hmat.update(kfar, &vlag, beta) {
                    return Ok((
                        state.terminate_with(TerminationStatus::Terminated(ExitStatus::NanModel)),
                        None,
                    ));
                }
                let xnew: Vec<F> = model
                    .xopt()
                    .iter()
                    .zip(d.iter())
                    .map(|(&o, &di)| o + di)
                    .collect();
                model.replace_point(kfar, xnew, f, moderr, hmat);
            }
            NextAction::ReduceRho => {
                if rho <= self.rho_end {
                    return Ok((
                        state.terminate_with(TerminationStatus::Terminated(
                            ExitStatus::SmallTrRadius,
                        )),
                        None,
                    ));
                }
                let ratio_to_end = rho / self.rho_end;
                let rho_next = if ratio_to_end <= float!(16.0) {
                    self.rho_end
                } else if ratio_to_end <= float!(250.0) {
                    ratio_to_end.sqrt() * self.rho_end
                } else {
                    tenth * rho
                };
                self.delta = (half * rho).max(rho_next);
                self.rho = rho_next;
                self.clear_history();
            }
            NextAction::Continue => {}
        }

        // Re-center the base when the distance of xopt from xbase starts to
        // threaten the accuracy of the bilinear forms.
        if norm_sq(model.xopt()) >= float!(1e3) * self.delta * self.delta {
            model.shift_base(hmat);
        }

        let mut kv = KV::new();
        kv.push("rho", self.rho)
            .push("delta", self.delta)
            .push("ratio", ratio)
            .push("dnorm", dnorm)
            .push("nf", problem.cost_count());
        Ok((state, Some(kv)))
    }
}

impl<O, F> Solver<O, IterState<Vec<F>, F>> for Newuoa<F>
where
    O: CostFunction<Param = Vec<F>, Output = F>,
    F: NewuoaFloat,
{
    fn name(&self) -> &str {
        "NEWUOA"
    }

    fn init(
        &mut self,
        problem: &mut Problem<O>,
        mut state: IterState<Vec<F>, F>,
    ) -> Result<(IterState<Vec<F>, F>, Option<KV>), Error> {
        let x0 = state.take_param().ok_or_else(newuoa_error_closure!(
            NotInitialized,
            concat!(
                "`Newuoa` requires an initial parameter vector. ",
                "Please provide an initial guess via `Executor`s `configure` method."
            )
        ))?;
        let n = x0.len();
        if n == 0 {
            return Err(newuoa_error!(
                InvalidParameter,
                "`Newuoa`: the parameter vector must not be empty."
            ));
        }
        let npt = self.npt.unwrap_or(2 * n + 1);
        if npt < n + 2 || npt > (n + 1) * (n + 2) / 2 {
            return Err(newuoa_error!(
                InvalidParameter,
                "`Newuoa`: npt must be in [n + 2, (n + 1)(n + 2) / 2]."
            ));
        }
        let maxfun = self.max_fun.unwrap_or(500 * n as u64);
        if maxfun <= npt as u64 {
            return Err(newuoa_error!(
                InvalidParameter,
                "`Newuoa`: maxfun must exceed npt."
            ));
        }
        self.maxfun_run = maxfun;
        self.rho = self.rho_beg;
        self.delta = self.rho_beg;
        self.itest = 0;
        self.clear_history();

        let out = initialize(
            problem,
            &x0,
            self.rho_beg,
            npt,
            maxfun,
            state.get_target_cost(),
        )?;

        state = match out.status {
            None => state.param(out.model.best_x()).cost(out.model.fopt()),
            Some(status @ (ExitStatus::NanInput | ExitStatus::NanInfF)) => {
                // Preserve the best evaluated point; when the very first
                // evaluation fails there is none, and the initial guess is
                // returned with the sentinel value.
                let (x, f) = out.last.unwrap_or((x0, F::nan()));
                let state = if out.evaluated > 1 {
                    state.param(out.model.best_x()).cost(out.model.fopt())
                } else {
                    state.param(x).cost(f)
                };
                state.terminate_with(TerminationStatus::Terminated(status))
            }
            Some(status @ ExitStatus::FtargetReached) => {
                let (x, f) = out.last.unwrap_or((x0, F::nan()));
                state
                    .param(x)
                    .cost(f)
                    .terminate_with(TerminationStatus::Terminated(status))
            }
            Some(status) => state
                .param(out.model.best_x())
                .cost(out.model.fopt())
                .terminate_with(TerminationStatus::Terminated(status)),
        };

        self.model = Some(out.model);
        self.hmat = Some(out.hmat);

        let kv = kv!(
            "rho_beg" => self.rho_beg;
            "rho_end" => self.rho_end;
            "npt" => npt;
            "maxfun" => maxfun;
        );
        Ok((state, Some(kv)))
    }

    fn next_iter(
        &mut self,
        problem: &mut Problem<O>,
        state: IterState<Vec<F>, F>,
    ) -> Result<(IterState<Vec<F>, F>, Option<KV>), Error> {
        let mut model = self.model.take().ok_or_else(newuoa_error_closure!(
            PotentialBug,
            "`Newuoa`: Model in solver not set."
        ))?;
        let mut hmat = self.hmat.take().ok_or_else(newuoa_error_closure!(
            PotentialBug,
            "`Newuoa`: H matrix in solver not set."
        ))?;
        let res = self.iterate(problem, state, &mut model, &mut hmat);
        self.model = Some(model);
        self.hmat = Some(hmat);
        res
    }

    fn terminate(&mut self, state: &IterState<Vec<F>, F>) -> TerminationStatus {
        // Defensive bound on the number of trust region iterations; normal
        // termination is always through an explicit status.
        if state.get_iter() >= 2 * self.maxfun_run {
            return TerminationStatus::Terminated(ExitStatus::MaxtrReached);
        }
        TerminationStatus::NotTerminated
    }
}
