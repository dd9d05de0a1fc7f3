// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Sampling of the first `npt` interpolation points, the initial quadratic
//! model and the closed-form initial H-representation.
//!
//! The pattern is Powell's: the first point sits at `xbase`, points
//! `1..=n` at `+rho_beg` along each coordinate, points `n+1..=2n` at
//! `-rho_beg` (truncated when `npt < 2n + 1`), and any further points have
//! two nonzero coordinates whose signs point toward the lower of the two
//! axial values already seen.

use crate::core::{CostFunction, Error, ExitStatus, NewuoaFloat, Problem};

use super::evaluate;
use super::hmatrix::HMatrix;
use super::model::Model;

/// Everything the driver needs from the initialization phase.
pub(crate) struct InitOutput<F> {
    pub(crate) model: Model<F>,
    pub(crate) hmat: HMatrix<F>,
    /// Terminal condition met during sampling, if any.
    pub(crate) status: Option<ExitStatus>,
    /// Number of points evaluated (equals `npt` when `status` allows the
    /// run to continue).
    pub(crate) evaluated: usize,
    /// The last point evaluated and its value, for terminal bookkeeping.
    pub(crate) last: Option<(Vec<F>, F)>,
}

/// Displacement of the `k`-th initial point from `xbase`.
///
/// Points past `2n` need the objective values of the axial points to pick
/// their signs, which is why `fval` is consulted.
fn place_point<F: NewuoaFloat>(k: usize, n: usize, rhobeg: F, fval: &[F]) -> Vec<F> {
    let mut x = vec![F::zero(); n];
    if k == 0 {
        return x;
    }
    if k <= n {
        x[k - 1] = rhobeg;
    } else if k <= 2 * n {
        x[k - n - 1] = -rhobeg;
    } else {
        // two-coordinate point: recover Powell's (ipt, jpt) pairing
        let itemp = (k - n - 1) / n;
        let mut jpt = k - itemp * n - n;
        let mut ipt = jpt + itemp;
        if ipt > n {
            let tmp = jpt;
            jpt = ipt - n;
            ipt = tmp;
        }
        let (ip, jp) = (ipt - 1, jpt - 1);
        let si = if fval[ip + n + 1] < fval[ip + 1] {
            -rhobeg
        } else {
            rhobeg
        };
        let sj = if fval[jp + n + 1] < fval[jp + 1] {
            -rhobeg
        } else {
            rhobeg
        };
        x[ip] = si;
        x[jp] = sj;
    }
    x
}

/// Fills `hmat` with the closed-form inverse KKT representation of the
/// initial interpolation set held in `xpt`.
pub(crate) fn init_h<F: NewuoaFloat>(hmat: &mut HMatrix<F>, xpt: &[Vec<F>], rhobeg: F) {
    let npt = xpt.len();
    let n = xpt[0].len();
    let rhosq = rhobeg * rhobeg;
    let recip = F::one() / rhosq;
    let reciq = float!(0.5).sqrt() / rhosq;
    let half = float!(0.5);

    for j in 0..n {
        if j < npt - n - 1 {
            // both axial points exist: central-difference rows and a
            // curvature column
            hmat.set_bmat(j + 1, j, half / rhobeg);
            hmat.set_bmat(j + n + 1, j, -half / rhobeg);
            hmat.set_zmat(0, j, -reciq - reciq);
            hmat.set_zmat(j + 1, j, reciq);
            hmat.set_zmat(j + n + 1, j, reciq);
        } else {
            // forward difference only
            hmat.set_bmat(0, j, -F::one() / rhobeg);
            hmat.set_bmat(j + 1, j, F::one() / rhobeg);
            hmat.set_bmat(npt + j, j, -half * rhosq);
        }
    }

    for (k, point) in xpt.iter().enumerate().skip(2 * n + 1) {
        let nonzero: Vec<usize> = (0..n).filter(|&i| point[i].abs() > F::zero()).collect();
        let (ip, jp) = (nonzero[0], nonzero[1]);
        let ka = if point[ip] > F::zero() { ip + 1 } else { ip + n + 1 };
        let kb = if point[jp] > F::zero() { jp + 1 } else { jp + n + 1 };
        let col = k - n - 1;
        hmat.set_zmat(0, col, recip);
        hmat.set_zmat(k, col, recip);
        hmat.set_zmat(ka, col, -recip);
        hmat.set_zmat(kb, col, -recip);
    }
}

/// Builds the initial model coefficients from the sampled values.
fn init_model<F: NewuoaFloat>(model: &mut Model<F>, rhobeg: F) {
    let n = model.n();
    let npt = model.npt();
    let rhosq = rhobeg * rhobeg;
    let two = float!(2.0);
    let fbeg = model.fval[0];

    for j in 0..n {
        let fp = model.fval[j + 1];
        if j < npt - n - 1 {
            let fm = model.fval[j + n + 1];
            model.gq[j] = (fp - fm) / (two * rhobeg);
            model.hq[j][j] = (fp + fm - two * fbeg) / rhosq;
        } else {
            model.gq[j] = (fp - fbeg) / rhobeg;
        }
    }

    for k in 2 * n + 1..npt {
        let point = model.xpt[k].clone();
        let nonzero: Vec<usize> = (0..n).filter(|&i| point[i].abs() > F::zero()).collect();
        let (ip, jp) = (nonzero[0], nonzero[1]);
        let ka = if point[ip] > F::zero() { ip + 1 } else { ip + n + 1 };
        let kb = if point[jp] > F::zero() { jp + 1 } else { jp + n + 1 };
        let value = (fbeg - model.fval[ka] - model.fval[kb] + model.fval[k])
            / (point[ip] * point[jp]);
        model.hq[ip][jp] = value;
        model.hq[jp][ip] = value;
    }
}

/// Samples the first `npt` points, evaluating the objective at each, and
/// assembles the initial model and H-representation.
///
/// Sampling can short-circuit on ftarget, on a NaN input, on NaN/+Inf from
/// the objective, or on exhaustion of `maxfun`; the driver returns the
/// corresponding status immediately.
pub(crate) fn initialize<O, F>(
    problem: &mut Problem<O>,
    x0: &[F],
    rhobeg: F,
    npt: usize,
    maxfun: u64,
    ftarget: F,
) -> Result<InitOutput<F>, Error>
where
    O: CostFunction<Param = Vec<F>, Output = F>,
    F: NewuoaFloat,
{
    let n = x0.len();
    let mut model = Model::new(x0.to_vec(), npt);
    let mut hmat = HMatrix::new(n, npt);

    let mut status = None;
    let mut evaluated = 0;
    let mut last = None;

    for k in 0..npt {
        model.xpt[k] = place_point(k, n, rhobeg, &model.fval);
        let x: Vec<F> = model
            .xbase
            .iter()
            .zip(model.xpt[k].iter())
            .map(|(&b, &p)| b + p)
            .collect();
        let (f, signal) = evaluate(problem, &x, maxfun, ftarget)?;
        evaluated = k + 1;
        last = Some((x, f));
        model.fval[k] = f;
        if matches!(signal, Some(ExitStatus::NanInput) | Some(ExitStatus::NanInfF)) {
            status = signal;
            break;
        }
        if f < model.fval[model.kopt] {
            model.kopt = k;
        }
        if signal.is_some() {
            status = signal;
            break;
        }
    }

    if status.is_none() {
        init_model(&mut model, rhobeg);
        init_h(&mut hmat, &model.xpt, rhobeg);
    }

    Ok(InitOutput {
        model,
        hmat,
        status,
        evaluated,
        last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Quadratic {}

    impl CostFunction for Quadratic {
        type Param = Vec<f64>;
        type Output = f64;

        fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
            Ok(p[0] * p[0] + 2.0 * p[1] * p[1] + 0.5 * p[0] * p[1] + 3.0 * p[0] - p[1] + 7.0)
        }
    }

    fn run_init(npt: usize) -> InitOutput<f64> {
        let mut problem = Problem::new(Quadratic {});
        initialize(&mut problem, &[0.5, -0.5], 1.0, npt, 1000, f64::NEG_INFINITY).unwrap()
    }

    #[test]
    fn test_initial_model_interpolates() {
        for npt in [4, 5, 6] {
            let out = run_init(npt);
            assert!(out.status.is_none());
            assert_eq!(out.evaluated, npt);
            let model = out.model;
            let fopt = model.fopt();
            for k in 0..npt {
                let d: Vec<f64> = model.xpt[k]
                    .iter()
                    .zip(model.xopt().iter())
                    .map(|(a, b)| a - b)
                    .collect();
                assert_relative_eq!(
                    fopt + model.quad_inc(&d),
                    model.fval[k],
                    epsilon = 1e-10 * (1.0 + model.fval[k].abs())
                );
            }
        }
    }

    #[test]
    fn test_initial_h_lagrange_property() {
        for npt in [4, 5, 6] {
            let out = run_init(npt);
            let (model, hmat) = (out.model, out.hmat);
            for j in 0..npt {
                let d: Vec<f64> = model.xpt[j]
                    .iter()
                    .zip(model.xopt().iter())
                    .map(|(a, b)| a - b)
                    .collect();
                let (vlag, _) = hmat.vlag_beta(&model.xpt, model.xopt(), model.kopt, &d);
                for (k, &v) in vlag.iter().take(npt).enumerate() {
                    let expected = if k == j { 1.0 } else { 0.0 };
                    assert_relative_eq!(v, expected, epsilon = 1e-8);
                }
            }
        }
    }

    #[test]
    fn test_kopt_points_to_minimum() {
        let out = run_init(5);
        let model = out.model;
        for &f in model.fval.iter() {
            assert!(model.fopt() <= f);
        }
    }

    #[test]
    fn test_ftarget_short_circuit() {
        let mut problem = Problem::new(Quadratic {});
        // every value of this objective is >= 0 + offset; a huge target
        // triggers on the very first evaluation
        let out = initialize(&mut problem, &[0.5, -0.5], 1.0, 5, 1000, f64::INFINITY).unwrap();
        assert_eq!(out.status, Some(ExitStatus::FtargetReached));
        assert_eq!(out.evaluated, 1);
    }

    #[test]
    fn test_maxfun_short_circuit() {
        let mut problem = Problem::new(Quadratic {});
        let out = initialize(&mut problem, &[0.5, -0.5], 1.0, 5, 3, f64::NEG_INFINITY).unwrap();
        assert_eq!(out.status, Some(ExitStatus::MaxfunReached));
        assert_eq!(out.evaluated, 3);
    }

    struct NanAtOrigin {}

    impl CostFunction for NanAtOrigin {
        type Param = Vec<f64>;
        type Output = f64;

        fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
            if p.iter().all(|&x| x.abs() < 1e-12) {
                Ok(f64::NAN)
            } else {
                Ok(p.iter().map(|x| x * x).sum())
            }
        }
    }

    #[test]
    fn test_nan_on_first_eval() {
        let mut problem = Problem::new(NanAtOrigin {});
        let out = initialize(&mut problem, &[0.0, 0.0], 1.0, 5, 1000, f64::NEG_INFINITY).unwrap();
        assert_eq!(out.status, Some(ExitStatus::NanInfF));
        assert_eq!(out.evaluated, 1);
        let (_, f) = out.last.unwrap();
        assert!(f.is_nan());
    }
}
