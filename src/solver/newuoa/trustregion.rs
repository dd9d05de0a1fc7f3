// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Approximate solution of the trust region subproblem by truncated
//! conjugate gradients.
//!
//! Minimizes the quadratic model around `xopt` subject to `||d|| <= delta`.
//! Along the way the least positive curvature `s^T H s / s^T s` of the
//! search directions is recorded; it is reported as `crvmin`, with the
//! convention that `crvmin = 0` whenever the boundary was reached or
//! non-positive curvature was encountered, so that callers can only rely on
//! a strictly positive value when the model was convex on the explored
//! subspace.
//!
//! ## Reference
//!
//! Jorge Nocedal and Stephen J. Wright (2006). Numerical Optimization.
//! Springer. ISBN 0-387-30303-0.

use crate::core::NewuoaFloat;

use super::math::{dot, norm_sq};
use super::model::Model;

/// Step length to the trust region boundary from `d` along `s`.
fn boundary_tau<F: NewuoaFloat>(d: &[F], s: &[F], delta: F) -> F {
    let dd = norm_sq(d);
    let ds = dot(d, s);
    let ss = norm_sq(s);
    let discriminant = (ds * ds + ss * (delta * delta - dd)).max(F::zero());
    (discriminant.sqrt() - ds) / ss
}

/// Truncated conjugate gradient solver for the trust region subproblem.
///
/// Returns the step `d` with `||d|| <= delta` and `crvmin`.
///
/// The iteration stops at the boundary, on non-positive curvature, after
/// `n` inner steps, or when the squared gradient norm has dropped below
/// `tol^2` times its initial value.
pub(crate) fn trsapp<F: NewuoaFloat>(model: &Model<F>, delta: F, tol: F) -> (Vec<F>, F) {
    let n = model.n();
    let zero = F::zero();

    let mut d = vec![zero; n];
    let mut g = model.gopt();
    let gg0 = norm_sq(&g);
    let mut crvmin = zero;

    if !(gg0 > zero) || !gg0.is_finite() {
        return (d, crvmin);
    }

    let mut s: Vec<F> = g.iter().map(|&gi| -gi).collect();
    let mut gg = gg0;

    for iterc in 1..=n {
        let hs = model.hess_mul(&s);
        let shs = dot(&s, &hs);
        let ss = norm_sq(&s);

        // Non-positive curvature: follow s to the boundary.
        if shs <= zero {
            let tau = boundary_tau(&d, &s, delta);
            for (di, &si) in d.iter_mut().zip(s.iter()) {
                *di = *di + tau * si;
            }
            return (d, zero);
        }

        let crv = shs / ss;
        crvmin = if iterc == 1 { crv } else { crvmin.min(crv) };

        let alpha = gg / shs;
        let dnew: Vec<F> = d
            .iter()
            .zip(s.iter())
            .map(|(&di, &si)| di + alpha * si)
            .collect();

        // The unconstrained CG step leaves the trust region: stop on the
        // boundary.
        if norm_sq(&dnew) >= delta * delta {
            let tau = boundary_tau(&d, &s, delta);
            for (di, &si) in d.iter_mut().zip(s.iter()) {
                *di = *di + tau * si;
            }
            return (d, zero);
        }

        d = dnew;
        for (gi, &hi) in g.iter_mut().zip(hs.iter()) {
            *gi = *gi + alpha * hi;
        }
        let ggnew = norm_sq(&g);
        if ggnew <= tol * tol * gg0 {
            break;
        }
        let beta = ggnew / gg;
        for (si, &gi) in s.iter_mut().zip(g.iter()) {
            *si = -gi + beta * *si;
        }
        gg = ggnew;
    }

    (d, crvmin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::newuoa::math::norm;
    use approx::assert_relative_eq;

    // a model with explicit Hessian `diag`, gradient `g` at xbase, and the
    // best point at the origin
    fn model_with(g: Vec<f64>, h: Vec<Vec<f64>>) -> Model<f64> {
        let n = g.len();
        let mut model = Model::new(vec![0.0; n], 2 * n + 1);
        model.gq = g;
        model.hq = h;
        model
    }

    #[test]
    fn test_interior_newton_point() {
        // H = diag(2, 4), g = (2, 4): minimizer at (-1, -1), well inside
        let model = model_with(vec![2.0, 4.0], vec![vec![2.0, 0.0], vec![0.0, 4.0]]);
        let (d, crvmin) = trsapp(&model, 10.0, 1e-2);
        assert_relative_eq!(d[0], -1.0, epsilon = 1e-6);
        assert_relative_eq!(d[1], -1.0, epsilon = 1e-6);
        // positive curvature certified: min eigenvalue-ish quantity
        assert!(crvmin > 0.0);
        assert!(crvmin <= 4.0 + 1e-12);
    }

    #[test]
    fn test_step_respects_radius() {
        let model = model_with(vec![2.0, 4.0], vec![vec![2.0, 0.0], vec![0.0, 4.0]]);
        for delta in [0.1, 0.5, 1.0] {
            let (d, crvmin) = trsapp(&model, delta, 1e-2);
            assert!(norm(&d) <= delta * (1.0 + 1e-12));
            // boundary step: no positive curvature certificate
            assert_relative_eq!(crvmin, 0.0, epsilon = f64::EPSILON);
        }
    }

    #[test]
    fn test_boundary_step_reduces_model() {
        let model = model_with(vec![2.0, 4.0], vec![vec![2.0, 0.0], vec![0.0, 4.0]]);
        let (d, _) = trsapp(&model, 0.5, 1e-2);
        assert!(model.quad_inc(&d) < 0.0);
    }

    #[test]
    fn test_negative_curvature_goes_to_boundary() {
        let model = model_with(vec![1.0, 0.0], vec![vec![-2.0, 0.0], vec![0.0, -2.0]]);
        let (d, crvmin) = trsapp(&model, 1.0, 1e-2);
        assert_relative_eq!(norm(&d), 1.0, epsilon = 1e-12);
        assert_relative_eq!(crvmin, 0.0, epsilon = f64::EPSILON);
        assert!(model.quad_inc(&d) < 0.0);
    }

    #[test]
    fn test_zero_gradient_returns_zero_step() {
        let model = model_with(vec![0.0, 0.0], vec![vec![2.0, 0.0], vec![0.0, 4.0]]);
        let (d, crvmin) = trsapp(&model, 1.0, 1e-2);
        assert_relative_eq!(norm(&d), 0.0, epsilon = f64::EPSILON);
        assert_relative_eq!(crvmin, 0.0, epsilon = f64::EPSILON);
    }
}
