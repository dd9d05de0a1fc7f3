// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Geometry-improving step.
//!
//! Chooses a step `d` with `||d|| = delbar` which approximately maximizes
//! the magnitude of the `knew`-th Lagrange function at `xopt + d`, so that
//! replacing the `knew`-th interpolation point by `xopt + d` improves the
//! poisedness of the set. The maximization is Powell's iterated
//! two-dimensional search: on the plane spanned by the incumbent `d` and
//! the component of the Lagrange gradient orthogonal to it, the Lagrange
//! function restricted to the sphere is a trigonometric polynomial of
//! degree two whose largest magnitude is located by an angle scan with a
//! quadratic refinement.

use crate::core::NewuoaFloat;

use super::hmatrix::HMatrix;
use super::math::{dot, norm_sq};
use super::model::Model;

const ANGLE_SAMPLES: usize = 50;

/// Value of the `knew`-th Lagrange function at `xopt + y`, up to the
/// (vanishing) value at `xopt` itself: `glag . y + y^T Hl y / 2` with
/// `Hl` applied through `hcol`.
fn lagrange_value<F: NewuoaFloat>(
    glag: &[F],
    hcol: &[F],
    xpt: &[Vec<F>],
    y: &[F],
) -> F {
    let mut quad = F::zero();
    for (k, &hk) in hcol.iter().enumerate() {
        if hk.abs() > F::zero() {
            let t = dot(&xpt[k], y);
            quad = quad + hk * t * t;
        }
    }
    dot(glag, y) + float!(0.5) * quad
}

/// `Hl v` where `Hl = sum_k hcol_k y_k y_k^T` is the Hessian of the
/// Lagrange function.
fn lagrange_hess_mul<F: NewuoaFloat>(hcol: &[F], xpt: &[Vec<F>], v: &[F]) -> Vec<F> {
    let n = xpt[0].len();
    let mut out = vec![F::zero(); n];
    for (k, &hk) in hcol.iter().enumerate() {
        if hk.abs() > F::zero() {
            let coeff = hk * dot(&xpt[k], v);
            for (i, oi) in out.iter_mut().enumerate() {
                *oi = *oi + coeff * xpt[k][i];
            }
        }
    }
    out
}

/// Returns a step `d` of length approximately `delbar` from `xopt` which
/// makes `|l_knew(xopt + d)|` large.
pub(crate) fn geostep<F: NewuoaFloat>(
    knew: usize,
    delbar: F,
    model: &Model<F>,
    hmat: &HMatrix<F>,
) -> Vec<F> {
    let n = model.n();
    let xopt = model.xopt();
    let zero = F::zero();
    let half = float!(0.5);
    let two_pi = float!(2.0) * F::PI();

    let hcol = hmat.omega_col(knew);
    let glag = hmat.lagrange_grad(knew, &model.xpt, xopt);

    // Initial direction: through the point being replaced, falling back to
    // the Lagrange gradient and finally to a coordinate direction.
    let mut d: Vec<F> = model.xpt[knew]
        .iter()
        .zip(xopt.iter())
        .map(|(&p, &o)| p - o)
        .collect();
    let mut dd = norm_sq(&d);
    if !(dd > zero) || !dd.is_finite() {
        d.copy_from_slice(&glag);
        dd = norm_sq(&d);
    }
    if !(dd > zero) || !dd.is_finite() {
        d = vec![zero; n];
        d[0] = F::one();
        dd = F::one();
    }
    let scale = delbar / dd.sqrt();
    for di in d.iter_mut() {
        *di = *di * scale;
    }

    let mut tau = lagrange_value(&glag, &hcol, &model.xpt, &d).abs();

    for _ in 0..n {
        // gradient of the Lagrange function at xopt + d
        let hd = lagrange_hess_mul(&hcol, &model.xpt, &d);
        let gd: Vec<F> = glag.iter().zip(hd.iter()).map(|(&g, &h)| g + h).collect();

        // component of gd orthogonal to d, scaled to the sphere radius
        let proj = dot(&gd, &d) / (delbar * delbar);
        let mut s: Vec<F> = gd
            .iter()
            .zip(d.iter())
            .map(|(&g, &di)| g - proj * di)
            .collect();
        let ssq = norm_sq(&s);
        let denom_tol = float!(1e-8) * norm_sq(&gd);
        if !(ssq > denom_tol) || !ssq.is_finite() {
            break;
        }
        let sscale = delbar / ssq.sqrt();
        for si in s.iter_mut() {
            *si = *si * sscale;
        }

        // Fourier coefficients of phi(theta) = l(cos(theta) d + sin(theta) s)
        let hs = lagrange_hess_mul(&hcol, &model.xpt, &s);
        let dhd = dot(&hd, &d);
        let shs = dot(&hs, &s);
        let dhs = dot(&hs, &d);
        let quarter = float!(0.25);
        let cf1 = quarter * (dhd + shs);
        let cf2 = dot(&glag, &d);
        let cf3 = dot(&glag, &s);
        let cf4 = quarter * (dhd - shs);
        let cf5 = half * dhs;
        let phi = |theta: F| -> F {
            let (sin1, cos1) = theta.sin_cos();
            let (sin2, cos2) = (theta + theta).sin_cos();
            cf1 + cf2 * cos1 + cf3 * sin1 + cf4 * cos2 + cf5 * sin2
        };

        // angle scan with quadratic refinement on the best sample
        let step = two_pi / float!(ANGLE_SAMPLES as f64);
        let mut best = 0usize;
        let mut best_val = zero;
        let mut values = [zero; ANGLE_SAMPLES];
        for (i, value) in values.iter_mut().enumerate() {
            *value = phi(step * float!(i as f64)).abs();
            if *value > best_val {
                best_val = *value;
                best = i;
            }
        }
        let prev = values[(best + ANGLE_SAMPLES - 1) % ANGLE_SAMPLES];
        let next = values[(best + 1) % ANGLE_SAMPLES];
        let curvature = prev - best_val - best_val + next;
        let mut theta = step * float!(best as f64);
        if curvature.abs() > zero {
            let shift = half * (prev - next) / curvature;
            if shift.abs() <= F::one() {
                theta = theta + shift * step;
            }
        }

        let (sin1, cos1) = theta.sin_cos();
        let dnew: Vec<F> = d
            .iter()
            .zip(s.iter())
            .map(|(&di, &si)| cos1 * di + sin1 * si)
            .collect();
        let tau_new = lagrange_value(&glag, &hcol, &model.xpt, &dnew).abs();
        if !(tau_new > tau) {
            break;
        }
        d = dnew;
        let improved_enough = tau_new > float!(1.1) * tau;
        tau = tau_new;
        if !improved_enough {
            break;
        }
    }

    d
}
