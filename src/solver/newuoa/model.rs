// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The interpolation set and the quadratic model.
//!
//! The model is `m(xbase + x) = c + gq . x + x^T (hq + sum_k pq_k y_k y_k^T) x / 2`
//! with `y_k` the columns of `xpt`; the constant `c` is never stored, all
//! model arithmetic works with differences. `gq` is the gradient at
//! `xbase`, the Hessian is split into the explicit symmetric part `hq` and
//! the implicit part carried by the weights `pq`.

use crate::core::NewuoaFloat;
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::hmatrix::HMatrix;
use super::math::{dist_sq, dot};

/// Interpolation set and quadratic model parameters.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub(crate) struct Model<F> {
    /// Shift of origin; all displacements are relative to it.
    pub(crate) xbase: Vec<F>,
    /// Sample displacements from `xbase`; `xpt[k]` is the `k`-th point.
    pub(crate) xpt: Vec<Vec<F>>,
    /// Objective values at `xbase + xpt[k]`.
    pub(crate) fval: Vec<F>,
    /// Index of the best sample.
    pub(crate) kopt: usize,
    /// Model gradient at `xbase`.
    pub(crate) gq: Vec<F>,
    /// Explicit part of the model Hessian (symmetric).
    pub(crate) hq: Vec<Vec<F>>,
    /// Implicit Hessian weights, one per interpolation point.
    pub(crate) pq: Vec<F>,
}

impl<F: NewuoaFloat> Model<F> {
    /// A zero model over `npt` points at `xbase`.
    pub(crate) fn new(xbase: Vec<F>, npt: usize) -> Self {
        let n = xbase.len();
        Model {
            xbase,
            xpt: vec![vec![F::zero(); n]; npt],
            fval: vec![F::zero(); npt],
            kopt: 0,
            gq: vec![F::zero(); n],
            hq: vec![vec![F::zero(); n]; n],
            pq: vec![F::zero(); npt],
        }
    }

    pub(crate) fn n(&self) -> usize {
        self.xbase.len()
    }

    pub(crate) fn npt(&self) -> usize {
        self.xpt.len()
    }

    /// Displacement of the best point from `xbase`.
    pub(crate) fn xopt(&self) -> &[F] {
        &self.xpt[self.kopt]
    }

    /// Best objective value seen.
    pub(crate) fn fopt(&self) -> F {
        self.fval[self.kopt]
    }

    /// The absolute coordinates of the best point.
    pub(crate) fn best_x(&self) -> Vec<F> {
        self.xbase
            .iter()
            .zip(self.xopt().iter())
            .map(|(&b, &o)| b + o)
            .collect()
    }

    /// Absolute coordinates of `xopt + d`.
    pub(crate) fn x_at(&self, d: &[F]) -> Vec<F> {
        let xopt = self.xopt();
        self.xbase
            .iter()
            .enumerate()
            .map(|(i, &b)| b + xopt[i] + d[i])
            .collect()
    }

    /// Product of the full model Hessian with `v`.
    pub(crate) fn hess_mul(&self, v: &[F]) -> Vec<F> {
        let n = self.n();
        let mut out = vec![F::zero(); n];
        for i in 0..n {
            out[i] = dot(&self.hq[i], v);
        }
        for (k, &pqk) in self.pq.iter().enumerate() {
            if pqk.abs() > F::zero() {
                let coeff = pqk * dot(&self.xpt[k], v);
                for (i, oi) in out.iter_mut().enumerate() {
                    *oi = *oi + coeff * self.xpt[k][i];
                }
            }
        }
        out
    }

    /// Model gradient at the best point, `gq + H xopt`.
    pub(crate) fn gopt(&self) -> Vec<F> {
        let hx = self.hess_mul(self.xopt());
        self.gq
            .iter()
            .zip(hx.iter())
            .map(|(&g, &h)| g + h)
            .collect()
    }

    /// Change of the model along `d` from the best point:
    /// `m(xopt + d) - m(xopt) = gopt . d + d^T H d / 2`.
    pub(crate) fn quad_inc(&self, d: &[F]) -> F {
        let gopt = self.gopt();
        let hd = self.hess_mul(d);
        dot(&gopt, d) + float!(0.5) * dot(&hd, d)
    }

    /// Squared distance of the farthest interpolation point from `xopt`,
    /// together with its index.
    pub(crate) fn max_dist_sq(&self) -> (usize, F) {
        let xopt = self.xopt();
        let mut kmax = self.kopt;
        let mut distmax = F::zero();
        for (k, point) in self.xpt.iter().enumerate() {
            let d = dist_sq(point, xopt);
            if d > distmax {
                distmax = d;
                kmax = k;
            }
        }
        (kmax, distmax)
    }

    /// True if any model parameter is NaN.
    pub(crate) fn has_nan(&self) -> bool {
        self.gq.iter().any(|v| v.is_nan())
            || self.pq.iter().any(|v| v.is_nan())
            || self.hq.iter().any(|row| row.iter().any(|v| v.is_nan()))
    }

    /// Moves the `knew`-th interpolation point to `xnew` (a displacement
    /// from `xbase`) with objective value `f`, and repairs the model so
    /// that it interpolates all points of the modified set. `moderr` is
    /// `f - m(xnew)` under the pre-update model and `hmat` must already
    /// have been updated for the replacement.
    pub(crate) fn replace_point(
        &mut self,
        knew: usize,
        xnew: Vec<F>,
        f: F,
        moderr: F,
        hmat: &HMatrix<F>,
    ) {
        let n = self.n();

        // Absorb the vanishing implicit coefficient into the explicit
        // Hessian.
        let pqk = self.pq[knew];
        if pqk.abs() > F::zero() {
            for i in 0..n {
                for j in 0..n {
                    self.hq[i][j] = self.hq[i][j] + pqk * self.xpt[knew][i] * self.xpt[knew][j];
                }
            }
        }
        self.pq[knew] = F::zero();

        // Distribute the model error over the implicit weights and the
        // gradient. The Lagrange gradient at xbase is exactly the knew-th
        // row of bmat, so no implicit term appears here.
        let omega = hmat.omega_col(knew);
        for (k, pk) in self.pq.iter_mut().enumerate() {
            *pk = *pk + moderr * omega[k];
        }
        let brow = hmat.bmat_row(knew);
        for (i, gi) in self.gq.iter_mut().enumerate() {
            *gi = *gi + moderr * brow[i];
        }

        self.xpt[knew] = xnew;
        self.fval[knew] = f;
        if f < self.fval[self.kopt] {
            self.kopt = knew;
        }
    }

    /// The least-Frobenius-norm interpolant of the current function values:
    /// gradient at `xbase` and implicit weights (its explicit Hessian is
    /// zero).
    pub(crate) fn alt_model(&self, hmat: &HMatrix<F>) -> (Vec<F>, Vec<F>) {
        let fopt = self.fopt();
        let fshift: Vec<F> = self.fval.iter().map(|&f| f - fopt).collect();
        let pq_alt = hmat.omega_mul(&fshift);
        let mut gq_alt = vec![F::zero(); self.n()];
        for (k, &fs) in fshift.iter().enumerate() {
            let brow = hmat.bmat_row(k);
            for (i, gi) in gq_alt.iter_mut().enumerate() {
                *gi = *gi + fs * brow[i];
            }
        }
        (gq_alt, pq_alt)
    }

    /// Gradient at `xopt` of a model given by `(gq, 0, pq)`.
    pub(crate) fn grad_at_opt_of(&self, gq: &[F], pq: &[F]) -> Vec<F> {
        let xopt = self.xopt();
        let mut g = gq.to_vec();
        for (k, &pk) in pq.iter().enumerate() {
            if pk.abs() > F::zero() {
                let coeff = pk * dot(&self.xpt[k], xopt);
                for (i, gi) in g.iter_mut().enumerate() {
                    *gi = *gi + coeff * self.xpt[k][i];
                }
            }
        }
        g
    }

    /// Replaces the model parameters by the least-Frobenius-norm
    /// interpolant.
    pub(crate) fn install_alt(&mut self, gq_alt: Vec<F>, pq_alt: Vec<F>) {
        self.gq = gq_alt;
        self.pq = pq_alt;
        for row in self.hq.iter_mut() {
            for v in row.iter_mut() {
                *v = F::zero();
            }
        }
    }

    /// Re-centers `xbase` at the best point. The model, the interpolation
    /// conditions and the H-representation are algebraically invariant
    /// under this re-parameterization; `xopt` becomes the zero vector.
    pub(crate) fn shift_base(&mut self, hmat: &mut HMatrix<F>) {
        let n = self.n();
        let half = float!(0.5);
        let s = self.xpt[self.kopt].clone();

        hmat.shift_base(&self.xpt, &s);

        // gq moves to the new base: gq += H s, with H built from the old
        // displacements.
        let hs = self.hess_mul(&s);
        for (i, gi) in self.gq.iter_mut().enumerate() {
            *gi = *gi + hs[i];
        }

        // hq absorbs the implicit-part change; with the half-shifted points
        // the correction is symmetric by construction.
        let mut w = vec![F::zero(); n];
        for (k, &pk) in self.pq.iter().enumerate() {
            for (i, wi) in w.iter_mut().enumerate() {
                *wi = *wi + pk * (self.xpt[k][i] - half * s[i]);
            }
        }
        for i in 0..n {
            for j in 0..n {
                self.hq[i][j] = self.hq[i][j] + w[i] * s[j] + s[i] * w[j];
            }
        }

        for point in self.xpt.iter_mut() {
            for (i, pi) in point.iter_mut().enumerate() {
                *pi = *pi - s[i];
            }
        }
        for (i, bi) in self.xbase.iter_mut().enumerate() {
            *bi = *bi + s[i];
        }
    }
}
