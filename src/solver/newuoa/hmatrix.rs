// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Factored representation of the inverse KKT matrix H of the
//! least-Frobenius-norm interpolation system.
//!
//! The leading `npt x npt` block of H is held as
//! `omega = zmat * diag(dz) * zmat^T` with `dz` a vector of `-1` entries
//! followed by `+1` entries (`idz` counts the leading `-1`s), and the
//! off-diagonal and trailing blocks are held in `bmat`. Everything the rest
//! of the solver needs from H goes through the methods of [`HMatrix`];
//! `bmat`, `zmat` and `idz` never leave this module's crate-internal
//! surface.

use crate::core::NewuoaFloat;
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::math::dot;

/// The inverse KKT matrix of the interpolation system in Powell's factored
/// form.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub(crate) struct HMatrix<F> {
    n: usize,
    npt: usize,
    /// `(npt + n) x n`. The first `npt` rows hold the gradients of the
    /// Lagrange functions at `xbase`; the trailing `n x n` block is
    /// symmetric.
    bmat: Vec<Vec<F>>,
    /// `npt x (npt - n - 1)`
    zmat: Vec<Vec<F>>,
    /// Number of leading columns of `zmat` carrying a `-1` in `diag(dz)`.
    idz: usize,
}

impl<F: NewuoaFloat> HMatrix<F> {
    /// A zero-initialized representation for `n` variables and `npt`
    /// interpolation points.
    pub(crate) fn new(n: usize, npt: usize) -> Self {
        HMatrix {
            n,
            npt,
            bmat: vec![vec![F::zero(); n]; npt + n],
            zmat: vec![vec![F::zero(); npt - n - 1]; npt],
            idz: 0,
        }
    }

    fn nptm(&self) -> usize {
        self.npt - self.n - 1
    }

    fn dz(&self, col: usize) -> F {
        if col < self.idz {
            -F::one()
        } else {
            F::one()
        }
    }

    pub(crate) fn set_bmat(&mut self, row: usize, col: usize, value: F) {
        self.bmat[row][col] = value;
    }

    pub(crate) fn set_zmat(&mut self, row: usize, col: usize, value: F) {
        self.zmat[row][col] = value;
    }

    /// Row `k < npt` of `bmat`: the gradient of the `k`-th Lagrange
    /// function at `xbase`.
    pub(crate) fn bmat_row(&self, k: usize) -> &[F] {
        &self.bmat[k]
    }

    /// Column `k` of `omega = zmat * diag(dz) * zmat^T`.
    pub(crate) fn omega_col(&self, k: usize) -> Vec<F> {
        let mut col = vec![F::zero(); self.npt];
        for c in 0..self.nptm() {
            let coeff = self.dz(c) * self.zmat[k][c];
            for (i, ci) in col.iter_mut().enumerate() {
                *ci = *ci + coeff * self.zmat[i][c];
            }
        }
        col
    }

    /// Diagonal entry `omega_kk`.
    pub(crate) fn omega_diag(&self, k: usize) -> F {
        let mut diag = F::zero();
        for c in 0..self.nptm() {
            diag = diag + self.dz(c) * self.zmat[k][c] * self.zmat[k][c];
        }
        diag
    }

    /// `omega * v` for a vector `v` of length `npt`.
    pub(crate) fn omega_mul(&self, v: &[F]) -> Vec<F> {
        let mut out = vec![F::zero(); self.npt];
        for c in 0..self.nptm() {
            let mut coeff = F::zero();
            for k in 0..self.npt {
                coeff = coeff + self.zmat[k][c] * v[k];
            }
            coeff = coeff * self.dz(c);
            for (k, ok) in out.iter_mut().enumerate() {
                *ok = *ok + coeff * self.zmat[k][c];
            }
        }
        out
    }

    /// Gradient of the `knew`-th Lagrange function at the displacement `x`
    /// from `xbase`.
    pub(crate) fn lagrange_grad(&self, knew: usize, xpt: &[Vec<F>], x: &[F]) -> Vec<F> {
        let hcol = self.omega_col(knew);
        let mut grad = self.bmat[knew].clone();
        for k in 0..self.npt {
            let coeff = hcol[k] * dot(&xpt[k], x);
            for (i, gi) in grad.iter_mut().enumerate() {
                *gi = *gi + coeff * xpt[k][i];
            }
        }
        grad
    }

    /// True if any entry of `bmat` or `zmat` is NaN.
    pub(crate) fn has_nan(&self) -> bool {
        self.bmat
            .iter()
            .chain(self.zmat.iter())
            .any(|row| row.iter().any(|v| v.is_nan()))
    }

    /// Computes `vlag = H w` and the denominator correction `beta` for the
    /// trial point `xopt + d`, where `w` is Powell's right-hand side for
    /// the updating formula. The first `npt` entries of `vlag` are the
    /// Lagrange function values at `xopt + d`.
    pub(crate) fn vlag_beta(
        &self,
        xpt: &[Vec<F>],
        xopt: &[F],
        kopt: usize,
        d: &[F],
    ) -> (Vec<F>, F) {
        let (n, npt) = (self.n, self.npt);
        let half = float!(0.5);

        let mut vlag = vec![F::zero(); npt + n];
        let mut w = vec![F::zero(); npt];
        for k in 0..npt {
            let suma = dot(&xpt[k], d);
            let sumb = dot(&xpt[k], xopt);
            w[k] = suma * (half * suma + sumb);
            vlag[k] = dot(&self.bmat[k], d);
        }

        let mut beta = F::zero();
        for c in 0..self.nptm() {
            let mut sum = F::zero();
            for k in 0..npt {
                sum = sum + self.zmat[k][c] * w[k];
            }
            if c < self.idz {
                beta = beta + sum * sum;
                sum = -sum;
            } else {
                beta = beta - sum * sum;
            }
            for (k, vk) in vlag.iter_mut().take(npt).enumerate() {
                *vk = *vk + sum * self.zmat[k][c];
            }
        }

        let dsq = dot(d, d);
        let xoptsq = dot(xopt, xopt);
        let mut bsum = F::zero();
        let mut dx = F::zero();
        for j in 0..n {
            let mut sum = F::zero();
            for k in 0..npt {
                sum = sum + w[k] * self.bmat[k][j];
            }
            bsum = bsum + sum * d[j];
            let jp = npt + j;
            for i in 0..n {
                sum = sum + self.bmat[jp][i] * d[i];
            }
            vlag[jp] = sum;
            bsum = bsum + sum * d[j];
            dx = dx + d[j] * xopt[j];
        }
        beta = dx * dx + dsq * (xoptsq + dx + dx + half * dsq) + beta - bsum;
        vlag[kopt] = vlag[kopt] + F::one();

        (vlag, beta)
    }

    /// Powell's rank-2 update of the factorization for moving the `knew`-th
    /// interpolation point to `xopt + d`, where `(vlag, beta)` were computed
    /// by [`vlag_beta`](`HMatrix::vlag_beta`) for that `d`.
    ///
    /// Returns `false`, leaving the representation unchanged, when the
    /// updating denominator `alpha * beta + tau^2` is zero or not finite.
    pub(crate) fn update(&mut self, knew: usize, vlag: &[F], beta: F) -> bool {
        let (n, npt) = (self.n, self.npt);
        let nptm = self.nptm();
        let zero = F::zero();

        // The parameters of the updating formula, from the unrotated
        // factorization.
        let w = self.omega_col(knew);
        let alpha = w[knew];
        let tau = vlag[knew];
        let denom = alpha * beta + tau * tau;
        if !(denom.is_finite() && denom.abs() > zero) {
            return false;
        }

        let mut vlag = vlag.to_vec();
        vlag[knew] = vlag[knew] - F::one();

        // Apply plane rotations confining the knew-th row of zmat to one
        // column per sign block: column 0 for the -1 block, column idz for
        // the +1 block.
        let mut jl = 0usize;
        for j in 1..nptm {
            if j == self.idz {
                jl = self.idz;
            } else if self.zmat[knew][j].abs() > zero {
                let temp =
                    (self.zmat[knew][jl].powi(2) + self.zmat[knew][j].powi(2)).sqrt();
                let tempa = self.zmat[knew][jl] / temp;
                let tempb = self.zmat[knew][j] / temp;
                for i in 0..npt {
                    let t = tempa * self.zmat[i][jl] + tempb * self.zmat[i][j];
                    self.zmat[i][j] = tempa * self.zmat[i][j] - tempb * self.zmat[i][jl];
                    self.zmat[i][jl] = t;
                }
                self.zmat[knew][j] = zero;
            }
        }

        let sqrtdn = denom.abs().sqrt();

        if jl == 0 {
            // Only one nonzero left in the knew-th row of zmat.
            let zk = self.zmat[knew][0];
            for i in 0..npt {
                self.zmat[i][0] = (tau * self.zmat[i][0] - zk * vlag[i]) / sqrtdn;
            }
            if denom < zero {
                if self.idz == 0 {
                    // the rescaled column turns negative
                    self.idz = 1;
                } else {
                    // the leading negative column turns positive; keep the
                    // negative block contiguous
                    self.idz -= 1;
                    if self.idz > 0 {
                        for i in 0..npt {
                            self.zmat[i].swap(0, self.idz);
                        }
                    }
                }
            }
        } else {
            // One nonzero per sign block; combine the two columns.
            let (ja, jb) = if beta >= zero { (jl, 0) } else { (0, jl) };
            let temp = self.zmat[knew][jb] / denom;
            let tempa = temp * beta;
            let tempb = temp * tau;
            let zk = self.zmat[knew][ja];
            let scala = F::one() / (beta.abs() * zk * zk + tau * tau).sqrt();
            let scalb = scala * sqrtdn;
            for i in 0..npt {
                self.zmat[i][ja] = scala * (tau * self.zmat[i][ja] - zk * vlag[i]);
                self.zmat[i][jb] =
                    scalb * (self.zmat[i][jb] - tempa * w[i] - tempb * vlag[i]);
            }
            if denom < zero {
                if beta < zero {
                    self.idz += 1;
                } else {
                    self.idz -= 1;
                }
            }
        }

        // Finally, update bmat. The knew-th row is saved first because the
        // loop below overwrites it column by column.
        let wb = self.bmat[knew].clone();
        for j in 0..n {
            let jp = npt + j;
            let tempa = (alpha * vlag[jp] - tau * wb[j]) / denom;
            let tempb = (-beta * wb[j] - tau * vlag[jp]) / denom;
            for i in 0..=jp {
                let wi = if i < npt { w[i] } else { wb[i - npt] };
                self.bmat[i][j] = self.bmat[i][j] + tempa * vlag[i] + tempb * wi;
                if i >= npt {
                    self.bmat[jp][i - npt] = self.bmat[i][j];
                }
            }
        }

        true
    }

    /// The part of the base shift (section "shift of origin" of the NEWUOA
    /// paper) affecting H: when `xbase` moves to `xbase + s` (with `s` the
    /// current `xopt`), `omega` is invariant and `bmat` undergoes the
    /// congruence transformation with the vectors
    /// `w_k = (y_k . s - |s|^2 / 2) (y_k - s / 2) + |s|^2 s / 4`,
    /// where `y_k` are the old displacements in `xpt`.
    ///
    /// `xpt` must still hold the displacements relative to the old base.
    pub(crate) fn shift_base(&mut self, xpt: &[Vec<F>], s: &[F]) {
        let (n, npt) = (self.n, self.npt);
        let half = float!(0.5);
        let ssq = dot(s, s);
        let tempq = float!(0.25) * ssq;

        let mut wk: Vec<Vec<F>> = Vec::with_capacity(npt);
        for k in 0..npt {
            let vk = dot(&xpt[k], s) - half * ssq;
            let mut w = vec![F::zero(); n];
            for (i, wi) in w.iter_mut().enumerate() {
                *wi = vk * (xpt[k][i] - half * s[i]) + tempq * s[i];
            }
            // the part of the trailing block not involving omega
            for i in 0..n {
                for j in 0..n {
                    self.bmat[npt + i][j] =
                        self.bmat[npt + i][j] + self.bmat[k][i] * w[j] + w[i] * self.bmat[k][j];
                }
            }
            wk.push(w);
        }

        // the revisions depending on zmat
        for c in 0..self.nptm() {
            let mut u = vec![F::zero(); n];
            for k in 0..npt {
                for (i, ui) in u.iter_mut().enumerate() {
                    *ui = *ui + self.zmat[k][c] * wk[k][i];
                }
            }
            let sign = self.dz(c);
            for k in 0..npt {
                let coeff = sign * self.zmat[k][c];
                for j in 0..n {
                    self.bmat[k][j] = self.bmat[k][j] + coeff * u[j];
                }
            }
            for i in 0..n {
                for j in 0..n {
                    self.bmat[npt + i][j] = self.bmat[npt + i][j] + sign * u[i] * u[j];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::newuoa::initialize::init_h;
    use approx::assert_relative_eq;

    // Lagrange values computed through H must satisfy l_k(x_j) = delta_kj
    // on the interpolation points themselves.
    fn lagrange_property(hmat: &HMatrix<f64>, xpt: &[Vec<f64>], kopt: usize) {
        let npt = xpt.len();
        for j in 0..npt {
            let d: Vec<f64> = xpt[j]
                .iter()
                .zip(xpt[kopt].iter())
                .map(|(a, b)| a - b)
                .collect();
            let (vlag, _) = hmat.vlag_beta(xpt, &xpt[kopt], kopt, &d);
            for (k, &v) in vlag.iter().take(npt).enumerate() {
                let expected = if k == j { 1.0 } else { 0.0 };
                assert_relative_eq!(v, expected, epsilon = 1e-9);
            }
        }
    }

    fn sample_set(n: usize, npt: usize, rhobeg: f64) -> (Vec<Vec<f64>>, HMatrix<f64>) {
        let mut xpt = vec![vec![0.0; n]; npt];
        for k in 1..npt {
            if k <= n {
                xpt[k][k - 1] = rhobeg;
            } else if k <= 2 * n {
                xpt[k][k - n - 1] = -rhobeg;
            }
        }
        let mut hmat = HMatrix::new(n, npt);
        init_h(&mut hmat, &xpt, rhobeg);
        (xpt, hmat)
    }

    #[test]
    fn test_initial_h_is_inverse() {
        let (xpt, hmat) = sample_set(3, 7, 0.5);
        lagrange_property(&hmat, &xpt, 0);
    }

    #[test]
    fn test_update_keeps_lagrange_property() {
        let (mut xpt, mut hmat) = sample_set(2, 5, 1.0);
        let kopt = 0;
        // move point 3 to a generic position inside the trust region
        let xnew = vec![0.3, -0.4];
        let d: Vec<f64> = xnew
            .iter()
            .zip(xpt[kopt].iter())
            .map(|(a, b)| a - b)
            .collect();
        let (vlag, beta) = hmat.vlag_beta(&xpt, &xpt[kopt], kopt, &d);
        assert!(hmat.update(3, &vlag, beta));
        xpt[3] = xnew;
        lagrange_property(&hmat, &xpt, kopt);
    }

    #[test]
    fn test_noop_update_is_identity() {
        // Re-inserting an existing point at its own position must leave the
        // representation unchanged up to roundoff.
        let (xpt, mut hmat) = sample_set(2, 5, 1.0);
        let reference = hmat.clone();
        let kopt = 0;
        let knew = 2;
        let d: Vec<f64> = xpt[knew]
            .iter()
            .zip(xpt[kopt].iter())
            .map(|(a, b)| a - b)
            .collect();
        let (vlag, beta) = hmat.vlag_beta(&xpt, &xpt[kopt], kopt, &d);
        assert!(hmat.update(knew, &vlag, beta));
        let tol = 1e-10 * (xpt.len() as f64);
        for k in 0..xpt.len() {
            let col_a = reference.omega_col(k);
            let col_b = hmat.omega_col(k);
            for (a, b) in col_a.iter().zip(col_b.iter()) {
                assert_relative_eq!(a, b, epsilon = tol);
            }
            for (a, b) in reference.bmat_row(k).iter().zip(hmat.bmat_row(k).iter()) {
                assert_relative_eq!(a, b, epsilon = tol);
            }
        }
    }

    #[test]
    fn test_update_rejects_bad_denominator() {
        let (xpt, mut hmat) = sample_set(2, 5, 1.0);
        let reference = hmat.clone();
        let vlag = vec![f64::NAN; xpt.len() + 2];
        assert!(!hmat.update(1, &vlag, 0.0));
        // state must be untouched
        for k in 0..xpt.len() {
            assert_eq!(reference.omega_diag(k).to_ne_bytes(), hmat.omega_diag(k).to_ne_bytes());
        }
    }

    #[test]
    fn test_trailing_block_symmetry_after_update() {
        let (mut xpt, mut hmat) = sample_set(3, 7, 1.0);
        let kopt = 0;
        for (knew, xnew) in [(4, vec![0.2, 0.1, -0.3]), (6, vec![-0.1, 0.5, 0.2])] {
            let d: Vec<f64> = xnew
                .iter()
                .zip(xpt[kopt].iter())
                .map(|(a, b)| a - b)
                .collect();
            let (vlag, beta) = hmat.vlag_beta(&xpt, &xpt[kopt], kopt, &d);
            assert!(hmat.update(knew, &vlag, beta));
            xpt[knew] = xnew;
        }
        let npt = xpt.len();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(
                    hmat.bmat[npt + i][j],
                    hmat.bmat[npt + j][i],
                    epsilon = 1e-12,
                );
            }
        }
    }
}
