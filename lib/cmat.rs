//! Dense complex-valued matrices.
//!
//! [`ComplexMatrix`] is a thin, shape-checked wrapper around
//! `nalgebra::DMatrix<Complex64>`. Every binary operation verifies that its
//! operands have compatible shapes and returns an error instead of panicking,
//! so that malformed input from a driver surfaces as a [`QuinferError`].
//!
//! # Bit ordering
//! [`ComplexMatrix::tensor_product`] places its left operand on the *more
//! significant* bits of the flattened index: for `A ⊗ B` with `B` of height
//! `h`, row `i` of the result corresponds to row `i / h` of `A` and row `i % h`
//! of `B`. Combined with building register operators as
//! `M_{n-1} ⊗ ... ⊗ M_0` (see [`gate::expand`][crate::gate::expand]), qubit `k`
//! of a register corresponds to bit `k` of a basis-state index, so that qubit 0
//! is the least significant bit.

use std::{ fmt, ops::Index };
use nalgebra as na;
use num_complex::Complex64 as C64;
use tracing::{ debug, warn };
use crate::error::{ QuinferError, QuinferResult };

/// Default convergence threshold for eigenvalue extraction.
pub const EIGEN_TOL: f64 = 1e-12;

/// Default iteration budget for eigenvalue extraction.
pub const EIGEN_MAX_ITER: usize = 500;

/// A dense, fixed-shape matrix of complex numbers.
#[derive(Clone, Debug, PartialEq)]
pub struct ComplexMatrix(na::DMatrix<C64>);

impl From<na::DMatrix<C64>> for ComplexMatrix {
    fn from(mat: na::DMatrix<C64>) -> Self { Self(mat) }
}

impl From<ComplexMatrix> for na::DMatrix<C64> {
    fn from(mat: ComplexMatrix) -> Self { mat.0 }
}

impl AsRef<na::DMatrix<C64>> for ComplexMatrix {
    fn as_ref(&self) -> &na::DMatrix<C64> { &self.0 }
}

impl Index<(usize, usize)> for ComplexMatrix {
    type Output = C64;

    fn index(&self, idx: (usize, usize)) -> &Self::Output { &self.0[idx] }
}

impl ComplexMatrix {
    /// Create a new `h × w` matrix of zeros.
    pub fn zeros(h: usize, w: usize) -> Self { Self(na::DMatrix::zeros(h, w)) }

    /// Create a new `n × n` identity matrix.
    pub fn identity(n: usize) -> Self { Self(na::DMatrix::identity(n, n)) }

    /// Create a new `h × w` matrix from a function of (row, column).
    pub fn from_fn<F>(h: usize, w: usize, f: F) -> Self
    where F: FnMut(usize, usize) -> C64
    {
        Self(na::DMatrix::from_fn(h, w, f))
    }

    /// Create a new `h × w` matrix from elements given in row-major order.
    ///
    /// Fails if `data` does not contain exactly `h * w` elements.
    pub fn from_row_slice(h: usize, w: usize, data: &[C64])
        -> QuinferResult<Self>
    {
        if data.len() != h * w {
            return Err(QuinferError::shape("from_row_slice", (h, w), (data.len(), 1)));
        }
        Ok(Self(na::DMatrix::from_row_slice(h, w, data)))
    }

    /// Create a new column vector.
    pub fn column(data: &[C64]) -> Self {
        Self(na::DMatrix::from_column_slice(data.len(), 1, data))
    }

    /// Create a new column vector from purely real amplitudes.
    pub fn column_real(data: &[f64]) -> Self {
        Self(
            na::DMatrix::from_iterator(
                data.len(), 1, data.iter().map(|x| C64::from(*x)))
        )
    }

    /// Return the number of rows.
    pub fn height(&self) -> usize { self.0.nrows() }

    /// Return the number of columns.
    pub fn width(&self) -> usize { self.0.ncols() }

    /// Return `(height, width)`.
    pub fn shape(&self) -> (usize, usize) { self.0.shape() }

    /// Return `true` if `self` is square.
    pub fn is_square(&self) -> bool { self.0.is_square() }

    /// Return `true` if `self` has width 1.
    pub fn is_column(&self) -> bool { self.0.ncols() == 1 }

    /// Return the element at `(row, col)`, if it exists.
    pub fn get(&self, row: usize, col: usize) -> Option<C64> {
        self.0.get((row, col)).copied()
    }

    /// Iterate over all elements in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = &C64> + '_ { self.0.iter() }

    /// Iterate over the diagonal elements.
    pub fn diagonal(&self) -> impl Iterator<Item = C64> + '_ {
        (0..self.height().min(self.width())).map(|k| self.0[(k, k)])
    }

    /// Element-wise sum.
    pub fn plus(&self, rhs: &Self) -> QuinferResult<Self> {
        if self.shape() != rhs.shape() {
            return Err(QuinferError::shape("plus", self.shape(), rhs.shape()));
        }
        Ok(Self(&self.0 + &rhs.0))
    }

    /// Element-wise difference.
    pub fn minus(&self, rhs: &Self) -> QuinferResult<Self> {
        if self.shape() != rhs.shape() {
            return Err(QuinferError::shape("minus", self.shape(), rhs.shape()));
        }
        Ok(Self(&self.0 - &rhs.0))
    }

    /// Matrix product `self · rhs`.
    pub fn times(&self, rhs: &Self) -> QuinferResult<Self> {
        if self.width() != rhs.height() {
            return Err(QuinferError::shape("times", self.shape(), rhs.shape()));
        }
        Ok(Self(&self.0 * &rhs.0))
    }

    /// Multiply every element by a (possibly complex) scalar.
    pub fn scale<T>(&self, s: T) -> Self
    where T: Into<C64>
    {
        let s: C64 = s.into();
        Self(self.0.map(|a| a * s))
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> Self { Self(self.0.adjoint()) }

    /// Sum of the diagonal elements.
    pub fn trace(&self) -> QuinferResult<C64> {
        if !self.is_square() {
            let (h, w) = self.shape();
            return Err(QuinferError::NotSquare(h, w));
        }
        Ok(self.0.trace())
    }

    /// Kronecker product `self ⊗ rhs`, with `self` on the more significant
    /// bits of the result's indices.
    pub fn tensor_product(&self, rhs: &Self) -> Self {
        Self(self.0.kronecker(&rhs.0))
    }

    /// Sum of the squared magnitudes of all elements.
    pub fn norm_sqr(&self) -> f64 {
        self.0.iter().map(|a| a.norm_sqr()).sum()
    }

    /// Return a copy of `self` scaled to unit Frobenius norm.
    pub fn normalized(&self) -> QuinferResult<Self> {
        let norm = self.norm_sqr().sqrt();
        if norm == 0.0 || !norm.is_finite() { return Err(QuinferError::ZeroNorm); }
        Ok(self.scale(1.0 / norm))
    }

    /// Outer product ∣ψ⟩⟨ψ∣ of a column vector with itself.
    pub fn outer(&self) -> QuinferResult<Self> {
        if !self.is_column() {
            let (h, w) = self.shape();
            return Err(QuinferError::NotAColumn(h, w));
        }
        Ok(Self(&self.0 * self.0.adjoint()))
    }

    /// Return `true` if every element of `self` lies within `tol` of the
    /// corresponding element of `other`.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        self.shape() == other.shape()
            && self.0.iter().zip(other.0.iter())
                .all(|(a, b)| (a - b).norm() <= tol)
    }

    /// Return `true` if `self · self†` is within `tol` of the identity.
    ///
    /// The comparison is entrywise: every element of the product must lie
    /// within a distance `tol` (in the complex plane) of the corresponding
    /// identity element. Non-square matrices are never unitary.
    pub fn is_unitary(&self, tol: f64) -> bool {
        if !self.is_square() { return false; }
        let prod = &self.0 * self.0.adjoint();
        prod.iter().enumerate()
            .all(|(k, a)| {
                let (i, j) = (k % prod.nrows(), k / prod.nrows());
                let target = if i == j { C64::from(1.0) } else { C64::from(0.0) };
                (a - target).norm() <= tol
            })
    }

    /// Return `true` if `self` is within `tol` of its own adjoint.
    pub fn is_hermitian(&self, tol: f64) -> bool {
        self.is_square() && self.approx_eq(&self.adjoint(), tol)
    }

    /// Compute the magnitudes of the eigenvalues of a Hermitian matrix.
    ///
    /// Eigenvalues are found by implicit-shift QR iteration on the Hermitian
    /// tridiagonal form of `self`, stopping when off-diagonal elements fall
    /// below `tol` or after `max_iter` iterations. Only the lower triangle of
    /// `self` is read.
    ///
    /// If QR iteration exhausts its budget, the matrix is instead diagonalized
    /// by cyclic Jacobi rotations, spending at most `max_iter` sweeps. The
    /// diagonal left after the last sweep is returned, and
    /// [`Spectrum::converged`] is `false` if the off-diagonal part is still
    /// above `tol` relative to the matrix norm. Each rotation is unitary, so
    /// the estimate's sum always equals the trace for positive semidefinite
    /// input.
    pub fn eigenvalue_magnitudes(&self, tol: f64, max_iter: usize)
        -> QuinferResult<Spectrum>
    {
        if !self.is_square() {
            let (h, w) = self.shape();
            return Err(QuinferError::NotSquare(h, w));
        }
        if self.height() == 0 {
            return Ok(Spectrum { magnitudes: Vec::new(), converged: true });
        }
        // a budget of zero means "unbounded" to nalgebra
        let max_iter = max_iter.max(1);
        match na::SymmetricEigen::try_new(self.0.clone(), tol, max_iter) {
            Some(eig) => {
                let magnitudes: Vec<f64>
                    = eig.eigenvalues.iter().map(|l| l.abs()).collect();
                Ok(Spectrum { magnitudes, converged: true })
            },
            None => {
                debug!(
                    dim = self.height(),
                    max_iter,
                    "QR iteration did not converge; switching to Jacobi sweeps"
                );
                let (eigenvalues, converged) = jacobi_eigenvalues(&self.0, tol, max_iter);
                if !converged {
                    warn!(
                        "eigenvalue extraction did not converge within {} sweeps \
                        (dim = {}, tol = {:e}); returning best estimate",
                        max_iter, self.height(), tol,
                    );
                }
                let magnitudes: Vec<f64>
                    = eigenvalues.into_iter().map(f64::abs).collect();
                Ok(Spectrum { magnitudes, converged })
            },
        }
    }
}

// root-sum-square of the strictly off-diagonal elements
fn off_diagonal_norm(a: &na::DMatrix<C64>) -> f64 {
    a.iter().enumerate()
        .filter(|(k, _)| k % a.nrows() != k / a.nrows())
        .map(|(_, x)| x.norm_sqr())
        .sum::<f64>()
        .sqrt()
}

// Diagonalize a Hermitian matrix by cyclic Jacobi rotations, returning the
// final diagonal and whether the off-diagonal norm fell below `tol` times the
// Frobenius norm within `max_sweeps` sweeps.
//
// For each pair (p, q) with a_pq = |a_pq| e^{iφ}, the rotation J has
// J_pp = J_qq = c, J_pq = s e^{iφ}, J_qp = -s e^{-iφ}, with t = s / c the
// smaller root of t² + 2τt - 1 = 0, τ = (a_qq - a_pp) / 2|a_pq|. Then
// (J†AJ)_pq = 0.
fn jacobi_eigenvalues(m: &na::DMatrix<C64>, tol: f64, max_sweeps: usize)
    -> (Vec<f64>, bool)
{
    let n = m.nrows();
    let mut a = m.clone();
    let threshold = tol * a.norm();
    let mut converged = off_diagonal_norm(&a) <= threshold;
    let mut sweeps: usize = 0;
    while !converged && sweeps < max_sweeps {
        for p in 0..n {
            for q in p + 1..n {
                let apq = a[(p, q)];
                let mag = apq.norm();
                if mag == 0.0 { continue; }
                let phase = apq / mag;
                let tau = (a[(q, q)].re - a[(p, p)].re) / (2.0 * mag);
                let t
                    = if tau == 0.0 {
                        1.0
                    } else {
                        tau.signum() / (tau.abs() + (1.0 + tau * tau).sqrt())
                    };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;
                // A ← A J
                for k in 0..n {
                    let (akp, akq) = (a[(k, p)], a[(k, q)]);
                    a[(k, p)] = akp * c - akq * phase.conj() * s;
                    a[(k, q)] = akp * phase * s + akq * c;
                }
                // A ← J† A
                for k in 0..n {
                    let (apk, aqk) = (a[(p, k)], a[(q, k)]);
                    a[(p, k)] = apk * c - aqk * phase * s;
                    a[(q, k)] = apk * phase.conj() * s + aqk * c;
                }
                a[(p, q)] = C64::from(0.0);
                a[(q, p)] = C64::from(0.0);
                a[(p, p)] = C64::from(a[(p, p)].re);
                a[(q, q)] = C64::from(a[(q, q)].re);
            }
        }
        sweeps += 1;
        converged = off_diagonal_norm(&a) <= threshold;
    }
    ((0..n).map(|k| a[(k, k)].re).collect(), converged)
}

impl fmt::Display for ComplexMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(3);
        for i in 0..self.height() {
            write!(f, "[")?;
            for j in 0..self.width() {
                let a = self.0[(i, j)];
                write!(f, "{:+.p$}{:+.p$}i", a.re, a.im, p = prec)?;
                if j + 1 < self.width() { write!(f, ", ")?; }
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

/// Magnitudes of a Hermitian matrix's eigenvalues, in no particular order.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    pub magnitudes: Vec<f64>,
    /// `false` if the iteration budget ran out and `magnitudes` is only an
    /// estimate.
    pub converged: bool,
}

impl Spectrum {
    pub fn len(&self) -> usize { self.magnitudes.len() }

    pub fn is_empty(&self) -> bool { self.magnitudes.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.magnitudes.iter().copied()
    }

    /// Sum of all magnitudes.
    pub fn sum(&self) -> f64 { self.magnitudes.iter().sum() }
}

impl AsRef<[f64]> for Spectrum {
    fn as_ref(&self) -> &[f64] { &self.magnitudes }
}
