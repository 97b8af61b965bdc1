//! Comparisons between density matrices.
//!
//! Everything here is a pure function of its inputs. Qubit `k` of a register
//! corresponds to bit `k` of a basis-state index.

use std::fmt;
use itertools::Itertools;
use num_complex::Complex64 as C64;
use crate::{
    cmat::{ ComplexMatrix, EIGEN_MAX_ITER, EIGEN_TOL },
    error::{ QuinferError, QuinferResult },
    sim::Counters,
};

// check that `rho` is square with power-of-two size, returning the number of
// qubits
fn register_size(rho: &ComplexMatrix) -> QuinferResult<usize> {
    let (h, w) = rho.shape();
    if h != w { return Err(QuinferError::NotSquare(h, w)); }
    if !h.is_power_of_two() { return Err(QuinferError::NotPowerOfTwo(h)); }
    Ok(h.trailing_zeros() as usize)
}

fn check_qubit_matrix(rho: &ComplexMatrix) -> QuinferResult<()> {
    if rho.shape() != (2, 2) {
        return Err(QuinferError::shape("single-qubit density matrix", rho.shape(), (2, 2)));
    }
    Ok(())
}

/// Reduce a 2<sup>*n*</sup> × 2<sup>*n*</sup> density matrix to the 2 × 2
/// marginal density matrix of qubit `k`, tracing out all other qubits.
///
/// Element (*a*, *b*) of the result is the sum of ρ<sub>*ij*</sub> over all
/// index pairs where bit `k` of *i* is *a*, bit `k` of *j* is *b*, and *i* and
/// *j* agree on every other bit.
pub fn partial_trace(rho: &ComplexMatrix, k: usize) -> QuinferResult<ComplexMatrix> {
    let n = register_size(rho)?;
    if k >= n { return Err(QuinferError::QubitOutOfRange { index: k, n }); }
    let mask: usize = 1 << k;
    let mut acc = [[C64::from(0.0); 2]; 2];
    for rest in (0..rho.height()).filter(|i| i & mask == 0) {
        for (a, b) in (0..2_usize).cartesian_product(0..2_usize) {
            acc[a][b] += rho[(rest | a * mask, rest | b * mask)];
        }
    }
    Ok(ComplexMatrix::from_fn(2, 2, |a, b| acc[a][b]))
}

/// Cartesian coordinates of a single-qubit state on the Bloch sphere.
///
/// ∣0⟩ lies at +*z* and ∣+⟩ = (∣0⟩ + ∣1⟩)/√2 lies at +*x*.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BlochVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl fmt::Display for BlochVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(3);
        write!(f, "({:+.p$}, {:+.p$}, {:+.p$})", self.x, self.y, self.z, p = prec)
    }
}

impl BlochVector {
    /// Euclidean length; 1 for pure states and less than 1 for mixed states.
    pub fn norm(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Self) -> f64 {
        (
            (self.x - other.x).powi(2)
            + (self.y - other.y).powi(2)
            + (self.z - other.z).powi(2)
        ).sqrt()
    }

    pub fn as_array(&self) -> [f64; 3] { [self.x, self.y, self.z] }
}

/// Convert a 2 × 2 density matrix to its Bloch vector via the Pauli
/// expectation values (Tr ρ*X*, Tr ρ*Y*, Tr ρ*Z*).
pub fn bloch_vector(rho: &ComplexMatrix) -> QuinferResult<BlochVector> {
    check_qubit_matrix(rho)?;
    Ok(BlochVector {
        x: rho[(0, 1)].re + rho[(1, 0)].re,
        y: rho[(1, 0)].im - rho[(0, 1)].im,
        z: rho[(0, 0)].re - rho[(1, 1)].re,
    })
}

/// Trace distance ½ Σ |λ<sub>*i*</sub>| between two density matrices, where
/// λ<sub>*i*</sub> are the eigenvalues of `rho1 - rho2`.
///
/// Uses the default eigenvalue tolerance and iteration budget; see
/// [`trace_distance_with`].
pub fn trace_distance(rho1: &ComplexMatrix, rho2: &ComplexMatrix)
    -> QuinferResult<f64>
{
    trace_distance_with(rho1, rho2, EIGEN_TOL, EIGEN_MAX_ITER)
}

/// Like [`trace_distance`], but with an explicit eigenvalue tolerance and
/// iteration budget.
pub fn trace_distance_with(
    rho1: &ComplexMatrix,
    rho2: &ComplexMatrix,
    tol: f64,
    max_iter: usize,
) -> QuinferResult<f64>
{
    let diff = rho1.minus(rho2)?;
    register_size(&diff)?;
    Ok(diff.eigenvalue_magnitudes(tol, max_iter)?.sum() / 2.0)
}

/// Half the Euclidean distance between the Bloch vectors of two single-qubit
/// density matrices.
///
/// For single qubits this equals the trace distance exactly.
pub fn qubit_trace_distance(rho1: &ComplexMatrix, rho2: &ComplexMatrix)
    -> QuinferResult<f64>
{
    Ok(bloch_vector(rho1)?.distance(&bloch_vector(rho2)?) / 2.0)
}

/// Shannon entropy (in bits) of a list of eigenvalues, Σ -*p* log<sub>2</sub>
/// *p*, with terms where *p* = 0 contributing nothing.
///
/// Applied to the eigenvalues of a density matrix, this is its von Neumann
/// entropy.
pub fn entropy(eigenvalues: &[f64]) -> f64 {
    eigenvalues.iter()
        .filter(|p| **p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}

/// Von Neumann entropy (in bits) of a density matrix.
pub fn von_neumann_entropy(rho: &ComplexMatrix, tol: f64, max_iter: usize)
    -> QuinferResult<f64>
{
    register_size(rho)?;
    Ok(entropy(rho.eigenvalue_magnitudes(tol, max_iter)?.as_ref()))
}

/// Purity Tr ρ<sup>2</sup> of a density matrix; 1 for pure states and
/// 2<sup>-*n*</sup> for the maximally mixed state.
pub fn purity(rho: &ComplexMatrix) -> QuinferResult<f64> {
    register_size(rho)?;
    Ok(rho.times(rho)?.trace()?.re)
}

/// Per-qubit comparison between the true and inferred states.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QubitComparison {
    pub truth: BlochVector,
    pub inferred: BlochVector,
    /// Half the distance between the two Bloch vectors.
    pub distance: f64,
}

/// Summary of how closely an inferred density matrix tracks a true one.
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub counters: Counters,
    /// Trace distance between the full-register density matrices.
    pub trace_distance: f64,
    /// Von Neumann entropy of the inferred state, in bits.
    pub inferred_entropy: f64,
    /// Purity of the inferred state.
    pub inferred_purity: f64,
    pub qubits: Vec<QubitComparison>,
}

impl Comparison {
    /// Compare a true density matrix to an inferred one.
    pub fn new(
        truth: &ComplexMatrix,
        inferred: &ComplexMatrix,
        counters: Counters,
        tol: f64,
        max_iter: usize,
    ) -> QuinferResult<Self>
    {
        let n = register_size(truth)?;
        let trace_distance = trace_distance_with(truth, inferred, tol, max_iter)?;
        let inferred_entropy = von_neumann_entropy(inferred, tol, max_iter)?;
        let inferred_purity = purity(inferred)?;
        let qubits: Vec<QubitComparison>
            = (0..n)
            .map(|k| -> QuinferResult<QubitComparison> {
                let t = partial_trace(truth, k)?;
                let i = partial_trace(inferred, k)?;
                Ok(QubitComparison {
                    truth: bloch_vector(&t)?,
                    inferred: bloch_vector(&i)?,
                    distance: qubit_trace_distance(&t, &i)?,
                })
            })
            .collect::<QuinferResult<_>>()?;
        Ok(Self { counters, trace_distance, inferred_entropy, inferred_purity, qubits })
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ops = {}, misprediction = {:.3}, D = {:.4}, S = {:.4}, purity = {:.4}",
            self.counters.operations,
            self.counters.misprediction,
            self.trace_distance,
            self.inferred_entropy,
            self.inferred_purity,
        )?;
        for (k, q) in self.qubits.iter().enumerate() {
            writeln!(
                f, "  q{}: true {} inferred {} d = {:.4}",
                k, q.truth, q.inferred, q.distance,
            )?;
        }
        Ok(())
    }
}
