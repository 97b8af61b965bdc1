//! Simultaneous evolution of a hidden true state and an observer's inferred
//! state.
//!
//! A [`Simulator`] owns two representations of the same register:
//! - the *true* state, a unit-norm column vector ∣ψ⟩ of length 2<sup>*n*</sup>
//!   that plays the role of the physical system; and
//! - the *inferred* state, a 2<sup>*n*</sup> × 2<sup>*n*</sup> density matrix ρ
//!   maintained by an observer who knows every operator applied and every
//!   measurement outcome, but never the amplitudes of ∣ψ⟩.
//!
//! The observer starts from the maximally mixed state *I*/2<sup>*n*</sup>.
//! Every unitary is applied to both (∣ψ⟩ → *U*∣ψ⟩, ρ → *U*ρ*U*<sup>†</sup>),
//! and every measurement samples an outcome from ∣ψ⟩ and then post-selects
//! both representations on it, so ρ gradually converges toward the statistics
//! of ∣ψ⟩.
//!
//! The simulator never calls back into a driver. A driver owns the loop,
//! applies operators and measurements, and reads the accessors (or
//! [`Simulator::compare`]) after each step.
//!
//! # Example
//! ```
//! use quinfer::{ gate::{ Gate, HADAMARD }, sim::{ SimConfig, Simulator } };
//!
//! let config = SimConfig::default().with_seed(10546);
//! let mut sim = Simulator::random(2, config).unwrap();
//!
//! let h0 = sim.expand_operation(&HADAMARD, 0, &[]).unwrap();
//! let cx = Gate::CX(0, 1).expand(2).unwrap();
//! for _ in 0..10 {
//!     sim.apply_operation(&h0).unwrap();
//!     sim.apply_operation(&cx).unwrap();
//!     sim.measure_qubit(1).unwrap();
//! }
//! println!("{}", sim.compare().unwrap());
//! ```

use num_complex::Complex64 as C64;
use rand::{ rngs::StdRng, Rng, SeedableRng };
use rand_distr::StandardNormal;
use tracing::{ debug, info, warn };
use crate::{
    analysis::Comparison,
    cmat::{ ComplexMatrix, EIGEN_MAX_ITER, EIGEN_TOL },
    error::{ QuinferError, QuinferResult },
    gate::{ self, Gate, MAX_QUBITS },
};

/// Default entrywise tolerance for the unitarity check in
/// [`Simulator::apply_operation`].
pub const UNITARY_TOL: f64 = 1e-3;

// probability mass below which a post-selected subspace is treated as empty
const MIN_MASS: f64 = 1e-300;

/// Numerical parameters for a [`Simulator`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Entrywise tolerance for accepting an operator as unitary.
    pub unitary_tol: f64,
    /// Convergence threshold for eigenvalue extraction in analysis routines.
    pub eigen_tol: f64,
    /// Iteration budget for eigenvalue extraction in analysis routines.
    pub eigen_max_iter: usize,
    /// Seed for the internal random number generator; drawn from system
    /// entropy if `None`.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            unitary_tol: UNITARY_TOL,
            eigen_tol: EIGEN_TOL,
            eigen_max_iter: EIGEN_MAX_ITER,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the unitarity tolerance.
    pub fn with_unitary_tol(mut self, tol: f64) -> Self {
        self.unitary_tol = tol;
        self
    }

    /// Set the eigenvalue convergence threshold and iteration budget.
    pub fn with_eigen(mut self, tol: f64, max_iter: usize) -> Self {
        self.eigen_tol = tol;
        self.eigen_max_iter = max_iter;
        self
    }

    /// Check that all tolerances are positive and finite and that the
    /// iteration budget is non-zero.
    pub fn validate(&self) -> QuinferResult<()> {
        if !(self.unitary_tol.is_finite() && self.unitary_tol > 0.0) {
            return Err(QuinferError::invalid_parameter(
                "unitary_tol", "must be positive and finite"));
        }
        if !(self.eigen_tol.is_finite() && self.eigen_tol > 0.0) {
            return Err(QuinferError::invalid_parameter(
                "eigen_tol", "must be positive and finite"));
        }
        if self.eigen_max_iter == 0 {
            return Err(QuinferError::invalid_parameter(
                "eigen_max_iter", "must be at least 1"));
        }
        Ok(())
    }

    fn rng(&self) -> StdRng {
        self.seed.map(StdRng::seed_from_u64)
            .unwrap_or_else(StdRng::from_entropy)
    }
}

/// Diagnostic counters accumulated over a simulator's lifetime.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Counters {
    /// Number of operators applied plus number of measurements performed.
    pub operations: usize,
    /// Running sum of |predicted - actual| "on" probabilities, taken at each
    /// measurement before collapse.
    pub misprediction: f64,
}

/// Main driver-facing type holding a true state and an inferred density matrix
/// for the same register.
///
/// Generic over the source of randomness; use [`Simulator::with_rng`] to
/// inject one, or [`Simulator::new`] for a seeded [`StdRng`].
#[derive(Clone, Debug)]
pub struct Simulator<R = StdRng> {
    n: usize,
    state: ComplexMatrix,
    density: ComplexMatrix,
    counters: Counters,
    config: SimConfig,
    rng: R,
}

impl Simulator<StdRng> {
    /// Create a new simulator from an explicit initial column vector.
    ///
    /// The vector is normalized to unit norm. Fails if it is not a column, if
    /// its height is not a power of two greater than 1, if it would hold more
    /// than [`MAX_QUBITS`] qubits, or if it has zero norm.
    pub fn new(initial: ComplexMatrix, config: SimConfig) -> QuinferResult<Self> {
        let rng = config.rng();
        Self::with_rng(initial, config, rng)
    }

    /// Create a new simulator of `num_qubits` qubits in a random pure state.
    ///
    /// Amplitudes are sampled from independent standard normal distributions
    /// and then normalized, which gives a state uniformly distributed over the
    /// unit sphere.
    pub fn random(num_qubits: usize, config: SimConfig) -> QuinferResult<Self> {
        let rng = config.rng();
        Self::random_with_rng(num_qubits, config, rng)
    }
}

impl<R> Simulator<R>
where R: Rng
{
    /// Like [`Simulator::new`], but drawing randomness from `rng`.
    ///
    /// `config.seed` is ignored.
    pub fn with_rng(initial: ComplexMatrix, config: SimConfig, rng: R)
        -> QuinferResult<Self>
    {
        config.validate()?;
        let (h, w) = initial.shape();
        if w != 1 { return Err(QuinferError::NotAColumn(h, w)); }
        if !h.is_power_of_two() { return Err(QuinferError::NotPowerOfTwo(h)); }
        if h == 1 { return Err(QuinferError::NoQubits); }
        let n = h.trailing_zeros() as usize;
        if n > MAX_QUBITS { return Err(QuinferError::TooManyQubits(n)); }
        let state = initial.normalized()?;
        let density = maximally_mixed(h);
        info!("initialized {}-qubit simulator", n);
        Ok(Self { n, state, density, counters: Counters::default(), config, rng })
    }

    /// Like [`Simulator::random`], but drawing randomness from `rng`.
    ///
    /// `config.seed` is ignored.
    pub fn random_with_rng(num_qubits: usize, config: SimConfig, mut rng: R)
        -> QuinferResult<Self>
    {
        if num_qubits == 0 { return Err(QuinferError::NoQubits); }
        if num_qubits > MAX_QUBITS {
            return Err(QuinferError::TooManyQubits(num_qubits));
        }
        let dim: usize = 1 << num_qubits;
        let amps: Vec<C64>
            = (0..dim)
            .map(|_| {
                C64::new(rng.sample(StandardNormal), rng.sample(StandardNormal))
            })
            .collect();
        Self::with_rng(ComplexMatrix::column(&amps), config, rng)
    }

    /// Return the number of qubits in the register.
    pub fn num_qubits(&self) -> usize { self.n }

    /// Return the dimension 2<sup>*n*</sup> of the register's state space.
    pub fn dim(&self) -> usize { self.state.height() }

    /// Return the current true state vector.
    pub fn state(&self) -> &ComplexMatrix { &self.state }

    /// Return the current inferred density matrix.
    pub fn density(&self) -> &ComplexMatrix { &self.density }

    /// Return the density matrix ∣ψ⟩⟨ψ∣ of the true state.
    pub fn true_density(&self) -> QuinferResult<ComplexMatrix> {
        self.state.outer()
    }

    /// Return the diagnostic counters.
    pub fn counters(&self) -> Counters { self.counters }

    /// Return the number of operations (applications and measurements)
    /// performed so far.
    pub fn operation_count(&self) -> usize { self.counters.operations }

    /// Return the accumulated misprediction score.
    pub fn misprediction(&self) -> f64 { self.counters.misprediction }

    /// Return the simulator's numerical parameters.
    pub fn config(&self) -> &SimConfig { &self.config }

    /// Reset the inferred state to the maximally mixed state and zero the
    /// counters, leaving the true state untouched.
    pub fn reset_inference(&mut self) -> &mut Self {
        self.density = maximally_mixed(self.dim());
        self.counters = Counters::default();
        self
    }

    /// Expand a single-qubit operator into a full operator on this register.
    ///
    /// See [`gate::expand`].
    pub fn expand_operation(
        &self,
        op: &ComplexMatrix,
        target: usize,
        controls: &[usize],
    ) -> QuinferResult<ComplexMatrix>
    {
        gate::expand(op, target, self.n, controls)
    }

    /// Apply a full-register unitary to both the true and inferred states.
    ///
    /// Fails, without modifying anything, if `op` is not square, does not
    /// match the register's dimension, or is not unitary within
    /// [`SimConfig::unitary_tol`]. Since an operator is only unitary up to that
    /// tolerance, ∣ψ⟩ is renormalized and ρ rescaled to unit trace afterward.
    pub fn apply_operation(&mut self, op: &ComplexMatrix) -> QuinferResult<()> {
        let (h, w) = op.shape();
        if h != w { return Err(QuinferError::NotSquare(h, w)); }
        if h != self.dim() {
            return Err(
                QuinferError::DimensionMismatch { expected: self.dim(), actual: h });
        }
        if !op.is_unitary(self.config.unitary_tol) {
            return Err(QuinferError::NotUnitary { tol: self.config.unitary_tol });
        }
        let state = op.times(&self.state)?.normalized()?;
        let density = op.times(&self.density)?.times(&op.adjoint())?;
        let trace = density.trace()?.re;
        let density
            = if trace < MIN_MASS {
                warn!("inferred state lost its trace under evolution; resetting");
                maximally_mixed(self.dim())
            } else {
                density.scale(1.0 / trace)
            };
        self.state = state;
        self.density = density;
        self.counters.operations += 1;
        debug!(operations = self.counters.operations, "applied operator");
        Ok(())
    }

    /// Expand and apply a [`Gate`].
    pub fn apply_gate(&mut self, gate: &Gate) -> QuinferResult<()> {
        let op = gate.expand(self.n)?;
        self.apply_operation(&op)
    }

    /// Apply a series of [`Gate`]s, stopping at the first failure.
    pub fn apply_circuit<'a, I>(&mut self, gates: I) -> QuinferResult<()>
    where I: IntoIterator<Item = &'a Gate>
    {
        gates.into_iter().try_for_each(|g| self.apply_gate(g))
    }

    /// Measure qubit `k` in the *z* basis, returning `true` if it was found
    /// ∣1⟩.
    ///
    /// The outcome is sampled from the true state using exactly one uniform
    /// draw from the simulator's random source. Before collapse, the absolute
    /// difference between the observer's predicted probability of ∣1⟩ and the
    /// true probability is added to the misprediction score. Both the true
    /// state and the inferred density matrix are then post-selected on the
    /// outcome and renormalized.
    pub fn measure_qubit(&mut self, k: usize) -> QuinferResult<bool> {
        if k >= self.n {
            return Err(QuinferError::QubitOutOfRange { index: k, n: self.n });
        }
        let mask: usize = 1 << k;

        let (mass_on, mass_off)
            = self.state.iter().enumerate()
            .fold((0.0, 0.0), |(on, off), (i, a)| {
                if i & mask != 0 {
                    (on + a.norm_sqr(), off)
                } else {
                    (on, off + a.norm_sqr())
                }
            });
        let p_true = mass_on / (mass_on + mass_off);
        let p_pred: f64
            = self.density.diagonal().enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.re)
            .sum();

        let mut outcome = self.rng.gen::<f64>() < p_true;
        // rounding can leave a vanishing chance of selecting an empty subspace
        if (outcome && mass_on < MIN_MASS) || (!outcome && mass_off < MIN_MASS) {
            warn!(qubit = k, "sampled an outcome with zero probability; flipping");
            outcome = !outcome;
        }
        let keep = |i: usize| (i & mask != 0) == outcome;

        let kept_mass = if outcome { mass_on } else { mass_off };
        let norm = kept_mass.sqrt();
        let state
            = ComplexMatrix::from_fn(self.dim(), 1, |i, _| {
                if keep(i) { self.state[(i, 0)] / norm } else { C64::from(0.0) }
            });

        let trace: f64
            = self.density.diagonal().enumerate()
            .filter(|(i, _)| keep(*i))
            .map(|(_, a)| a.re)
            .sum();
        let density
            = if trace < MIN_MASS {
                // the observer ruled this outcome out; it can only fall back on
                // ignorance within the observed subspace
                warn!(qubit = k, "inferred state assigned zero probability to outcome");
                let count = self.dim() / 2;
                ComplexMatrix::from_fn(self.dim(), self.dim(), |i, j| {
                    if i == j && keep(i) {
                        C64::from(1.0 / count as f64)
                    } else {
                        C64::from(0.0)
                    }
                })
            } else {
                ComplexMatrix::from_fn(self.dim(), self.dim(), |i, j| {
                    if keep(i) && keep(j) {
                        self.density[(i, j)] / trace
                    } else {
                        C64::from(0.0)
                    }
                })
            };

        self.state = state;
        self.density = density;
        self.counters.misprediction += (p_pred - p_true).abs();
        self.counters.operations += 1;
        debug!(
            qubit = k,
            outcome,
            p_true,
            p_pred,
            operations = self.counters.operations,
            misprediction = self.counters.misprediction,
            "measured qubit"
        );
        Ok(outcome)
    }

    /// Summarize how closely the inferred state tracks the true state.
    pub fn compare(&self) -> QuinferResult<Comparison> {
        Comparison::new(
            &self.true_density()?,
            &self.density,
            self.counters,
            self.config.eigen_tol,
            self.config.eigen_max_iter,
        )
    }
}

fn maximally_mixed(dim: usize) -> ComplexMatrix {
    ComplexMatrix::identity(dim).scale(1.0 / dim as f64)
}
