//! Simulation of a small qubit register from two perspectives at once: the
//! true, hidden pure state, and the density matrix inferred by an observer who
//! sees only the operators applied and the measurement outcomes.
//!
//! All states and operators are dense complex matrices, so memory and time per
//! operation scale as 4<sup>*n*</sup> for *n* qubits; registers beyond roughly
//! a dozen qubits are impractical.
//!
//! Qubit `k` of a register corresponds to bit `k` (least significant first) of
//! a basis-state index.

pub mod error;
pub mod cmat;
pub mod gate;
pub mod sim;
pub mod analysis;

pub use error::{ QuinferError, QuinferResult };
pub use cmat::{ ComplexMatrix, Spectrum };
pub use gate::Gate;
pub use sim::{ Counters, SimConfig, Simulator };
