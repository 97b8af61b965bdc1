//! Error types for matrix algebra, register construction, and operator
//! application.
//!
//! Errors fall into three groups: *construction* errors (a malformed initial
//! state), *operator* errors (an applied matrix of the wrong size or one that
//! fails the unitarity check), and general shape/index errors raised by the
//! algebra and analysis routines. Eigenvalue non-convergence is deliberately
//! absent: it is reported through [`Spectrum::converged`][crate::cmat::Spectrum]
//! instead.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type QuinferResult<T> = Result<T, QuinferError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuinferError {
    /// An initial state was not a single column.
    #[error("initial state must be a column vector; got shape {0}×{1}")]
    NotAColumn(usize, usize),

    /// A state-related dimension was not a power of two.
    #[error("dimension {0} is not a power of two")]
    NotPowerOfTwo(usize),

    /// An initial state had zero norm and cannot be normalized.
    #[error("state vector has zero norm")]
    ZeroNorm,

    /// A register must hold at least one qubit.
    #[error("register must contain at least one qubit")]
    NoQubits,

    /// The requested register exceeds [`MAX_QUBITS`][crate::gate::MAX_QUBITS].
    #[error("cannot allocate a register of {0} qubits")]
    TooManyQubits(usize),

    /// An operator was not square.
    #[error("operator must be square; got shape {0}×{1}")]
    NotSquare(usize, usize),

    /// An operator's size does not match the register.
    #[error("operator dimension {actual} does not match register dimension {expected}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },

    /// An operator failed the unitarity check.
    #[error("operator is not unitary within tolerance {tol:e}")]
    NotUnitary {
        tol: f64,
    },

    /// Two operands of a matrix operation have incompatible shapes.
    #[error("incompatible shapes for {op}: {lhs:?} and {rhs:?}")]
    ShapeMismatch {
        op: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    },

    /// A qubit index lies outside the register.
    #[error("qubit index {index} out of range for a {n}-qubit register")]
    QubitOutOfRange {
        index: usize,
        n: usize,
    },

    /// A parameter was outside its allowed range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
}

impl QuinferError {
    pub(crate) fn shape(
        op: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    ) -> Self
    {
        Self::ShapeMismatch { op, lhs, rhs }
    }

    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>)
        -> Self
    {
        Self::InvalidParameter { name, reason: reason.into() }
    }

    /// Return `true` if `self` describes a malformed initial state.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::NotAColumn(..)
            | Self::NotPowerOfTwo(_)
            | Self::ZeroNorm
            | Self::NoQubits
            | Self::TooManyQubits(_)
        )
    }

    /// Return `true` if `self` describes a malformed operator.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Self::NotSquare(..)
            | Self::DimensionMismatch { .. }
            | Self::NotUnitary { .. }
        )
    }
}
