//! Standard single-qubit matrices and their expansion into full-register
//! operators.
//!
//! Register operators are built as `M_{n-1} ⊗ ... ⊗ M_0`, where `M_k` is the
//! single-qubit matrix acting on qubit `k`, so qubit `k` corresponds to bit `k`
//! of a basis-state index (see the [`cmat`][crate::cmat] module docs).

use std::fmt;
use num_complex::Complex64 as C64;
use once_cell::sync::Lazy;
use crate::{
    cmat::ComplexMatrix,
    error::{ QuinferError, QuinferResult },
};

/// Largest register for which full operators and density matrices are built.
///
/// A dense operator on *n* qubits holds 4<sup>*n*</sup> complex elements, so
/// this bound keeps a single matrix at 4 GiB.
pub const MAX_QUBITS: usize = 14;

fn mat2(a00: C64, a01: C64, a10: C64, a11: C64) -> ComplexMatrix {
    ComplexMatrix::from_fn(2, 2, |i, j| {
        match (i, j) {
            (0, 0) => a00,
            (0, 1) => a01,
            (1, 0) => a10,
            _ => a11,
        }
    })
}

/// The single-qubit identity.
pub static IDENTITY: Lazy<ComplexMatrix> =
    Lazy::new(|| ComplexMatrix::identity(2));

/// The Pauli *X* matrix.
pub static PAULI_X: Lazy<ComplexMatrix> =
    Lazy::new(|| mat2(0.0.into(), 1.0.into(), 1.0.into(), 0.0.into()));

/// The Pauli *Y* matrix.
pub static PAULI_Y: Lazy<ComplexMatrix> =
    Lazy::new(|| mat2(0.0.into(), -C64::i(), C64::i(), 0.0.into()));

/// The Pauli *Z* matrix.
pub static PAULI_Z: Lazy<ComplexMatrix> =
    Lazy::new(|| mat2(1.0.into(), 0.0.into(), 0.0.into(), (-1.0).into()));

/// The Hadamard matrix.
pub static HADAMARD: Lazy<ComplexMatrix> =
    Lazy::new(|| {
        use std::f64::consts::FRAC_1_SQRT_2;
        mat2(
            FRAC_1_SQRT_2.into(),   FRAC_1_SQRT_2.into(),
            FRAC_1_SQRT_2.into(), (-FRAC_1_SQRT_2).into(),
        )
    });

/// The π/2 phase gate, diag(1, i).
pub static PHASE_S: Lazy<ComplexMatrix> =
    Lazy::new(|| mat2(1.0.into(), 0.0.into(), 0.0.into(), C64::i()));

/// The π/4 phase gate, diag(1, e^iπ/4).
pub static PHASE_T: Lazy<ComplexMatrix> =
    Lazy::new(|| {
        use std::f64::consts::FRAC_PI_4;
        mat2(1.0.into(), 0.0.into(), 0.0.into(), C64::cis(FRAC_PI_4))
    });

/// Make the rotation by `angle` about the (not necessarily normalized) Bloch
/// sphere axis `axis`:
///
/// exp(-i θ/2 n̂·σ) = cos(θ/2) I - i sin(θ/2) (n<sub>x</sub> X + n<sub>y</sub> Y
/// + n<sub>z</sub> Z)
///
/// Fails if `axis` has zero or non-finite length.
pub fn rotation(axis: [f64; 3], angle: f64) -> QuinferResult<ComplexMatrix> {
    let len = axis.iter().map(|a| a * a).sum::<f64>().sqrt();
    if len == 0.0 || !len.is_finite() {
        return Err(QuinferError::invalid_parameter(
            "axis", "rotation axis must have finite, non-zero length"));
    }
    let [x, y, z] = axis.map(|a| a / len);
    let cos = (angle / 2.0).cos();
    let sin = (angle / 2.0).sin();
    let i = C64::i();
    Ok(mat2(
        C64::new(cos, -sin * z),
        -i * sin * C64::new(x, -y),
        -i * sin * C64::new(x, y),
        C64::new(cos, sin * z),
    ))
}

/// Make a rotation by `angle` about the *x* axis.
pub fn xrot(angle: f64) -> ComplexMatrix {
    let cos = (angle / 2.0).cos();
    let sin = (angle / 2.0).sin();
    mat2(cos.into(), C64::new(0.0, -sin), C64::new(0.0, -sin), cos.into())
}

/// Make a rotation by `angle` about the *y* axis.
pub fn yrot(angle: f64) -> ComplexMatrix {
    let cos = (angle / 2.0).cos();
    let sin = (angle / 2.0).sin();
    mat2(cos.into(), (-sin).into(), sin.into(), cos.into())
}

/// Make a rotation by `angle` about the *z* axis.
pub fn zrot(angle: f64) -> ComplexMatrix {
    mat2(
        C64::cis(-angle / 2.0), 0.0.into(),
        0.0.into(), C64::cis(angle / 2.0),
    )
}

/// Expand a single-qubit operator into a full operator on a register of
/// `num_qubits` qubits, acting on `target` and conditioned on every qubit in
/// `controls` being ∣1⟩.
///
/// Any element `(r, c)` of the result where `r` or `c` does not have all
/// control bits set is replaced by the corresponding element of the identity,
/// so that basis states failing the control condition are fixed points.
///
/// Fails if `op` is not 2 × 2, if the register is empty or larger than
/// [`MAX_QUBITS`], if any qubit index is out of range, or if `target` also
/// appears as a control. The result is not checked for unitarity.
pub fn expand(
    op: &ComplexMatrix,
    target: usize,
    num_qubits: usize,
    controls: &[usize],
) -> QuinferResult<ComplexMatrix>
{
    if op.shape() != (2, 2) {
        return Err(QuinferError::shape("expand", op.shape(), (2, 2)));
    }
    if num_qubits == 0 { return Err(QuinferError::NoQubits); }
    if num_qubits > MAX_QUBITS {
        return Err(QuinferError::TooManyQubits(num_qubits));
    }
    let out_of_range
        = std::iter::once(&target).chain(controls)
        .find(|q| **q >= num_qubits);
    if let Some(&index) = out_of_range {
        return Err(QuinferError::QubitOutOfRange { index, n: num_qubits });
    }
    if controls.contains(&target) {
        return Err(QuinferError::invalid_parameter(
            "controls", format!("target qubit {} cannot also be a control", target)));
    }

    let full: ComplexMatrix
        = (0..num_qubits).rev()
        .fold(ComplexMatrix::identity(1), |acc, q| {
            if q == target {
                acc.tensor_product(op)
            } else {
                acc.tensor_product(&IDENTITY)
            }
        });
    let mask: usize = controls.iter().fold(0, |m, c| m | (1 << c));
    if mask == 0 { return Ok(full); }
    let dim = full.height();
    let controlled
        = ComplexMatrix::from_fn(dim, dim, |r, c| {
            if r & mask == mask && c & mask == mask {
                full[(r, c)]
            } else if r == c {
                1.0.into()
            } else {
                0.0.into()
            }
        });
    Ok(controlled)
}

/// Description of a standard gate on a register.
///
/// Qubit indices for controlled gates list controls first.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Gate {
    /// Hadamard
    H(usize),
    /// π rotation about X
    X(usize),
    /// π rotation about Y
    Y(usize),
    /// π rotation about Z
    Z(usize),
    /// π/2 phase
    S(usize),
    /// π/4 phase
    T(usize),
    /// Rotation about X by an angle
    XRot(usize, f64),
    /// Rotation about Y by an angle
    YRot(usize, f64),
    /// Rotation about Z by an angle
    ZRot(usize, f64),
    /// Rotation about an arbitrary axis by an angle
    Rot(usize, [f64; 3], f64),
    /// Z-controlled π rotation about X.
    CX(usize, usize),
    /// Z-controlled π rotation about Z.
    CZ(usize, usize),
    /// Doubly controlled π rotation about X.
    CCX(usize, usize, usize),
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::H(k) => write!(f, "H({})", k),
            Self::X(k) => write!(f, "X({})", k),
            Self::Y(k) => write!(f, "Y({})", k),
            Self::Z(k) => write!(f, "Z({})", k),
            Self::S(k) => write!(f, "S({})", k),
            Self::T(k) => write!(f, "T({})", k),
            Self::XRot(k, a) => write!(f, "XRot({}, {:.3})", k, a),
            Self::YRot(k, a) => write!(f, "YRot({}, {:.3})", k, a),
            Self::ZRot(k, a) => write!(f, "ZRot({}, {:.3})", k, a),
            Self::Rot(k, [x, y, z], a)
                => write!(f, "Rot({}, [{:.3}, {:.3}, {:.3}], {:.3})", k, x, y, z, a),
            Self::CX(c, t) => write!(f, "CX({}, {})", c, t),
            Self::CZ(c, t) => write!(f, "CZ({}, {})", c, t),
            Self::CCX(c0, c1, t) => write!(f, "CCX({}, {}, {})", c0, c1, t),
        }
    }
}

impl Gate {
    /// Return `true` if `self` has at least one control qubit.
    pub fn is_controlled(&self) -> bool {
        matches!(self, Self::CX(..) | Self::CZ(..) | Self::CCX(..))
    }

    /// Return the target qubit index.
    pub fn target(&self) -> usize {
        match *self {
            Self::H(k)
            | Self::X(k)
            | Self::Y(k)
            | Self::Z(k)
            | Self::S(k)
            | Self::T(k)
            | Self::XRot(k, _)
            | Self::YRot(k, _)
            | Self::ZRot(k, _)
            | Self::Rot(k, ..)
            => k,
            Self::CX(_, t) | Self::CZ(_, t) | Self::CCX(_, _, t) => t,
        }
    }

    /// Return the control qubit indices.
    pub fn controls(&self) -> Vec<usize> {
        match *self {
            Self::CX(c, _) | Self::CZ(c, _) => vec![c],
            Self::CCX(c0, c1, _) => vec![c0, c1],
            _ => Vec::new(),
        }
    }

    /// Return the single-qubit matrix applied to the target.
    pub fn matrix(&self) -> QuinferResult<ComplexMatrix> {
        match *self {
            Self::H(_) => Ok(HADAMARD.clone()),
            Self::X(_) | Self::CX(..) | Self::CCX(..) => Ok(PAULI_X.clone()),
            Self::Y(_) => Ok(PAULI_Y.clone()),
            Self::Z(_) | Self::CZ(..) => Ok(PAULI_Z.clone()),
            Self::S(_) => Ok(PHASE_S.clone()),
            Self::T(_) => Ok(PHASE_T.clone()),
            Self::XRot(_, a) => Ok(xrot(a)),
            Self::YRot(_, a) => Ok(yrot(a)),
            Self::ZRot(_, a) => Ok(zrot(a)),
            Self::Rot(_, axis, a) => rotation(axis, a),
        }
    }

    /// Expand `self` into an operator on a register of `num_qubits` qubits.
    pub fn expand(&self, num_qubits: usize) -> QuinferResult<ComplexMatrix> {
        expand(&self.matrix()?, self.target(), num_qubits, &self.controls())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-12;

    #[test]
    fn standard_matrices_are_unitary() {
        [&IDENTITY, &PAULI_X, &PAULI_Y, &PAULI_Z, &HADAMARD, &PHASE_S, &PHASE_T]
            .into_iter()
            .for_each(|m| { assert!(m.is_unitary(TOL)); });
        assert!(xrot(0.3).is_unitary(TOL));
        assert!(yrot(1.3).is_unitary(TOL));
        assert!(zrot(-2.1).is_unitary(TOL));
        assert!(rotation([1.0, 2.0, -0.5], 0.7).unwrap().is_unitary(TOL));
    }

    #[test]
    fn rotation_matches_axis_shorthands() {
        let a = 0.9;
        assert!(rotation([1.0, 0.0, 0.0], a).unwrap().approx_eq(&xrot(a), TOL));
        assert!(rotation([0.0, 2.0, 0.0], a).unwrap().approx_eq(&yrot(a), TOL));
        assert!(rotation([0.0, 0.0, 0.5], a).unwrap().approx_eq(&zrot(a), TOL));
        // a π rotation about x is X up to a global phase of -i
        assert!(xrot(PI).approx_eq(&PAULI_X.scale(-C64::i()), TOL));
        assert!(rotation([0.0, 0.0, 0.0], a).is_err());
    }

    #[test]
    fn expand_single_qubit_is_identity_map() {
        let e = expand(&HADAMARD, 0, 1, &[]).unwrap();
        assert_eq!(e, *HADAMARD);
    }

    #[test]
    fn expand_bit_ordering() {
        // X on qubit 1 of 2 maps ∣00⟩ (index 0) to ∣10⟩ (index 2)
        let x1 = expand(&PAULI_X, 1, 2, &[]).unwrap();
        assert_eq!(x1[(2, 0)], C64::from(1.0));
        assert_eq!(x1[(1, 0)], C64::from(0.0));
        let x0 = expand(&PAULI_X, 0, 2, &[]).unwrap();
        assert_eq!(x0[(1, 0)], C64::from(1.0));
    }

    #[test]
    fn expand_controlled_not() {
        // control 0, target 1: ∣01⟩ (index 1) ↔ ∣11⟩ (index 3)
        let cx = expand(&PAULI_X, 1, 2, &[0]).unwrap();
        let expected = ComplexMatrix::from_row_slice(
            4, 4,
            &[1.0, 0.0, 0.0, 0.0,
              0.0, 0.0, 0.0, 1.0,
              0.0, 0.0, 1.0, 0.0,
              0.0, 1.0, 0.0, 0.0].map(C64::from),
        ).unwrap();
        assert_eq!(cx, expected);
        assert!(cx.is_unitary(TOL));
        assert_eq!(Gate::CX(0, 1).expand(2).unwrap(), expected);
    }

    #[test]
    fn expand_controls_fix_unselected_states() {
        let op = rotation([0.3, -1.0, 0.2], 1.1).unwrap();
        let controls = [0, 3];
        let mask = 0b1001;
        let m = expand(&op, 1, 4, &controls).unwrap();
        assert!(m.is_unitary(1e-10));
        for b in (0..16_usize).filter(|b| b & mask != mask) {
            for r in 0..16 {
                let expected = if r == b { 1.0 } else { 0.0 };
                assert_eq!(m[(r, b)], C64::from(expected));
            }
        }
    }

    #[test]
    fn expand_rejects_bad_input() {
        assert!(expand(&ComplexMatrix::identity(4), 0, 2, &[]).is_err());
        assert_eq!(expand(&PAULI_X, 0, 0, &[]), Err(QuinferError::NoQubits));
        assert_eq!(
            expand(&PAULI_X, 2, 2, &[]),
            Err(QuinferError::QubitOutOfRange { index: 2, n: 2 }),
        );
        assert_eq!(
            expand(&PAULI_X, 0, 2, &[5]),
            Err(QuinferError::QubitOutOfRange { index: 5, n: 2 }),
        );
        assert!(expand(&PAULI_X, 1, 2, &[1]).is_err());
        assert_eq!(
            expand(&PAULI_X, 0, MAX_QUBITS + 1, &[]),
            Err(QuinferError::TooManyQubits(MAX_QUBITS + 1)),
        );
        assert_eq!(expand(&PAULI_X, 0, 40, &[]), Err(QuinferError::TooManyQubits(40)));
    }

    #[test]
    fn gate_descriptions() {
        let g = Gate::CCX(0, 2, 1);
        assert!(g.is_controlled());
        assert_eq!(g.target(), 1);
        assert_eq!(g.controls(), vec![0, 2]);
        assert_eq!(g.to_string(), "CCX(0, 2, 1)");
        assert!(!Gate::H(3).is_controlled());
        assert!(g.expand(3).unwrap().is_unitary(TOL));
        assert!(Gate::Rot(0, [0.0; 3], 1.0).expand(1).is_err());
    }
}
