//! Property-based tests for the dual-state simulator.

use proptest::prelude::*;
use quinfer::{
    analysis::{ self, entropy, trace_distance },
    gate::{ self, HADAMARD, PAULI_X },
    ComplexMatrix,
    SimConfig,
    Simulator,
};

const TOL: f64 = 1e-9;

fn config(seed: u64) -> SimConfig { SimConfig::default().with_seed(seed) }

fn unit_trace(m: &ComplexMatrix) -> bool {
    (m.trace().unwrap().re - 1.0).abs() < TOL
}

// a random single-qubit rotation expanded onto a 3-qubit register with up to
// two controls
fn register_op() -> impl Strategy<Value = (ComplexMatrix, usize, Vec<usize>)> {
    (
        prop::array::uniform3(-1.0f64..1.0),
        -6.0f64..6.0,
        0usize..3,
        prop::collection::vec(any::<bool>(), 3),
    )
        .prop_filter("axis must be non-zero", |(axis, ..)| {
            axis.iter().map(|a| a * a).sum::<f64>() > 1e-6
        })
        .prop_map(|(axis, angle, target, use_control)| {
            let op = gate::rotation(axis, angle).unwrap();
            let controls: Vec<usize>
                = (0..3)
                .filter(|q| *q != target && use_control[*q])
                .collect();
            (op, target, controls)
        })
}

proptest! {
    /// Unitary evolution keeps ∣ψ⟩ normalized and ρ at unit trace.
    #[test]
    fn unitaries_preserve_normalization(
        seed in any::<u64>(),
        ops in prop::collection::vec(register_op(), 1..6),
    ) {
        let mut sim = Simulator::random(3, config(seed)).unwrap();
        for (op, target, controls) in ops.iter() {
            let full = sim.expand_operation(op, *target, controls).unwrap();
            sim.apply_operation(&full).unwrap();
            prop_assert!((sim.state().norm_sqr() - 1.0).abs() < TOL);
            prop_assert!(unit_trace(sim.density()));
            prop_assert!(sim.density().is_hermitian(TOL));
        }
        prop_assert_eq!(sim.operation_count(), ops.len());
    }

    /// Controlled expansion of a unitary is unitary and fixes every basis
    /// state whose control bits are not all set.
    #[test]
    fn controlled_expansion_is_unitary((op, target, controls) in register_op()) {
        let full = gate::expand(&op, target, 3, &controls).unwrap();
        prop_assert!(full.is_unitary(1e-10));
        let mask: usize = controls.iter().fold(0, |m, c| m | (1 << c));
        for b in (0..8_usize).filter(|b| b & mask != mask) {
            for r in 0..8 {
                let expected = if r == b { 1.0 } else { 0.0 };
                prop_assert!((full[(r, b)].re - expected).abs() < TOL);
                prop_assert!(full[(r, b)].im.abs() < TOL);
            }
        }
    }

    /// Applying U and then U† restores both representations.
    #[test]
    fn adjoint_undoes_operator(
        seed in any::<u64>(),
        measured in 0usize..3,
        (op, target, controls) in register_op(),
    ) {
        let mut sim = Simulator::random(3, config(seed)).unwrap();
        // give the inferred state some structure first
        sim.measure_qubit(measured).unwrap();
        let psi = sim.state().clone();
        let rho = sim.density().clone();
        let full = sim.expand_operation(&op, target, &controls).unwrap();
        sim.apply_operation(&full).unwrap();
        sim.apply_operation(&full.adjoint()).unwrap();
        prop_assert!(sim.state().approx_eq(&psi, TOL));
        prop_assert!(sim.density().approx_eq(&rho, TOL));
    }

    /// A second measurement of the same qubit repeats the first outcome and
    /// adds nothing to the misprediction score.
    #[test]
    fn repeated_measurement_is_idempotent(
        seed in any::<u64>(),
        k in 0usize..3,
        (op, target, controls) in register_op(),
    ) {
        let mut sim = Simulator::random(3, config(seed)).unwrap();
        let full = sim.expand_operation(&op, target, &controls).unwrap();
        sim.apply_operation(&full).unwrap();
        let first = sim.measure_qubit(k).unwrap();
        let score = sim.misprediction();
        let second = sim.measure_qubit(k).unwrap();
        prop_assert_eq!(first, second);
        prop_assert!((sim.misprediction() - score).abs() < TOL);
        prop_assert!((sim.state().norm_sqr() - 1.0).abs() < TOL);
        prop_assert!(unit_trace(sim.density()));
    }

    /// Trace distance vanishes on the diagonal and is symmetric.
    #[test]
    fn trace_distance_is_a_metric(
        seed_a in any::<u64>(),
        seed_b in any::<u64>(),
        k in 0usize..2,
    ) {
        let mut a = Simulator::random(2, config(seed_a)).unwrap();
        let b = Simulator::random(2, config(seed_b)).unwrap();
        a.measure_qubit(k).unwrap();
        let rho_a = a.density();
        let rho_b = b.true_density().unwrap();
        prop_assert!(trace_distance(rho_a, rho_a).unwrap().abs() < TOL);
        prop_assert!(trace_distance(&rho_b, &rho_b).unwrap().abs() < TOL);
        let ab = trace_distance(rho_a, &rho_b).unwrap();
        let ba = trace_distance(&rho_b, rho_a).unwrap();
        prop_assert!((ab - ba).abs() < TOL);
        prop_assert!((-TOL..=1.0 + TOL).contains(&ab));
    }

    /// Pure states have zero entropy and unit purity.
    #[test]
    fn pure_states_have_zero_entropy(seed in any::<u64>()) {
        let sim = Simulator::random(2, config(seed)).unwrap();
        let rho = sim.true_density().unwrap();
        let spectrum = rho.eigenvalue_magnitudes(1e-12, 500).unwrap();
        prop_assert!(entropy(spectrum.as_ref()).abs() < 1e-6);
        prop_assert!((analysis::purity(&rho).unwrap() - 1.0).abs() < TOL);
    }
}

#[test]
fn certain_outcomes_on_a_single_qubit() {
    for seed in 0..20 {
        let mut sim
            = Simulator::new(ComplexMatrix::column_real(&[1.0, 0.0]), config(seed))
            .unwrap();
        assert!(!sim.measure_qubit(0).unwrap());
        sim.apply_operation(&PAULI_X).unwrap();
        assert!(sim.measure_qubit(0).unwrap());
    }
}

#[test]
fn hadamard_rate_converges_to_half() {
    const TRIALS: u64 = 4000;
    let ones
        = (0..TRIALS)
        .filter(|seed| {
            let mut sim
                = Simulator::new(ComplexMatrix::column_real(&[1.0, 0.0]), config(*seed))
                .unwrap();
            sim.apply_operation(&HADAMARD).unwrap();
            let outcome = sim.measure_qubit(0).unwrap();
            let slot = usize::from(outcome);
            let rho = sim.density();
            assert!((rho[(slot, slot)].re - 1.0).abs() < TOL);
            assert!(rho[(0, 1)].norm() < TOL && rho[(1, 0)].norm() < TOL);
            outcome
        })
        .count();
    let rate = ones as f64 / TRIALS as f64;
    assert!((rate - 0.5).abs() < 0.04, "rate = {}", rate);
}

#[test]
fn observer_converges_under_repeated_measurement() {
    // measuring every qubit reveals a computational basis state completely
    let mut sim = Simulator::random(3, config(10546)).unwrap();
    let before = sim.compare().unwrap();
    assert!((before.inferred_entropy - 3.0).abs() < 1e-6);
    (0..3).for_each(|k| { sim.measure_qubit(k).unwrap(); });
    let after = sim.compare().unwrap();
    assert!(after.trace_distance < TOL);
    assert!(after.inferred_entropy.abs() < 1e-6);
    assert!(after.qubits.iter().all(|q| q.distance < TOL));
}

#[test]
fn entropy_of_reference_states() {
    let mixed = ComplexMatrix::identity(2).scale(0.5);
    let spectrum = mixed.eigenvalue_magnitudes(1e-12, 500).unwrap();
    assert!((entropy(spectrum.as_ref()) - 1.0).abs() < TOL);
}
