use quinfer::{
    gate::{ self, Gate },
    ComplexMatrix,
    QuinferResult,
    SimConfig,
    Simulator,
};
use tracing_subscriber::EnvFilter;

const N: usize = 3; // number of qubits

fn main() -> QuinferResult<()> {
    const STEPS: usize = 40;
    const SEED: u64 = 10546;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut sim = Simulator::random(N, SimConfig::default().with_seed(SEED))?;

    // operators are expanded once and reused every step
    let ops: Vec<ComplexMatrix>
        = [
            Gate::H(0),
            Gate::CX(0, 1),
            Gate::Rot(2, [1.0, 1.0, 0.0], 0.35),
            Gate::CZ(2, 0),
            Gate::T(1),
        ]
        .iter()
        .map(|g| g.expand(N))
        .collect::<QuinferResult<_>>()?;
    let drift = sim.expand_operation(&gate::yrot(0.1), 1, &[2])?;

    println!("t=0");
    print!("{}", sim.compare()?);
    for t in 1..=STEPS {
        ops.iter().try_for_each(|op| sim.apply_operation(op))?;
        sim.apply_operation(&drift)?;
        let k = t % N;
        let outcome = sim.measure_qubit(k)?;
        println!("t={} measured q{} -> {}", t, k, u8::from(outcome));
        print!("{}", sim.compare()?);
    }
    Ok(())
}
