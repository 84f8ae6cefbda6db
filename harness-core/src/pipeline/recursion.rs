use ark_ec::pairing::Pairing;
use ark_groth16::{Proof, VerifyingKey};

use super::{
    report::{CsvReporter, InnerSummary},
    run_phases, BenchConfig, Phase, PhaseResult, Pipeline,
};
use crate::{
    backend::{ConstraintStats, Groth16Backend},
    circuits::{
        recursion::{Bls12Bw6, Mnt4Mnt6, OuterFr, RecursiveVerifierCircuit, TwoChain},
        BenchCircuit,
    },
    curves::Curve,
    utils::errors::{ConfigError, PipelineError},
};

/// A verified inner Groth16 proof, ready to be embedded in an outer circuit.
pub struct InnerProof<E: Pairing> {
    pub vk: VerifyingKey<E>,
    pub proof: Proof<E>,
    pub public: Vec<E::ScalarField>,
    pub stats: ConstraintStats,
    /// Timings of the inner run, one per phase.
    pub phases: Vec<PhaseResult>,
}

/// Runs the configured circuit through every phase once on the inner curve.
///
/// The proof is verified natively before being handed out.
#[tracing::instrument(skip_all, name = "inner_proof", fields(circuit = %config.circuit))]
pub fn compute_inner_proof<E: Pairing>(
    config: &BenchConfig,
) -> Result<InnerProof<E>, PipelineError> {
    let input = config.load_input()?;
    let (shape, assignment) =
        BenchCircuit::<E::ScalarField>::build(config.circuit, config.size, input.as_ref())?;

    let mut backend = Groth16Backend::<E>::new(config.seed);
    let mut pipeline = Pipeline::<E::ScalarField, _>::new(&mut backend, Phase::Verify, 1);
    let compiled = pipeline.compile(&shape)?;
    let (pk, vk) = pipeline.setup(&compiled)?;
    let witness = pipeline.witness(&compiled, &assignment)?;
    let proof = pipeline.prove(&compiled, &pk, &witness)?;
    pipeline.verify(&vk, &proof, witness.public())?;
    let (_, phases) = pipeline.finish();

    Ok(InnerProof {
        vk,
        proof,
        public: witness.public().to_vec(),
        stats: compiled.stats(),
        phases,
    })
}

/// Benchmarks the outer half of a recursion: proving that an inner Groth16
/// proof verifies. `config.curve` names the outer curve.
pub fn run_recursion(
    config: &BenchConfig,
    reporter: &mut CsvReporter,
) -> Result<Vec<PhaseResult>, PipelineError> {
    config.validate_recursive()?;
    match config.curve {
        Curve::Bw6_761 => run_chain::<Bls12Bw6>(config, reporter),
        Curve::Mnt6_298 => run_chain::<Mnt4Mnt6>(config, reporter),
        other => Err(ConfigError::NoTwoChain(other).into()),
    }
}

fn run_chain<C: TwoChain>(
    config: &BenchConfig,
    reporter: &mut CsvReporter,
) -> Result<Vec<PhaseResult>, PipelineError> {
    let _span = tracing::info_span!(
        "recursion",
        inner = %C::INNER,
        outer = %C::OUTER,
        circuit = %config.circuit,
        phase = %config.phase
    )
    .entered();

    let inner = compute_inner_proof::<C::Inner>(config)
        .map_err(|e| PipelineError::InnerProof(Box::new(e)))?;
    let summary = InnerSummary::new(C::INNER, inner.stats, &inner.phases);
    tracing::info!(
        inner_constraints = summary.constraints,
        inner_prove_ms = summary.prove_time_ms,
        "inner proof verified"
    );

    let outer = RecursiveVerifierCircuit::<C>::new(inner.vk, inner.proof, inner.public);
    let mut backend = Groth16Backend::<C::Outer>::new(config.seed);
    run_phases::<OuterFr<C>, _, _>(
        &mut backend,
        outer.clone(),
        outer,
        config,
        Some(summary),
        reporter,
    )
}
