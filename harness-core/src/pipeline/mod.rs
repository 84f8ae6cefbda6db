//! The benchmark phase pipeline.
//!
//! Phases always run in the order compile → setup → witness → prove → verify,
//! stopping at the configured target phase. Every phase before the target runs
//! once and its artifact is reused; the target phase runs `count` times and
//! its mean duration is reported.

mod recursion;
pub mod report;

use std::{
    marker::PhantomData,
    path::PathBuf,
    time::{Duration, Instant},
};

use ark_bls12_377::Bls12_377;
use ark_bls12_381::Bls12_381;
use ark_bn254::Bn254;
use ark_bw6_761::BW6_761;
use ark_ec::pairing::Pairing;
use ark_ff::PrimeField;
use ark_mnt4_298::MNT4_298;
use ark_mnt6_298::MNT6_298;
use ark_relations::r1cs::ConstraintSynthesizer;
use ark_serialize::CanonicalSerialize;
use clap::ValueEnum;
use strum_macros::{Display, EnumIter};

use crate::{
    backend::{Backend, CompiledCircuit, ConstraintStats, Groth16Backend, ProofSystem, Witness},
    circuits::{BenchCircuit, CircuitKind},
    curves::Curve,
    input::CircuitInput,
    utils::{
        errors::{ConfigError, PipelineError, ProofSystemError},
        profiling::{bytes_to_mb, clamp_duration, mean_duration, MemoryTracker},
    },
};

pub use recursion::{compute_inner_proof, run_recursion, InnerProof};
pub use report::{BenchRecord, Category, CsvReporter, InnerSummary, MachineInfo, PrimitiveRecord};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Display, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Compile,
    Setup,
    Witness,
    Prove,
    Verify,
}

/// One benchmark configuration. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub backend: Backend,
    pub curve: Curve,
    pub circuit: CircuitKind,
    pub size: usize,
    pub count: usize,
    pub phase: Phase,
    pub input: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl BenchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::NonPositiveSize(self.size));
        }
        if self.count == 0 {
            return Err(ConfigError::NonPositiveCount(self.count));
        }
        if self.circuit.requires_input() && self.input.is_none() {
            return Err(ConfigError::MissingInput(self.circuit));
        }
        Ok(())
    }

    /// Additionally requires `curve` to be the outer curve of a 2-chain and the
    /// inner circuit to expose a single public input.
    pub fn validate_recursive(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.curve.inner_of_chain().is_none() {
            return Err(ConfigError::NoTwoChain(self.curve));
        }
        let public = self.circuit.public_inputs();
        if public != 1 {
            return Err(ConfigError::UnsupportedInnerCircuit {
                circuit: self.circuit,
                public,
            });
        }
        Ok(())
    }

    pub fn load_input(&self) -> Result<Option<CircuitInput>, ConfigError> {
        self.input
            .as_deref()
            .map(CircuitInput::from_path)
            .transpose()
    }

    pub fn input_label(&self) -> String {
        self.input
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string())
    }
}

/// Observations for one executed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseResult {
    pub phase: Phase,
    /// Mean over `iterations`, never below one millisecond.
    pub elapsed: Duration,
    /// Running peak of resident memory in bytes, sampled after the phase.
    pub peak_memory: u64,
    /// Serialized size of the phase's output (keys, public inputs or proof).
    pub artifact_bytes: usize,
    pub iterations: usize,
}

/// Drives one backend through the phases, timing and sampling each call.
pub struct Pipeline<'a, F: PrimeField, PS: ProofSystem<F>> {
    backend: &'a mut PS,
    target: Phase,
    count: usize,
    memory: MemoryTracker,
    stats: Option<ConstraintStats>,
    results: Vec<PhaseResult>,
    _field: PhantomData<F>,
}

impl<'a, F: PrimeField, PS: ProofSystem<F>> Pipeline<'a, F, PS> {
    pub fn new(backend: &'a mut PS, target: Phase, count: usize) -> Self {
        Self {
            backend,
            target,
            count,
            memory: MemoryTracker::new(),
            stats: None,
            results: Vec::new(),
            _field: PhantomData,
        }
    }

    pub fn target(&self) -> Phase {
        self.target
    }

    /// Stats of the compiled circuit (once compilation succeeded) and the
    /// results of every completed phase.
    pub fn finish(self) -> (Option<ConstraintStats>, Vec<PhaseResult>) {
        (self.stats, self.results)
    }

    pub fn compile<C: ConstraintSynthesizer<F> + Clone>(
        &mut self,
        shape: &C,
    ) -> Result<CompiledCircuit<F, C>, PipelineError> {
        let compiled = self.measure(Phase::Compile, |_| PS::compile(shape.clone()), |_| 0)?;
        let stats = compiled.stats();
        tracing::info!(
            constraints = stats.constraints,
            public = stats.public,
            secret = stats.secret,
            "circuit compiled"
        );
        self.stats = Some(stats);
        Ok(compiled)
    }

    pub fn setup<C: ConstraintSynthesizer<F> + Clone>(
        &mut self,
        compiled: &CompiledCircuit<F, C>,
    ) -> Result<(PS::ProvingKey, PS::VerifyingKey), PipelineError> {
        self.measure(
            Phase::Setup,
            |backend| backend.setup(compiled),
            |(pk, vk)| pk.compressed_size() + vk.compressed_size(),
        )
    }

    pub fn witness<C: ConstraintSynthesizer<F> + Clone>(
        &mut self,
        compiled: &CompiledCircuit<F, C>,
        assignment: &C,
    ) -> Result<Witness<F>, PipelineError> {
        self.measure(
            Phase::Witness,
            |_| PS::new_witness(compiled, assignment.clone()),
            Witness::public_size_in_bytes,
        )
    }

    pub fn prove<C>(
        &mut self,
        compiled: &CompiledCircuit<F, C>,
        pk: &PS::ProvingKey,
        witness: &Witness<F>,
    ) -> Result<PS::Proof, PipelineError> {
        self.measure(
            Phase::Prove,
            |backend| backend.prove(compiled, pk, witness),
            |proof| proof.compressed_size(),
        )
    }

    pub fn verify(
        &mut self,
        vk: &PS::VerifyingKey,
        proof: &PS::Proof,
        public: &[F],
    ) -> Result<(), PipelineError> {
        let proof_bytes = proof.compressed_size();
        self.measure(
            Phase::Verify,
            |backend| backend.verify(vk, proof, public),
            |_| proof_bytes,
        )
    }

    fn measure<T>(
        &mut self,
        phase: Phase,
        mut run: impl FnMut(&mut PS) -> Result<T, ProofSystemError>,
        artifact_bytes: impl Fn(&T) -> usize,
    ) -> Result<T, PipelineError> {
        let _span = tracing::info_span!("phase", %phase).entered();
        let iterations = if phase == self.target { self.count } else { 1 };
        let failed = |source| PipelineError::Phase { phase, source };

        let start = Instant::now();
        let mut output = run(&mut *self.backend).map_err(failed)?;
        let mut total = start.elapsed();
        for _ in 1..iterations {
            let start = Instant::now();
            output = run(&mut *self.backend).map_err(failed)?;
            total += start.elapsed();
        }

        let result = PhaseResult {
            phase,
            elapsed: clamp_duration(mean_duration(total, iterations)),
            peak_memory: self.memory.sample(),
            artifact_bytes: artifact_bytes(&output),
            iterations,
        };
        tracing::info!(
            elapsed_ms = result.elapsed.as_millis() as u64,
            peak_mb = bytes_to_mb(result.peak_memory),
            artifact_bytes = result.artifact_bytes,
            iterations,
            "phase complete"
        );
        self.results.push(result);
        Ok(output)
    }
}

/// Runs every phase up to `config.phase`, repeating only the target
/// `config.count` times, and reports one row per completed phase.
///
/// Phases that completed before a failure are still reported. `inner` marks a
/// recursion run.
pub fn run_phases<F, PS, C>(
    backend: &mut PS,
    shape: C,
    assignment: C,
    config: &BenchConfig,
    inner: Option<InnerSummary>,
    reporter: &mut CsvReporter,
) -> Result<Vec<PhaseResult>, PipelineError>
where
    F: PrimeField,
    PS: ProofSystem<F>,
    C: ConstraintSynthesizer<F> + Clone,
{
    let mut pipeline = Pipeline::new(backend, config.phase, config.count);
    let outcome = run_until_target(&mut pipeline, &shape, &assignment);
    let (stats, phases) = pipeline.finish();

    if let Some(stats) = stats {
        let category = if inner.is_some() {
            Category::Recursion
        } else {
            Category::Circuit
        };
        reporter.record_run(config, category, stats, &phases, inner)?;
    }
    if let Err(e) = outcome {
        if let Some(last) = phases.last() {
            tracing::warn!(completed = %last.phase, "run stopped after a failed phase: {e}");
        }
        return Err(e);
    }
    Ok(phases)
}

fn run_until_target<F, PS, C>(
    pipeline: &mut Pipeline<'_, F, PS>,
    shape: &C,
    assignment: &C,
) -> Result<(), PipelineError>
where
    F: PrimeField,
    PS: ProofSystem<F>,
    C: ConstraintSynthesizer<F> + Clone,
{
    let compiled = pipeline.compile(shape)?;
    if pipeline.target() == Phase::Compile {
        return Ok(());
    }
    let (pk, vk) = pipeline.setup(&compiled)?;
    if pipeline.target() == Phase::Setup {
        return Ok(());
    }
    let witness = pipeline.witness(&compiled, assignment)?;
    if pipeline.target() == Phase::Witness {
        return Ok(());
    }
    let proof = pipeline.prove(&compiled, &pk, &witness)?;
    if pipeline.target() == Phase::Prove {
        return Ok(());
    }
    pipeline.verify(&vk, &proof, witness.public())
}

/// Benchmarks one plain circuit configuration and reports every executed phase.
pub fn run_benchmark(
    config: &BenchConfig,
    reporter: &mut CsvReporter,
) -> Result<Vec<PhaseResult>, PipelineError> {
    config.validate()?;
    match config.curve {
        Curve::Bn254 => run_on_curve::<Bn254>(config, reporter),
        Curve::Bls12_381 => run_on_curve::<Bls12_381>(config, reporter),
        Curve::Bls12_377 => run_on_curve::<Bls12_377>(config, reporter),
        Curve::Bw6_761 => run_on_curve::<BW6_761>(config, reporter),
        Curve::Mnt4_298 => run_on_curve::<MNT4_298>(config, reporter),
        Curve::Mnt6_298 => run_on_curve::<MNT6_298>(config, reporter),
    }
}

fn run_on_curve<E: Pairing>(
    config: &BenchConfig,
    reporter: &mut CsvReporter,
) -> Result<Vec<PhaseResult>, PipelineError> {
    let _span = tracing::info_span!(
        "bench",
        circuit = %config.circuit,
        curve = %config.curve,
        phase = %config.phase
    )
    .entered();

    let input = config.load_input()?;
    let (shape, assignment) =
        BenchCircuit::<E::ScalarField>::build(config.circuit, config.size, input.as_ref())?;
    match config.backend {
        Backend::Groth16 => {
            let mut backend = Groth16Backend::<E>::new(config.seed);
            run_phases::<E::ScalarField, _, _>(
                &mut backend,
                shape,
                assignment,
                config,
                None,
                reporter,
            )
        }
    }
}
