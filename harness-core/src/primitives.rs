//! Native field arithmetic and curve operations, timed outside any circuit.
//!
//! Each operation runs `count` times back to back and the mean is reported in
//! nanoseconds. Operands come from the input file when one is given and are
//! drawn from a ChaCha20 stream otherwise.

use std::{
    hint::black_box,
    path::PathBuf,
    time::{Duration, Instant},
};

use ark_bls12_377::Bls12_377;
use ark_bls12_381::Bls12_381;
use ark_bn254::Bn254;
use ark_bw6_761::BW6_761;
use ark_ec::{pairing::Pairing, CurveGroup, VariableBaseMSM};
use ark_ff::PrimeField;
use ark_mnt4_298::MNT4_298;
use ark_mnt6_298::MNT6_298;
use ark_std::UniformRand;
use clap::ValueEnum;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use strum_macros::{Display, EnumIter};

use crate::{
    curves::Curve,
    input::CircuitInput,
    pipeline::CsvReporter,
    utils::{
        errors::{ConfigError, PipelineError},
        profiling::{mean_duration, MemoryTracker},
    },
};

/// Points in a timed multi-scalar multiplication.
pub const MSM_POINTS: usize = 73;

/// Random exponents are drawn below this bound.
pub const MAX_RANDOM_EXPONENT: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum FieldKind {
    Scalar,
    Base,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Exp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Group {
    G1,
    G2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum CurveOp {
    ScalarMultiplication,
    MultiScalarMultiplication,
    /// Ignores the group: one G1 and one G2 point are paired.
    Pairing,
}

/// One timed native operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Arithmetic { field: FieldKind, op: ArithmeticOp },
    Curve { group: Group, op: CurveOp },
}

impl Primitive {
    pub fn category(&self) -> &'static str {
        match self {
            Primitive::Arithmetic { .. } => "arithmetic",
            Primitive::Curve { .. } => "curve",
        }
    }

    /// The field or group the operation acts on.
    pub fn domain(&self) -> String {
        match self {
            Primitive::Arithmetic { field, .. } => field.to_string(),
            Primitive::Curve {
                op: CurveOp::Pairing,
                ..
            } => "gt".to_string(),
            Primitive::Curve { group, .. } => group.to_string(),
        }
    }

    pub fn operation(&self) -> String {
        match self {
            Primitive::Arithmetic { op, .. } => op.to_string(),
            Primitive::Curve { op, .. } => op.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrimitiveConfig {
    pub curve: Curve,
    pub count: usize,
    /// JSON with decimal `X` and `Y` operands and an integer exponent `E`.
    pub input: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl PrimitiveConfig {
    pub fn input_label(&self) -> String {
        self.input
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string())
    }

    fn rng(&self) -> ChaCha20Rng {
        match self.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveResult {
    pub mean: Duration,
    pub peak_memory: u64,
    pub count: usize,
}

/// Times `primitive` on `config.curve` and reports one row.
pub fn run_primitive(
    config: &PrimitiveConfig,
    primitive: Primitive,
    reporter: &mut CsvReporter,
) -> Result<PrimitiveResult, PipelineError> {
    if config.count == 0 {
        return Err(ConfigError::NonPositiveCount(config.count).into());
    }
    let input = config
        .input
        .as_deref()
        .map(CircuitInput::from_path)
        .transpose()?;
    let _span = tracing::info_span!(
        "primitive",
        curve = %config.curve,
        domain = %primitive.domain(),
        operation = %primitive.operation()
    )
    .entered();

    let mut memory = MemoryTracker::new();
    let mut rng = config.rng();
    let (count, input) = (config.count, input.as_ref());
    let total = match config.curve {
        Curve::Bn254 => time_on::<Bn254>(primitive, count, input, &mut rng),
        Curve::Bls12_381 => time_on::<Bls12_381>(primitive, count, input, &mut rng),
        Curve::Bls12_377 => time_on::<Bls12_377>(primitive, count, input, &mut rng),
        Curve::Bw6_761 => time_on::<BW6_761>(primitive, count, input, &mut rng),
        Curve::Mnt4_298 => time_on::<MNT4_298>(primitive, count, input, &mut rng),
        Curve::Mnt6_298 => time_on::<MNT6_298>(primitive, count, input, &mut rng),
    }?;

    let result = PrimitiveResult {
        mean: mean_duration(total, count),
        peak_memory: memory.sample(),
        count,
    };
    tracing::info!(mean_ns = result.mean.as_nanos() as u64, count, "primitive timed");
    reporter.record_primitive(config, primitive, &result)?;
    Ok(result)
}

fn time_on<E: Pairing>(
    primitive: Primitive,
    count: usize,
    input: Option<&CircuitInput>,
    rng: &mut ChaCha20Rng,
) -> Result<Duration, ConfigError> {
    match primitive {
        Primitive::Arithmetic {
            field: FieldKind::Scalar,
            op,
        } => time_arithmetic::<E::ScalarField>(op, count, input, rng),
        Primitive::Arithmetic {
            field: FieldKind::Base,
            op,
        } => time_arithmetic::<E::BaseField>(op, count, input, rng),
        Primitive::Curve {
            op: CurveOp::Pairing,
            ..
        } => Ok(time_pairing::<E>(count, rng)),
        Primitive::Curve {
            op: CurveOp::ScalarMultiplication,
            group: Group::G1,
        } => Ok(time_scalar_mul::<E::G1>(count, rng)),
        Primitive::Curve {
            op: CurveOp::ScalarMultiplication,
            group: Group::G2,
        } => Ok(time_scalar_mul::<E::G2>(count, rng)),
        Primitive::Curve {
            op: CurveOp::MultiScalarMultiplication,
            group: Group::G1,
        } => Ok(time_msm::<E::G1>(count, rng)),
        Primitive::Curve {
            op: CurveOp::MultiScalarMultiplication,
            group: Group::G2,
        } => Ok(time_msm::<E::G2>(count, rng)),
    }
}

fn time_repeated<T>(count: usize, mut run: impl FnMut() -> T) -> Duration {
    let start = Instant::now();
    for _ in 0..count {
        black_box(run());
    }
    start.elapsed()
}

fn operand<F: PrimeField>(
    input: Option<&CircuitInput>,
    key: &str,
    rng: &mut ChaCha20Rng,
) -> Result<F, ConfigError> {
    match input {
        Some(input) => input.field(key),
        None => Ok(F::rand(rng)),
    }
}

/// Folds `count` applications of `op` into an accumulator starting at `X`.
fn time_arithmetic<F: PrimeField>(
    op: ArithmeticOp,
    count: usize,
    input: Option<&CircuitInput>,
    rng: &mut ChaCha20Rng,
) -> Result<Duration, ConfigError> {
    let mut acc: F = operand(input, "X", rng)?;
    if op == ArithmeticOp::Exp {
        let e = match input {
            Some(input) => input.integer::<u64>("E")?,
            None => rng.next_u64() % MAX_RANDOM_EXPONENT,
        };
        return Ok(time_repeated(count, || {
            acc = acc.pow([e]);
            acc
        }));
    }

    let y: F = operand(input, "Y", rng)?;
    if op == ArithmeticOp::Div && y.is_zero() {
        return Err(ConfigError::ZeroDivisor);
    }
    Ok(time_repeated(count, || {
        acc = match op {
            ArithmeticOp::Add => acc + y,
            ArithmeticOp::Sub => acc - y,
            ArithmeticOp::Mul => acc * y,
            ArithmeticOp::Div | ArithmeticOp::Exp => acc / y,
        };
        acc
    }))
}

fn time_scalar_mul<G: CurveGroup>(count: usize, rng: &mut ChaCha20Rng) -> Duration {
    let mut point = G::rand(rng);
    let scalar = G::ScalarField::rand(rng);
    time_repeated(count, || {
        point = point * scalar;
        point
    })
}

fn time_msm<G: CurveGroup>(count: usize, rng: &mut ChaCha20Rng) -> Duration {
    let points: Vec<G> = (0..MSM_POINTS).map(|_| G::rand(rng)).collect();
    let bases = G::normalize_batch(&points);
    let scalars: Vec<G::ScalarField> = (0..MSM_POINTS).map(|_| G::ScalarField::rand(rng)).collect();
    time_repeated(count, || G::msm_unchecked(&bases, &scalars))
}

fn time_pairing<E: Pairing>(count: usize, rng: &mut ChaCha20Rng) -> Duration {
    let a = E::G1::rand(rng).into_affine();
    let b = E::G2::rand(rng).into_affine();
    time_repeated(count, || E::pairing(a, b))
}
