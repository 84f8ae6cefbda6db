use std::path::PathBuf;

use ark_relations::r1cs::SynthesisError;
use thiserror::Error;

use crate::{circuits::CircuitKind, curves::Curve, pipeline::Phase};

/// Rejections raised before any phase runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("circuit size must be positive, got {0}")]
    NonPositiveSize(usize),
    #[error("repetition count must be positive, got {0}")]
    NonPositiveCount(usize),
    #[error("circuit {0} needs an input file (--input)")]
    MissingInput(CircuitKind),
    #[error("input is missing key {0:?}")]
    MissingInputKey(String),
    #[error("input key {key:?} is malformed: {reason}")]
    MalformedInput { key: String, reason: String },
    #[error("could not read input {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("input is not a JSON object of strings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("curve {0} is not the outer curve of a supported 2-chain")]
    NoTwoChain(Curve),
    #[error("circuit {circuit} exposes {public} public inputs; recursion needs exactly one")]
    UnsupportedInnerCircuit { circuit: CircuitKind, public: usize },
    #[error("division by zero: operand Y is zero")]
    ZeroDivisor,
}

#[derive(Error, Debug)]
pub enum ProofSystemError {
    #[error("constraint synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("constraint matrices were not recorded during compilation")]
    MissingMatrices,
    #[error(
        "witness shape ({instance} public, {witness} secret) does not match the compiled circuit ({expected_instance} public, {expected_witness} secret)"
    )]
    ShapeMismatch {
        instance: usize,
        witness: usize,
        expected_instance: usize,
        expected_witness: usize,
    },
    #[error("witness does not satisfy constraint #{constraint}")]
    Unsatisfied { constraint: usize },
    #[error("proof verification failed")]
    VerificationFailed,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{phase} phase failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: ProofSystemError,
    },
    #[error("inner proof could not be produced: {0}")]
    InnerProof(#[source] Box<PipelineError>),
    #[error("could not write report: {0}")]
    Report(#[from] csv::Error),
    #[error("could not write report: {0}")]
    ReportIo(#[from] std::io::Error),
}
