//! Proof-system backends.
//!
//! A backend turns a compiled constraint system into keys, proofs and
//! verification verdicts. Compilation and witness generation are shared by
//! every R1CS backend and live in [`r1cs`].

pub mod groth16;
pub mod r1cs;

use ark_ff::PrimeField;
use ark_relations::r1cs::{ConstraintMatrices, ConstraintSynthesizer};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use clap::ValueEnum;
use strum_macros::Display;

use crate::utils::errors::ProofSystemError;

pub use groth16::Groth16Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    Groth16,
}

/// Size of a compiled circuit. `public` excludes the constant-one wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintStats {
    pub constraints: usize,
    pub public: usize,
    pub secret: usize,
}

/// A circuit's constraint matrices together with the shape-only circuit that
/// produced them.
pub struct CompiledCircuit<F: PrimeField, C> {
    pub(crate) circuit: C,
    pub(crate) matrices: ConstraintMatrices<F>,
    pub(crate) stats: ConstraintStats,
}

impl<F: PrimeField, C> CompiledCircuit<F, C> {
    pub fn stats(&self) -> ConstraintStats {
        self.stats
    }
}

/// Full assignment `[1, public.., secret..]` and its public slice.
#[derive(Clone, Debug)]
pub struct Witness<F: PrimeField> {
    pub(crate) full: Vec<F>,
    pub(crate) num_public: usize,
}

impl<F: PrimeField> Witness<F> {
    pub fn public(&self) -> &[F] {
        &self.full[1..1 + self.num_public]
    }

    pub fn full_assignment(&self) -> &[F] {
        &self.full
    }

    pub fn public_size_in_bytes(&self) -> usize {
        self.public().iter().map(|x| x.compressed_size()).sum()
    }
}

/// Common surface of a SNARK backend.
///
/// Keys are derived from a [`CompiledCircuit`]; proving consumes the compiled
/// circuit, a proving key and a witness.
pub trait ProofSystem<F: PrimeField> {
    type ProvingKey: CanonicalSerialize + CanonicalDeserialize + Clone;
    type VerifyingKey: CanonicalSerialize + CanonicalDeserialize + Clone;
    type Proof: CanonicalSerialize + CanonicalDeserialize + Clone;

    fn compile<C: ConstraintSynthesizer<F> + Clone>(
        circuit: C,
    ) -> Result<CompiledCircuit<F, C>, ProofSystemError> {
        r1cs::compile(circuit)
    }

    fn setup<C: ConstraintSynthesizer<F> + Clone>(
        &mut self,
        compiled: &CompiledCircuit<F, C>,
    ) -> Result<(Self::ProvingKey, Self::VerifyingKey), ProofSystemError>;

    fn new_witness<C: ConstraintSynthesizer<F>>(
        compiled: &CompiledCircuit<F, C>,
        assignment: C,
    ) -> Result<Witness<F>, ProofSystemError> {
        r1cs::new_witness(compiled, assignment)
    }

    fn prove<C>(
        &mut self,
        compiled: &CompiledCircuit<F, C>,
        pk: &Self::ProvingKey,
        witness: &Witness<F>,
    ) -> Result<Self::Proof, ProofSystemError>;

    /// Fails with [`ProofSystemError::VerificationFailed`] on a rejected proof.
    fn verify(
        &self,
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        public: &[F],
    ) -> Result<(), ProofSystemError>;
}
