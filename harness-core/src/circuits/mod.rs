//! Benchmark circuits and the registry that builds them from a name, a size
//! and an optional input file.

pub mod recursion;
pub mod sha2;
pub mod toy;

use ark_ff::PrimeField;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use clap::ValueEnum;
use strum_macros::{Display, EnumIter};

use self::{
    sha2::{Sha256, Sha2Circuit, Sha512},
    toy::{ExpoCircuit, ExponentiateCircuit},
};
use crate::{input::CircuitInput, utils::errors::ConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum CircuitKind {
    /// `X^(2^size) == Y`.
    Expo,
    /// `X^E == Y` with a secret 8-bit `E`.
    Exponentiate,
    /// SHA-256 preimage knowledge.
    Sha256,
    /// SHA-512 preimage knowledge.
    Sha512,
}

impl CircuitKind {
    /// Number of public inputs the circuit exposes.
    pub fn public_inputs(self) -> usize {
        match self {
            CircuitKind::Expo | CircuitKind::Exponentiate => 1,
            CircuitKind::Sha256 => 32,
            CircuitKind::Sha512 => 64,
        }
    }

    pub fn requires_input(self) -> bool {
        matches!(self, CircuitKind::Sha256 | CircuitKind::Sha512)
    }
}

/// Every registered circuit behind one synthesizer type.
#[derive(Clone, Debug)]
pub enum BenchCircuit<F: PrimeField> {
    Expo(ExpoCircuit<F>),
    Exponentiate(ExponentiateCircuit<F>),
    Sha256(Sha2Circuit<Sha256, 32>),
    Sha512(Sha2Circuit<Sha512, 64>),
}

impl<F: PrimeField> BenchCircuit<F> {
    /// Builds the shape-only circuit and its full assignment.
    ///
    /// `size` is the number of squarings for `expo` and is ignored elsewhere.
    /// Hash circuits read `PreImage` and `Hash` (hex) from the input; the toy
    /// circuits fall back to `X = 2` (and `E = 12`, `Y = 4096`) without one.
    pub fn build(
        kind: CircuitKind,
        size: usize,
        input: Option<&CircuitInput>,
    ) -> Result<(Self, Self), ConfigError> {
        match kind {
            CircuitKind::Expo => {
                let x = match input {
                    Some(input) if input.contains("X") => input.field("X")?,
                    _ => F::from(2u64),
                };
                Ok((
                    Self::Expo(ExpoCircuit::blank(size)),
                    Self::Expo(ExpoCircuit::new(size, x)),
                ))
            }
            CircuitKind::Exponentiate => {
                let (x, e, y) = match input {
                    Some(input) => (
                        input.field("X")?,
                        input.integer::<u8>("E")?,
                        input.field("Y")?,
                    ),
                    None => (F::from(2u64), 12, F::from(4096u64)),
                };
                Ok((
                    Self::Exponentiate(ExponentiateCircuit::blank()),
                    Self::Exponentiate(ExponentiateCircuit::new(x, e, y)),
                ))
            }
            CircuitKind::Sha256 => {
                let (preimage, digest) = hash_input(kind, input, 32)?;
                Ok((
                    Self::Sha256(Sha2Circuit::blank(preimage.len())),
                    Self::Sha256(Sha2Circuit::new(preimage, digest)),
                ))
            }
            CircuitKind::Sha512 => {
                let (preimage, digest) = hash_input(kind, input, 64)?;
                Ok((
                    Self::Sha512(Sha2Circuit::blank(preimage.len())),
                    Self::Sha512(Sha2Circuit::new(preimage, digest)),
                ))
            }
        }
    }
}

fn hash_input(
    kind: CircuitKind,
    input: Option<&CircuitInput>,
    digest_len: usize,
) -> Result<(Vec<u8>, Vec<u8>), ConfigError> {
    let input = input.ok_or(ConfigError::MissingInput(kind))?;
    let preimage = input.hex_bytes("PreImage")?;
    let digest = input.hex_bytes("Hash")?;
    if digest.len() != digest_len {
        return Err(ConfigError::MalformedInput {
            key: "Hash".to_string(),
            reason: format!("expected {digest_len} bytes, got {}", digest.len()),
        });
    }
    Ok((preimage, digest))
}

impl<F: PrimeField> ConstraintSynthesizer<F> for BenchCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        match self {
            BenchCircuit::Expo(c) => c.generate_constraints(cs),
            BenchCircuit::Exponentiate(c) => c.generate_constraints(cs),
            BenchCircuit::Sha256(c) => c.generate_constraints(cs),
            BenchCircuit::Sha512(c) => c.generate_constraints(cs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    fn synthesize(circuit: BenchCircuit<Fr>) -> (bool, usize) {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        (cs.is_satisfied().unwrap(), cs.num_instance_variables() - 1)
    }

    #[test]
    fn public_input_counts_match_synthesis() {
        let input = CircuitInput::from_json(
            r#"{
                "PreImage": "68656c6c6f20776f726c64",
                "Hash": "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
            }"#,
        )
        .unwrap();
        for kind in [
            CircuitKind::Expo,
            CircuitKind::Exponentiate,
            CircuitKind::Sha256,
        ] {
            let input = kind.requires_input().then_some(&input);
            let (_, assignment) = BenchCircuit::<Fr>::build(kind, 4, input).unwrap();
            let (satisfied, public) = synthesize(assignment);
            assert!(satisfied, "{kind} should be satisfied");
            assert_eq!(public, kind.public_inputs(), "{kind}");
        }
    }

    #[test]
    fn hash_circuits_need_input() {
        assert!(matches!(
            BenchCircuit::<Fr>::build(CircuitKind::Sha512, 1, None),
            Err(ConfigError::MissingInput(CircuitKind::Sha512))
        ));
    }

    #[test]
    fn short_digest_is_rejected() {
        let input =
            CircuitInput::from_json(r#"{"PreImage": "00", "Hash": "abcd"}"#).unwrap();
        assert!(matches!(
            BenchCircuit::<Fr>::build(CircuitKind::Sha256, 1, Some(&input)),
            Err(ConfigError::MalformedInput { .. })
        ));
    }

    #[test]
    fn exponentiate_reads_input() {
        let input = CircuitInput::from_json(r#"{"X": "3", "E": "5", "Y": "243"}"#).unwrap();
        let (_, assignment) =
            BenchCircuit::<Fr>::build(CircuitKind::Exponentiate, 1, Some(&input)).unwrap();
        assert!(synthesize(assignment).0);
    }
}
