use std::marker::PhantomData;

use ark_ec::pairing::Pairing;
use ark_groth16::{prepare_verifying_key, Groth16, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::ConstraintSynthesizer;
use ark_std::UniformRand;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

use super::{r1cs, CompiledCircuit, ProofSystem, Witness};
use crate::utils::errors::ProofSystemError;

/// Groth16 over the pairing `E`, with circuit-specific setup.
///
/// All randomness (toxic waste and prover blinding) is drawn from one ChaCha
/// stream, so a fixed seed makes keys and proofs reproducible.
pub struct Groth16Backend<E: Pairing> {
    rng: ChaCha20Rng,
    _pairing: PhantomData<E>,
}

impl<E: Pairing> Groth16Backend<E> {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Self {
            rng,
            _pairing: PhantomData,
        }
    }
}

impl<E: Pairing> ProofSystem<E::ScalarField> for Groth16Backend<E> {
    type ProvingKey = ProvingKey<E>;
    type VerifyingKey = VerifyingKey<E>;
    type Proof = Proof<E>;

    #[tracing::instrument(skip_all, name = "Groth16::setup")]
    fn setup<C: ConstraintSynthesizer<E::ScalarField> + Clone>(
        &mut self,
        compiled: &CompiledCircuit<E::ScalarField, C>,
    ) -> Result<(Self::ProvingKey, Self::VerifyingKey), ProofSystemError> {
        let pk = Groth16::<E>::generate_random_parameters_with_reduction(
            compiled.circuit.clone(),
            &mut self.rng,
        )?;
        let vk = pk.vk.clone();
        Ok((pk, vk))
    }

    #[tracing::instrument(skip_all, name = "Groth16::prove")]
    fn prove<C>(
        &mut self,
        compiled: &CompiledCircuit<E::ScalarField, C>,
        pk: &Self::ProvingKey,
        witness: &Witness<E::ScalarField>,
    ) -> Result<Self::Proof, ProofSystemError> {
        let matrices = &compiled.matrices;
        if let Some(constraint) = r1cs::first_unsatisfied(matrices, witness.full_assignment()) {
            return Err(ProofSystemError::Unsatisfied { constraint });
        }

        let r = E::ScalarField::rand(&mut self.rng);
        let s = E::ScalarField::rand(&mut self.rng);
        let proof = Groth16::<E>::create_proof_with_reduction_and_matrices(
            pk,
            r,
            s,
            matrices,
            matrices.num_instance_variables,
            matrices.num_constraints,
            witness.full_assignment(),
        )?;
        Ok(proof)
    }

    #[tracing::instrument(skip_all, name = "Groth16::verify")]
    fn verify(
        &self,
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        public: &[E::ScalarField],
    ) -> Result<(), ProofSystemError> {
        let pvk = prepare_verifying_key(vk);
        if Groth16::<E>::verify_proof(&pvk, proof, public)? {
            Ok(())
        } else {
            Err(ProofSystemError::VerificationFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::toy::{ExpoCircuit, ExponentiateCircuit};
    use ark_bls12_381::{Bls12_381, Fr};
    use ark_bn254::Bn254;
    use ark_ec::AffineRepr;
    use ark_serialize::CanonicalSerialize;

    fn prove_expo<E: Pairing>(seed: u64) -> (VerifyingKey<E>, Proof<E>, Vec<E::ScalarField>) {
        let mut backend = Groth16Backend::<E>::new(Some(seed));
        let compiled =
            Groth16Backend::<E>::compile(ExpoCircuit::<E::ScalarField>::blank(8)).unwrap();
        let (pk, vk) = backend.setup(&compiled).unwrap();
        let witness = Groth16Backend::<E>::new_witness(
            &compiled,
            ExpoCircuit::new(8, E::ScalarField::from(2u64)),
        )
        .unwrap();
        let proof = backend.prove(&compiled, &pk, &witness).unwrap();
        (vk, proof, witness.public().to_vec())
    }

    #[test]
    fn expo_proof_verifies() {
        let (vk, proof, public) = prove_expo::<Bn254>(7);
        let backend = Groth16Backend::<Bn254>::new(None);
        backend.verify(&vk, &proof, &public).unwrap();
    }

    #[test]
    fn wrong_public_input_fails_verification() {
        let (vk, proof, mut public) = prove_expo::<Bls12_381>(7);
        public[0] += Fr::from(1u64);
        let backend = Groth16Backend::<Bls12_381>::new(None);
        assert!(matches!(
            backend.verify(&vk, &proof, &public),
            Err(ProofSystemError::VerificationFailed)
        ));
    }

    #[test]
    fn tampered_proof_fails_verification() {
        let (vk, mut proof, public) = prove_expo::<Bn254>(3);
        proof.c = (proof.c + <Bn254 as Pairing>::G1Affine::generator()).into();
        let backend = Groth16Backend::<Bn254>::new(None);
        assert!(backend.verify(&vk, &proof, &public).is_err());
    }

    #[test]
    fn same_seed_gives_same_proof() {
        let (_, first, _) = prove_expo::<Bn254>(42);
        let (_, second, _) = prove_expo::<Bn254>(42);
        let mut a = Vec::new();
        let mut b = Vec::new();
        first.serialize_compressed(&mut a).unwrap();
        second.serialize_compressed(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unsatisfied_witness_is_refused() {
        let mut backend = Groth16Backend::<Bn254>::new(Some(1));
        let compiled =
            Groth16Backend::<Bn254>::compile(ExponentiateCircuit::<ark_bn254::Fr>::blank())
                .unwrap();
        let (pk, _) = backend.setup(&compiled).unwrap();
        let witness = Groth16Backend::<Bn254>::new_witness(
            &compiled,
            ExponentiateCircuit::new(2u64.into(), 12, 4095u64.into()),
        )
        .unwrap();
        assert!(matches!(
            backend.prove(&compiled, &pk, &witness),
            Err(ProofSystemError::Unsatisfied { .. })
        ));
    }
}
