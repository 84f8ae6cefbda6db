//! In-circuit Groth16 verification over a 2-chain.
//!
//! The inner proof lives on a curve whose scalar field is the base field of
//! the outer curve, so the inner pairing check is native arithmetic in the
//! outer circuit.

use ark_bls12_377::Bls12_377;
use ark_bw6_761::BW6_761;
use ark_crypto_primitives::snark::{BooleanInputVar, SNARKGadget};
use ark_ec::pairing::Pairing;
use ark_groth16::{
    constraints::{Groth16VerifierGadget, ProofVar, VerifyingKeyVar},
    Groth16, Proof, VerifyingKey,
};
use ark_mnt4_298::MNT4_298;
use ark_mnt6_298::MNT6_298;
use ark_r1cs_std::prelude::*;
use ark_relations::{
    ns,
    r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError},
};

use crate::curves::Curve;

pub type InnerFr<C> = <<C as TwoChain>::Inner as Pairing>::ScalarField;
pub type OuterFr<C> = <<C as TwoChain>::Outer as Pairing>::ScalarField;

/// A pair of pairing-friendly curves where the inner scalar field is the
/// outer base field.
pub trait TwoChain: Clone {
    type Inner: Pairing;
    type Outer: Pairing;

    const INNER: Curve;
    const OUTER: Curve;

    /// Allocates the inner key and proof as outer witnesses, and the inner
    /// public inputs as outer public inputs, then runs the verifier gadget.
    fn verify_in_circuit(
        cs: ConstraintSystemRef<OuterFr<Self>>,
        vk: &VerifyingKey<Self::Inner>,
        proof: &Proof<Self::Inner>,
        public: &[InnerFr<Self>],
    ) -> Result<Boolean<OuterFr<Self>>, SynthesisError>;
}

macro_rules! two_chain {
    ($name:ident, $inner:ty, $outer:ty, $pairing_var:ty, $inner_curve:expr, $outer_curve:expr) => {
        #[derive(Clone, Copy, Debug)]
        pub struct $name;

        impl TwoChain for $name {
            type Inner = $inner;
            type Outer = $outer;

            const INNER: Curve = $inner_curve;
            const OUTER: Curve = $outer_curve;

            fn verify_in_circuit(
                cs: ConstraintSystemRef<OuterFr<Self>>,
                vk: &VerifyingKey<$inner>,
                proof: &Proof<$inner>,
                public: &[InnerFr<Self>],
            ) -> Result<Boolean<OuterFr<Self>>, SynthesisError> {
                type Gadget = Groth16VerifierGadget<$inner, $pairing_var>;

                let input = BooleanInputVar::<InnerFr<$name>, OuterFr<$name>>::new_input(
                    ns!(cs, "inner_public_inputs"),
                    || Ok(public.to_vec()),
                )?;
                let vk = VerifyingKeyVar::<$inner, $pairing_var>::new_witness(
                    ns!(cs, "inner_vk"),
                    || Ok(vk.clone()),
                )?;
                let proof = ProofVar::<$inner, $pairing_var>::new_witness(
                    ns!(cs, "inner_proof"),
                    || Ok(proof.clone()),
                )?;
                <Gadget as SNARKGadget<InnerFr<$name>, OuterFr<$name>, Groth16<$inner>>>::verify(
                    &vk, &input, &proof,
                )
            }
        }
    };
}

two_chain!(
    Bls12Bw6,
    Bls12_377,
    BW6_761,
    ark_bls12_377::constraints::PairingVar,
    Curve::Bls12_377,
    Curve::Bw6_761
);

two_chain!(
    Mnt4Mnt6,
    MNT4_298,
    MNT6_298,
    ark_mnt4_298::constraints::PairingVar,
    Curve::Mnt4_298,
    Curve::Mnt6_298
);

/// Outer circuit asserting that an inner Groth16 proof verifies.
///
/// The inner key fixes the circuit shape: a fresh key requires a fresh
/// compilation.
#[derive(Clone)]
pub struct RecursiveVerifierCircuit<C: TwoChain> {
    vk: VerifyingKey<C::Inner>,
    proof: Proof<C::Inner>,
    public: Vec<InnerFr<C>>,
}

impl<C: TwoChain> RecursiveVerifierCircuit<C> {
    pub fn new(
        vk: VerifyingKey<C::Inner>,
        proof: Proof<C::Inner>,
        public: Vec<InnerFr<C>>,
    ) -> Self {
        Self { vk, proof, public }
    }

    pub fn proof_mut(&mut self) -> &mut Proof<C::Inner> {
        &mut self.proof
    }
}

impl<C: TwoChain> ConstraintSynthesizer<OuterFr<C>> for RecursiveVerifierCircuit<C> {
    fn generate_constraints(
        self,
        cs: ConstraintSystemRef<OuterFr<C>>,
    ) -> Result<(), SynthesisError> {
        let valid = C::verify_in_circuit(cs, &self.vk, &self.proof, &self.public)?;
        valid.enforce_equal(&Boolean::TRUE)
    }
}
