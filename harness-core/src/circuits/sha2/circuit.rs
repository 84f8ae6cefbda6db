use std::marker::PhantomData;

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::{
    ns,
    r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError},
};

use super::{Sha2Params, Sha2State};
use crate::gadgets::U8;

/// Proves knowledge of a secret preimage whose digest equals the public one.
///
/// Each preimage byte is a secret native wire range-checked into an 8-bit
/// word. Each digest byte is a public native wire.
#[derive(Clone, Debug)]
pub struct Sha2Circuit<P: Sha2Params<W>, const W: usize> {
    preimage_len: usize,
    preimage: Option<Vec<u8>>,
    digest: Option<Vec<u8>>,
    _params: PhantomData<P>,
}

impl<P: Sha2Params<W>, const W: usize> Sha2Circuit<P, W> {
    /// Shape-only circuit for a preimage of `preimage_len` bytes.
    pub fn blank(preimage_len: usize) -> Self {
        Self {
            preimage_len,
            preimage: None,
            digest: None,
            _params: PhantomData,
        }
    }

    pub fn new(preimage: Vec<u8>, digest: Vec<u8>) -> Self {
        assert_eq!(digest.len(), W, "digest must be {W} bytes");
        Self {
            preimage_len: preimage.len(),
            preimage: Some(preimage),
            digest: Some(digest),
            _params: PhantomData,
        }
    }
}

impl<F: PrimeField, P: Sha2Params<W>, const W: usize> ConstraintSynthesizer<F>
    for Sha2Circuit<P, W>
{
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let preimage = (0..self.preimage_len)
            .map(|i| {
                let byte = FpVar::new_witness(ns!(cs, "preimage_byte"), || {
                    self.preimage
                        .as_ref()
                        .map(|p| F::from(p[i]))
                        .ok_or(SynthesisError::AssignmentMissing)
                })?;
                U8::from_wire(&byte)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = Sha2State::<F, P, W>::new();
        state.update(&preimage)?;
        let computed = state.finalize()?;

        for (i, byte) in computed.iter().enumerate() {
            let expected = FpVar::new_input(ns!(cs, "digest_byte"), || {
                self.digest
                    .as_ref()
                    .map(|d| F::from(d[i]))
                    .ok_or(SynthesisError::AssignmentMissing)
            })?;
            byte.to_wire().enforce_equal(&expected)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::sha2::{Sha256, Sha512};
    use ark_bls12_381::Fr;
    use ark_relations::r1cs::ConstraintSystem;
    use sha2::Digest;

    #[test]
    fn accepts_matching_digest() {
        let preimage = b"hello world".to_vec();
        let digest = sha2::Sha256::digest(&preimage).to_vec();
        let cs = ConstraintSystem::<Fr>::new_ref();
        Sha2Circuit::<Sha256, 32>::new(preimage, digest)
            .generate_constraints(cs.clone())
            .unwrap();
        assert!(cs.is_satisfied().unwrap());
        assert_eq!(cs.num_instance_variables(), 1 + 32);
    }

    #[test]
    fn rejects_wrong_digest() {
        let preimage = b"hello world".to_vec();
        let mut digest = sha2::Sha512::digest(&preimage).to_vec();
        digest[0] ^= 1;
        let cs = ConstraintSystem::<Fr>::new_ref();
        Sha2Circuit::<Sha512, 64>::new(preimage, digest)
            .generate_constraints(cs.clone())
            .unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn sha256_rejects_a_flipped_bit_in_every_digest_byte() {
        let preimage = b"hello world".to_vec();
        let digest = sha2::Sha256::digest(&preimage).to_vec();
        assert_eq!(hex::encode(&digest[..4]), "b94d27b9");

        let cs = ConstraintSystem::<Fr>::new_ref();
        Sha2Circuit::<Sha256, 32>::new(preimage, digest.clone())
            .generate_constraints(cs.clone())
            .unwrap();
        assert!(cs.is_satisfied().unwrap());

        // Instance slot 0 is the constant one; digest bytes follow in order.
        for (i, byte) in digest.iter().enumerate() {
            for bit in [i % 8, 7 - i % 8] {
                let flipped = Fr::from(*byte ^ (1u8 << bit));
                let honest = std::mem::replace(
                    &mut cs.borrow_mut().unwrap().instance_assignment[1 + i],
                    flipped,
                );
                assert!(!cs.is_satisfied().unwrap(), "byte {i} bit {bit}");
                cs.borrow_mut().unwrap().instance_assignment[1 + i] = honest;
            }
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn blank_shape_matches_assigned_shape() {
        let preimage = vec![0xab; 70];
        let digest = sha2::Sha256::digest(&preimage).to_vec();

        let setup = ConstraintSystem::<Fr>::new_ref();
        setup.set_mode(ark_relations::r1cs::SynthesisMode::Setup);
        Sha2Circuit::<Sha256, 32>::blank(70)
            .generate_constraints(setup.clone())
            .unwrap();

        let prove = ConstraintSystem::<Fr>::new_ref();
        Sha2Circuit::<Sha256, 32>::new(preimage, digest)
            .generate_constraints(prove.clone())
            .unwrap();

        assert_eq!(setup.num_constraints(), prove.num_constraints());
        assert_eq!(setup.num_witness_variables(), prove.num_witness_variables());
    }
}
