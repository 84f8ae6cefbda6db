//! Small arithmetic circuits used to calibrate the pipeline.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::{
    ns,
    r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError},
};

use crate::gadgets::U8;

/// `X^(2^n) == Y` by `n` repeated squarings. `X` is secret, `Y` public.
#[derive(Clone, Debug)]
pub struct ExpoCircuit<F: PrimeField> {
    squarings: usize,
    x: Option<F>,
    y: Option<F>,
}

impl<F: PrimeField> ExpoCircuit<F> {
    pub fn blank(squarings: usize) -> Self {
        Self {
            squarings,
            x: None,
            y: None,
        }
    }

    /// Assignment with `Y` computed natively from `x`.
    pub fn new(squarings: usize, x: F) -> Self {
        let mut y = x;
        for _ in 0..squarings {
            y.square_in_place();
        }
        Self {
            squarings,
            x: Some(x),
            y: Some(y),
        }
    }

    pub fn output(&self) -> Option<F> {
        self.y
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for ExpoCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let x = FpVar::new_witness(ns!(cs, "x"), || {
            self.x.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let y = FpVar::new_input(ns!(cs, "y"), || {
            self.y.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let mut acc = x;
        for _ in 0..self.squarings {
            acc = acc.square()?;
        }
        acc.enforce_equal(&y)
    }
}

/// `X^E == Y` for a secret base and a secret 8-bit exponent, by
/// square-and-multiply over the exponent bits. Only `Y` is public.
#[derive(Clone, Debug)]
pub struct ExponentiateCircuit<F: PrimeField> {
    x: Option<F>,
    e: Option<u8>,
    y: Option<F>,
}

impl<F: PrimeField> ExponentiateCircuit<F> {
    pub fn blank() -> Self {
        Self {
            x: None,
            e: None,
            y: None,
        }
    }

    pub fn new(x: F, e: u8, y: F) -> Self {
        Self {
            x: Some(x),
            e: Some(e),
            y: Some(y),
        }
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for ExponentiateCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let x = FpVar::new_witness(ns!(cs, "x"), || {
            self.x.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let y = FpVar::new_input(ns!(cs, "y"), || {
            self.y.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let e = FpVar::new_witness(ns!(cs, "e"), || {
            self.e.map(F::from).ok_or(SynthesisError::AssignmentMissing)
        })?;

        let bits = U8::from_wire(&e)?;
        let x_minus_one = &x - F::one();
        let mut acc = FpVar::one();
        for bit in bits.bits_le().iter().rev() {
            acc = acc.square()?;
            // bit ? x : 1
            let factor = FpVar::from(bit.clone()) * &x_minus_one + F::one();
            acc *= factor;
        }
        acc.enforce_equal(&y)
    }
}
