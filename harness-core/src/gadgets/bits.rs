use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

/// Splits `value` into `num_bits` little-endian booleans and constrains their
/// weighted sum back to `value`.
///
/// The constraint system becomes unsatisfiable when the assigned value does not
/// fit in `num_bits` bits. A constant input yields constant bits and no
/// constraints.
pub fn decompose<F: PrimeField>(
    value: &FpVar<F>,
    num_bits: usize,
) -> Result<Vec<Boolean<F>>, SynthesisError> {
    assert!(
        num_bits < F::MODULUS_BIT_SIZE as usize,
        "decomposition into {num_bits} bits can wrap around the field modulus"
    );
    let native = value.value().ok().map(|v| v.into_bigint());
    let cs = value.cs();

    if cs.is_none() {
        let native = native.ok_or(SynthesisError::AssignmentMissing)?;
        if native.num_bits() as usize > num_bits {
            return Err(SynthesisError::Unsatisfiable);
        }
        return Ok((0..num_bits)
            .map(|i| Boolean::constant(native.get_bit(i)))
            .collect());
    }

    let bits = (0..num_bits)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                native
                    .map(|n| n.get_bit(i))
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    recompose(&bits).enforce_equal(value)?;
    Ok(bits)
}

/// Σ bit_i · 2^i. Adds no constraints.
pub fn recompose<F: PrimeField>(bits: &[Boolean<F>]) -> FpVar<F> {
    let mut coeff = F::one();
    let mut acc = FpVar::zero();
    for bit in bits {
        acc += FpVar::from(bit.clone()) * coeff;
        coeff.double_in_place();
    }
    acc
}
