//! Fixed-width words held as individual boolean wires.
//!
//! Bitwise operations, rotations and shifts only re-wire or combine bits, so
//! they are cheap; the single arithmetic operation, [`BitWord::wrapping_add_many`],
//! pays one binary decomposition for the whole sum.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use super::bits::{decompose, recompose};

/// An `N`-bit word, least-significant bit first.
#[derive(Clone, Debug)]
pub struct BitWord<F: PrimeField, const N: usize> {
    bits: [Boolean<F>; N],
}

pub type U8<F> = BitWord<F, 8>;
pub type U32<F> = BitWord<F, 32>;
pub type U64<F> = BitWord<F, 64>;

impl<F: PrimeField, const N: usize> BitWord<F, N> {
    const WIDTH_CHECK: () = assert!(N > 0 && N <= 64, "word width must be in 1..=64");

    /// Builds a word from exactly `N` little-endian bits.
    pub fn from_bits_le(bits: &[Boolean<F>]) -> Self {
        let () = Self::WIDTH_CHECK;
        assert_eq!(bits.len(), N, "expected {N} bits, got {}", bits.len());
        Self {
            bits: std::array::from_fn(|i| bits[i].clone()),
        }
    }

    pub fn bits_le(&self) -> &[Boolean<F>; N] {
        &self.bits
    }

    /// Constant word holding the low `N` bits of `value`.
    pub fn constant(value: u64) -> Self {
        let () = Self::WIDTH_CHECK;
        Self {
            bits: std::array::from_fn(|i| Boolean::constant((value >> i) & 1 == 1)),
        }
    }

    pub fn zero() -> Self {
        Self::constant(0)
    }

    /// Binary decomposition of a native wire. Unsatisfiable unless the wire
    /// holds a value below `2^N`.
    pub fn from_wire(wire: &FpVar<F>) -> Result<Self, SynthesisError> {
        let () = Self::WIDTH_CHECK;
        Ok(Self::from_bits_le(&decompose(wire, N)?))
    }

    /// Recomposes the word into a native wire without adding constraints.
    pub fn to_wire(&self) -> FpVar<F> {
        recompose(&self.bits)
    }

    pub fn value(&self) -> Result<u64, SynthesisError> {
        self.bits
            .iter()
            .enumerate()
            .try_fold(0u64, |acc, (i, bit)| Ok(acc | (u64::from(bit.value()?) << i)))
    }

    pub fn is_constant(&self) -> bool {
        self.bits.iter().all(|bit| bit.is_constant())
    }

    pub fn and(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a & b)
    }

    pub fn or(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a | b)
    }

    pub fn xor(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a ^ b)
    }

    pub fn not(&self) -> Self {
        Self {
            bits: std::array::from_fn(|i| !self.bits[i].clone()),
        }
    }

    /// Folds left to right; an empty slice yields all ones.
    pub fn and_many(words: &[Self]) -> Self {
        words
            .iter()
            .fold(Self::constant(u64::MAX), |acc, w| acc.and(w))
    }

    /// Folds left to right; an empty slice yields zero.
    pub fn or_many(words: &[Self]) -> Self {
        words.iter().fold(Self::zero(), |acc, w| acc.or(w))
    }

    /// Folds left to right; an empty slice yields zero.
    pub fn xor_many(words: &[Self]) -> Self {
        words.iter().fold(Self::zero(), |acc, w| acc.xor(w))
    }

    /// `out[i] = in[(i + r) mod N]`.
    pub fn rotate_right(&self, r: usize) -> Self {
        Self {
            bits: std::array::from_fn(|i| self.bits[(i + r) % N].clone()),
        }
    }

    pub fn rotate_left(&self, r: usize) -> Self {
        self.rotate_right(N - r % N)
    }

    /// Logical shift; vacated high bits are constant zero.
    pub fn shift_right(&self, r: usize) -> Self {
        Self {
            bits: std::array::from_fn(|i| {
                self.bits
                    .get(i + r)
                    .cloned()
                    .unwrap_or(Boolean::FALSE)
            }),
        }
    }

    /// Vacated low bits are constant zero.
    pub fn shift_left(&self, r: usize) -> Self {
        Self {
            bits: std::array::from_fn(|i| {
                if i >= r {
                    self.bits[i - r].clone()
                } else {
                    Boolean::FALSE
                }
            }),
        }
    }

    pub fn wrapping_add(&self, other: &Self) -> Result<Self, SynthesisError> {
        Self::wrapping_add_many(&[self.clone(), other.clone()])
    }

    /// Sum modulo `2^N`.
    ///
    /// The operands are recomposed, summed natively, and the sum is decomposed
    /// into `N + ceil(log2(k))` bits of which the low `N` are kept. Constant
    /// operands fold into a constant result.
    pub fn wrapping_add_many(words: &[Self]) -> Result<Self, SynthesisError> {
        match words {
            [] => return Ok(Self::zero()),
            [single] => return Ok(single.clone()),
            _ => {}
        }
        let carry_bits = (usize::BITS - (words.len() - 1).leading_zeros()) as usize;
        let sum = words
            .iter()
            .fold(FpVar::zero(), |acc, w| acc + w.to_wire());
        let bits = decompose(&sum, N + carry_bits)?;
        Ok(Self::from_bits_le(&bits[..N]))
    }

    /// Explicit width change: truncates to the low `M` bits or zero-extends.
    pub fn resize<const M: usize>(&self) -> BitWord<F, M> {
        BitWord {
            bits: std::array::from_fn(|i| {
                self.bits.get(i).cloned().unwrap_or(Boolean::FALSE)
            }),
        }
    }

    /// Packs big-endian bytes (most significant first) into one word.
    pub fn from_be_bytes(bytes: &[U8<F>]) -> Self {
        assert_eq!(bytes.len() * 8, N, "{} bytes cannot fill a {N}-bit word", bytes.len());
        let bits: Vec<_> = bytes
            .iter()
            .rev()
            .flat_map(|byte| byte.bits.iter().cloned())
            .collect();
        Self::from_bits_le(&bits)
    }

    pub fn to_be_bytes(&self) -> Vec<U8<F>> {
        assert_eq!(N % 8, 0, "{N}-bit word is not byte aligned");
        self.bits
            .chunks(8)
            .rev()
            .map(U8::from_bits_le)
            .collect()
    }

    pub fn enforce_equal(&self, other: &Self) -> Result<(), SynthesisError> {
        self.bits.as_slice().enforce_equal(other.bits.as_slice())
    }

    fn zip_with(&self, other: &Self, f: impl Fn(&Boolean<F>, &Boolean<F>) -> Boolean<F>) -> Self {
        Self {
            bits: std::array::from_fn(|i| f(&self.bits[i], &other.bits[i])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};
    use rand_chacha::ChaCha20Rng;
    use rand_core::{RngCore, SeedableRng};

    fn word<const N: usize>(cs: &ConstraintSystemRef<Fr>, v: u64) -> BitWord<Fr, N> {
        let wire = FpVar::new_witness(cs.clone(), || Ok(Fr::from(v))).unwrap();
        BitWord::from_wire(&wire).unwrap()
    }

    fn mask(n: usize) -> u64 {
        if n == 64 {
            u64::MAX
        } else {
            (1 << n) - 1
        }
    }

    fn native_rotr(x: u64, r: usize, n: usize) -> u64 {
        let r = r % n;
        if r == 0 {
            x
        } else {
            ((x >> r) | (x << (n - r))) & mask(n)
        }
    }

    fn check_against_native<const N: usize>(rng: &mut ChaCha20Rng) {
        let m = mask(N);
        let mut values = vec![0, 1, m, m - 1, 1 << (N - 1), m >> 1];
        values.extend((0..6).map(|_| rng.next_u64() & m));

        let cs = ConstraintSystem::<Fr>::new_ref();
        let words: Vec<BitWord<Fr, N>> = values.iter().map(|&v| word(&cs, v)).collect();

        for (a, &x) in words.iter().zip(&values) {
            assert_eq!(a.value().unwrap(), x);
            assert_eq!(a.not().value().unwrap(), !x & m, "not {x:#x}");
            for r in [0, 1, N / 2, N - 1, N, N + 3] {
                assert_eq!(a.rotate_right(r).value().unwrap(), native_rotr(x, r, N));
                assert_eq!(
                    a.rotate_left(r).value().unwrap(),
                    native_rotr(x, N - r % N, N),
                    "rotl {x:#x} by {r}"
                );
            }
            for r in [0, 1, N / 2, N - 1] {
                assert_eq!(a.shift_right(r).value().unwrap(), x >> r);
                assert_eq!(a.shift_left(r).value().unwrap(), (x << r) & m);
            }
            assert_eq!(a.shift_right(N).value().unwrap(), 0);
            assert_eq!(a.shift_left(N).value().unwrap(), 0);

            for (b, &y) in words.iter().zip(&values) {
                assert_eq!(a.and(b).value().unwrap(), x & y);
                assert_eq!(a.or(b).value().unwrap(), x | y);
                assert_eq!(a.xor(b).value().unwrap(), x ^ y);
                assert_eq!(
                    a.wrapping_add(b).unwrap().value().unwrap(),
                    x.wrapping_add(y) & m,
                    "{x:#x} + {y:#x}"
                );
            }
        }

        let native_sum = |vs: &[u64]| vs.iter().fold(0u64, |acc, v| acc.wrapping_add(*v)) & m;
        assert_eq!(
            BitWord::wrapping_add_many(&words).unwrap().value().unwrap(),
            native_sum(values.as_slice())
        );
        // A carry out of every bit position.
        for k in 2..=5 {
            let maxed = vec![words[2].clone(); k];
            assert_eq!(
                BitWord::wrapping_add_many(&maxed).unwrap().value().unwrap(),
                native_sum(vec![m; k].as_slice())
            );
        }
        assert_eq!(
            BitWord::xor_many(&words).value().unwrap(),
            values.iter().fold(0, |acc, v| acc ^ v)
        );
        assert_eq!(
            BitWord::and_many(&words[2..4]).value().unwrap(),
            values[2] & values[3]
        );
        assert_eq!(
            BitWord::or_many(&words).value().unwrap(),
            values.iter().fold(0, |acc, v| acc | v)
        );
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn operators_match_native_on_random_and_boundary_values() {
        let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);
        check_against_native::<8>(&mut rng);
        check_against_native::<32>(&mut rng);
        check_against_native::<64>(&mut rng);
    }

    #[test]
    fn bitwise_ops_match_native() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (x, y) = (0xdead_beefu64, 0x0123_4567u64);
        let (a, b) = (word::<32>(&cs, x), word::<32>(&cs, y));

        assert_eq!(a.and(&b).value().unwrap(), x & y);
        assert_eq!(a.or(&b).value().unwrap(), x | y);
        assert_eq!(a.xor(&b).value().unwrap(), x ^ y);
        assert_eq!(a.not().value().unwrap(), !x & 0xffff_ffff);
        assert_eq!(
            U32::xor_many(&[a.clone(), b.clone(), a.clone()]).value().unwrap(),
            y
        );
        assert_eq!(U32::<Fr>::and_many(&[]).value().unwrap(), 0xffff_ffff);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn rotations_and_shifts_are_free() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let x = 0x8000_0001u64;
        let a = word::<32>(&cs, x);
        let before = cs.num_constraints();

        assert_eq!(
            a.rotate_right(7).value().unwrap(),
            u64::from((x as u32).rotate_right(7))
        );
        assert_eq!(
            a.rotate_left(3).value().unwrap(),
            u64::from((x as u32).rotate_left(3))
        );
        assert_eq!(a.rotate_right(32).value().unwrap(), x);
        assert_eq!(a.shift_right(4).value().unwrap(), x >> 4);
        assert_eq!(a.shift_left(4).value().unwrap(), (x << 4) & 0xffff_ffff);
        assert_eq!(a.shift_right(40).value().unwrap(), 0);
        assert_eq!(cs.num_constraints(), before);
    }

    #[test]
    fn addition_wraps() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = word::<32>(&cs, 0xffff_ffff);
        let b = word::<32>(&cs, 2);
        let c = word::<32>(&cs, 0x8000_0000);
        assert_eq!(a.wrapping_add(&b).unwrap().value().unwrap(), 1);
        let sum = U32::wrapping_add_many(&[a, b, c.clone(), c]).unwrap();
        assert_eq!(
            sum.value().unwrap(),
            0xffff_ffffu64.wrapping_add(2 + 0x1_0000_0000) & 0xffff_ffff
        );
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn sixty_four_bit_addition() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let x = 0xfedc_ba98_7654_3210u64;
        let y = 0x1357_9bdf_0246_8ace_u64;
        let sum = word::<64>(&cs, x).wrapping_add(&word::<64>(&cs, y)).unwrap();
        assert_eq!(sum.value().unwrap(), x.wrapping_add(y));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn constant_addition_folds() {
        let sum = U32::<Fr>::wrapping_add_many(&[
            U32::constant(0xffff_fff0),
            U32::constant(0x20),
            U32::constant(1),
        ])
        .unwrap();
        assert!(sum.is_constant());
        assert_eq!(sum.value().unwrap(), 0x11);
    }

    #[test]
    fn oversized_wire_is_unsatisfiable() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        word::<8>(&cs, 300);
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn byte_order_is_big_endian() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let bytes: Vec<U8<Fr>> = [0x01, 0x23, 0x45, 0x67]
            .iter()
            .map(|b| word::<8>(&cs, *b))
            .collect();
        let w = U32::from_be_bytes(&bytes);
        assert_eq!(w.value().unwrap(), 0x0123_4567);
        let back: Vec<u64> = w.to_be_bytes().iter().map(|b| b.value().unwrap()).collect();
        assert_eq!(back, vec![0x01, 0x23, 0x45, 0x67]);
    }

    #[test]
    fn resize_truncates_or_extends() {
        let w = U32::<Fr>::constant(0xabcd_1234);
        assert_eq!(w.resize::<16>().value().unwrap(), 0x1234);
        assert_eq!(w.resize::<64>().value().unwrap(), 0xabcd_1234);
    }

    #[test]
    fn mismatched_words_fail_equality() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = word::<8>(&cs, 7);
        let b = word::<8>(&cs, 9);
        a.enforce_equal(&b).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
