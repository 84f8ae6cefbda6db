//! SHA-256 and SHA-512 over [`BitWord`]s.
//!
//! Both variants share one implementation parameterised by word width. Input
//! bytes may be supplied incrementally; padding and the final length block are
//! emitted on [`Sha2State::finalize`].

mod circuit;
mod compress;
mod constants;

use std::marker::PhantomData;

use ark_ff::PrimeField;
use ark_relations::r1cs::SynthesisError;

use crate::gadgets::{BitWord, U8};

pub use circuit::Sha2Circuit;

/// Round constants and rotation amounts of one SHA-2 variant with `W`-bit words.
pub trait Sha2Params<const W: usize>: Clone {
    const IV: [u64; 8];
    const K: &'static [u64];
    /// Σ0 rotations.
    const BIG_SIGMA0: [usize; 3];
    /// Σ1 rotations.
    const BIG_SIGMA1: [usize; 3];
    /// σ0: two rotations and a shift.
    const SMALL_SIGMA0: [usize; 3];
    /// σ1: two rotations and a shift.
    const SMALL_SIGMA1: [usize; 3];
}

#[derive(Clone, Copy, Debug)]
pub struct Sha256;

#[derive(Clone, Copy, Debug)]
pub struct Sha512;

impl Sha2Params<32> for Sha256 {
    const IV: [u64; 8] = constants::SHA256_IV;
    const K: &'static [u64] = &constants::SHA256_K;
    const BIG_SIGMA0: [usize; 3] = [2, 13, 22];
    const BIG_SIGMA1: [usize; 3] = [6, 11, 25];
    const SMALL_SIGMA0: [usize; 3] = [7, 18, 3];
    const SMALL_SIGMA1: [usize; 3] = [17, 19, 10];
}

impl Sha2Params<64> for Sha512 {
    const IV: [u64; 8] = constants::SHA512_IV;
    const K: &'static [u64] = &constants::SHA512_K;
    const BIG_SIGMA0: [usize; 3] = [28, 34, 39];
    const BIG_SIGMA1: [usize; 3] = [14, 18, 41];
    const SMALL_SIGMA0: [usize; 3] = [1, 8, 7];
    const SMALL_SIGMA1: [usize; 3] = [19, 61, 6];
}

/// Incremental hasher state: chaining value, partial block and byte count.
#[derive(Clone, Debug)]
pub struct Sha2State<F: PrimeField, P: Sha2Params<W>, const W: usize> {
    h: [BitWord<F, W>; 8],
    buffer: Vec<U8<F>>,
    length: u64,
    _params: PhantomData<P>,
}

impl<F: PrimeField, P: Sha2Params<W>, const W: usize> Default for Sha2State<F, P, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: PrimeField, P: Sha2Params<W>, const W: usize> Sha2State<F, P, W> {
    /// Sixteen `W`-bit words.
    pub const BLOCK_BYTES: usize = 2 * W;
    /// Two `W`-bit words carry the message bit length.
    pub const LENGTH_BYTES: usize = W / 4;
    pub const DIGEST_BYTES: usize = W;

    pub fn new() -> Self {
        Self {
            h: P::IV.map(BitWord::constant),
            buffer: Vec::with_capacity(Self::BLOCK_BYTES),
            length: 0,
            _params: PhantomData,
        }
    }

    /// Absorbs `bytes`, compressing every block that fills up.
    pub fn update(&mut self, bytes: &[U8<F>]) -> Result<(), SynthesisError> {
        self.length += bytes.len() as u64;
        for byte in bytes {
            self.buffer.push(byte.clone());
            if self.buffer.len() == Self::BLOCK_BYTES {
                compress::compress::<F, P, W>(&mut self.h, &self.buffer)?;
                self.buffer.clear();
            }
        }
        Ok(())
    }

    /// Pads, compresses the trailing block(s) and returns the big-endian digest.
    pub fn finalize(mut self) -> Result<Vec<U8<F>>, SynthesisError> {
        let bit_length = u128::from(self.length) * 8;
        let pad = padding_len(self.length, Self::BLOCK_BYTES, Self::LENGTH_BYTES);

        let mut tail = Vec::with_capacity(pad + Self::LENGTH_BYTES);
        tail.push(U8::constant(0x80));
        tail.resize(pad, U8::zero());
        let length_bytes = bit_length.to_be_bytes();
        tail.extend(
            length_bytes[length_bytes.len() - Self::LENGTH_BYTES..]
                .iter()
                .map(|b| U8::constant(u64::from(*b))),
        );

        self.update(&tail)?;
        debug_assert!(self.buffer.is_empty());

        Ok(self.h.iter().flat_map(BitWord::to_be_bytes).collect())
    }
}

/// Bytes of `0x80 || 0x00*` appended before the length field so that the
/// padded message fills whole blocks.
///
/// A message whose trailing partial block leaves fewer than `length_bytes + 1`
/// free bytes spills into a second block.
pub fn padding_len(message_len: u64, block_bytes: usize, length_bytes: usize) -> usize {
    let used = (message_len % block_bytes as u64) as usize;
    let limit = block_bytes - length_bytes;
    if used < limit {
        limit - used
    } else {
        block_bytes + limit - used
    }
}

/// One-shot digest of `bytes`.
pub fn digest<F: PrimeField, P: Sha2Params<W>, const W: usize>(
    bytes: &[U8<F>],
) -> Result<Vec<U8<F>>, SynthesisError> {
    let mut state = Sha2State::<F, P, W>::new();
    state.update(bytes)?;
    state.finalize()
}
