use ark_ff::PrimeField;
use ark_relations::r1cs::SynthesisError;
use itertools::Itertools;

use super::Sha2Params;
use crate::gadgets::{BitWord, U8};

fn big_sigma<F: PrimeField, const W: usize>(x: &BitWord<F, W>, r: [usize; 3]) -> BitWord<F, W> {
    BitWord::xor_many(&[x.rotate_right(r[0]), x.rotate_right(r[1]), x.rotate_right(r[2])])
}

fn small_sigma<F: PrimeField, const W: usize>(
    x: &BitWord<F, W>,
    r: [usize; 3],
) -> BitWord<F, W> {
    BitWord::xor_many(&[x.rotate_right(r[0]), x.rotate_right(r[1]), x.shift_right(r[2])])
}

/// `(e & f) ^ (!e & g)`, written as `g ^ (e & (f ^ g))`.
fn ch<F: PrimeField, const W: usize>(
    e: &BitWord<F, W>,
    f: &BitWord<F, W>,
    g: &BitWord<F, W>,
) -> BitWord<F, W> {
    g.xor(&e.and(&f.xor(g)))
}

/// `(a & b) ^ (a & c) ^ (b & c)`, written as `(a & b) ^ (c & (a ^ b))`.
fn maj<F: PrimeField, const W: usize>(
    a: &BitWord<F, W>,
    b: &BitWord<F, W>,
    c: &BitWord<F, W>,
) -> BitWord<F, W> {
    a.and(b).xor(&c.and(&a.xor(b)))
}

/// Runs the compression function over one block and adds the result into `h`.
pub(super) fn compress<F: PrimeField, P: Sha2Params<W>, const W: usize>(
    h: &mut [BitWord<F, W>; 8],
    block: &[U8<F>],
) -> Result<(), SynthesisError> {
    let word_bytes = W / 8;
    debug_assert_eq!(block.len(), 16 * word_bytes);

    let mut w: Vec<BitWord<F, W>> = Vec::with_capacity(P::K.len());
    w.extend(block.chunks(word_bytes).map(BitWord::from_be_bytes));
    for t in 16..P::K.len() {
        let s0 = small_sigma(&w[t - 15], P::SMALL_SIGMA0);
        let s1 = small_sigma(&w[t - 2], P::SMALL_SIGMA1);
        let next = BitWord::wrapping_add_many(&[s1, w[t - 7].clone(), s0, w[t - 16].clone()])?;
        w.push(next);
    }

    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut hh] = h.clone();
    for (t, k) in P::K.iter().enumerate() {
        // t1 is never decomposed on its own; it feeds both sums directly.
        let t1 = [
            hh.clone(),
            big_sigma(&e, P::BIG_SIGMA1),
            ch(&e, &f, &g),
            BitWord::constant(*k),
            w[t].clone(),
        ];

        let mut e_terms = Vec::with_capacity(t1.len() + 1);
        e_terms.push(d.clone());
        e_terms.extend_from_slice(&t1);
        let new_e = BitWord::wrapping_add_many(&e_terms)?;

        let mut a_terms = t1.to_vec();
        a_terms.push(big_sigma(&a, P::BIG_SIGMA0));
        a_terms.push(maj(&a, &b, &c));
        let new_a = BitWord::wrapping_add_many(&a_terms)?;

        hh = g;
        g = f;
        f = e;
        e = new_e;
        d = c;
        c = b;
        b = a;
        a = new_a;
    }

    for (slot, v) in h.iter_mut().zip_eq([a, b, c, d, e, f, g, hh]) {
        *slot = slot.wrapping_add(&v)?;
    }
    Ok(())
}
