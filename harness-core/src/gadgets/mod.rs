//! Bit-level gadgets over R1CS booleans.

mod bits;
mod bitword;

pub use bits::{decompose, recompose};
pub use bitword::{BitWord, U32, U64, U8};
