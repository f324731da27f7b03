//! The GHASH accumulator: a running polynomial hash over GF(2¹²⁸),
//! built on the Shoup tables in [`crate::field`].

use crate::field::{Block, Tables};
use zeroize::Zeroize;

/// `Y`, the running GHASH value. Starts at zero; each call to
/// [`absorb`](Ghash::absorb) folds in one block: `Y <- (Y xor B) * H`.
///
/// Partial trailing blocks shorter than 16 bytes are zero-padded on
/// the right before XOR, per NIST SP 800-38D's definition of GHASH.
#[derive(Clone, Default)]
pub struct Ghash {
    y: Block,
}

impl Ghash {
    /// A fresh accumulator with `Y = 0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current accumulator value.
    pub fn value(&self) -> Block {
        self.y
    }

    /// Reset the accumulator to zero.
    pub fn reset(&mut self) {
        self.y = Block::default();
    }

    /// Fold one block into the accumulator. `data` may be shorter than
    /// 16 bytes, in which case it is treated as zero-padded on the right.
    pub fn absorb(&mut self, tables: &Tables, data: &[u8]) {
        debug_assert!(data.len() <= 16);
        for (y_byte, &in_byte) in self.y.iter_mut().zip(data) {
            *y_byte ^= in_byte;
        }
        self.y = tables.mul_h(&self.y);
    }
}

impl Zeroize for Ghash {
    fn zeroize(&mut self) {
        self.y.as_mut_slice().zeroize();
    }
}
