//! Arithmetic in GF(2¹²⁸) under the reduction polynomial
//! f(x) = 1 + x + x² + x⁷ + x¹²⁸, and Shoup's 8-bit window tables for
//! multiplying by a fixed hash subkey `H`.
//!
//! GCM's "big-endian polynomial" convention places the constant term
//! (degree zero) in the most significant bit of byte 0, which matches
//! no CPU's native bit ordering. Every table below is built with that
//! convention in mind; see the module docs on [`Tables::new`].

use aead::generic_array::{typenum::U16, GenericArray};
use zeroize::Zeroize;

/// A 128-bit GCM block.
pub type Block = GenericArray<u8, U16>;

/// The GCM field polynomial, reduced to a single byte: `0xe1` encodes
/// `1 + x + x^2 + x^7` (the `x^128` term falls outside the 128-bit range).
const GCM_POLY: u8 = 0xe1;

/// Reverse the bits within a byte.
///
/// Table construction walks bit-reversed indices to compensate for
/// GCM placing its constant term at the wrong end of the byte for any
/// real CPU.
#[inline]
fn reverse_bits(byte: u8) -> u8 {
    let mut b = byte;
    b = (b & 0xf0) >> 4 | (b & 0x0f) << 4;
    b = (b & 0xcc) >> 2 | (b & 0x33) << 2;
    b = (b & 0xaa) >> 1 | (b & 0x55) << 1;
    b
}

/// Multiply a block by the field element `x`, i.e. a one-bit shift of
/// the big-endian-polynomial representation, reducing by the field
/// polynomial on overflow.
pub fn mul_x(block: &Block) -> Block {
    let mut out = Block::default();
    let mut carry = 0u8;
    for i in 0..16 {
        let byte = block[i];
        out[i] = (carry << 7) | (byte >> 1);
        carry = byte & 0x01;
    }
    if carry != 0 {
        out[0] ^= GCM_POLY;
    }
    out
}

fn xor_block(a: &Block, b: &Block) -> Block {
    let mut out = Block::default();
    for i in 0..16 {
        out[i] = a[i] ^ b[i];
    }
    out
}

/// Shoup's precomputed multiplication and reduction tables for a
/// single hash subkey `H`.
///
/// `m0[i] = H * P(i)` where `P(i)` is the polynomial whose
/// coefficients are the bits of `i` in GCM's bit order. `r[i]` holds
/// the top 16 bits of `x^128 * P(i) mod f(x)`; all lower bits of that
/// product are always zero, so a `u16` suffices.
///
/// One instance per context; rebuilt only when the context's key
/// changes.
#[derive(Clone)]
pub struct Tables {
    m0: [Block; 256],
    r: [u16; 256],
}

impl Tables {
    /// Build `M0`/`R` for hash subkey `h`.
    ///
    /// Indices are visited in numeric order but entries are written
    /// at their bit-reversed position, so each new entry is derived
    /// in O(1) from an entry already computed: odd (post-reversal)
    /// indices are the previous entry plus `H`, even indices are half
    /// the shift-by-`x` of a previously computed entry.
    pub fn new(h: &Block) -> Self {
        let mut m0 = [Block::default(); 256];
        let mut r = [0u16; 256];

        for i in 1usize..256 {
            let this = reverse_bits(i as u8) as usize;
            if this & 0x80 != 0 {
                let other = this & 0x7f;
                m0[this] = xor_block(h, &m0[other]);
                let reduce = r[other] ^ ((GCM_POLY as u16) << 8);
                r[this] = reduce;
            } else {
                let other = this << 1;
                m0[this] = mul_x(&m0[other]);
                r[this] = r[other] >> 1;
            }
        }

        Self { m0, r }
    }

    /// Multiply `block` by `x^8` in place, using the reduction table.
    ///
    /// Equivalent to eight successive [`mul_x`] calls, but performed
    /// as a byte-wise shift plus one table lookup.
    pub fn mul_x8(&self, block: &mut Block) {
        let msb = block[15];
        for i in (1..16).rev() {
            block[i] = block[i - 1];
        }
        block[0] = 0;
        let reduce = self.r[msb as usize].to_be_bytes();
        block[0] ^= reduce[0];
        block[1] ^= reduce[1];
    }

    /// Multiply `block` by the hash subkey `H` these tables were built
    /// for, returning the result.
    ///
    /// An 8-bit-wide Horner evaluation: 16 table lookups, 15
    /// shift-by-byte steps, and 15 XORs.
    pub fn mul_h(&self, block: &Block) -> Block {
        let mut acc = self.m0[block[15] as usize];
        for i in (0..15).rev() {
            self.mul_x8(&mut acc);
            let entry = &self.m0[block[i] as usize];
            for j in 0..16 {
                acc[j] ^= entry[j];
            }
        }
        acc
    }
}

impl Zeroize for Tables {
    fn zeroize(&mut self) {
        for block in self.m0.iter_mut() {
            block.as_mut_slice().zeroize();
        }
        for entry in self.r.iter_mut() {
            entry.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(bytes: [u8; 16]) -> Block {
        Block::clone_from_slice(&bytes)
    }

    #[test]
    fn mul_x_matches_eight_steps_of_mul_x8() {
        let h = block(*b"0123456789abcdef");
        let tables = Tables::new(&h);

        let input = block(*b"ABCDEFGHIJKLMNOP");

        let mut via_mul_x8 = input;
        tables.mul_x8(&mut via_mul_x8);

        let mut via_mul_x = input;
        for _ in 0..8 {
            via_mul_x = mul_x(&via_mul_x);
        }

        assert_eq!(via_mul_x8, via_mul_x);
    }

    #[test]
    fn mul_h_is_linear() {
        let h = block([0x11; 16]);
        let tables = Tables::new(&h);

        let b1 = block([0x22; 16]);
        let b2 = block([0x33; 16]);
        let xor = xor_block(&b1, &b2);

        let lhs = tables.mul_h(&xor);
        let rhs = xor_block(&tables.mul_h(&b1), &tables.mul_h(&b2));

        assert_eq!(lhs, rhs);
    }

    #[test]
    fn tables_are_deterministic() {
        let h = block([0xaa; 16]);
        let a = Tables::new(&h);
        let b = Tables::new(&h);
        assert_eq!(&a.m0[..], &b.m0[..]);
        assert_eq!(&a.r[..], &b.r[..]);
    }

    #[test]
    fn zero_entry_is_identity_element() {
        let h = block([0x77; 16]);
        let tables = Tables::new(&h);
        assert_eq!(tables.m0[0], Block::default());
        assert_eq!(tables.r[0], 0);
    }
}
