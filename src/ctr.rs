//! Counter-mode keystream generation: a 96-bit IV field plus a 32-bit
//! big-endian counter, incremented modulo 2³² and never touching the
//! IV field.

use crate::field::Block;
use aes::block_cipher_trait::BlockCipher;

/// Increment the low 32 bits of `ctr` modulo 2³², leaving the high 96
/// bits (the IV field) untouched.
pub fn increment(ctr: &mut Block) {
    let counter = u32::from_be_bytes([ctr[12], ctr[13], ctr[14], ctr[15]]);
    let next = counter.wrapping_add(1);
    ctr[12..16].copy_from_slice(&next.to_be_bytes());
}

/// Produce one keystream block by encrypting `ctr` under `cipher`.
/// Does not itself increment the counter; callers call [`increment`]
/// first, per the GCM convention that `J1 = inc32(J0)` is the first
/// counter actually used for keystream.
pub fn keystream_block<C>(cipher: &C, ctr: &Block) -> Block
where
    C: BlockCipher<BlockSize = aead::generic_array::typenum::U16>,
{
    let mut block = *ctr;
    cipher.encrypt_block(&mut block);
    block
}
