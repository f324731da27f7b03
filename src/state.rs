//! The GCM AEAD state machine: key setup, IV processing, streaming
//! AAD/plaintext/ciphertext, and tag finalization.
//!
//! This is the low-level primitive: deliberately permissive. Unlike
//! the `aead::Aead` wrapper built on top of it (see [`crate::Gcm`]),
//! [`GcmCore::decrypt`] hands back plaintext before the tag is
//! checked, so callers who use this type directly are responsible for
//! buffering and verifying the tag themselves.

use crate::ctr;
use crate::field::{Block, Tables};
use crate::ghash::Ghash;
use crate::Error;
use aead::generic_array::typenum::U16;
use aes::block_cipher_trait::{BlockCipher, NewBlockCipher};
use zeroize::Zeroize;

/// Per-session GCM state: hash subkey, precomputed multiplication
/// tables, running GHASH accumulator, bit-length counters, counter
/// block, and the underlying cipher's key schedule.
///
/// Tables are owned per-context rather than shared in a process-wide
/// cache, so no synchronization is needed, which matters because a
/// `GcmCore` may outlive any particular thread that touches it.
pub struct GcmCore<C: BlockCipher<BlockSize = U16> + NewBlockCipher> {
    cipher: C,
    h: Block,
    tables: Tables,
    hash: Ghash,
    aad_bits: u64,
    data_bits: u64,
    ctr: Block,
    #[cfg(debug_assertions)]
    finalized: bool,
}

impl<C: BlockCipher<BlockSize = U16> + NewBlockCipher> GcmCore<C> {
    /// Set up a fresh session: initialize the underlying cipher's key
    /// schedule, derive the hash subkey `H = E_K(0^128)`, and build
    /// its Shoup tables.
    ///
    /// The counter block is left at the "tentative `J0`"
    /// (all-zero IV field, counter = 1) until [`set_iv`](Self::set_iv)
    /// runs; callers must call `set_iv` before `encrypt`/`decrypt`.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        let cipher = C::new_varkey(key).map_err(|_| Error::CipherKey)?;

        let mut h = Block::default();
        cipher.encrypt_block(&mut h);
        let tables = Tables::new(&h);

        let mut ctr = Block::default();
        ctr[12..16].copy_from_slice(&1u32.to_be_bytes());

        Ok(Self {
            cipher,
            h,
            tables,
            hash: Ghash::new(),
            aad_bits: 0,
            data_bits: 0,
            ctr,
            #[cfg(debug_assertions)]
            finalized: false,
        })
    }

    /// Process a nonce/IV, producing the initial counter block `J0`.
    ///
    /// A 12-byte IV is used directly: `J0 = IV || 0x00000001`. Any
    /// other (non-empty) length is GHASH-reduced per NIST SP 800-38D
    /// §7.1 step 2: `J0 = GHASH(H, IV || pad || len64(|IV|))`, in
    /// which case the resulting counter field of `J0` is whatever
    /// GHASH produced, not explicitly 1. This asymmetry with the
    /// 12-byte fast path is intentional, matching NIST SP 800-38D.
    pub fn set_iv(&mut self, iv: &[u8]) {
        debug_assert!(!iv.is_empty(), "GCM does not support zero-length IVs");

        self.hash.reset();
        self.aad_bits = 0;
        self.data_bits = 0;
        #[cfg(debug_assertions)]
        {
            self.finalized = false;
        }

        self.ctr = Block::default();
        self.ctr[12..16].copy_from_slice(&1u32.to_be_bytes());

        if iv.len() == 12 {
            self.ctr[0..12].copy_from_slice(iv);
        } else {
            self.data_bits = (iv.len() as u64) * 8;
            self.ghash_absorb(iv);
            let j0 = self.finalize_hash();
            self.ctr = j0;

            self.hash.reset();
            self.data_bits = 0;
        }
    }

    /// Encrypt (`dst = Some`) or absorb additional authenticated data
    /// (`dst = None`) from `src`.
    ///
    /// `src.len()` may be any size and this may be called repeatedly;
    /// only the final call in a phase (AAD, then data) may carry a
    /// partial 16-byte block.
    pub fn encrypt(&mut self, src: &[u8], dst: Option<&mut [u8]>) {
        match dst {
            Some(dst) => {
                assert_eq!(src.len(), dst.len(), "src/dst length mismatch");
                self.assert_not_finalized();
                self.data_bits += (src.len() as u64) * 8;
                self.ctr_xor(src, dst);
                self.ghash_absorb(dst);
            }
            None => {
                self.assert_aad_open();
                self.assert_not_finalized();
                self.aad_bits += (src.len() as u64) * 8;
                self.ghash_absorb(src);
            }
        }
    }

    /// Decrypt (`dst = Some`) or absorb additional authenticated data
    /// (`dst = None`) from `src`.
    ///
    /// This hands back plaintext immediately, before the tag is
    /// checked. See the module docs.
    pub fn decrypt(&mut self, src: &[u8], dst: Option<&mut [u8]>) {
        match dst {
            Some(dst) => {
                assert_eq!(src.len(), dst.len(), "src/dst length mismatch");
                self.assert_not_finalized();
                self.data_bits += (src.len() as u64) * 8;
                self.ghash_absorb(src);
                self.ctr_xor(src, dst);
            }
            None => {
                self.assert_aad_open();
                self.assert_not_finalized();
                self.aad_bits += (src.len() as u64) * 8;
                self.ghash_absorb(src);
            }
        }
    }

    /// Finalize: fold the length block into GHASH, recover `E_K(J0)`
    /// from the current counter without having stored `J0` separately,
    /// and XOR it into the running hash to produce the tag.
    pub fn tag(&mut self) -> Block {
        self.assert_not_finalized();
        let y = self.finalize_hash();

        let blocks = (self.data_bits + 127) / 128;
        let mut j0 = self.ctr;
        let counter = u32::from_be_bytes([j0[12], j0[13], j0[14], j0[15]]);
        j0[12..16].copy_from_slice(&counter.wrapping_sub(blocks as u32).to_be_bytes());

        let mut tag = y;
        let ek_j0 = ctr::keystream_block(&self.cipher, &j0);
        for i in 0..16 {
            tag[i] ^= ek_j0[i];
        }

        #[cfg(debug_assertions)]
        {
            self.finalized = true;
        }
        tag
    }

    /// Absorb the big-endian `(aad_bits, data_bits)` length block into
    /// the running hash and return the resulting value. Used both by
    /// [`tag`](Self::tag) and by the IV-hash path of
    /// [`set_iv`](Self::set_iv), which is the same finalization
    /// routine applied mid-stream.
    fn finalize_hash(&mut self) -> Block {
        let mut lengths = Block::default();
        lengths[0..8].copy_from_slice(&self.aad_bits.to_be_bytes());
        lengths[8..16].copy_from_slice(&self.data_bits.to_be_bytes());
        self.hash.absorb(&self.tables, &lengths);
        self.hash.value()
    }

    fn ctr_xor(&mut self, src: &[u8], dst: &mut [u8]) {
        for (src_frag, dst_frag) in src.chunks(16).zip(dst.chunks_mut(16)) {
            ctr::increment(&mut self.ctr);
            let keystream = ctr::keystream_block(&self.cipher, &self.ctr);
            for (d, (s, k)) in dst_frag.iter_mut().zip(src_frag.iter().zip(keystream.iter())) {
                *d = s ^ k;
            }
        }
    }

    fn ghash_absorb(&mut self, data: &[u8]) {
        for chunk in data.chunks(16) {
            self.hash.absorb(&self.tables, chunk);
        }
    }

    #[cfg(debug_assertions)]
    fn assert_aad_open(&self) {
        debug_assert_eq!(
            self.data_bits, 0,
            "AAD must be fully absorbed before any data is processed"
        );
    }

    #[cfg(not(debug_assertions))]
    fn assert_aad_open(&self) {}

    #[cfg(debug_assertions)]
    fn assert_not_finalized(&self) {
        debug_assert!(!self.finalized, "GcmCore used after tag() finalized it");
    }

    #[cfg(not(debug_assertions))]
    fn assert_not_finalized(&self) {}
}

impl<C: BlockCipher<BlockSize = U16> + NewBlockCipher> Drop for GcmCore<C> {
    fn drop(&mut self) {
        self.h.as_mut_slice().zeroize();
        self.ctr.as_mut_slice().zeroize();
        self.hash.zeroize();
        self.tables.zeroize();
    }
}
