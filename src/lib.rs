//! [Galois/Counter Mode][1] (GCM, [NIST SP 800-38D][2]):
//! [Authenticated Encryption with Associated Data (AEAD)][3] built
//! generically over any 128-bit block cipher.
//!
//! [1]: https://en.wikipedia.org/wiki/Galois/Counter_Mode
//! [2]: https://nvlpubs.nist.gov/nistpubs/Legacy/SP/nistspecialpublication800-38d.pdf
//! [3]: https://en.wikipedia.org/wiki/Authenticated_encryption
//!
//! This crate provides two layers:
//!
//! - [`GcmCore`]: the streaming primitive. Key setup, IV processing
//!   (both the 96-bit fast path and the general GHASH-reduced path),
//!   fragmentable AAD/plaintext/ciphertext absorption, and tag
//!   finalization. It hands back plaintext *before* tag verification
//!   on decrypt, so callers using this layer directly are responsible
//!   for buffering and comparing tags themselves.
//! - [`Gcm`]: the [`aead::Aead`] wrapper (plus `Aes128Gcm`/`Aes256Gcm`
//!   aliases), which buffers, verifies the tag in constant time, and
//!   only then returns plaintext.

#![no_std]

extern crate alloc;

pub use aead;

mod ctr;
mod field;
mod ghash;
mod state;

pub use crate::state::GcmCore;

use aead::generic_array::{
    typenum::{U0, U12, U16},
    GenericArray,
};
use aead::{Aead, Error as AeadError, NewAead, Payload};
use aes::{
    block_cipher_trait::{BlockCipher, NewBlockCipher},
    Aes128, Aes256,
};
use alloc::vec::Vec;
use core::marker::PhantomData;
use subtle::ConstantTimeEq;

/// Errors the GCM core itself can report.
///
/// Distinct from [`aead::Error`], which the high-level [`Gcm`] wrapper
/// returns for tag-verification failure: the core can only fail at
/// key setup, when the underlying cipher rejects the key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The underlying block cipher rejected the key (e.g. an
    /// unsupported key length).
    CipherKey,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::CipherKey => write!(f, "block cipher rejected key"),
        }
    }
}

/// GCM with a 128-bit key.
pub type Aes128Gcm = Gcm<Aes128>;

/// GCM with a 256-bit key.
pub type Aes256Gcm = Gcm<Aes256>;

/// Galois/Counter Mode over block cipher `C`, exposed as an
/// [`aead::Aead`] implementation with a 96-bit nonce (the fast path
/// from the core's IV handling; arbitrary-length IVs are reachable
/// through [`GcmCore::set_iv`] directly).
#[derive(Clone)]
pub struct Gcm<C: BlockCipher<BlockSize = U16> + NewBlockCipher> {
    /// Secret key
    key: GenericArray<u8, C::KeySize>,

    /// Block cipher
    block_cipher: PhantomData<C>,
}

impl<C> NewAead for Gcm<C>
where
    C: BlockCipher<BlockSize = U16> + NewBlockCipher,
{
    type KeySize = C::KeySize;

    fn new(key: GenericArray<u8, C::KeySize>) -> Self {
        Self {
            key,
            block_cipher: PhantomData,
        }
    }
}

impl<C> Gcm<C>
where
    C: BlockCipher<BlockSize = U16> + NewBlockCipher,
{
    fn core(&self, nonce: &[u8]) -> GcmCore<C> {
        // The key's length was fixed at compile time by `GenericArray`,
        // so the underlying cipher can never reject it here.
        let mut ctx = GcmCore::<C>::new(&self.key).expect("fixed-size key is always accepted");
        ctx.set_iv(nonce);
        ctx
    }

    /// Encrypt with a 96-bit nonce, in place, returning the detached tag.
    pub fn encrypt_in_place_detached(
        &self,
        nonce: &GenericArray<u8, U12>,
        associated_data: &[u8],
        buffer: &mut [u8],
    ) -> Result<GenericArray<u8, U16>, AeadError> {
        let mut ctx = self.core(nonce.as_slice());
        if !associated_data.is_empty() {
            ctx.encrypt(associated_data, None);
        }

        let plaintext = buffer.to_vec();
        ctx.encrypt(&plaintext, Some(buffer));
        Ok(ctx.tag())
    }

    /// Decrypt with a 96-bit nonce, in place, verifying `tag` in
    /// constant time before returning. On mismatch the buffer is
    /// zeroized rather than left holding unauthenticated plaintext.
    pub fn decrypt_in_place_detached(
        &self,
        nonce: &GenericArray<u8, U12>,
        associated_data: &[u8],
        buffer: &mut [u8],
        tag: &GenericArray<u8, U16>,
    ) -> Result<(), AeadError> {
        let mut ctx = self.core(nonce.as_slice());
        if !associated_data.is_empty() {
            ctx.decrypt(associated_data, None);
        }

        let ciphertext = buffer.to_vec();
        ctx.decrypt(&ciphertext, Some(&mut *buffer));
        let expected_tag = ctx.tag();

        if expected_tag.ct_eq(tag).unwrap_u8() == 1 {
            Ok(())
        } else {
            // Don't leave unauthenticated plaintext sitting in the
            // caller's buffer.
            for byte in buffer.iter_mut() {
                *byte = 0;
            }
            Err(AeadError)
        }
    }
}

impl<C> Aead for Gcm<C>
where
    C: BlockCipher<BlockSize = U16> + NewBlockCipher,
{
    type NonceSize = U12;
    type TagSize = U16;
    type CiphertextOverhead = U0;

    fn encrypt<'msg, 'aad>(
        &self,
        nonce: &GenericArray<u8, Self::NonceSize>,
        plaintext: impl Into<Payload<'msg, 'aad>>,
    ) -> Result<Vec<u8>, AeadError> {
        let payload = plaintext.into();
        let mut buffer = Vec::with_capacity(payload.msg.len() + 16);
        buffer.extend_from_slice(payload.msg);

        let tag = self.encrypt_in_place_detached(nonce, payload.aad, &mut buffer)?;
        buffer.extend_from_slice(tag.as_slice());
        Ok(buffer)
    }

    fn decrypt<'msg, 'aad>(
        &self,
        nonce: &GenericArray<u8, Self::NonceSize>,
        ciphertext: impl Into<Payload<'msg, 'aad>>,
    ) -> Result<Vec<u8>, AeadError> {
        let payload = ciphertext.into();
        if payload.msg.len() < 16 {
            return Err(AeadError);
        }

        let tag_start = payload.msg.len() - 16;
        let mut buffer = Vec::from(&payload.msg[..tag_start]);
        let tag = GenericArray::from_slice(&payload.msg[tag_start..]);

        self.decrypt_in_place_detached(nonce, payload.aad, &mut buffer, tag)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn round_trip_through_aead_trait() {
        let key = GenericArray::clone_from_slice(&[0x11u8; 16]);
        let gcm = Aes128Gcm::new(key);
        let nonce = GenericArray::clone_from_slice(&[0x22u8; 12]);

        let plaintext = b"hello, GCM".as_ref();
        let ciphertext = gcm.encrypt(&nonce, plaintext).unwrap();
        let decrypted = gcm.decrypt(&nonce, ciphertext.as_slice()).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn tampered_ciphertext_fails_to_decrypt() {
        let key = GenericArray::clone_from_slice(&[0x11u8; 16]);
        let gcm = Aes128Gcm::new(key);
        let nonce = GenericArray::clone_from_slice(&[0x22u8; 12]);

        let mut ciphertext = gcm.encrypt(&nonce, b"hello, GCM".as_ref()).unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        assert!(gcm.decrypt(&nonce, ciphertext.as_slice()).is_err());
    }

    #[test]
    fn nist_vector_one_block_aes128_no_aad() {
        let key = GenericArray::clone_from_slice(&[0u8; 16]);
        let gcm = Aes128Gcm::new(key);
        let nonce = GenericArray::clone_from_slice(&[0u8; 12]);

        let ciphertext = gcm.encrypt(&nonce, [0u8; 16].as_ref()).unwrap();
        let tag_start = ciphertext.len() - 16;

        assert_eq!(
            &ciphertext[..tag_start],
            &hex!("0388dace60b6a392f328c2b971b2fe78")[..]
        );
        assert_eq!(
            &ciphertext[tag_start..],
            &hex!("ab6e47d42cec13bdf53a67b21257bddf")[..]
        );
    }

    #[test]
    fn nist_vector_with_aad_aes128() {
        let key_bytes = hex!("feffe9928665731c6d6a8f9467308308");
        let nonce_bytes = hex!("cafebabefacedbaddecaf888");
        let aad = hex!("feedfacedeadbeeffeedfacedeadbeefabaddad2");
        let plaintext = hex!(
            "d9313225f88406e5a55909c5aff5269"
            "a86a7a9531534f7da2e4c303d8a318a7"
            "21c3c0c95956809532fcf0e2449a6b52"
            "5b16aedf5aa0de657ba637b39"
        );

        let key = GenericArray::clone_from_slice(&key_bytes);
        let gcm = Aes128Gcm::new(key);
        let nonce = GenericArray::clone_from_slice(&nonce_bytes);

        let payload = Payload {
            msg: &plaintext,
            aad: &aad,
        };
        let ciphertext = gcm.encrypt(&nonce, payload).unwrap();
        let tag_start = ciphertext.len() - 16;

        assert_eq!(
            &ciphertext[..tag_start],
            &hex!(
                "42831ec2217774244b7221b784d0d49"
                "ce3aa212f2c02a4e035c17e2329aca12"
                "e21d514b25466931c7d8f6a5aac84aa0"
                "51ba30b396a0aac973d58e091"
            )[..]
        );
        assert_eq!(
            &ciphertext[tag_start..],
            &hex!("5bc94fbc3221a5db94fae95ae7121a47")[..]
        );

        let decrypt_payload = Payload {
            msg: &ciphertext,
            aad: &aad,
        };
        let decrypted = gcm.decrypt(&nonce, decrypt_payload).unwrap();
        assert_eq!(decrypted, plaintext.to_vec());
    }
}
