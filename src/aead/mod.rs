//! Authenticated-encryption primitives and the algorithm factory.

mod aes_gcm;
mod chacha20;

use crate::error::{KeyManagerError, Result};
use serde::{Deserialize, Serialize};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

/// Wrapping cipher selected for a KEK or DEK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "aes256gcm")]
    AESGCM,
    #[serde(rename = "chacha20poly1305")]
    ChaCha20,
}

/// Uniform contract implemented by both AEAD primitives. Both require a
/// 32-byte key; both use 12-byte random nonces and empty-or-present AAD.
pub trait Aead: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<(Vec<u8>, [u8; NONCE_LEN])>;
    fn decrypt(&self, ciphertext: &[u8], nonce: &[u8], aad: &[u8]) -> Result<Vec<u8>>;
}

/// Builds an [`Aead`] for the given algorithm, validating key length.
pub fn create_cipher(key: &[u8], algorithm: Algorithm) -> Result<Box<dyn Aead>> {
    if key.len() != KEY_LEN {
        return Err(KeyManagerError::InvalidKeySize {
            expected: KEY_LEN,
            actual: key.len(),
        });
    }
    match algorithm {
        Algorithm::AESGCM => Ok(Box::new(aes_gcm::AesGcmCipher::new(key)?)),
        Algorithm::ChaCha20 => Ok(Box::new(chacha20::ChaCha20Cipher::new(key)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_key() {
        let err = create_cipher(&[0u8; 16], Algorithm::AESGCM).unwrap_err();
        assert!(matches!(err, KeyManagerError::InvalidKeySize { .. }));
    }

    #[test]
    fn roundtrip_both_algorithms() {
        for alg in [Algorithm::AESGCM, Algorithm::ChaCha20] {
            let key = [0x42u8; KEY_LEN];
            let cipher = create_cipher(&key, alg).unwrap();
            let (ct, nonce) = cipher.encrypt(b"hello world", b"aad").unwrap();
            let pt = cipher.decrypt(&ct, &nonce, b"aad").unwrap();
            assert_eq!(pt, b"hello world");
        }
    }

    #[test]
    fn nonces_differ_across_calls() {
        let key = [0x11u8; KEY_LEN];
        let cipher = create_cipher(&key, Algorithm::AESGCM).unwrap();
        let (_, n1) = cipher.encrypt(b"a", b"").unwrap();
        let (_, n2) = cipher.encrypt(b"a", b"").unwrap();
        assert_ne!(n1, n2);
    }

    #[test]
    fn tamper_detection() {
        for alg in [Algorithm::AESGCM, Algorithm::ChaCha20] {
            let key = [0x77u8; KEY_LEN];
            let cipher = create_cipher(&key, alg).unwrap();
            let (mut ct, nonce) = cipher.encrypt(b"secret", b"").unwrap();
            let last = ct.len() - 1;
            ct[last] ^= 0x01;
            let err = cipher.decrypt(&ct, &nonce, b"").unwrap_err();
            assert!(matches!(err, KeyManagerError::DecryptionFailed));
        }
    }

    #[test]
    fn wrong_key_fails_decrypt() {
        let cipher_a = create_cipher(&[1u8; KEY_LEN], Algorithm::ChaCha20).unwrap();
        let cipher_b = create_cipher(&[2u8; KEY_LEN], Algorithm::ChaCha20).unwrap();
        let (ct, nonce) = cipher_a.encrypt(b"payload", b"").unwrap();
        let err = cipher_b.decrypt(&ct, &nonce, b"").unwrap_err();
        assert!(matches!(err, KeyManagerError::DecryptionFailed));
    }
}
