//! Generates and (un)wraps KEKs and DEKs. Pure with respect to storage:
//! every operation here is in-memory crypto only.

use chrono::Utc;
use rand::RngCore;

use crate::aead::{self, Algorithm};
use crate::dek::Dek;
use crate::error::Result;
use crate::kek::Kek;
use crate::master_key::MasterKey;
use crate::secret::SecretBytes;

const KEY_LEN: usize = 32;

fn random_key() -> Vec<u8> {
    let mut bytes = vec![0u8; KEY_LEN];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Wraps a fresh KEK under the active master key.
pub fn create_kek(master_key: &MasterKey, algorithm: Algorithm) -> Result<Kek> {
    let plaintext = random_key();
    let cipher = aead::create_cipher(master_key.key(), algorithm)?;
    let (encrypted_key, nonce) = cipher.encrypt(&plaintext, &[])?;

    Ok(Kek {
        id: crate::kek::new_id(),
        master_key_id: master_key.id.clone(),
        algorithm,
        encrypted_key,
        key: Some(SecretBytes::new(plaintext)),
        nonce,
        version: 1,
        is_active: Some(true),
        created_at: Utc::now(),
    })
}

/// Decrypts a KEK's wrapped bytes under its master key. Any underlying
/// failure collapses to `DecryptionFailed`.
pub fn decrypt_kek(kek: &Kek, master_key: &MasterKey) -> Result<SecretBytes> {
    let cipher = aead::create_cipher(master_key.key(), kek.algorithm)?;
    let plaintext = cipher.decrypt(&kek.encrypted_key, &kek.nonce, &[])?;
    Ok(SecretBytes::new(plaintext))
}

/// Wraps a fresh DEK under the given (already-unwrapped) KEK. The KEK's own
/// algorithm governs the wrap, independent of `algorithm` recorded on the
/// returned DEK.
pub fn create_dek(kek: &Kek, algorithm: Algorithm) -> Result<Dek> {
    let kek_key = kek
        .key()
        .ok_or(crate::error::KeyManagerError::DecryptionFailed)?;
    let mut plaintext = SecretBytes::new(random_key());
    let cipher = aead::create_cipher(kek_key, kek.algorithm)?;
    let encrypt_result = cipher.encrypt(plaintext.as_slice(), &[]);
    plaintext.wipe();
    let (encrypted_key, nonce) = encrypt_result?;

    Ok(Dek {
        id: crate::kek::new_id(),
        kek_id: kek.id,
        algorithm,
        encrypted_key,
        nonce,
        created_at: Utc::now(),
    })
}

/// Decrypts a DEK under its KEK. Failures collapse to `DecryptionFailed`.
pub fn decrypt_dek(dek: &Dek, kek: &Kek) -> Result<SecretBytes> {
    let kek_key = kek
        .key()
        .ok_or(crate::error::KeyManagerError::DecryptionFailed)?;
    let cipher = aead::create_cipher(kek_key, kek.algorithm)?;
    let plaintext = cipher.decrypt(&dek.encrypted_key, &dek.nonce, &[])?;
    Ok(SecretBytes::new(plaintext))
}

/// Wraps an already-plaintext DEK under a (possibly different) KEK. Used by
/// rewrap.
pub fn encrypt_dek(plaintext: &[u8], kek: &Kek) -> Result<(Vec<u8>, [u8; 12])> {
    let kek_key = kek
        .key()
        .ok_or(crate::error::KeyManagerError::DecryptionFailed)?;
    let cipher = aead::create_cipher(kek_key, kek.algorithm)?;
    cipher.encrypt(plaintext, &[])
}
