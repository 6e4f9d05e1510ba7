//! Master-key loading and the in-memory master-key chain.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use dashmap::DashMap;

use crate::error::{KeyManagerError, Result};
use crate::kms_bridge::KmsKeeperFactory;
use crate::secret::SecretBytes;

const MASTER_KEY_LEN: usize = 32;

/// A single master key held outside the database.
#[derive(Clone)]
pub struct MasterKey {
    pub id: String,
    key: SecretBytes,
}

impl MasterKey {
    pub fn key(&self) -> &[u8] {
        self.key.as_slice()
    }
}

/// Build-once, read-many, close-once container of master keys.
pub struct MasterKeyChain {
    keys: DashMap<String, MasterKey>,
    active_id: String,
}

impl MasterKeyChain {
    fn empty(active_id: String) -> Self {
        Self {
            keys: DashMap::new(),
            active_id,
        }
    }

    pub fn get(&self, id: &str) -> Option<MasterKey> {
        self.keys.get(id).map(|e| e.clone())
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active(&self) -> Option<MasterKey> {
        self.get(&self.active_id)
    }

    /// Wipes every key's bytes and empties the chain. Terminal: a closed
    /// chain behaves like an empty one for all lookups.
    pub fn close(&self) {
        for mut entry in self.keys.iter_mut() {
            entry.key.wipe();
        }
        self.keys.clear();
    }

    fn insert(&self, id: String, key: SecretBytes) {
        self.keys.insert(id.clone(), MasterKey { id, key });
    }
}

/// Parses `"id1:body1,id2:body2"` into `(id, body)` pairs, tolerating
/// whitespace around each entry. Does not decode the body.
fn split_entries(raw: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (id, body) = entry
            .split_once(':')
            .ok_or(KeyManagerError::InvalidMasterKeysFormat)?;
        let id = id.trim();
        if id.is_empty() {
            return Err(KeyManagerError::InvalidMasterKeysFormat);
        }
        out.push((id.to_string(), body.trim().to_string()));
    }
    Ok(out)
}

fn decode_base64(body: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(body)
        .map_err(|_| KeyManagerError::InvalidMasterKeyBase64)
}

/// Loads master keys whose bodies are base64 of raw 32-byte plaintext keys.
pub fn load_plaintext(master_keys: &str, active_master_key_id: &str) -> Result<MasterKeyChain> {
    if master_keys.is_empty() {
        return Err(KeyManagerError::MasterKeysNotSet);
    }
    if active_master_key_id.is_empty() {
        return Err(KeyManagerError::ActiveMasterKeyIDNotSet);
    }

    let chain = MasterKeyChain::empty(active_master_key_id.to_string());
    let entries = split_entries(master_keys)?;

    for (id, body) in entries {
        let mut decoded = decode_base64(&body)?;
        if decoded.len() != MASTER_KEY_LEN {
            let actual = decoded.len();
            zeroize::Zeroize::zeroize(&mut decoded);
            chain.close();
            return Err(KeyManagerError::InvalidKeySize {
                expected: MASTER_KEY_LEN,
                actual,
            });
        }
        chain.insert(id, SecretBytes::new(decoded));
    }

    if chain.get(active_master_key_id).is_none() {
        chain.close();
        return Err(KeyManagerError::ActiveMasterKeyNotFound(
            active_master_key_id.to_string(),
        ));
    }

    Ok(chain)
}

/// Loads master keys whose bodies are opaque ciphertext, decrypted through
/// an externally-supplied keeper factory.
pub async fn load_kms(
    master_keys: &str,
    active_master_key_id: &str,
    kms_provider: Option<&str>,
    kms_key_uri: Option<&str>,
    keeper_factory: &dyn KmsKeeperFactory,
) -> Result<MasterKeyChain> {
    if master_keys.is_empty() {
        return Err(KeyManagerError::MasterKeysNotSet);
    }
    if active_master_key_id.is_empty() {
        return Err(KeyManagerError::ActiveMasterKeyIDNotSet);
    }
    match (kms_provider, kms_key_uri) {
        (Some(_), None) => return Err(KeyManagerError::KMSKeyURINotSet),
        (None, Some(_)) => return Err(KeyManagerError::KMSProviderNotSet),
        (None, None) => return Err(KeyManagerError::KMSProviderNotSet),
        (Some(_), Some(_)) => {}
    }
    let provider = kms_provider.unwrap();
    let uri = kms_key_uri.unwrap();

    let keeper = keeper_factory
        .open(provider, uri)
        .await
        .map_err(|e| KeyManagerError::KMSOpenKeeperFailed(e.to_string()))?;

    let chain = MasterKeyChain::empty(active_master_key_id.to_string());
    let entries = split_entries(master_keys)?;

    for (id, body) in entries {
        let mut ciphertext = decode_base64(&body)?;
        let decrypt_result = keeper.decrypt(&ciphertext).await;
        zeroize::Zeroize::zeroize(&mut ciphertext);

        let mut plaintext = match decrypt_result {
            Ok(p) => p,
            Err(_) => {
                chain.close();
                return Err(KeyManagerError::KMSDecryptionFailed);
            }
        };

        if plaintext.len() != MASTER_KEY_LEN {
            let actual = plaintext.len();
            zeroize::Zeroize::zeroize(&mut plaintext);
            chain.close();
            return Err(KeyManagerError::InvalidKeySize {
                expected: MASTER_KEY_LEN,
                actual,
            });
        }
        chain.insert(id, SecretBytes::new(plaintext));
    }

    keeper.close().await;

    if chain.get(active_master_key_id).is_none() {
        chain.close();
        return Err(KeyManagerError::ActiveMasterKeyNotFound(
            active_master_key_id.to_string(),
        ));
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    #[test]
    fn loads_single_key() {
        let body = b64(&[1u8; MASTER_KEY_LEN]);
        let chain = load_plaintext(&format!("m1:{body}"), "m1").unwrap();
        assert_eq!(chain.active().unwrap().key(), &[1u8; MASTER_KEY_LEN]);
    }

    #[test]
    fn missing_master_keys() {
        let err = load_plaintext("", "m1").unwrap_err();
        assert!(matches!(err, KeyManagerError::MasterKeysNotSet));
    }

    #[test]
    fn missing_active_id() {
        let body = b64(&[1u8; MASTER_KEY_LEN]);
        let err = load_plaintext(&format!("m1:{body}"), "").unwrap_err();
        assert!(matches!(err, KeyManagerError::ActiveMasterKeyIDNotSet));
    }

    #[test]
    fn malformed_entry_missing_colon() {
        let err = load_plaintext("m1nocolon", "m1").unwrap_err();
        assert!(matches!(err, KeyManagerError::InvalidMasterKeysFormat));
    }

    #[test]
    fn bad_base64() {
        let err = load_plaintext("m1:not-base64!!!", "m1").unwrap_err();
        assert!(matches!(err, KeyManagerError::InvalidMasterKeyBase64));
    }

    #[test]
    fn wrong_length_key() {
        let body = b64(&[1u8; 16]);
        let err = load_plaintext(&format!("m1:{body}"), "m1").unwrap_err();
        assert!(matches!(err, KeyManagerError::InvalidKeySize { .. }));
    }

    #[test]
    fn active_id_not_among_entries() {
        let body = b64(&[1u8; MASTER_KEY_LEN]);
        let err = load_plaintext(&format!("m1:{body}"), "m2").unwrap_err();
        assert!(matches!(err, KeyManagerError::ActiveMasterKeyNotFound(_)));
    }

    #[test]
    fn close_wipes_all_keys() {
        let body = b64(&[9u8; MASTER_KEY_LEN]);
        let chain = load_plaintext(&format!("m1:{body}"), "m1").unwrap();
        chain.close();
        assert!(chain.get("m1").is_none());
    }
}
