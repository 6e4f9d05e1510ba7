//! KEK row type and the in-memory KEK chain.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::aead::Algorithm;
use crate::secret::SecretBytes;

/// Time-ordered identifier for KEKs and DEKs (UUIDv7).
pub fn new_id() -> Uuid {
    Uuid::now_v7()
}

/// A key-encryption key. `key` is only populated in memory after an unwrap;
/// it is never persisted.
#[derive(Clone)]
pub struct Kek {
    pub id: Uuid,
    pub master_key_id: String,
    pub algorithm: Algorithm,
    pub encrypted_key: Vec<u8>,
    pub key: Option<SecretBytes>,
    pub nonce: [u8; 12],
    pub version: u64,
    pub is_active: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl Kek {
    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_ref().map(|k| k.as_slice())
    }

    fn wipe(&mut self) {
        if let Some(key) = self.key.as_mut() {
            key.wipe();
        }
        self.key = None;
    }
}

/// Build-once, read-many, close-once container of unwrapped KEKs.
///
/// Constructed from a list ordered by `version` descending; the first
/// element becomes the active KEK.
pub struct KekChain {
    keks: DashMap<Uuid, Kek>,
    active_kek_id: Option<Uuid>,
}

impl KekChain {
    /// `ordered_desc` must already be sorted by `version` descending.
    pub fn from_ordered(ordered_desc: Vec<Kek>) -> Self {
        let active_kek_id = ordered_desc.first().map(|k| k.id);
        let keks = DashMap::new();
        for kek in ordered_desc {
            keks.insert(kek.id, kek);
        }
        Self {
            keks,
            active_kek_id,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Kek> {
        self.keks.get(&id).map(|e| e.clone())
    }

    pub fn active_kek_id(&self) -> Option<Uuid> {
        self.active_kek_id
    }

    pub fn active(&self) -> Option<Kek> {
        self.active_kek_id.and_then(|id| self.get(id))
    }

    pub fn is_empty(&self) -> bool {
        self.keks.is_empty()
    }

    /// Wipes every KEK's plaintext, clears the map and the active id.
    pub fn close(&mut self) {
        for mut entry in self.keks.iter_mut() {
            entry.wipe();
        }
        self.keks.clear();
        self.active_kek_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kek(version: u64) -> Kek {
        Kek {
            id: new_id(),
            master_key_id: "m1".into(),
            algorithm: Algorithm::AESGCM,
            encrypted_key: vec![1, 2, 3],
            key: Some(SecretBytes::new(vec![9u8; 32])),
            nonce: [0u8; 12],
            version,
            is_active: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_chain_has_no_active() {
        let chain = KekChain::from_ordered(Vec::new());
        assert!(chain.active_kek_id().is_none());
        assert!(chain.is_empty());
    }

    #[test]
    fn first_in_descending_order_is_active() {
        let k3 = kek(3);
        let k2 = kek(2);
        let k1 = kek(1);
        let expected_active = k3.id;
        let chain = KekChain::from_ordered(vec![k3, k2, k1]);
        assert_eq!(chain.active_kek_id(), Some(expected_active));
        assert_eq!(chain.active().unwrap().version, 3);
    }

    #[test]
    fn close_wipes_and_clears() {
        let mut chain = KekChain::from_ordered(vec![kek(1)]);
        let id = chain.active_kek_id().unwrap();
        chain.close();
        assert!(chain.get(id).is_none());
        assert!(chain.active_kek_id().is_none());
    }
}
