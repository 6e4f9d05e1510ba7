//! DEK row type.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aead::Algorithm;

/// A data-encryption key wrapped by a single KEK. Plaintext never lives on
/// this struct; it only transits through a local buffer during wrap/unwrap.
#[derive(Clone)]
pub struct Dek {
    pub id: Uuid,
    pub kek_id: Uuid,
    pub algorithm: Algorithm,
    pub encrypted_key: Vec<u8>,
    pub nonce: [u8; 12],
    pub created_at: DateTime<Utc>,
}
