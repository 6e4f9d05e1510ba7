//! Owned secret byte buffers with guaranteed wipe on drop.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A plaintext key buffer that zeroes itself on drop and never prints its
/// contents, even in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Overwrites every byte with zero in place. Safe to call on an
    /// already-empty buffer; idempotent. Unlike `Vec<u8>::zeroize` (which
    /// also truncates to length 0), this preserves the buffer's length.
    pub fn wipe(&mut self) {
        self.0.fill(0);
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBytes([REDACTED])")
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}
