//! Error types for the envelope key-management core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyManagerError {
    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,

    #[error("invalid key size: expected {expected}, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    #[error("invalid MASTER_KEYS format")]
    InvalidMasterKeysFormat,

    #[error("invalid master key base64 encoding")]
    InvalidMasterKeyBase64,

    #[error("MASTER_KEYS is not set")]
    MasterKeysNotSet,

    #[error("ACTIVE_MASTER_KEY_ID is not set")]
    ActiveMasterKeyIDNotSet,

    #[error("KMS_PROVIDER is not set")]
    KMSProviderNotSet,

    #[error("KMS_KEY_URI is not set")]
    KMSKeyURINotSet,

    #[error("master key not found: {0}")]
    MasterKeyNotFound(String),

    #[error("active master key not found: {0}")]
    ActiveMasterKeyNotFound(String),

    #[error("kek not found: {0}")]
    KekNotFound(String),

    #[error("dek not found: {0}")]
    DekNotFound(String),

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("failed to open kms keeper: {0}")]
    KMSOpenKeeperFailed(String),

    #[error("kms decryption failed")]
    KMSDecryptionFailed,

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, KeyManagerError>;
