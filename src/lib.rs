//! Envelope-encryption key-management core.
//!
//! Administers a three-tier key hierarchy — master keys, key-encryption
//! keys (KEKs), and data-encryption keys (DEKs) — so that a data plane can
//! mint, rotate, and retire keys without re-encrypting application data on
//! every rotation.

pub mod aead;
pub mod config;
pub mod dek;
pub mod error;
pub mod kek;
pub mod key_manager;
pub mod kms_bridge;
pub mod master_key;
pub mod repository;
pub mod secret;
pub mod usecase;

pub use dek::Dek;
pub use error::{KeyManagerError, Result};
pub use kek::{Kek, KekChain};
pub use master_key::{MasterKey, MasterKeyChain};
pub use secret::SecretBytes;
pub use usecase::{KekUseCase, RewrapUseCase};
