//! Environment-variable ingestion for the master-key loader.

use std::env;

/// Raw configuration gathered from the process environment. Parsing and
/// validation live in [`crate::master_key`]; this struct only collects the
/// four variables so the loader stays unit-testable without mutating the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct MasterKeyLoaderConfig {
    pub master_keys: String,
    pub active_master_key_id: String,
    pub kms_provider: Option<String>,
    pub kms_key_uri: Option<String>,
}

impl MasterKeyLoaderConfig {
    pub fn new(
        master_keys: impl Into<String>,
        active_master_key_id: impl Into<String>,
        kms_provider: Option<String>,
        kms_key_uri: Option<String>,
    ) -> Self {
        Self {
            master_keys: master_keys.into(),
            active_master_key_id: active_master_key_id.into(),
            kms_provider,
            kms_key_uri,
        }
    }

    pub fn from_env() -> Self {
        Self {
            master_keys: env::var("MASTER_KEYS").unwrap_or_default(),
            active_master_key_id: env::var("ACTIVE_MASTER_KEY_ID").unwrap_or_default(),
            kms_provider: env::var("KMS_PROVIDER").ok(),
            kms_key_uri: env::var("KMS_KEY_URI").ok(),
        }
    }

    pub fn is_kms_mode(&self) -> bool {
        self.kms_provider.is_some() || self.kms_key_uri.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_mode_when_no_kms_vars() {
        let cfg = MasterKeyLoaderConfig::new("m1:abc", "m1", None, None);
        assert!(!cfg.is_kms_mode());
    }

    #[test]
    fn kms_mode_when_provider_set() {
        let cfg = MasterKeyLoaderConfig::new("m1:abc", "m1", Some("gcpkms".into()), None);
        assert!(cfg.is_kms_mode());
    }
}
