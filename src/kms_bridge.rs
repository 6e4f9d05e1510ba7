//! Abstract bridge to an external key-management service.
//!
//! The core only needs `decrypt` and a scoped `close`; it never talks to a
//! specific cloud provider directly.

use async_trait::async_trait;

/// Decrypts opaque ciphertext produced by an external KMS.
#[async_trait]
pub trait KmsKeeper: Send + Sync {
    async fn decrypt(&self, ciphertext: &[u8]) -> anyhow::Result<Vec<u8>>;
    async fn close(&self);
}

/// Opens a [`KmsKeeper`] for a given provider/key-uri pair.
#[async_trait]
pub trait KmsKeeperFactory: Send + Sync {
    async fn open(&self, provider: &str, key_uri: &str) -> anyhow::Result<Box<dyn KmsKeeper>>;
}

/// Masks a KMS key URI for logging: scheme is kept, path segments become
/// `***`. `awskms` URIs retain a `region` query parameter.
pub fn mask_key_uri(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return "***".to_string();
    };
    let scheme = &uri[..scheme_end];
    let rest = &uri[scheme_end + 3..];

    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };

    let segments: Vec<&str> = path.split('/').collect();
    let masked_path = if segments.len() % 2 == 0 && segments.len() > 1 {
        // Alternating label/value path (e.g. gcpkms resource names): keep
        // the label, mask the value.
        segments
            .iter()
            .enumerate()
            .map(|(i, seg)| if i % 2 == 0 { *seg } else { "***" })
            .collect::<Vec<_>>()
            .join("/")
    } else {
        segments.iter().map(|_| "***").collect::<Vec<_>>().join("/")
    };

    match (scheme, query) {
        ("awskms", Some(q)) => {
            let region = q
                .split('&')
                .find_map(|kv| kv.strip_prefix("region="))
                .map(|r| format!("?region={r}"));
            format!("{scheme}://{masked_path}{}", region.unwrap_or_default())
        }
        _ => format!("{scheme}://{masked_path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_gcpkms_path() {
        let uri = "gcpkms://projects/P/locations/L/keyRings/R/cryptoKeys/K";
        assert_eq!(
            mask_key_uri(uri),
            "gcpkms://projects/***/locations/***/keyRings/***/cryptoKeys/***"
        );
    }

    #[test]
    fn masks_awskms_keeps_region() {
        let uri = "awskms://arn?region=us-east-1";
        assert_eq!(mask_key_uri(uri), "awskms://***?region=us-east-1");
    }

    #[test]
    fn masks_unknown_scheme() {
        let uri = "base64key://XYZ";
        assert_eq!(mask_key_uri(uri), "base64key://***");
    }

    #[test]
    fn masks_bare_string() {
        assert_eq!(mask_key_uri("garbage"), "***");
    }
}
