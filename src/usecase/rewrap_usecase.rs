use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{KeyManagerError, Result};
use crate::kek::KekChain;
use crate::key_manager;
use crate::repository::{Ctx, DekRepository};

/// Batched, idempotent rewrap of DEKs onto a designated active KEK.
pub struct RewrapUseCase {
    dek_repo: Arc<dyn DekRepository>,
}

impl RewrapUseCase {
    pub fn new(dek_repo: Arc<dyn DekRepository>) -> Self {
        Self { dek_repo }
    }

    /// Decrypts each fetched DEK under its current KEK and re-encrypts it
    /// under `new_kek_id`, in strict decrypt-old -> encrypt-new -> persist
    /// order per DEK. Returns the number of DEKs migrated in this call.
    pub async fn rewrap(
        &self,
        ctx: &Ctx,
        kek_chain: &KekChain,
        new_kek_id: Uuid,
        batch_size: usize,
    ) -> Result<usize> {
        debug!("rewrap_usecase: batch_size={batch_size} new_kek_id={new_kek_id}");

        ctx.check_cancelled()?;
        let batch = self
            .dek_repo
            .get_batch_not_kek_id(ctx, new_kek_id, batch_size)
            .await?;
        if batch.is_empty() {
            return Ok(0);
        }

        let new_kek = kek_chain
            .get(new_kek_id)
            .ok_or_else(|| KeyManagerError::KekNotFound(new_kek_id.to_string()))?;
        if new_kek.key().is_none() {
            warn!("rewrap_usecase: target kek {new_kek_id} has no plaintext key loaded");
            return Err(KeyManagerError::DecryptionFailed);
        }

        let count = batch.len();
        for mut dek in batch {
            let old_kek = kek_chain
                .get(dek.kek_id)
                .ok_or_else(|| KeyManagerError::KekNotFound(dek.kek_id.to_string()))?;

            let mut plaintext = key_manager::decrypt_dek(&dek, &old_kek)?;
            let encrypt_result = key_manager::encrypt_dek(plaintext.as_slice(), &new_kek);
            plaintext.wipe();
            let (ciphertext, nonce) = encrypt_result?;

            dek.kek_id = new_kek_id;
            dek.encrypted_key = ciphertext;
            dek.nonce = nonce;

            ctx.check_cancelled()?;
            self.dek_repo.update(ctx, &dek).await?;
        }

        info!("rewrap_usecase: migrated {count} deks to kek {new_kek_id}");
        Ok(count)
    }
}
