use log::{debug, info, warn};
use std::sync::Arc;

use crate::aead::Algorithm;
use crate::error::{KeyManagerError, Result};
use crate::kek::{Kek, KekChain};
use crate::key_manager;
use crate::master_key::MasterKeyChain;
use crate::repository::{BoxFuture, Ctx, KekRepository, TxManager};

/// `Create` / `Rotate` / `Unwrap` orchestration for KEKs, atomic across the
/// repository via [`TxManager`].
pub struct KekUseCase {
    kek_repo: Arc<dyn KekRepository>,
    tx_manager: Arc<dyn TxManager>,
}

impl KekUseCase {
    pub fn new(kek_repo: Arc<dyn KekRepository>, tx_manager: Arc<dyn TxManager>) -> Self {
        Self {
            kek_repo,
            tx_manager,
        }
    }

    /// First-time setup: wraps a single KEK under the active master key and
    /// persists it. Not itself transactional.
    pub async fn create(
        &self,
        ctx: &Ctx,
        master_key_chain: &MasterKeyChain,
        algorithm: Algorithm,
    ) -> Result<()> {
        debug!("kek_usecase: create algorithm={:?}", algorithm);
        let active = master_key_chain
            .active()
            .ok_or_else(|| KeyManagerError::MasterKeyNotFound(master_key_chain.active_id().to_string()))?;

        let kek = key_manager::create_kek(&active, algorithm)?;
        ctx.check_cancelled()?;
        self.kek_repo.create(ctx, &kek).await?;
        info!("kek_usecase: created kek id={}", kek.id);
        Ok(())
    }

    /// Rotates to a new KEK, atomically. If no KEK exists yet, delegates to
    /// the same creation path within the same transaction.
    pub async fn rotate(
        &self,
        ctx: &Ctx,
        master_key_chain: &MasterKeyChain,
        algorithm: Algorithm,
    ) -> Result<()> {
        debug!("kek_usecase: rotate algorithm={:?}", algorithm);
        let active = master_key_chain
            .active()
            .ok_or_else(|| KeyManagerError::MasterKeyNotFound(master_key_chain.active_id().to_string()))?;

        ctx.check_cancelled()?;

        let kek_repo = self.kek_repo.clone();
        let master_key = active.clone();

        let result = self
            .tx_manager
            .with_tx(
                ctx,
                Box::new(move |tx_ctx: Ctx| {
                    Box::pin(async move {
                        tx_ctx.check_cancelled()?;
                        let existing = kek_repo.list(&tx_ctx).await?;

                        let new_kek = match existing.first() {
                            Some(head) => {
                                let mut k = key_manager::create_kek(&master_key, algorithm)?;
                                k.version = head.version + 1;
                                k
                            }
                            None => key_manager::create_kek(&master_key, algorithm)?,
                        };

                        tx_ctx.check_cancelled()?;
                        kek_repo.create(&tx_ctx, &new_kek).await?;
                        Ok(())
                    }) as BoxFuture<'_, Result<()>>
                }),
            )
            .await;

        match &result {
            Ok(()) => info!("kek_usecase: rotate committed"),
            Err(e) => warn!("kek_usecase: rotate failed: {e}"),
        }
        result
    }

    /// Decrypts every persisted KEK into a fresh [`KekChain`]. Any partial
    /// failure wipes the in-progress chain before returning.
    pub async fn unwrap(
        &self,
        ctx: &Ctx,
        master_key_chain: &MasterKeyChain,
    ) -> Result<KekChain> {
        debug!("kek_usecase: unwrap");
        ctx.check_cancelled()?;
        let rows = self.kek_repo.list(ctx).await?;
        if rows.is_empty() {
            return Err(KeyManagerError::KekNotFound("no keks persisted".into()));
        }

        let mut unwrapped: Vec<Kek> = Vec::with_capacity(rows.len());
        for row in rows {
            let master_key = match master_key_chain.get(&row.master_key_id) {
                Some(mk) => mk,
                None => {
                    let mut chain = KekChain::from_ordered(unwrapped);
                    chain.close();
                    return Err(KeyManagerError::MasterKeyNotFound(row.master_key_id));
                }
            };

            match key_manager::decrypt_kek(&row, &master_key) {
                Ok(plaintext) => {
                    let mut kek = row;
                    kek.key = Some(plaintext);
                    unwrapped.push(kek);
                }
                Err(e) => {
                    let mut chain = KekChain::from_ordered(unwrapped);
                    chain.close();
                    return Err(e);
                }
            }
        }

        unwrapped.sort_by(|a, b| b.version.cmp(&a.version));
        info!("kek_usecase: unwrapped {} keks", unwrapped.len());
        Ok(KekChain::from_ordered(unwrapped))
    }
}
