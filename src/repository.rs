//! Persistence contracts consumed (not implemented) by the core, plus the
//! transaction-scoping contract used by the KEK use-case.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::dek::Dek;
use crate::error::{KeyManagerError, Result};
use crate::kek::Kek;

/// A boxed, `Send` future, for callbacks that can't be expressed as a plain
/// `async fn` in a trait (the transaction body passed to `TxManager`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Cooperative cancellation handle. The core never polls a timer itself;
/// callers flip this when a deadline or an external cancellation fires, and
/// context-aware operations check it at each I/O boundary.
#[derive(Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Opaque context threaded through every operation; repositories detect
/// whether it carries an in-progress transaction, and context-aware
/// operations poll it for cancellation before each I/O boundary.
#[derive(Clone, Default)]
pub struct Ctx {
    pub tx: Option<Uuid>,
    pub cancellation: Option<Cancellation>,
}

impl Ctx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tx(tx: Uuid) -> Self {
        Self {
            tx: Some(tx),
            ..Self::default()
        }
    }

    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(Cancellation::is_cancelled)
    }

    /// Returns `Err(Cancelled)` if this context's cancellation handle has
    /// fired. Call at every I/O boundary before issuing the call.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(KeyManagerError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
pub trait KekRepository: Send + Sync {
    async fn create(&self, ctx: &Ctx, kek: &Kek) -> Result<()>;
    async fn update(&self, ctx: &Ctx, kek: &Kek) -> Result<()>;
    async fn list(&self, ctx: &Ctx) -> Result<Vec<Kek>>;
}

#[async_trait]
pub trait DekRepository: Send + Sync {
    async fn update(&self, ctx: &Ctx, dek: &Dek) -> Result<()>;
    async fn get_batch_not_kek_id(
        &self,
        ctx: &Ctx,
        kek_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Dek>>;
}

/// Runs `body` under a transaction: commits on `Ok`, rolls back on any
/// `Err` or panic.
#[async_trait]
pub trait TxManager: Send + Sync {
    async fn with_tx<'a>(
        &'a self,
        ctx: &'a Ctx,
        body: Box<dyn FnOnce(Ctx) -> BoxFuture<'a, Result<()>> + Send + 'a>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ctx_is_not_cancelled() {
        let ctx = Ctx::new();
        assert!(ctx.check_cancelled().is_ok());
    }

    #[test]
    fn cancelling_the_handle_is_observed_through_clones() {
        let cancellation = Cancellation::new();
        let ctx = Ctx::new().with_cancellation(cancellation.clone());
        assert!(ctx.check_cancelled().is_ok());

        cancellation.cancel();

        assert!(matches!(
            ctx.check_cancelled().unwrap_err(),
            KeyManagerError::Cancelled
        ));
    }
}
