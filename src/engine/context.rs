use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::DefaultsConfig;
use crate::error::ReconcileError;
use crate::inventory::InventoryApi;
use crate::observability::Metrics;
use crate::translate::VhostPattern;

/// Everything one reconciliation needs, passed in explicitly.
///
/// Cloning is cheap; clones share the inventory session, the metrics and
/// the cancellation token.
#[derive(Clone)]
pub struct ReconcileContext {
    inventory: Arc<dyn InventoryApi>,
    defaults: Arc<DefaultsConfig>,
    vhosts: VhostPattern,
    metrics: Arc<Metrics>,
    cancel: CancellationToken,
}

impl ReconcileContext {
    pub fn new(
        inventory: Arc<dyn InventoryApi>,
        defaults: DefaultsConfig,
        metrics: Arc<Metrics>,
    ) -> Result<Self, regex::Error> {
        let vhosts = VhostPattern::for_domain(&defaults.platform_domain)?;
        Ok(Self {
            inventory,
            defaults: Arc::new(defaults),
            vhosts,
            metrics,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn inventory(&self) -> &Arc<dyn InventoryApi> {
        &self.inventory
    }

    pub fn defaults(&self) -> &DefaultsConfig {
        &self.defaults
    }

    pub fn vhosts(&self) -> &VhostPattern {
        &self.vhosts
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run one remote call as a cancellation point.
    ///
    /// A cancelled token wins over a ready call, so nothing new is sent once
    /// cancellation was requested.
    pub async fn guard<T, F>(&self, call: F) -> Result<T, ReconcileError>
    where
        F: Future<Output = Result<T, ReconcileError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ReconcileError::Cancelled),
            result = call => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InMemoryInventory;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn context() -> ReconcileContext {
        ReconcileContext::new(
            Arc::new(InMemoryInventory::new("cleverapps.io")),
            DefaultsConfig::default(),
            Arc::new(Metrics::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_guard_passes_result_through() {
        let ctx = context();
        assert_eq!(ctx.guard(async { Ok(7) }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_guard_after_cancel_skips_call() {
        let ctx = context();
        ctx.cancellation().cancel();

        let polled = AtomicBool::new(false);
        let result = ctx
            .guard(async {
                polled.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert_eq!(result, Err(ReconcileError::Cancelled));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_call() {
        let ctx = context();
        let token = ctx.cancellation().clone();
        tokio::spawn(async move { token.cancel() });

        let result: Result<(), _> = ctx.guard(std::future::pending()).await;
        assert_eq!(result, Err(ReconcileError::Cancelled));
    }
}
