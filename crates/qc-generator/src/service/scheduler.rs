//! Periodic production loop

use super::Generator;
use crate::error::Result;
use crate::ports::ChainBackend;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

impl<C: ChainBackend> Generator<C> {
    /// Call [`Generator::make_block`] once per block period until `shutdown`
    /// fires.
    ///
    /// Failed cycles are logged and the next tick retries from scratch. A
    /// fatal error ends the loop and is returned; the owning process must
    /// exit rather than keep producing.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let mut ticker = tokio::time::interval(self.config.block_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            block_period_ms = self.config.block_period_ms,
            "[qc-generator] production loop started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("[qc-generator] production loop stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            match self.make_block(unix_millis()).await {
                Ok(hash) => debug!(block = %hex::encode(hash), "[qc-generator] cycle complete"),
                Err(err) if err.is_fatal() => {
                    error!(error = %err, "[qc-generator] fatal error, halting production");
                    return Err(err);
                }
                Err(err) if err.is_conflict() => {
                    info!(error = %err, "[qc-generator] another generator owns this height")
                }
                Err(err) => warn!(
                    error = %err,
                    retryable = err.is_retryable(),
                    "[qc-generator] cycle failed"
                ),
            }
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
