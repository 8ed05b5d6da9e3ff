//! Inbound ports (driving side - API)

use crate::domain::{Hash, SubmitOutcome, Transaction};
use crate::error::Result;
use async_trait::async_trait;

/// Primary port: block generation
#[async_trait]
pub trait BlockGenerator: Send + Sync {
    /// Run one production cycle for `target_time_ms` and return the block hash
    async fn make_block(&self, target_time_ms: u64) -> Result<Hash>;

    /// Queue a transaction for inclusion
    fn submit(&self, tx: Transaction) -> SubmitOutcome;
}
