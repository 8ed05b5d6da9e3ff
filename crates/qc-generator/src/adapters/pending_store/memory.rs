//! In-process pending slot

use crate::domain::Block;
use crate::ports::{PendingBlockStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;

/// In-process pending slot.
///
/// Survives generator restarts within one process only; used by tests and
/// single-process setups.
#[derive(Debug, Default)]
pub struct MemoryPendingStore {
    slot: Mutex<Option<Block>>,
}

impl MemoryPendingStore {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Height held by the slot, if any
    pub fn stored_height(&self) -> Option<u64> {
        self.slot.lock().as_ref().map(|b| b.height)
    }
}

#[async_trait]
impl PendingBlockStore for MemoryPendingStore {
    async fn load(&self) -> Result<Option<Block>, StoreError> {
        Ok(self.slot.lock().clone())
    }

    async fn save(&self, block: &Block) -> Result<(), StoreError> {
        let mut slot = self.slot.lock();
        if let Some(stored) = slot.as_ref() {
            if stored.height >= block.height {
                return Err(StoreError::Conflict {
                    stored: stored.height,
                    attempted: block.height,
                });
            }
        }
        *slot = Some(block.clone());
        Ok(())
    }
}
