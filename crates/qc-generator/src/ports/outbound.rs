//! Outbound ports (driven side - SPI)
//!
//! Collaborators the generator needs but does not own: the chain backend
//! that validates and applies blocks, the federation signers, and the
//! durable pending-block slot.

use crate::domain::{Block, Transaction};
use async_trait::async_trait;
use thiserror::Error;

/// Chain backend failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Block assembly failed
    #[error("block assembly failed: {0}")]
    Assembly(String),

    /// Block does not apply to the snapshot
    #[error("block {height} does not apply: {reason}")]
    Apply {
        /// Height of the offending block
        height: u64,
        /// Why it was refused
        reason: String,
    },

    /// Backend refused to commit the block
    #[error("block {height} rejected: {reason}")]
    Rejected {
        /// Height of the offending block
        height: u64,
        /// Why it was refused
        reason: String,
    },

    /// Underlying storage failed
    #[error("chain storage failure: {0}")]
    Storage(String),
}

/// Signer client failures; each one just counts as an absent signature
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// Signer could not be reached
    #[error("signer unavailable: {0}")]
    Unavailable(String),

    /// Signer refused to sign
    #[error("signer refused: {0}")]
    Refused(String),
}

/// Pending slot failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Slot already holds a block at this height or higher; nothing written
    #[error("pending slot holds height {stored}, refusing height {attempted}")]
    Conflict {
        /// Height currently in the slot
        stored: u64,
        /// Height of the refused write
        attempted: u64,
    },

    /// Slot contents failed their integrity check
    #[error("pending slot corrupt: {0}")]
    Corrupt(String),

    /// Block could not be encoded or decoded
    #[error("pending block encoding: {0}")]
    Codec(#[from] bincode::Error),

    /// Filesystem or database failure
    #[error("pending slot I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Ledger state as of a committed height.
///
/// Each cycle clones the head snapshot and applies one block to its copy;
/// snapshots are never shared between cycles.
pub trait LedgerSnapshot: Clone + Send + Sync + 'static {
    /// Apply `block` on top of this snapshot
    fn apply_block(&mut self, block: &Block) -> Result<(), ChainError>;
}

/// Port: chain state owner
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Snapshot type produced by this backend
    type Snapshot: LedgerSnapshot;

    /// Current head block (none before the first commit) and its snapshot
    fn state(&self) -> (Option<Block>, Self::Snapshot);

    /// Assemble the block following `head` from `transactions` and return it
    /// with the snapshot it produces
    async fn generate_block(
        &self,
        head: Option<&Block>,
        snapshot: &Self::Snapshot,
        target_time_ms: u64,
        transactions: Vec<Transaction>,
    ) -> Result<(Block, Self::Snapshot), ChainError>;

    /// Atomically persist a signed block and the snapshot it produced
    async fn commit_applied_block(
        &self,
        block: Block,
        snapshot: Self::Snapshot,
    ) -> Result<(), ChainError>;
}

/// Port: one federation member able to sign blocks
#[async_trait]
pub trait BlockSigner: Send + Sync {
    /// Sign a block's canonical signable bytes
    async fn sign_block(&self, signable: &[u8]) -> Result<Vec<u8>, SignerError>;
}

/// Port: single-row durable slot for the generated but uncommitted block
#[async_trait]
pub trait PendingBlockStore: Send + Sync {
    /// Current pending block, if any
    async fn load(&self) -> Result<Option<Block>, StoreError>;

    /// Replace the slot only if it is empty or holds a strictly lower height.
    ///
    /// Otherwise nothing is written and [`StoreError::Conflict`] is returned.
    async fn save(&self, block: &Block) -> Result<(), StoreError>;
}
