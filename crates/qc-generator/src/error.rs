//! Error types for the block generator

use crate::domain::ProgramError;
use crate::ports::{ChainError, StoreError};
use thiserror::Error;

/// Result type alias for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Errors that can end a block production cycle
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Fewer signer clients are configured than the quorum requires
    #[error("too few signers: {configured} configured, quorum requires {required}")]
    TooFewSigners {
        /// Configured signer clients
        configured: usize,
        /// Signatures required by the consensus program
        required: usize,
    },

    /// Collection ended before enough distinct keys were satisfied
    #[error("got {collected} of {required} needed signatures")]
    InsufficientSignatures {
        /// Distinct keys matched
        collected: usize,
        /// Signatures required by the consensus program
        required: usize,
    },

    /// The pending slot already holds a block at this height or higher
    #[error("generator already committed to a block at height {stored} (attempted {attempted})")]
    DuplicateBlock {
        /// Height held by the pending slot
        stored: u64,
        /// Height this cycle tried to persist
        attempted: u64,
    },

    /// Reading the pending slot failed
    #[error("retrieving the pending block: {0}")]
    LoadPendingBlock(#[source] StoreError),

    /// Writing the pending slot failed
    #[error("saving pending block: {0}")]
    SavePendingBlock(#[source] StoreError),

    /// Chain backend could not assemble a block
    #[error("generate: {0}")]
    Generate(#[source] ChainError),

    /// Chain backend refused or failed to persist the signed block
    #[error("commit: {0}")]
    Commit(#[source] ChainError),

    /// The previous block carries an unparseable consensus program
    #[error("parsing previous block consensus program: {0}")]
    ConsensusProgram(#[source] ProgramError),

    /// A non-initial block was produced without a previous block
    #[error("no previous block for height {height}")]
    MissingPreviousBlock {
        /// Height of the orphaned candidate
        height: u64,
    },

    /// A recovered pending block does not apply to the snapshot it was built on
    #[error("pending block at height {height} does not apply to its prior snapshot: {source}")]
    CorruptPendingBlock {
        /// Height of the pending block
        height: u64,
        /// Rejection reported by the snapshot
        #[source]
        source: ChainError,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GeneratorError {
    /// Misconfiguration; retrying the cycle will not help
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::TooFewSigners { .. } | Self::InvalidConfig(_))
    }

    /// Safe to retry: the pending block and its signable bytes are unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InsufficientSignatures { .. })
    }

    /// Lost a race with another writer of the pending slot
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateBlock { .. })
    }

    /// Local state can no longer be trusted; the process must stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CorruptPendingBlock { .. })
    }
}
