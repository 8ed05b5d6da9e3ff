//! # Quorum Chain - Federated Block Generator
//!
//! **Bounded Context:** Block Production & Federation Signing
//! **Architecture:** Hexagonal (ports/adapters around a pure domain)
//!
//! ## Purpose
//!
//! The generator assembles the next block, obtains an M-of-N quorum of
//! signatures from a fixed federation of signer parties, and commits the
//! signed block to the chain. It is crash-safe: a generated block is
//! persisted before any signer sees it, and a restarted generator resumes
//! that exact block instead of building a competing one.
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - Pending slot: memory, file (fs2 lock + fsync)    │
//! │  - InMemoryChain reference backend                  │
//! │  - LocalSigner                                      │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - Inbound: BlockGenerator                          │
//! │  - Outbound: ChainBackend, BlockSigner,             │
//! │              PendingBlockStore, LedgerSnapshot      │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Logic)                        │
//! │  - Block / signable encoding                        │
//! │  - ConsensusProgram (M-of-N script)                 │
//! │  - SignatureMatcher                                 │
//! │  - TransactionPool                                  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **One block per height**: the pending slot only accepts strictly
//!    higher heights, so two generators never both sign different blocks at
//!    the same height.
//! 2. **Persist before sign**: no signature is requested for a block that
//!    is not durable.
//! 3. **Stable signable bytes**: the witness is excluded from the signed
//!    encoding, so retries ask for a signature over identical bytes.
//! 4. **Distinct signers**: each signature fills at most one key slot,
//!    found by verification, never by signer-declared identity.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! let generator = Generator::new(chain, store, signers, GeneratorConfig::default())?;
//! generator.submit(Transaction::new(payload));
//! let hash = generator.make_block(now_ms).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod crypto;
pub mod domain;
pub mod ports;
pub mod service;

mod config;
mod error;
mod metrics;

pub use config::GeneratorConfig;
pub use error::{GeneratorError, Result};
pub use metrics::Metrics;

pub use domain::{
    verify_witness, Block, ConsensusProgram, Hash, ProgramError, SignatureMatcher, SubmitOutcome,
    Transaction, TransactionPool,
};

pub use ports::{
    BlockGenerator, BlockSigner, ChainBackend, ChainError, LedgerSnapshot, PendingBlockStore,
    SignerError, StoreError,
};

pub use adapters::{FilePendingStore, InMemoryChain, LocalSigner, MemoryPendingStore, TxLedger};

pub use service::Generator;

/// Height of the first block; it needs no signatures
pub const INITIAL_HEIGHT: u64 = 1;

/// Default interval between production cycles (1 second)
pub const DEFAULT_BLOCK_PERIOD_MS: u64 = 1_000;

/// Default per-signer timeout (5 seconds)
pub const DEFAULT_SIGNER_TIMEOUT_MS: u64 = 5_000;

/// Default transaction pool capacity
pub const DEFAULT_MAX_POOL_SIZE: usize = 10_000;
