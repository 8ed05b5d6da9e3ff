//! Adapters implementing the outbound ports
//!
//! - [`pending_store`]: in-memory and file-backed pending-block slots
//! - [`chain`]: in-memory reference chain backend
//! - [`signer`]: local ed25519 signer client

pub mod chain;
pub mod pending_store;
pub mod signer;

pub use chain::{InMemoryChain, TxLedger};
pub use pending_store::{FilePendingStore, MemoryPendingStore};
pub use signer::LocalSigner;
