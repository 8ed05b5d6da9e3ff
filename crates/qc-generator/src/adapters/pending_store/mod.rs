//! Pending Block Stores
//!
//! Implementations of the `PendingBlockStore` port.

mod file;
mod memory;

pub use file::FilePendingStore;
pub use memory::MemoryPendingStore;
