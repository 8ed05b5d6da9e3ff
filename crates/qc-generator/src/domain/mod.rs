//! Domain layer - block, consensus program, quorum matching, transaction pool
//!
//! Everything here is synchronous and free of I/O; the service layer drives
//! it from async code.

mod block;
mod pool;
pub mod program;
pub mod quorum;

pub use block::{Block, Hash, Transaction};
pub use pool::{SubmitOutcome, TransactionPool};
pub use program::{ConsensusProgram, ProgramError};
pub use quorum::{verify_witness, SignatureMatcher};
