//! In-memory chain backend
//!
//! Reference [`ChainBackend`] for tests and single-node setups. The ledger
//! is the set of applied transaction ids; a block applies when it is the
//! next height and includes no transaction twice. Commits are refused unless
//! the witness satisfies the previous block's consensus program.

use crate::domain::{verify_witness, Block, ConsensusProgram, Hash, Transaction};
use crate::ports::{ChainBackend, ChainError, LedgerSnapshot};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;

/// Snapshot: applied transaction ids as of `height`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxLedger {
    height: u64,
    applied: HashSet<Hash>,
}

impl TxLedger {
    /// Height of the last applied block (0 before the first)
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Whether a transaction with this id has been applied
    pub fn contains(&self, id: &Hash) -> bool {
        self.applied.contains(id)
    }

    /// Number of applied transactions
    pub fn len(&self) -> usize {
        self.applied.len()
    }

    /// Whether nothing has been applied
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

impl LedgerSnapshot for TxLedger {
    fn apply_block(&mut self, block: &Block) -> Result<(), ChainError> {
        if block.height != self.height + 1 {
            return Err(ChainError::Apply {
                height: block.height,
                reason: format!("snapshot is at height {}", self.height),
            });
        }

        let mut ids = HashSet::with_capacity(block.transactions.len());
        for tx in &block.transactions {
            let id = tx.id();
            if self.applied.contains(&id) || !ids.insert(id) {
                return Err(ChainError::Apply {
                    height: block.height,
                    reason: format!("transaction {} already applied", hex::encode(id)),
                });
            }
        }

        self.applied.extend(ids);
        self.height = block.height;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ChainState {
    blocks: Vec<Block>,
    snapshot: TxLedger,
}

/// Chain held entirely in memory
#[derive(Debug)]
pub struct InMemoryChain {
    state: RwLock<ChainState>,
    /// Encoded program stamped on every new block
    federation_program: Vec<u8>,
}

impl InMemoryChain {
    /// Empty chain whose blocks name `federation` as the next signers
    pub fn new(federation: &ConsensusProgram) -> Self {
        Self {
            state: RwLock::new(ChainState::default()),
            federation_program: federation.encode(),
        }
    }

    /// Height of the head block (0 when empty)
    pub fn height(&self) -> u64 {
        self.state.read().blocks.last().map_or(0, |b| b.height)
    }

    /// Head block, if any
    pub fn head(&self) -> Option<Block> {
        self.state.read().blocks.last().cloned()
    }

    /// Committed block at `height`
    pub fn block_at(&self, height: u64) -> Option<Block> {
        let index = usize::try_from(height.checked_sub(1)?).ok()?;
        self.state.read().blocks.get(index).cloned()
    }

    fn check_commit(head: Option<&Block>, block: &Block) -> Result<(), ChainError> {
        let rejected = |reason: String| ChainError::Rejected {
            height: block.height,
            reason,
        };

        let expected = head.map_or(1, |b| b.height + 1);
        if block.height != expected {
            return Err(rejected(format!("expected height {expected}")));
        }

        let Some(head) = head else {
            return Ok(());
        };
        if block.previous_block_hash != head.hash() {
            return Err(rejected("previous block hash mismatch".into()));
        }

        let program =
            ConsensusProgram::parse(&head.consensus_program).map_err(|e| rejected(e.to_string()))?;
        let signed = verify_witness(&program, &block.signable_bytes(), &block.witness);
        if signed < program.quorum() {
            return Err(rejected(format!(
                "witness satisfies {signed} of {} required keys",
                program.quorum()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainBackend for InMemoryChain {
    type Snapshot = TxLedger;

    fn state(&self) -> (Option<Block>, TxLedger) {
        let state = self.state.read();
        (state.blocks.last().cloned(), state.snapshot.clone())
    }

    async fn generate_block(
        &self,
        head: Option<&Block>,
        snapshot: &TxLedger,
        target_time_ms: u64,
        transactions: Vec<Transaction>,
    ) -> Result<(Block, TxLedger), ChainError> {
        let height = head.map_or(1, |b| b.height + 1);
        if snapshot.height() + 1 != height {
            return Err(ChainError::Assembly(format!(
                "snapshot at height {} does not follow head",
                snapshot.height()
            )));
        }

        let mut seen = HashSet::new();
        let transactions: Vec<_> = transactions
            .into_iter()
            .filter(|tx| {
                let id = tx.id();
                !snapshot.contains(&id) && seen.insert(id)
            })
            .collect();

        let block = Block {
            height,
            previous_block_hash: head.map_or([0u8; 32], Block::hash),
            timestamp_ms: target_time_ms,
            transactions,
            consensus_program: self.federation_program.clone(),
            witness: Vec::new(),
        };

        let mut next = snapshot.clone();
        next.apply_block(&block)?;
        Ok((block, next))
    }

    async fn commit_applied_block(
        &self,
        block: Block,
        snapshot: TxLedger,
    ) -> Result<(), ChainError> {
        let mut state = self.state.write();
        Self::check_commit(state.blocks.last(), &block)?;
        if snapshot.height() != block.height {
            return Err(ChainError::Rejected {
                height: block.height,
                reason: format!("snapshot is at height {}", snapshot.height()),
            });
        }

        state.blocks.push(block);
        state.snapshot = snapshot;
        Ok(())
    }
}
