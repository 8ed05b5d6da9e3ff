//! Transaction pool
//!
//! Holds submitted transactions until the next block is assembled. The only
//! way transactions leave is [`TransactionPool::take_all`], which swaps the
//! whole pool (transactions and membership index) for an empty one under a
//! single lock, so a transaction is never both handed to block assembly and
//! still visible to a concurrent submit.

use super::block::{Hash, Transaction};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Result of a submission
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Queued for the next block
    Added,
    /// Already pooled; ignored
    Duplicate,
    /// Pool at capacity; rejected
    Full,
}

#[derive(Debug, Default)]
struct PoolState {
    transactions: Vec<Transaction>,
    ids: HashSet<Hash>,
}

/// In-memory holding area for transactions awaiting inclusion
#[derive(Debug)]
pub struct TransactionPool {
    state: Mutex<PoolState>,
    max_size: usize,
}

impl TransactionPool {
    /// Create an empty pool holding at most `max_size` transactions
    pub fn new(max_size: usize) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            max_size,
        }
    }

    /// Queue `tx` unless it is already pooled or the pool is full
    pub fn submit(&self, tx: Transaction) -> SubmitOutcome {
        let id = tx.id();
        let mut state = self.state.lock();
        if state.ids.contains(&id) {
            return SubmitOutcome::Duplicate;
        }
        if state.transactions.len() >= self.max_size {
            return SubmitOutcome::Full;
        }
        state.ids.insert(id);
        state.transactions.push(tx);
        SubmitOutcome::Added
    }

    /// Atomically take every pooled transaction, leaving the pool empty
    pub fn take_all(&self) -> Vec<Transaction> {
        let taken = std::mem::take(&mut *self.state.lock());
        taken.transactions
    }

    /// Copy of the pooled transactions, in submission order
    pub fn pending(&self) -> Vec<Transaction> {
        self.state.lock().transactions.clone()
    }

    /// Number of pooled transactions
    pub fn len(&self) -> usize {
        self.state.lock().transactions.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
