//! Metrics collection for the block generator

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for production cycles
#[derive(Debug, Default)]
pub struct Metrics {
    /// `make_block` invocations
    pub cycles: AtomicU64,

    /// Blocks signed and committed
    pub blocks_committed: AtomicU64,

    /// Empty blocks returned without persisting or committing
    pub empty_blocks: AtomicU64,

    /// Cycles that resumed a persisted pending block
    pub pending_blocks_recovered: AtomicU64,

    /// Signing rounds that ended short of quorum
    pub quorum_failures: AtomicU64,

    /// Signatures that matched no unmatched federation key
    pub invalid_signatures: AtomicU64,

    /// Pending-slot writes rejected by the height check
    pub pending_conflicts: AtomicU64,

    /// Total cycle time (microseconds)
    pub cycle_time_us: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the completion of one cycle, successful or not
    pub fn record_cycle(&self, elapsed: Duration) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.cycle_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record a committed block
    pub fn record_block_committed(&self) {
        self.blocks_committed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an empty block that was skipped
    pub fn record_empty_block(&self) {
        self.empty_blocks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a resumed pending block
    pub fn record_recovered(&self) {
        self.pending_blocks_recovered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a signing round that missed quorum
    pub fn record_quorum_failure(&self) {
        self.quorum_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a discarded signature
    pub fn record_invalid_signature(&self) {
        self.invalid_signatures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected pending-slot write
    pub fn record_pending_conflict(&self) {
        self.pending_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get blocks committed
    pub fn get_blocks_committed(&self) -> u64 {
        self.blocks_committed.load(Ordering::Relaxed)
    }

    /// Get average cycle time (microseconds)
    pub fn get_avg_cycle_time(&self) -> f64 {
        let cycles = self.cycles.load(Ordering::Relaxed);
        if cycles == 0 {
            return 0.0;
        }
        let time = self.cycle_time_us.load(Ordering::Relaxed);
        time as f64 / cycles as f64
    }
}
