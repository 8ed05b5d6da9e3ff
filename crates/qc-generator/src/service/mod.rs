//! Block Generator Service
//!
//! One production cycle ([`Generator::make_block`]):
//!
//! 1. Read the chain head and its snapshot.
//! 2. Resume the persisted pending block if it is still the next height,
//!    otherwise drain the pool, assemble a fresh block and persist it
//!    *before* any signer sees it. Empty blocks are returned unpersisted.
//! 3. Collect an M-of-N witness from the federation.
//! 4. Hand block and snapshot to the chain for an atomic commit.
//!
//! A generator that dies anywhere after step 2 resumes the identical block
//! on its next cycle, so signers are only ever asked to sign one block per
//! height.

mod collector;
mod scheduler;

use crate::config::GeneratorConfig;
use crate::domain::{Block, ConsensusProgram, Hash, SubmitOutcome, Transaction, TransactionPool};
use crate::error::{GeneratorError, Result};
use crate::metrics::Metrics;
use crate::ports::{
    BlockGenerator, BlockSigner, ChainBackend, LedgerSnapshot, PendingBlockStore, StoreError,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Federated block generator.
///
/// At most one cycle may run per instance at a time; callers serialize
/// `make_block` (the scheduling loop in [`Generator::run`] does).
pub struct Generator<C: ChainBackend> {
    chain: Arc<C>,
    store: Arc<dyn PendingBlockStore>,
    pool: Arc<TransactionPool>,
    signers: Vec<Arc<dyn BlockSigner>>,
    config: GeneratorConfig,
    metrics: Arc<Metrics>,
}

impl<C: ChainBackend> Generator<C> {
    /// Create a generator with a fresh transaction pool
    pub fn new(
        chain: Arc<C>,
        store: Arc<dyn PendingBlockStore>,
        signers: Vec<Arc<dyn BlockSigner>>,
        config: GeneratorConfig,
    ) -> Result<Self> {
        let pool = Arc::new(TransactionPool::new(config.max_pool_size));
        Self::with_pool(chain, store, pool, signers, config)
    }

    /// Create a generator draining an existing pool handle
    pub fn with_pool(
        chain: Arc<C>,
        store: Arc<dyn PendingBlockStore>,
        pool: Arc<TransactionPool>,
        signers: Vec<Arc<dyn BlockSigner>>,
        config: GeneratorConfig,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            signers = signers.len(),
            block_period_ms = config.block_period_ms,
            signer_timeout_ms = config.signer_timeout_ms,
            "[qc-generator] Initializing block generator"
        );
        Ok(Self {
            chain,
            store,
            pool,
            signers,
            config,
            metrics: Arc::new(Metrics::new()),
        })
    }

    /// Shared transaction pool
    pub fn pool(&self) -> &Arc<TransactionPool> {
        &self.pool
    }

    /// Cycle counters
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Active configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Queue a transaction for the next block
    pub fn submit(&self, tx: Transaction) -> SubmitOutcome {
        self.pool.submit(tx)
    }

    /// Transactions waiting for the next block
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pool.pending()
    }

    /// Run one production cycle and return the resulting block's hash.
    ///
    /// The hash of an empty block is returned even though that block is
    /// neither persisted nor committed.
    pub async fn make_block(&self, target_time_ms: u64) -> Result<Hash> {
        let started = Instant::now();
        let result = self.produce(target_time_ms).await;
        self.metrics.record_cycle(started.elapsed());
        match &result {
            Err(GeneratorError::InsufficientSignatures { .. }) => {
                self.metrics.record_quorum_failure()
            }
            Err(GeneratorError::DuplicateBlock { .. }) => self.metrics.record_pending_conflict(),
            _ => {}
        }
        result
    }

    async fn produce(&self, target_time_ms: u64) -> Result<Hash> {
        let (head, head_snapshot) = self.chain.state();

        let (block, snapshot) = match self.recover_pending(head.as_ref(), &head_snapshot).await? {
            Some(recovered) => recovered,
            None => {
                let transactions = self.pool.take_all();
                let (block, snapshot) = self
                    .chain
                    .generate_block(head.as_ref(), &head_snapshot, target_time_ms, transactions)
                    .await
                    .map_err(GeneratorError::Generate)?;

                if block.transactions.is_empty() {
                    debug!(height = block.height, "[qc-generator] empty block, skipping commit");
                    self.metrics.record_empty_block();
                    return Ok(block.hash());
                }

                self.save_pending(&block).await?;
                (block, snapshot)
            }
        };

        self.sign_and_commit(block, snapshot, head.as_ref()).await
    }

    /// Reuse the persisted pending block when it is still the next height.
    async fn recover_pending(
        &self,
        head: Option<&Block>,
        head_snapshot: &C::Snapshot,
    ) -> Result<Option<(Block, C::Snapshot)>> {
        let Some(pending) = self
            .store
            .load()
            .await
            .map_err(GeneratorError::LoadPendingBlock)?
        else {
            return Ok(None);
        };

        let next_height = head.map_or(1, |b| b.height + 1);
        if pending.height != next_height {
            debug!(
                pending_height = pending.height,
                next_height, "[qc-generator] ignoring stale pending block"
            );
            return Ok(None);
        }

        let mut snapshot = head_snapshot.clone();
        if let Err(source) = snapshot.apply_block(&pending) {
            error!(
                height = pending.height,
                block = %hex::encode(pending.hash()),
                error = %source,
                "[qc-generator] pending block does not apply to its prior snapshot"
            );
            return Err(GeneratorError::CorruptPendingBlock {
                height: pending.height,
                source,
            });
        }

        info!(
            height = pending.height,
            block = %hex::encode(pending.hash()),
            "[qc-generator] resuming pending block"
        );
        self.metrics.record_recovered();
        Ok(Some((pending, snapshot)))
    }

    async fn save_pending(&self, block: &Block) -> Result<()> {
        match self.store.save(block).await {
            Ok(()) => {
                debug!(height = block.height, "[qc-generator] pending block persisted");
                Ok(())
            }
            Err(StoreError::Conflict { stored, attempted }) => {
                Err(GeneratorError::DuplicateBlock { stored, attempted })
            }
            Err(e) => Err(GeneratorError::SavePendingBlock(e)),
        }
    }

    async fn sign_and_commit(
        &self,
        mut block: Block,
        snapshot: C::Snapshot,
        previous: Option<&Block>,
    ) -> Result<Hash> {
        block.witness = self.collect_witness(&block, previous).await?;

        let hash = block.hash();
        let height = block.height;
        let tx_count = block.transactions.len();
        self.chain
            .commit_applied_block(block, snapshot)
            .await
            .map_err(GeneratorError::Commit)?;

        self.metrics.record_block_committed();
        info!(
            height,
            transactions = tx_count,
            block = %hex::encode(hash),
            "[qc-generator] block committed"
        );
        Ok(hash)
    }

    async fn collect_witness(
        &self,
        block: &Block,
        previous: Option<&Block>,
    ) -> Result<Vec<Vec<u8>>> {
        let Some(previous) = previous else {
            if block.height == crate::INITIAL_HEIGHT {
                // Nobody is named to sign the initial block
                return Ok(Vec::new());
            }
            return Err(GeneratorError::MissingPreviousBlock {
                height: block.height,
            });
        };

        let program = ConsensusProgram::parse(&previous.consensus_program)
            .map_err(GeneratorError::ConsensusProgram)?;

        collector::collect_signatures(
            &self.signers,
            &program,
            Arc::from(block.signable_bytes()),
            block.hash(),
            self.config.signer_timeout(),
            &self.metrics,
        )
        .await
    }
}

#[async_trait]
impl<C: ChainBackend> BlockGenerator for Generator<C> {
    async fn make_block(&self, target_time_ms: u64) -> Result<Hash> {
        Generator::make_block(self, target_time_ms).await
    }

    fn submit(&self, tx: Transaction) -> SubmitOutcome {
        Generator::submit(self, tx)
    }
}
