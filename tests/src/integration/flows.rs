//! # Integration Test Flows
//!
//! Generators wired to the file-backed pending slot, local signers and the
//! in-memory chain.
//!
//! ## Flows Tested:
//!
//! 1. **Crash recovery**: a block persisted by one generator instance is
//!    resumed, byte for byte, by the next instance on the same slot file
//! 2. **Competing generators**: two generators on one slot never get
//!    signatures for two different blocks at the same height
//! 3. **Chain growth**: every committed block carries a witness that
//!    satisfies the consensus program of the block before it

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tracing_subscriber::EnvFilter;

    use qc_generator::crypto::KeyPair;
    use qc_generator::{
        verify_witness, Block, BlockGenerator, BlockSigner, ChainError, ConsensusProgram,
        FilePendingStore, Generator, GeneratorConfig, GeneratorError, InMemoryChain, LocalSigner,
        PendingBlockStore, SignerError, Transaction,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn keypair(i: u8) -> KeyPair {
        KeyPair::from_seed([i; 32])
    }

    fn federation(n: u8, quorum: usize) -> ConsensusProgram {
        ConsensusProgram::new((1..=n).map(|i| keypair(i).public_key()).collect(), quorum)
            .expect("valid federation")
    }

    /// Local signer that records every message it signs and can be taken
    /// offline
    struct RecordingSigner {
        inner: LocalSigner,
        online: AtomicBool,
        signed: Arc<Mutex<Vec<Vec<u8>>>>,
        requests: AtomicUsize,
    }

    impl RecordingSigner {
        fn new(key: u8, signed: &Arc<Mutex<Vec<Vec<u8>>>>) -> Arc<Self> {
            Arc::new(Self {
                inner: LocalSigner::new(keypair(key)),
                online: AtomicBool::new(true),
                signed: Arc::clone(signed),
                requests: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl BlockSigner for RecordingSigner {
        async fn sign_block(&self, signable: &[u8]) -> Result<Vec<u8>, SignerError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if !self.online.load(Ordering::SeqCst) {
                return Err(SignerError::Unavailable("offline".into()));
            }
            let signature = self.inner.sign_block(signable).await?;
            self.signed.lock().push(signable.to_vec());
            Ok(signature)
        }
    }

    struct Node {
        generator: Generator<InMemoryChain>,
        signers: Vec<Arc<RecordingSigner>>,
    }

    fn node(
        chain: &Arc<InMemoryChain>,
        slot: &std::path::Path,
        keys: impl IntoIterator<Item = u8>,
        signed: &Arc<Mutex<Vec<Vec<u8>>>>,
    ) -> Node {
        let signers: Vec<_> = keys
            .into_iter()
            .map(|key| RecordingSigner::new(key, signed))
            .collect();
        let generator = Generator::new(
            Arc::clone(chain),
            Arc::new(FilePendingStore::new(slot)),
            signers
                .iter()
                .map(|s| Arc::clone(s) as Arc<dyn BlockSigner>)
                .collect(),
            GeneratorConfig {
                signer_timeout_ms: 2_000,
                ..Default::default()
            },
        )
        .expect("valid config");
        Node { generator, signers }
    }

    fn tx(tag: &str) -> Transaction {
        Transaction::new(tag.as_bytes().to_vec())
    }

    fn committed(chain: &InMemoryChain) -> Vec<Block> {
        (1..=chain.height())
            .map(|h| chain.block_at(h).expect("contiguous chain"))
            .collect()
    }

    // =============================================================================
    // FLOW 1: CRASH RECOVERY ACROSS INSTANCES
    // =============================================================================

    #[tokio::test]
    async fn test_restarted_generator_resumes_block_from_slot_file() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let slot = dir.path().join("pending.block");
        let chain = Arc::new(InMemoryChain::new(&federation(3, 2)));
        let signed = Arc::new(Mutex::new(Vec::new()));

        let first = node(&chain, &slot, 1..=3, &signed);
        first.generator.submit(tx("genesis"));
        first.generator.make_block(1_000).await.unwrap();

        // Federation goes dark; the block is persisted but cannot be signed
        first
            .signers
            .iter()
            .for_each(|s| s.online.store(false, Ordering::SeqCst));
        first.generator.submit(tx("transfer"));
        let err = first.generator.make_block(2_000).await.unwrap_err();
        assert!(matches!(err, GeneratorError::InsufficientSignatures { .. }));
        let persisted = FilePendingStore::new(&slot).load().await.unwrap().unwrap();
        assert_eq!(persisted.height, 2);
        drop(first);

        let second = node(&chain, &slot, 1..=3, &signed);
        second.generator.submit(tx("after-restart"));
        let hash = second.generator.make_block(9_000).await.unwrap();

        assert_eq!(hash, persisted.hash());
        let head = chain.head().unwrap();
        assert_eq!(head.transactions, vec![tx("transfer")]);
        assert_eq!(head.timestamp_ms, 2_000);
        assert_eq!(second.generator.pending_transactions(), vec![tx("after-restart")]);

        // Next cycle picks up the transaction that arrived after the restart
        second.generator.make_block(10_000).await.unwrap();
        assert_eq!(chain.head().unwrap().transactions, vec![tx("after-restart")]);
    }

    // =============================================================================
    // FLOW 2: COMPETING GENERATORS ON ONE SLOT
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_competing_generators_never_split_a_height() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let slot = dir.path().join("pending.block");
        let chain = Arc::new(InMemoryChain::new(&federation(3, 2)));
        let signed = Arc::new(Mutex::new(Vec::new()));

        let alpha = Arc::new(node(&chain, &slot, 1..=3, &signed));
        let beta = Arc::new(node(&chain, &slot, 1..=3, &signed));

        for round in 0..10u64 {
            alpha.generator.submit(tx(&format!("alpha-{round}")));
            beta.generator.submit(tx(&format!("beta-{round}")));

            let a = Arc::clone(&alpha);
            let b = Arc::clone(&beta);
            let (ra, rb) = tokio::join!(
                tokio::spawn(async move { a.generator.make_block(round * 10 + 1).await }),
                tokio::spawn(async move { b.generator.make_block(round * 10 + 2).await }),
            );

            for result in [ra.unwrap(), rb.unwrap()] {
                match result {
                    Ok(_)
                    | Err(GeneratorError::DuplicateBlock { .. })
                    | Err(GeneratorError::Commit(ChainError::Rejected { .. })) => {}
                    Err(other) => panic!("unexpected error in round {round}: {other}"),
                }
            }
        }

        let blocks = committed(&chain);
        assert!(!blocks.is_empty());
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(block.height, i as u64 + 1);
        }

        // Signatures were only ever produced for blocks that survived:
        // committed ones, or the one still waiting in the slot
        let mut survivors: HashSet<Vec<u8>> =
            blocks.iter().map(Block::signable_bytes).collect();
        if let Some(pending) = FilePendingStore::new(&slot).load().await.unwrap() {
            survivors.insert(pending.signable_bytes());
        }
        for message in signed.lock().iter() {
            assert!(survivors.contains(message));
        }
    }

    // =============================================================================
    // FLOW 3: CHAIN GROWTH
    // =============================================================================

    #[tokio::test]
    async fn test_every_block_satisfies_previous_program() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let slot = dir.path().join("pending.block");
        let program = federation(4, 3);
        let chain = Arc::new(InMemoryChain::new(&program));
        let signed = Arc::new(Mutex::new(Vec::new()));

        // One federation member never answers
        let node = node(&chain, &slot, [1, 2, 3, 4], &signed);
        node.signers[1].online.store(false, Ordering::SeqCst);
        let port: &dyn BlockGenerator = &node.generator;

        for i in 0..5u64 {
            port.submit(tx(&format!("payment-{i}")));
            port.make_block(i * 1_000).await.unwrap();
            // Idle cycle between payments
            port.make_block(i * 1_000 + 500).await.unwrap();
        }

        let blocks = committed(&chain);
        assert_eq!(blocks.len(), 5);
        assert!(blocks[0].witness.is_empty());
        for pair in blocks.windows(2) {
            let (previous, block) = (&pair[0], &pair[1]);
            assert_eq!(block.previous_block_hash, previous.hash());
            let program = ConsensusProgram::parse(&previous.consensus_program).unwrap();
            assert_eq!(block.witness.len(), program.quorum());
            assert_eq!(
                verify_witness(&program, &block.signable_bytes(), &block.witness),
                program.quorum()
            );
        }

        let pending = FilePendingStore::new(&slot).load().await.unwrap().unwrap();
        // The slot keeps the unsigned copy of the last block
        assert_eq!(pending.hash(), blocks[4].hash());
        assert!(pending.witness.is_empty());
        assert_eq!(node.generator.metrics().get_blocks_committed(), 5);
        assert!(node.signers[1].requests.load(Ordering::SeqCst) > 0);
    }
}
