//! Quorum signature collection
//!
//! One task per configured signer, all watching a shared cancellation
//! token and reporting `(slot, signature-or-none)` through a channel sized
//! to the signer count so no straggler ever blocks on send. Replies are
//! drained one at a time until the matched key count reaches the quorum or
//! every signer has answered; the token is then cancelled and late replies
//! are dropped with the receiver.

use crate::domain::{ConsensusProgram, Hash, SignatureMatcher};
use crate::error::{GeneratorError, Result};
use crate::metrics::Metrics;
use crate::ports::BlockSigner;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reply from one signer task
struct SignerReply {
    slot: usize,
    signature: Option<Vec<u8>>,
}

/// Collect `program.quorum()` signatures over `message` from `signers`.
///
/// Returns the witness: exactly `quorum` signatures ordered by the key they
/// matched in `program`.
pub(crate) async fn collect_signatures(
    signers: &[Arc<dyn BlockSigner>],
    program: &ConsensusProgram,
    message: Arc<[u8]>,
    block_hash: Hash,
    signer_timeout: Duration,
    metrics: &Metrics,
) -> Result<Vec<Vec<u8>>> {
    let quorum = program.quorum();
    if signers.len() < quorum {
        return Err(GeneratorError::TooFewSigners {
            configured: signers.len(),
            required: quorum,
        });
    }
    if quorum == 0 {
        return Ok(Vec::new());
    }

    let cancel = CancellationToken::new();
    // Also fires if this future is dropped mid-collection.
    let _cancel_on_drop = cancel.clone().drop_guard();

    let (reply_tx, mut reply_rx) = mpsc::channel(signers.len());
    for (slot, signer) in signers.iter().enumerate() {
        let signer = Arc::clone(signer);
        let message = Arc::clone(&message);
        let cancel = cancel.clone();
        let reply_tx = reply_tx.clone();
        tokio::spawn(async move {
            let signature =
                request_signature(signer.as_ref(), &message, slot, signer_timeout, &cancel).await;
            // Receiver is gone once collection stopped
            let _ = reply_tx.send(SignerReply { slot, signature }).await;
        });
    }
    drop(reply_tx);

    let mut matcher = SignatureMatcher::new(program.public_keys());
    let mut replies = 0;
    while matcher.filled() < quorum && replies < signers.len() {
        let Some(reply) = reply_rx.recv().await else {
            break;
        };
        replies += 1;

        let Some(signature) = reply.signature else {
            continue;
        };
        match matcher.claim(&message, signature) {
            Some(key_index) => debug!(
                slot = reply.slot,
                key_index,
                filled = matcher.filled(),
                "[qc-generator] signature accepted"
            ),
            None => {
                metrics.record_invalid_signature();
                warn!(
                    slot = reply.slot,
                    block = %hex::encode(block_hash),
                    "[qc-generator] invalid signature: matches no unmatched federation key"
                );
            }
        }
    }
    cancel.cancel();

    let collected = matcher.filled();
    if collected < quorum {
        warn!(
            collected,
            required = quorum,
            replies,
            block = %hex::encode(block_hash),
            "[qc-generator] quorum not reached"
        );
        return Err(GeneratorError::InsufficientSignatures {
            collected,
            required: quorum,
        });
    }

    info!(
        signatures = collected,
        replies,
        block = %hex::encode(block_hash),
        "[qc-generator] quorum reached"
    );
    Ok(matcher.into_witness())
}

/// Ask one signer for a signature. Failure, timeout and cancellation all
/// come back as `None`.
async fn request_signature(
    signer: &dyn BlockSigner,
    message: &[u8],
    slot: usize,
    signer_timeout: Duration,
    cancel: &CancellationToken,
) -> Option<Vec<u8>> {
    tokio::select! {
        _ = cancel.cancelled() => None,
        result = tokio::time::timeout(signer_timeout, signer.sign_block(message)) => match result {
            Ok(Ok(signature)) => Some(signature),
            Ok(Err(err)) => {
                if !cancel.is_cancelled() {
                    warn!(slot, error = %err, "[qc-generator] signer failed");
                }
                None
            }
            Err(_) => {
                warn!(
                    slot,
                    timeout_ms = signer_timeout.as_millis() as u64,
                    "[qc-generator] signer timed out"
                );
                None
            }
        },
    }
}
