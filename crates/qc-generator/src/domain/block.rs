//! Block and transaction entities

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 32-byte content hash
pub type Hash = [u8; 32];

/// Domain separator prefixed to every signable encoding
const SIGNABLE_TAG: &[u8] = b"qc-block/v1";

/// Opaque transaction awaiting inclusion
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    /// Encoded transaction, interpreted only by the chain backend
    pub payload: Vec<u8>,
}

impl Transaction {
    /// Wrap an encoded transaction
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// SHA-256 of the payload
    pub fn id(&self) -> Hash {
        sha256(&self.payload)
    }
}

/// A block as produced by the generator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Height, unique per chain
    pub height: u64,

    /// Hash of the block at `height - 1` (zero for the initial block)
    pub previous_block_hash: Hash,

    /// Target time the block was assembled for (Unix milliseconds)
    pub timestamp_ms: u64,

    /// Included transactions, in order
    pub transactions: Vec<Transaction>,

    /// Script naming the signers and quorum for the *next* block
    pub consensus_program: Vec<u8>,

    /// Signatures authorizing this block, in consensus-key order
    pub witness: Vec<Vec<u8>>,
}

impl Block {
    /// Deterministic encoding of every field except the witness.
    ///
    /// Signers sign exactly these bytes, so a block re-signed after a failed
    /// round is always presented identically.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let tx_bytes: usize = self.transactions.iter().map(|tx| tx.payload.len() + 4).sum();
        let mut bytes =
            Vec::with_capacity(SIGNABLE_TAG.len() + 60 + tx_bytes + self.consensus_program.len());

        bytes.extend_from_slice(SIGNABLE_TAG);
        bytes.extend_from_slice(&self.height.to_le_bytes());
        bytes.extend_from_slice(&self.previous_block_hash);
        bytes.extend_from_slice(&self.timestamp_ms.to_le_bytes());

        bytes.extend_from_slice(&(self.transactions.len() as u32).to_le_bytes());
        for tx in &self.transactions {
            bytes.extend_from_slice(&(tx.payload.len() as u32).to_le_bytes());
            bytes.extend_from_slice(&tx.payload);
        }

        bytes.extend_from_slice(&(self.consensus_program.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&self.consensus_program);

        bytes
    }

    /// Content hash; independent of the witness
    pub fn hash(&self) -> Hash {
        sha256(&self.signable_bytes())
    }

    /// Full encoding, witness included, for durable storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode a block written by [`Block::to_bytes`]
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

#[inline]
fn sha256(data: &[u8]) -> Hash {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Sha256::digest(data));
    output
}
