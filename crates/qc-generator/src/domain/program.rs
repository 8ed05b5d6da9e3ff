//! Consensus program: the M-of-N federation script carried by each block
//!
//! The program in block `h` names the keys allowed to sign block `h + 1`
//! and how many of them must. Encoding:
//!
//! ```text
//! [0x51][quorum: u8][count: u8][count x 32-byte ed25519 public key]
//! ```

use crate::crypto::PublicKey;
use thiserror::Error;

/// Leading tag of a block multisig program
pub const PROGRAM_TAG: u8 = 0x51;

/// Upper bound on federation size imposed by the one-byte count
pub const MAX_FEDERATION_KEYS: usize = u8::MAX as usize;

/// Errors building or parsing a consensus program
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// Empty input or unknown leading tag
    #[error("not a block multisig program")]
    BadTag,

    /// Input ended before all declared keys were read
    #[error("program truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required by the header
        expected: usize,
        /// Bytes present
        actual: usize,
    },

    /// Input continues past the last declared key
    #[error("{0} trailing bytes after program")]
    TrailingBytes(usize),

    /// A key is not a valid curve point
    #[error("invalid public key at position {0}")]
    InvalidKey(usize),

    /// More signatures required than keys named
    #[error("quorum {quorum} exceeds {keys} keys")]
    QuorumTooLarge {
        /// Declared quorum
        quorum: usize,
        /// Keys named
        keys: usize,
    },

    /// Keys named but no signature required
    #[error("zero quorum with {0} keys")]
    ZeroQuorum(usize),

    /// Federation larger than the encoding allows
    #[error("{0} keys exceed the maximum of {MAX_FEDERATION_KEYS}")]
    TooManyKeys(usize),
}

/// Parsed M-of-N program
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusProgram {
    public_keys: Vec<PublicKey>,
    quorum: usize,
}

impl ConsensusProgram {
    /// Build a program requiring `quorum` of `public_keys`.
    ///
    /// 0-of-0 is accepted and needs no signatures.
    pub fn new(public_keys: Vec<PublicKey>, quorum: usize) -> Result<Self, ProgramError> {
        if public_keys.len() > MAX_FEDERATION_KEYS {
            return Err(ProgramError::TooManyKeys(public_keys.len()));
        }
        if quorum > public_keys.len() {
            return Err(ProgramError::QuorumTooLarge {
                quorum,
                keys: public_keys.len(),
            });
        }
        if quorum == 0 && !public_keys.is_empty() {
            return Err(ProgramError::ZeroQuorum(public_keys.len()));
        }
        Ok(Self {
            public_keys,
            quorum,
        })
    }

    /// Eligible keys, in slot order
    pub fn public_keys(&self) -> &[PublicKey] {
        &self.public_keys
    }

    /// Signatures required (M)
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Encode as script bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(3 + 32 * self.public_keys.len());
        bytes.push(PROGRAM_TAG);
        // Bounded by MAX_FEDERATION_KEYS in `new`
        bytes.push(self.quorum as u8);
        bytes.push(self.public_keys.len() as u8);
        for key in &self.public_keys {
            bytes.extend_from_slice(key.as_bytes());
        }
        bytes
    }

    /// Parse script bytes produced by [`ConsensusProgram::encode`]
    pub fn parse(script: &[u8]) -> Result<Self, ProgramError> {
        let [tag, quorum, count, rest @ ..] = script else {
            return match script.first() {
                Some(&PROGRAM_TAG) => Err(ProgramError::Truncated {
                    expected: 3,
                    actual: script.len(),
                }),
                _ => Err(ProgramError::BadTag),
            };
        };
        if *tag != PROGRAM_TAG {
            return Err(ProgramError::BadTag);
        }

        let count = *count as usize;
        let expected = count * 32;
        if rest.len() < expected {
            return Err(ProgramError::Truncated {
                expected: 3 + expected,
                actual: script.len(),
            });
        }
        if rest.len() > expected {
            return Err(ProgramError::TrailingBytes(rest.len() - expected));
        }

        let public_keys = rest
            .chunks_exact(32)
            .enumerate()
            .map(|(i, chunk)| {
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(chunk);
                PublicKey::from_bytes(bytes).map_err(|_| ProgramError::InvalidKey(i))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(public_keys, *quorum as usize)
    }
}
