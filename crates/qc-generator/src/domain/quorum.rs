//! Signature-to-key matching
//!
//! Signers never say which federation key they hold. Each signature is
//! verified against every key whose slot is still empty and claims the first
//! one it satisfies. A signature is worth at most one slot and a slot accepts
//! at most one signature, so the filled count is the number of distinct keys
//! that have signed.

use super::program::ConsensusProgram;
use crate::crypto::PublicKey;

/// Witness slots for one signing round, one per consensus key
#[derive(Debug)]
pub struct SignatureMatcher<'a> {
    keys: &'a [PublicKey],
    slots: Vec<Option<Vec<u8>>>,
    filled: usize,
}

impl<'a> SignatureMatcher<'a> {
    /// Empty slots for `keys`
    pub fn new(keys: &'a [PublicKey]) -> Self {
        Self {
            keys,
            slots: vec![None; keys.len()],
            filled: 0,
        }
    }

    /// Place `signature` in the first unmatched slot whose key verifies it.
    ///
    /// Returns the slot index, or `None` when no unmatched key accepts it.
    pub fn claim(&mut self, message: &[u8], signature: Vec<u8>) -> Option<usize> {
        let index = self
            .keys
            .iter()
            .zip(&self.slots)
            .position(|(key, slot)| slot.is_none() && key.verify(message, &signature))?;
        self.slots[index] = Some(signature);
        self.filled += 1;
        Some(index)
    }

    /// Number of distinct keys matched so far
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Matched signatures in key order, empty slots omitted
    pub fn into_witness(self) -> Vec<Vec<u8>> {
        self.slots.into_iter().flatten().collect()
    }
}

/// Count the distinct program keys satisfied by `witness` over `message`.
pub fn verify_witness(program: &ConsensusProgram, message: &[u8], witness: &[Vec<u8>]) -> usize {
    let mut matcher = SignatureMatcher::new(program.public_keys());
    for signature in witness {
        matcher.claim(message, signature.clone());
    }
    matcher.filled()
}
