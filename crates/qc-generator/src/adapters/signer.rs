//! Local signer client
//!
//! Signs with a key held in process. Remote signers implement the same
//! [`BlockSigner`] port over their own transport.

use crate::crypto::{KeyPair, PublicKey};
use crate::ports::{BlockSigner, SignerError};
use async_trait::async_trait;

/// Federation member whose key lives in this process
#[derive(Debug)]
pub struct LocalSigner {
    keypair: KeyPair,
}

impl LocalSigner {
    /// Wrap a key pair
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    /// Key this signer signs with
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }
}

#[async_trait]
impl BlockSigner for LocalSigner {
    async fn sign_block(&self, signable: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(self.keypair.sign(signable))
    }
}
