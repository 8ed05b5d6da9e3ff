//! # Ed25519 Federation Keys
//!
//! Federation members sign blocks with ed25519. Signers are untrusted, so
//! signatures arrive as raw bytes and anything malformed simply fails to
//! verify.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use thiserror::Error;

/// Key and signature errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Bytes are not a valid curve point
    #[error("Invalid public key")]
    InvalidPublicKey,
}

/// Ed25519 public key (32 bytes) of one federation member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Create from bytes, rejecting non-points.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(bytes) = <[u8; 64]>::try_from(signature) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        verifying_key
            .verify(message, &ed25519_dalek::Signature::from_bytes(&bytes))
            .is_ok()
    }
}

/// Ed25519 keypair.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::thread_rng()),
        }
    }

    /// Create from secret seed (32 bytes).
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Get public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message (deterministic).
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key().as_bytes()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign(b"block");
        assert!(keypair.public_key().verify(b"block", &signature));
        assert!(!keypair.public_key().verify(b"other block", &signature));
    }

    #[test]
    fn test_wrong_key_fails() {
        let signer = KeyPair::from_seed([1u8; 32]);
        let other = KeyPair::from_seed([2u8; 32]);
        let signature = signer.sign(b"test");
        assert!(!other.public_key().verify(b"test", &signature));
    }

    #[test]
    fn test_malformed_signature_fails() {
        let keypair = KeyPair::generate();
        assert!(!keypair.public_key().verify(b"test", &[]));
        assert!(!keypair.public_key().verify(b"test", &[0u8; 63]));
        assert!(!keypair.public_key().verify(b"test", &[0u8; 64]));
    }

    #[test]
    fn test_roundtrip_public_key() {
        let keypair = KeyPair::from_seed([0xAB; 32]);
        let pk = keypair.public_key();
        assert_eq!(PublicKey::from_bytes(*pk.as_bytes()), Ok(pk));
    }
}
