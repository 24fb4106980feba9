//! Operator key management and signing.
//!
//! # Security
//! - The operator key comes from resolved configuration only
//! - Keys are never logged; only the public key is
//! - The operator key is shared read-only between concurrent requests

use std::sync::Arc;

use crate::keys::keypair::{KeyAlgorithm, PrivateKey, PublicKey, Signature};
use crate::keys::secret::SecretString;
use crate::keys::KeyError;
use crate::ledger::types::AccountId;

/// A freshly generated key pair.
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl KeyPair {
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// One-time handoff of the secret half to the caller.
    pub fn reveal_private_key(&self) -> SecretString {
        self.private.reveal()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Holds the operator credential and performs signing.
#[derive(Clone)]
pub struct KeyManager {
    operator_account: AccountId,
    operator_key: Arc<PrivateKey>,
}

impl KeyManager {
    /// Parse an operator key string.
    ///
    /// # Security
    /// The string is parsed in place and never logged.
    pub fn load_operator_key(raw: &str) -> Result<PrivateKey, KeyError> {
        raw.parse()
    }

    /// Create a manager for `operator_account` signing with `raw_key`.
    pub fn from_credentials(operator_account: AccountId, raw_key: &str) -> Result<Self, KeyError> {
        let key = Self::load_operator_key(raw_key)?;

        tracing::info!(
            operator = %operator_account,
            algorithm = %key.algorithm(),
            public_key = %key.public_key(),
            "Operator key loaded"
        );

        Ok(Self {
            operator_account,
            operator_key: Arc::new(key),
        })
    }

    /// Generate a fresh key pair from a CSPRNG.
    pub fn generate_key_pair(algorithm: KeyAlgorithm) -> KeyPair {
        let private = PrivateKey::generate(algorithm);
        let public = private.public_key();
        tracing::debug!(algorithm = %algorithm, public_key = %public, "Generated key pair");
        KeyPair { private, public }
    }

    /// Sign `bytes` with `key`.
    ///
    /// Callers must not assume determinism: ED25519 is deterministic, ECDSA
    /// signatures may differ between calls.
    pub fn sign(key: &PrivateKey, bytes: &[u8]) -> Result<Signature, KeyError> {
        key.sign(bytes)
    }

    /// Sign with the operator key, returning the public key alongside.
    pub fn sign_as_operator(&self, bytes: &[u8]) -> Result<(PublicKey, Signature), KeyError> {
        let signature = Self::sign(&self.operator_key, bytes)?;
        Ok((self.operator_key.public_key(), signature))
    }

    pub fn operator_account(&self) -> AccountId {
        self.operator_account
    }

    pub fn operator_public_key(&self) -> PublicKey {
        self.operator_key.public_key()
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("operator_account", &self.operator_account)
            .field("operator_public_key", &self.operator_key.public_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str =
        "302e020100300506032b6570042204209d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    #[test]
    fn test_from_credentials() {
        let manager = KeyManager::from_credentials(AccountId::new(0, 0, 1001), TEST_KEY).unwrap();
        assert_eq!(manager.operator_account().to_string(), "0.0.1001");
        assert_eq!(manager.operator_public_key().algorithm(), KeyAlgorithm::Ed25519);
    }

    #[test]
    fn test_invalid_operator_key() {
        let result = KeyManager::from_credentials(AccountId::new(0, 0, 1001), "invalid_key");
        assert!(matches!(result, Err(KeyError::Malformed(_))));
    }

    #[test]
    fn test_sign_does_not_mutate_input() {
        let manager = KeyManager::from_credentials(AccountId::new(0, 0, 1001), TEST_KEY).unwrap();
        let bytes = vec![1u8, 2, 3, 4];
        let before = bytes.clone();
        let (public, signature) = manager.sign_as_operator(&bytes).unwrap();
        assert_eq!(bytes, before);
        assert!(public.verify(&bytes, &signature).is_ok());
    }

    #[test]
    fn test_generate_key_pair() {
        let pair = KeyManager::generate_key_pair(KeyAlgorithm::Ecdsa);
        assert_eq!(pair.public_key().algorithm(), KeyAlgorithm::Ecdsa);
        assert!(!pair.reveal_private_key().expose().is_empty());
        assert!(!format!("{pair:?}").contains(pair.reveal_private_key().expose()));

        let other = KeyManager::generate_key_pair(KeyAlgorithm::Ecdsa);
        assert_ne!(pair.public_key(), other.public_key());
    }
}
