//! Key management subsystem.
//!
//! # Data Flow
//! ```text
//! Operator credential string (config / environment)
//!     → keypair.rs (parse DER / hex encodings, validate)
//!     → manager.rs (operator key held read-only behind Arc)
//!     → sign(body bytes) → signature pair attached to a transaction
//!
//! Account creation:
//!     manager.rs generate_key_pair → fresh KeyPair
//!     → public key goes into the transaction
//!     → private key revealed once to the caller as a SecretString
//! ```
//!
//! # Security Constraints
//! - No network or disk I/O in this subsystem
//! - Private keys are never logged or serialized implicitly
//! - The operator key is never mutated after load

pub mod keypair;
pub mod manager;
pub mod secret;

use thiserror::Error;

pub use keypair::{KeyAlgorithm, PrivateKey, PublicKey, Signature};
pub use manager::{KeyManager, KeyPair};
pub use secret::SecretString;

/// Errors raised by key parsing and signing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The input does not parse as a supported key encoding.
    #[error("malformed key: {0}")]
    Malformed(String),

    /// Requested key algorithm is not supported.
    #[error("unsupported key algorithm '{0}': expected ED25519 or ECDSA")]
    UnsupportedAlgorithm(String),

    /// The signer backend failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Signature does not verify against the key.
    #[error("signature verification failed")]
    InvalidSignature,
}
