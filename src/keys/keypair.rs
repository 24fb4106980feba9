//! Key material for the two supported signature schemes.
//!
//! # Encodings
//! - Private keys: DER hex (`302e…` ED25519, `3030…` ECDSA secp256k1),
//!   `0x`-prefixed raw hex (ECDSA), bare 32-byte hex (ED25519 seed) or bare
//!   64-byte hex (ED25519 seed followed by its public key).
//! - Public keys: DER hex, or raw 32 bytes (ED25519) / 33 bytes (compressed
//!   secp256k1).
//!
//! # Security
//! - Private keys never implement `Display` and their `Debug` output only
//!   shows the algorithm and public key.
//! - Intermediate secret byte buffers are zeroized.

use alloy::primitives::{keccak256, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use ed25519_dalek::{Signer as _, Verifier as _};
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

use crate::keys::secret::SecretString;
use crate::keys::KeyError;

const ED25519_PRIVATE_DER_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];
const ECDSA_PRIVATE_DER_PREFIX: [u8; 18] = [
    0x30, 0x30, 0x02, 0x01, 0x00, 0x30, 0x07, 0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x0a, 0x04, 0x22,
    0x04, 0x20,
];
const ED25519_PUBLIC_DER_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];
const ECDSA_PUBLIC_DER_PREFIX: [u8; 14] = [
    0x30, 0x2d, 0x30, 0x07, 0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x0a, 0x03, 0x22, 0x00,
];

/// Supported signature schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    #[default]
    #[serde(rename = "ED25519")]
    Ed25519,
    /// ECDSA over secp256k1, signing Keccak-256 digests.
    #[serde(rename = "ECDSA")]
    Ecdsa,
}

impl KeyAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyAlgorithm::Ed25519 => "ED25519",
            KeyAlgorithm::Ecdsa => "ECDSA",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ed25519" => Ok(KeyAlgorithm::Ed25519),
            "ecdsa" | "secp256k1" | "ecdsa_secp256k1" => Ok(KeyAlgorithm::Ecdsa),
            other => Err(KeyError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// A private signing key.
#[derive(Clone)]
pub enum PrivateKey {
    Ed25519(ed25519_dalek::SigningKey),
    Ecdsa(PrivateKeySigner),
}

impl PrivateKey {
    /// Generate a fresh key from the OS-seeded thread RNG.
    pub fn generate(algorithm: KeyAlgorithm) -> Self {
        let mut rng = rand::thread_rng();
        match algorithm {
            KeyAlgorithm::Ed25519 => {
                PrivateKey::Ed25519(ed25519_dalek::SigningKey::generate(&mut rng))
            }
            KeyAlgorithm::Ecdsa => {
                let signing_key = k256::ecdsa::SigningKey::random(&mut rng);
                PrivateKey::Ecdsa(PrivateKeySigner::from_signing_key(signing_key))
            }
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PrivateKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            PrivateKey::Ecdsa(_) => KeyAlgorithm::Ecdsa,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Ed25519(key) => PublicKey::Ed25519(key.verifying_key().to_bytes()),
            PrivateKey::Ecdsa(signer) => {
                let sec1 = signer.credential().verifying_key().to_sec1_bytes();
                let mut bytes = [0u8; 33];
                bytes.copy_from_slice(&sec1[..33]);
                PublicKey::Ecdsa(bytes)
            }
        }
    }

    /// Sign `message` without mutating it.
    ///
    /// ED25519 signs the bytes directly; ECDSA signs their Keccak-256 digest
    /// and yields a 64-byte `r || s` signature.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, KeyError> {
        match self {
            PrivateKey::Ed25519(key) => Ok(Signature(key.sign(message).to_bytes().to_vec())),
            PrivateKey::Ecdsa(signer) => {
                let digest: B256 = keccak256(message);
                let signature = signer
                    .sign_hash_sync(&digest)
                    .map_err(|e| KeyError::Signing(e.to_string()))?;
                Ok(Signature(signature.as_bytes()[..64].to_vec()))
            }
        }
    }

    /// EVM address derived from an ECDSA key.
    pub fn evm_address(&self) -> Option<String> {
        match self {
            PrivateKey::Ed25519(_) => None,
            PrivateKey::Ecdsa(signer) => Some(signer.address().to_string()),
        }
    }

    /// DER hex encoding of the secret.
    ///
    /// This is the only way to read secret material out of a key and it is
    /// handed back wrapped so it cannot end up in logs by accident.
    pub fn reveal(&self) -> SecretString {
        let (prefix, mut secret): (&[u8], [u8; 32]) = match self {
            PrivateKey::Ed25519(key) => (&ED25519_PRIVATE_DER_PREFIX[..], key.to_bytes()),
            PrivateKey::Ecdsa(signer) => {
                let mut scalar = [0u8; 32];
                scalar.copy_from_slice(&signer.credential().to_bytes());
                (&ECDSA_PRIVATE_DER_PREFIX[..], scalar)
            }
        };
        let mut der = Vec::with_capacity(prefix.len() + secret.len());
        der.extend_from_slice(prefix);
        der.extend_from_slice(&secret);
        let encoded = SecretString::new(hex::encode(&der));
        secret.zeroize();
        der.zeroize();
        encoded
    }

    fn ed25519_from_seed(seed: &[u8]) -> Result<Self, KeyError> {
        let mut bytes: [u8; 32] = seed
            .try_into()
            .map_err(|_| KeyError::Malformed("ED25519 seed must be 32 bytes".into()))?;
        let key = ed25519_dalek::SigningKey::from_bytes(&bytes);
        bytes.zeroize();
        Ok(PrivateKey::Ed25519(key))
    }

    fn ecdsa_from_scalar(scalar: &[u8]) -> Result<Self, KeyError> {
        let signing_key = k256::ecdsa::SigningKey::from_slice(scalar)
            .map_err(|_| KeyError::Malformed("invalid secp256k1 scalar".into()))?;
        Ok(PrivateKey::Ecdsa(PrivateKeySigner::from_signing_key(signing_key)))
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(KeyError::Malformed("empty key".into()));
        }

        if let Some(hex_part) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            let mut bytes = decode_hex(hex_part)?;
            let key = if bytes.len() == 32 {
                Self::ecdsa_from_scalar(&bytes)
            } else {
                Err(KeyError::Malformed(format!(
                    "0x-prefixed key must be 32 bytes, got {}",
                    bytes.len()
                )))
            };
            bytes.zeroize();
            return key;
        }

        let mut bytes = decode_hex(text)?;
        let key = match bytes.len() {
            48 if bytes.starts_with(&ED25519_PRIVATE_DER_PREFIX) => {
                Self::ed25519_from_seed(&bytes[16..])
            }
            50 if bytes.starts_with(&ECDSA_PRIVATE_DER_PREFIX) => {
                Self::ecdsa_from_scalar(&bytes[18..])
            }
            32 => Self::ed25519_from_seed(&bytes),
            64 => Self::ed25519_from_seed(&bytes[..32]).and_then(|key| {
                if key.public_key().to_bytes() == bytes[32..] {
                    Ok(key)
                } else {
                    Err(KeyError::Malformed(
                        "ED25519 public half does not match seed".into(),
                    ))
                }
            }),
            n => Err(KeyError::Malformed(format!(
                "unrecognized key encoding ({n} bytes)"
            ))),
        };
        bytes.zeroize();
        key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm())
            .field("public_key", &self.public_key().to_string())
            .finish_non_exhaustive()
    }
}

/// A validated public key.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyRepr", into = "PublicKeyRepr")]
pub enum PublicKey {
    Ed25519([u8; 32]),
    /// Compressed SEC1 point.
    Ecdsa([u8; 33]),
}

#[derive(Serialize, Deserialize)]
struct PublicKeyRepr {
    algorithm: KeyAlgorithm,
    bytes: Vec<u8>,
}

impl TryFrom<PublicKeyRepr> for PublicKey {
    type Error = KeyError;

    fn try_from(repr: PublicKeyRepr) -> Result<Self, Self::Error> {
        PublicKey::from_raw(repr.algorithm, &repr.bytes)
    }
}

impl From<PublicKey> for PublicKeyRepr {
    fn from(key: PublicKey) -> Self {
        PublicKeyRepr {
            algorithm: key.algorithm(),
            bytes: key.to_bytes(),
        }
    }
}

impl PublicKey {
    /// Build from raw key bytes, checking the point is valid.
    pub fn from_raw(algorithm: KeyAlgorithm, bytes: &[u8]) -> Result<Self, KeyError> {
        match algorithm {
            KeyAlgorithm::Ed25519 => {
                let raw: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| KeyError::Malformed("ED25519 public key must be 32 bytes".into()))?;
                ed25519_dalek::VerifyingKey::from_bytes(&raw)
                    .map_err(|_| KeyError::Malformed("invalid ED25519 point".into()))?;
                Ok(PublicKey::Ed25519(raw))
            }
            KeyAlgorithm::Ecdsa => {
                let raw: [u8; 33] = bytes.try_into().map_err(|_| {
                    KeyError::Malformed("ECDSA public key must be 33 compressed bytes".into())
                })?;
                k256::ecdsa::VerifyingKey::from_sec1_bytes(&raw)
                    .map_err(|_| KeyError::Malformed("invalid secp256k1 point".into()))?;
                Ok(PublicKey::Ecdsa(raw))
            }
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            PublicKey::Ecdsa(_) => KeyAlgorithm::Ecdsa,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PublicKey::Ed25519(raw) => raw.to_vec(),
            PublicKey::Ecdsa(raw) => raw.to_vec(),
        }
    }

    /// DER encoding (SubjectPublicKeyInfo).
    pub fn to_der(&self) -> Vec<u8> {
        let (prefix, raw): (&[u8], &[u8]) = match self {
            PublicKey::Ed25519(raw) => (&ED25519_PUBLIC_DER_PREFIX[..], &raw[..]),
            PublicKey::Ecdsa(raw) => (&ECDSA_PUBLIC_DER_PREFIX[..], &raw[..]),
        };
        [prefix, raw].concat()
    }

    /// Check `signature` over `message` as produced by [`PrivateKey::sign`].
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), KeyError> {
        match self {
            PublicKey::Ed25519(raw) => {
                let key = ed25519_dalek::VerifyingKey::from_bytes(raw)
                    .map_err(|_| KeyError::Malformed("invalid ED25519 point".into()))?;
                let sig = ed25519_dalek::Signature::from_slice(signature.as_bytes())
                    .map_err(|_| KeyError::InvalidSignature)?;
                key.verify(message, &sig).map_err(|_| KeyError::InvalidSignature)
            }
            PublicKey::Ecdsa(raw) => {
                let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(raw)
                    .map_err(|_| KeyError::Malformed("invalid secp256k1 point".into()))?;
                let sig = k256::ecdsa::Signature::from_slice(signature.as_bytes())
                    .map_err(|_| KeyError::InvalidSignature)?;
                key.verify_prehash(keccak256(message).as_slice(), &sig)
                    .map_err(|_| KeyError::InvalidSignature)
            }
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_der()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}, {})", self.algorithm(), self)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text = raw.trim();
        let text = text.strip_prefix("0x").unwrap_or(text);
        let bytes = decode_hex(text)?;
        match bytes.len() {
            44 if bytes.starts_with(&ED25519_PUBLIC_DER_PREFIX) => {
                PublicKey::from_raw(KeyAlgorithm::Ed25519, &bytes[12..])
            }
            47 if bytes.starts_with(&ECDSA_PUBLIC_DER_PREFIX) => {
                PublicKey::from_raw(KeyAlgorithm::Ecdsa, &bytes[14..])
            }
            32 => PublicKey::from_raw(KeyAlgorithm::Ed25519, &bytes),
            33 => PublicKey::from_raw(KeyAlgorithm::Ecdsa, &bytes),
            n => Err(KeyError::Malformed(format!(
                "unrecognized public key encoding ({n} bytes)"
            ))),
        }
    }
}

/// Raw signature bytes (64 bytes for both schemes).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} bytes)", self.0.len())
    }
}

fn decode_hex(text: &str) -> Result<Vec<u8>, KeyError> {
    hex::decode(text).map_err(|_| KeyError::Malformed("key is not valid hex".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Deterministic ED25519 seed used across tests.
    const ED25519_SEED_HEX: &str =
        "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    // Anvil's first account: a well-known secp256k1 test key.
    const ECDSA_KEY_HEX: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_parse_ed25519_raw_and_der() {
        let raw: PrivateKey = ED25519_SEED_HEX.parse().unwrap();
        let der: PrivateKey = format!("302e020100300506032b657004220420{ED25519_SEED_HEX}")
            .parse()
            .unwrap();
        assert_eq!(raw.algorithm(), KeyAlgorithm::Ed25519);
        assert_eq!(raw.public_key(), der.public_key());
        // RFC 8032 test vector 1.
        assert_eq!(
            hex::encode(raw.public_key().to_bytes()),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
    }

    #[test]
    fn test_parse_ed25519_seed_with_public_half() {
        let joined = format!(
            "{ED25519_SEED_HEX}d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
        assert!(joined.parse::<PrivateKey>().is_ok());

        let mismatched = format!("{ED25519_SEED_HEX}{ED25519_SEED_HEX}");
        assert!(mismatched.parse::<PrivateKey>().is_err());
    }

    #[test]
    fn test_parse_ecdsa_forms() {
        let prefixed: PrivateKey = format!("0x{ECDSA_KEY_HEX}").parse().unwrap();
        let der: PrivateKey = format!("3030020100300706052b8104000a04220420{ECDSA_KEY_HEX}")
            .parse()
            .unwrap();
        assert_eq!(prefixed.algorithm(), KeyAlgorithm::Ecdsa);
        assert_eq!(prefixed.public_key(), der.public_key());
        assert_eq!(
            prefixed.evm_address().unwrap().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_malformed_keys() {
        for bad in ["", "zz", "abcd", "0x1234", "not a key at all"] {
            assert!(
                matches!(bad.parse::<PrivateKey>(), Err(KeyError::Malformed(_))),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_reveal_round_trip() {
        for algorithm in [KeyAlgorithm::Ed25519, KeyAlgorithm::Ecdsa] {
            let key = PrivateKey::generate(algorithm);
            let revealed = key.reveal();
            let reparsed: PrivateKey = revealed.expose().parse().unwrap();
            assert_eq!(reparsed.public_key(), key.public_key());
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let message = b"transaction body bytes";
        for algorithm in [KeyAlgorithm::Ed25519, KeyAlgorithm::Ecdsa] {
            let key = PrivateKey::generate(algorithm);
            let signature = key.sign(message).unwrap();
            assert_eq!(signature.as_bytes().len(), 64);
            assert!(key.public_key().verify(message, &signature).is_ok());
            assert!(key.public_key().verify(b"tampered", &signature).is_err());
        }
    }

    #[test]
    fn test_public_key_der_round_trip() {
        for algorithm in [KeyAlgorithm::Ed25519, KeyAlgorithm::Ecdsa] {
            let public = PrivateKey::generate(algorithm).public_key();
            let text = public.to_string();
            assert_eq!(text.parse::<PublicKey>().unwrap(), public);
        }
        let ed: PublicKey = "302a300506032b6570032100d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
            .parse()
            .unwrap();
        assert_eq!(ed.algorithm(), KeyAlgorithm::Ed25519);
    }

    #[test]
    fn test_debug_hides_secret() {
        let key: PrivateKey = ED25519_SEED_HEX.parse().unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains(ED25519_SEED_HEX));
        assert!(debug.contains("Ed25519"));
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("ed25519".parse::<KeyAlgorithm>().unwrap(), KeyAlgorithm::Ed25519);
        assert_eq!("ECDSA".parse::<KeyAlgorithm>().unwrap(), KeyAlgorithm::Ecdsa);
        assert!("rsa".parse::<KeyAlgorithm>().is_err());
    }
}
