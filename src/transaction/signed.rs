//! Signed transactions and the unsigned/signed envelope.

use serde::{Deserialize, Serialize};

use crate::codec::wire::encode_body;
use crate::keys::{KeyManager, PrivateKey, PublicKey, Signature};
use crate::ledger::types::TransactionId;
use crate::transaction::body::TransactionBody;
use crate::transaction::TransactionError;

/// A signature and the key that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    pub public_key: PublicKey,
    pub signature: Signature,
}

/// A transaction body plus one or more signatures over its canonical bytes.
///
/// Whether the signature set covers every key the ledger requires can only
/// be checked by the ledger; locally we only guarantee presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    body: TransactionBody,
    signatures: Vec<SignaturePair>,
}

impl SignedTransaction {
    pub fn body(&self) -> &TransactionBody {
        &self.body
    }

    pub fn signatures(&self) -> &[SignaturePair] {
        &self.signatures
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.body.transaction_id
    }

    pub fn is_signed_by(&self, key: &PublicKey) -> bool {
        self.signatures.iter().any(|pair| &pair.public_key == key)
    }

    /// Check every attached signature against the body bytes.
    pub fn verify_signatures(&self) -> Result<(), TransactionError> {
        let message = encode_body(&self.body).map_err(|e| TransactionError::Signing(e.to_string()))?;
        for pair in &self.signatures {
            pair.public_key
                .verify(&message, &pair.signature)
                .map_err(|_| {
                    TransactionError::Signing(format!("signature by {} does not verify", pair.public_key))
                })?;
        }
        Ok(())
    }
}

/// Either side of the signing step, as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    Unsigned(TransactionBody),
    Signed(SignedTransaction),
}

impl Transaction {
    pub fn body(&self) -> &TransactionBody {
        match self {
            Transaction::Unsigned(body) => body,
            Transaction::Signed(signed) => signed.body(),
        }
    }

    pub fn signatures(&self) -> &[SignaturePair] {
        match self {
            Transaction::Unsigned(_) => &[],
            Transaction::Signed(signed) => signed.signatures(),
        }
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures().is_empty()
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.body().transaction_id
    }

    /// The signed form, if any signature is present.
    pub fn into_signed(self) -> Option<SignedTransaction> {
        match self {
            Transaction::Unsigned(_) => None,
            Transaction::Signed(signed) => Some(signed),
        }
    }

    /// Add the operator's signature.
    pub fn sign_with(self, keys: &KeyManager) -> Result<SignedTransaction, TransactionError> {
        self.sign(|message| {
            keys.sign_as_operator(message)
                .map_err(|e| TransactionError::Signing(e.to_string()))
        })
    }

    /// Add a signature by an arbitrary key.
    pub fn sign_with_key(self, key: &PrivateKey) -> Result<SignedTransaction, TransactionError> {
        self.sign(|message| {
            let signature = KeyManager::sign(key, message)
                .map_err(|e| TransactionError::Signing(e.to_string()))?;
            Ok((key.public_key(), signature))
        })
    }

    fn sign<F>(self, signer: F) -> Result<SignedTransaction, TransactionError>
    where
        F: FnOnce(&[u8]) -> Result<(PublicKey, Signature), TransactionError>,
    {
        let mut signed = match self {
            Transaction::Unsigned(body) => SignedTransaction {
                body,
                signatures: Vec::new(),
            },
            Transaction::Signed(signed) => signed,
        };

        let message = encode_body(&signed.body).map_err(|e| TransactionError::Signing(e.to_string()))?;
        let (public_key, signature) = signer(&message)?;

        // A key signs at most once.
        if signed.is_signed_by(&public_key) {
            tracing::debug!(
                transaction_id = %signed.transaction_id(),
                public_key = %public_key,
                "Transaction already signed by key"
            );
            return Ok(signed);
        }

        signed.signatures.push(SignaturePair {
            public_key,
            signature,
        });
        Ok(signed)
    }
}

impl From<SignedTransaction> for Transaction {
    fn from(signed: SignedTransaction) -> Self {
        Transaction::Signed(signed)
    }
}
