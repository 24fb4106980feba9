//! Result records.
//!
//! Success records carry operation-specific fields; failures become error
//! records carrying the message, the taxonomy kind, and the transaction id
//! when one was assigned. Generated private keys pass through an explicit
//! [`SecretPolicy`] so forwarding layers can redact them.

use serde_json::{json, Map, Value};

use crate::error::OperationError;
use crate::keys::{PublicKey, SecretString};
use crate::ledger::types::{AccountId, Status, TransactionId};

/// Whether generated secrets are rendered into result records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretPolicy {
    #[default]
    Reveal,
    Redact,
}

impl SecretPolicy {
    pub fn from_reveal(reveal: bool) -> Self {
        if reveal {
            SecretPolicy::Reveal
        } else {
            SecretPolicy::Redact
        }
    }

    fn render(self, secret: &SecretString) -> &str {
        match self {
            SecretPolicy::Reveal => secret.expose(),
            SecretPolicy::Redact => SecretString::redacted(),
        }
    }
}

/// Successful outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutput {
    AccountCreated {
        account_id: AccountId,
        public_key: PublicKey,
        private_key: SecretString,
        evm_address: Option<String>,
        transaction_id: TransactionId,
    },
    Transferred {
        status: Status,
        transaction_id: TransactionId,
    },
    Signed {
        signed_transaction: String,
    },
    Submitted {
        transaction_id: TransactionId,
        node_id: AccountId,
        transaction_hash: String,
        status: Status,
        /// Present for sign-and-submit.
        signed_transaction: Option<String>,
    },
}

impl OperationOutput {
    pub fn to_json(&self, policy: SecretPolicy) -> Value {
        match self {
            OperationOutput::AccountCreated {
                account_id,
                public_key,
                private_key,
                evm_address,
                transaction_id,
            } => {
                let mut record = json!({
                    "newAccountId": account_id.to_string(),
                    "newAccountPublicKey": public_key.to_string(),
                    "newAccountPrivateKey": policy.render(private_key),
                    "transactionId": transaction_id.to_string(),
                });
                if let (Some(address), Some(map)) = (evm_address, record.as_object_mut()) {
                    map.insert("newAccountEvmAddress".into(), json!(address));
                }
                record
            }
            OperationOutput::Transferred {
                status,
                transaction_id,
            } => json!({
                "status": status.as_str(),
                "transactionId": transaction_id.to_string(),
            }),
            OperationOutput::Signed { signed_transaction } => json!({
                "signedTransaction": signed_transaction,
            }),
            OperationOutput::Submitted {
                transaction_id,
                node_id,
                transaction_hash,
                status,
                signed_transaction,
            } => {
                let mut record = json!({
                    "transactionId": transaction_id.to_string(),
                    "nodeId": node_id.to_string(),
                    "transactionHash": transaction_hash,
                    "status": status.as_str(),
                });
                if let (Some(signed), Some(map)) = (signed_transaction, record.as_object_mut()) {
                    map.insert("signedTransaction".into(), json!(signed));
                }
                record
            }
        }
    }
}

/// Error record rendered in place of a success record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub error: String,
    pub error_kind: &'static str,
    pub transaction_id: Option<TransactionId>,
}

impl ErrorRecord {
    pub fn to_json(&self) -> Value {
        let mut record = Map::new();
        record.insert("error".into(), json!(self.error));
        record.insert("errorKind".into(), json!(self.error_kind));
        if let Some(id) = &self.transaction_id {
            record.insert("transactionId".into(), json!(id.to_string()));
        }
        Value::Object(record)
    }
}

impl From<&OperationError> for ErrorRecord {
    fn from(err: &OperationError) -> Self {
        Self {
            error: err.to_string(),
            error_kind: err.kind(),
            transaction_id: err.transaction_id(),
        }
    }
}

/// Outcome of one batch item.
pub type ItemResult = Result<OperationOutput, OperationError>;

/// Render an item as its JSON result record.
pub fn render(result: &ItemResult, policy: SecretPolicy) -> Value {
    match result {
        Ok(output) => output.to_json(policy),
        Err(err) => ErrorRecord::from(err).to_json(),
    }
}
