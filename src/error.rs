//! Operation error taxonomy.
//!
//! Every per-item failure the dispatcher reports is one of these kinds.
//! Only configuration errors are fatal to a whole batch; everything else is
//! captured per item unless the caller opted into fail-fast.

use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::keys::KeyError;
use crate::ledger::amount::AmountError;
use crate::ledger::submission::SubmissionError;
use crate::ledger::transport::TransportError;
use crate::ledger::types::{IdError, Status, TransactionId};
use crate::transaction::TransactionError;

/// Result type for dispatcher operations.
pub type OperationResult<T> = Result<T, OperationError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// Bad or missing credentials/configuration; aborts the batch.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Bad request parameters; never reaches the network.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// Unknown resource, operation or format value.
    #[error("unsupported {field} '{value}'")]
    UnsupportedOperation { field: &'static str, value: String },

    /// Transport-level failure during submission.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The ledger returned an explicit failure status.
    #[error("transaction {transaction_id} rejected by network: {status}")]
    RejectedByNetwork {
        status: Status,
        transaction_id: TransactionId,
    },

    /// No receipt within the deadline; the transaction may still succeed.
    #[error("transaction {transaction_id} not confirmed within {waited_secs}s; query its receipt before resubmitting")]
    TimedOut {
        transaction_id: TransactionId,
        waited_secs: u64,
    },

    /// The batch was cancelled before this item was dispatched.
    #[error("cancelled before dispatch")]
    Cancelled,
}

impl OperationError {
    /// Stable taxonomy name for result records.
    pub fn kind(&self) -> &'static str {
        match self {
            OperationError::Configuration(_) => "ConfigurationError",
            OperationError::Validation(_) => "ValidationError",
            OperationError::MalformedKey(_) => "MalformedKeyError",
            OperationError::MalformedTransaction(_) => "MalformedTransactionError",
            OperationError::UnsupportedOperation { .. } => "UnsupportedOperationError",
            OperationError::NetworkFailure(_) => "NetworkFailure",
            OperationError::RejectedByNetwork { .. } => "RejectedByNetwork",
            OperationError::TimedOut { .. } => "TimedOut",
            OperationError::Cancelled => "Cancelled",
        }
    }

    /// Whether this error aborts the batch regardless of failure mode.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OperationError::Configuration(_))
    }

    /// The transaction this error concerns, when one was built.
    pub fn transaction_id(&self) -> Option<TransactionId> {
        match self {
            OperationError::RejectedByNetwork { transaction_id, .. }
            | OperationError::TimedOut { transaction_id, .. } => Some(*transaction_id),
            _ => None,
        }
    }

    pub fn unsupported(field: &'static str, value: impl Into<String>) -> Self {
        OperationError::UnsupportedOperation {
            field,
            value: value.into(),
        }
    }
}

impl From<ConfigError> for OperationError {
    fn from(err: ConfigError) -> Self {
        OperationError::Configuration(err.to_string())
    }
}

impl From<KeyError> for OperationError {
    fn from(err: KeyError) -> Self {
        OperationError::MalformedKey(err.to_string())
    }
}

impl From<CodecError> for OperationError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::UnsupportedFormat(value) => {
                OperationError::unsupported("transactionFormat", value)
            }
            other => OperationError::MalformedTransaction(other.to_string()),
        }
    }
}

impl From<TransactionError> for OperationError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Signing(message) => OperationError::MalformedKey(message),
            other => OperationError::Validation(other.to_string()),
        }
    }
}

impl From<AmountError> for OperationError {
    fn from(err: AmountError) -> Self {
        OperationError::Validation(err.to_string())
    }
}

impl From<IdError> for OperationError {
    fn from(err: IdError) -> Self {
        OperationError::Validation(err.to_string())
    }
}

impl From<TransportError> for OperationError {
    fn from(err: TransportError) -> Self {
        OperationError::NetworkFailure(err.to_string())
    }
}

impl From<SubmissionError> for OperationError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Unsigned => {
                OperationError::Validation("transaction carries no signatures".into())
            }
            SubmissionError::Codec(e) => e.into(),
            SubmissionError::Transport(e) => e.into(),
            e @ SubmissionError::InvalidTransition { .. } => {
                OperationError::NetworkFailure(e.to_string())
            }
        }
    }
}
