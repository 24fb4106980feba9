//! Ledger identity types, status codes and network selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors raised when parsing ledger identifiers from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Account identity is not a `shard.realm.num` triple.
    #[error("invalid account id '{0}': expected shard.realm.num")]
    Account(String),

    /// Transaction identity is not `account@seconds.nanos`.
    #[error("invalid transaction id '{0}': expected shard.realm.num@seconds.nanos")]
    Transaction(String),

    /// Network name is not one of the supported networks.
    #[error("unsupported network '{0}': expected mainnet, testnet, previewnet or local")]
    Network(String),
}

/// A ledger account identity (`shard.realm.num`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl AccountId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for AccountId {
    type Err = IdError;

    /// Lexical validation only: exactly three dot separated non-negative integers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IdError::Account(s.to_string());
        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u64, IdError> {
            let part = parts.next().ok_or_else(err)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            part.parse().map_err(|_| err())
        };
        let id = AccountId::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(id)
    }
}

/// Transaction identity: the paying account plus the valid-start timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    pub account_id: AccountId,
    pub valid_start_secs: i64,
    pub valid_start_nanos: u32,
}

impl TransactionId {
    /// Generate an identity for `payer` starting now.
    ///
    /// Valid starts are strictly increasing within the process, so builds
    /// landing on the same clock reading still get distinct identities.
    pub fn generate(payer: AccountId) -> Self {
        static LAST_START_NANOS: AtomicU64 = AtomicU64::new(0);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        let previous = LAST_START_NANOS
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        let start = now.max(previous + 1);

        Self {
            account_id: payer,
            valid_start_secs: (start / 1_000_000_000) as i64,
            valid_start_nanos: (start % 1_000_000_000) as u32,
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.account_id, self.valid_start_secs, self.valid_start_nanos
        )
    }
}

impl FromStr for TransactionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IdError::Transaction(s.to_string());
        let (account, start) = s.trim().split_once('@').ok_or_else(err)?;
        let account_id: AccountId = account.parse().map_err(|_| err())?;
        let (secs, nanos) = start.split_once('.').ok_or_else(err)?;
        if nanos.is_empty() || nanos.len() > 9 || !nanos.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let valid_start_secs: i64 = secs.parse().map_err(|_| err())?;
        // "5" after the dot means 5 nanoseconds, not half a second.
        let valid_start_nanos: u32 = nanos.parse().map_err(|_| err())?;
        if valid_start_secs < 0 {
            return Err(err());
        }
        Ok(Self {
            account_id,
            valid_start_secs,
            valid_start_nanos,
        })
    }
}

/// Ledger response codes surfaced by precheck and receipts.
///
/// Codes this crate does not name are kept verbatim in [`Status::Other`]
/// so a failure is never lost or mistaken for a pending receipt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Ok,
    Success,
    /// Consensus not reached yet; receipts in this state are not final.
    Unknown,
    Busy,
    ReceiptNotFound,
    DuplicateTransaction,
    InsufficientAccountBalance,
    InsufficientPayerBalance,
    InsufficientTxFee,
    InvalidSignature,
    InvalidAccountId,
    InvalidNodeAccount,
    InvalidTransactionStart,
    InvalidTransactionDuration,
    TransactionExpired,
    PayerAccountNotFound,
    AccountDeleted,
    KeyRequired,
    MemoTooLong,
    InvalidAccountAmounts,
    AccountRepeatedInAccountAmounts,
    InvalidInitialBalance,
    TransactionOversize,
    InvalidTransaction,
    /// Any other ledger code, e.g. `ACCOUNT_FROZEN_FOR_TOKEN`.
    Other(String),
}

impl Status {
    /// Final success of a receipt.
    pub fn is_success(&self) -> bool {
        *self == Status::Success
    }

    /// Whether a receipt with this status may still change.
    pub fn is_pending(&self) -> bool {
        matches!(self, Status::Unknown | Status::ReceiptNotFound | Status::Busy)
    }

    /// Stable wire name, e.g. `INSUFFICIENT_ACCOUNT_BALANCE`.
    pub fn as_str(&self) -> &str {
        match self {
            Status::Ok => "OK",
            Status::Success => "SUCCESS",
            Status::Unknown => "UNKNOWN",
            Status::Busy => "BUSY",
            Status::ReceiptNotFound => "RECEIPT_NOT_FOUND",
            Status::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            Status::InsufficientAccountBalance => "INSUFFICIENT_ACCOUNT_BALANCE",
            Status::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            Status::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            Status::InvalidSignature => "INVALID_SIGNATURE",
            Status::InvalidAccountId => "INVALID_ACCOUNT_ID",
            Status::InvalidNodeAccount => "INVALID_NODE_ACCOUNT",
            Status::InvalidTransactionStart => "INVALID_TRANSACTION_START",
            Status::InvalidTransactionDuration => "INVALID_TRANSACTION_DURATION",
            Status::TransactionExpired => "TRANSACTION_EXPIRED",
            Status::PayerAccountNotFound => "PAYER_ACCOUNT_NOT_FOUND",
            Status::AccountDeleted => "ACCOUNT_DELETED",
            Status::KeyRequired => "KEY_REQUIRED",
            Status::MemoTooLong => "MEMO_TOO_LONG",
            Status::InvalidAccountAmounts => "INVALID_ACCOUNT_AMOUNTS",
            Status::AccountRepeatedInAccountAmounts => "ACCOUNT_REPEATED_IN_ACCOUNT_AMOUNTS",
            Status::InvalidInitialBalance => "INVALID_INITIAL_BALANCE",
            Status::TransactionOversize => "TRANSACTION_OVERSIZE",
            Status::InvalidTransaction => "INVALID_TRANSACTION",
            Status::Other(code) => code,
        }
    }
}

impl From<String> for Status {
    fn from(code: String) -> Self {
        match code.as_str() {
            "OK" => Status::Ok,
            "SUCCESS" => Status::Success,
            "UNKNOWN" => Status::Unknown,
            "BUSY" => Status::Busy,
            "RECEIPT_NOT_FOUND" => Status::ReceiptNotFound,
            "DUPLICATE_TRANSACTION" => Status::DuplicateTransaction,
            "INSUFFICIENT_ACCOUNT_BALANCE" => Status::InsufficientAccountBalance,
            "INSUFFICIENT_PAYER_BALANCE" => Status::InsufficientPayerBalance,
            "INSUFFICIENT_TX_FEE" => Status::InsufficientTxFee,
            "INVALID_SIGNATURE" => Status::InvalidSignature,
            "INVALID_ACCOUNT_ID" => Status::InvalidAccountId,
            "INVALID_NODE_ACCOUNT" => Status::InvalidNodeAccount,
            "INVALID_TRANSACTION_START" => Status::InvalidTransactionStart,
            "INVALID_TRANSACTION_DURATION" => Status::InvalidTransactionDuration,
            "TRANSACTION_EXPIRED" => Status::TransactionExpired,
            "PAYER_ACCOUNT_NOT_FOUND" => Status::PayerAccountNotFound,
            "ACCOUNT_DELETED" => Status::AccountDeleted,
            "KEY_REQUIRED" => Status::KeyRequired,
            "MEMO_TOO_LONG" => Status::MemoTooLong,
            "INVALID_ACCOUNT_AMOUNTS" => Status::InvalidAccountAmounts,
            "ACCOUNT_REPEATED_IN_ACCOUNT_AMOUNTS" => Status::AccountRepeatedInAccountAmounts,
            "INVALID_INITIAL_BALANCE" => Status::InvalidInitialBalance,
            "TRANSACTION_OVERSIZE" => Status::TransactionOversize,
            "INVALID_TRANSACTION" => Status::InvalidTransaction,
            _ => Status::Other(code),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger network the operator credentials belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Previewnet,
    /// A single-node local ledger (e.g. a development node).
    Local,
}

impl Network {
    /// Node accounts transactions may be addressed to.
    pub fn node_accounts(self) -> Vec<AccountId> {
        let last = match self {
            Network::Mainnet => 28,
            Network::Testnet => 9,
            Network::Previewnet => 6,
            Network::Local => 3,
        };
        (3..=last).map(|num| AccountId::new(0, 0, num)).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Previewnet => "previewnet",
            Network::Local => "local",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "previewnet" => Ok(Network::Previewnet),
            "local" | "localnet" => Ok(Network::Local),
            _ => Err(IdError::Network(s.to_string())),
        }
    }
}

/// Network-confirmed outcome of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: Status,
    /// Present only for account creation.
    pub account_id: Option<AccountId>,
}
