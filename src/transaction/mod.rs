//! Transaction construction subsystem.
//!
//! # Data Flow
//! ```text
//! Validated request parameters
//!     → builder.rs (transaction id, node, fee, typed payload)
//!     → body.rs (TransactionBody, zero-sum TransferList)
//!     → signed.rs (attach signatures over the canonical body bytes)
//!     → codec (wire bytes) → submission
//! ```
//!
//! # Design Decisions
//! - Bodies are immutable once built; signing produces a new value
//! - Transfer lists enforce the zero-sum invariant at construction and
//!   again when decoded from the wire
//! - No network I/O in this subsystem

pub mod body;
pub mod builder;
pub mod signed;

use thiserror::Error;

pub use body::{AccountAmount, TransactionBody, TransactionData, TransferList};
pub use builder::{TransactionDefaults, TxBuilder};
pub use signed::{SignaturePair, SignedTransaction, Transaction};

/// Errors raised while constructing or validating a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("initial balance must not be negative, got {0}")]
    NegativeInitialBalance(String),

    #[error("transfer amount must be positive, got {0}")]
    NonPositiveAmount(String),

    #[error("sender and recipient are the same account ({0})")]
    SelfTransfer(String),

    #[error("transfer amounts must sum to zero, got {0} tinybars")]
    NotZeroSum(i128),

    #[error("invalid transfer list: {0}")]
    InvalidTransferList(String),

    #[error("invalid transaction field: {0}")]
    InvalidField(String),

    #[error("signing failed: {0}")]
    Signing(String),
}
