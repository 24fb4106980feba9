//! Ledger model and submission subsystem.
//!
//! # Data Flow
//! ```text
//! SignedTransaction
//!     → submission.rs (state machine, BUSY retry, receipt polling)
//!     → transport.rs LedgerTransport
//!         → HttpTransport (JSON gateway over reqwest)
//!         → MemoryLedger (in-process simulation)
//!     → SubmissionResult {transaction id, node, hash, outcome}
//! ```
//!
//! # Design Decisions
//! - Identity, amount and status types live here and are shared by every
//!   other subsystem
//! - The network is a black box behind one async trait
//! - Every wait is bounded by the receipt deadline

pub mod amount;
pub mod memory;
pub mod nodes;
pub mod submission;
pub mod transport;
pub mod types;

pub use amount::{AmountError, Hbar};
pub use memory::MemoryLedger;
pub use nodes::NodeSelector;
pub use submission::{
    FailureStage, SubmissionClient, SubmissionError, SubmissionOutcome, SubmissionResult,
    SubmissionSettings, SubmissionState,
};
pub use transport::{HttpTransport, LedgerTransport, TransportError};
pub use types::{AccountId, IdError, Network, Receipt, Status, TransactionId};
