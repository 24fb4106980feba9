//! Operation dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request record (JSON)
//!     → request.rs (resource/operation → OperationRequest, payload normalized)
//!     → dispatcher.rs (handler sequence: build | decode → sign → submit)
//!     → output.rs (success record, or {error, errorKind, transactionId?})
//!
//! Batch:
//!     records → ordered buffered stream (concurrency N)
//!             → one result per record, input order preserved
//! ```
//!
//! # Design Decisions
//! - Per-item failures are isolated by default; fail-fast is opt-in
//! - The operator key and transport are shared read-only across items
//! - Cancellation stops dispatch; in-flight submissions run to completion

pub mod dispatcher;
pub mod output;
pub mod request;

pub use dispatcher::{BatchAborted, BatchOptions, Dispatcher, FailureMode};
pub use output::{render, ErrorRecord, ItemResult, OperationOutput, SecretPolicy};
pub use request::{OperationRequest, Resource, TransactionPayload};
