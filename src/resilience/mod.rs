//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Submission client:
//!     precheck BUSY → backoff.rs delay → resubmit (bounded attempts)
//!     receipt pending → backoff.rs delay → poll again (bounded by deadline)
//! ```
//!
//! # Design Decisions
//! - Every wait is bounded; nothing polls forever
//! - Only resubmissions the ledger never accepted are retried
//! - Jittered delays avoid synchronized polling from concurrent items

pub mod backoff;

pub use backoff::{calculate_backoff, BackoffPolicy};
