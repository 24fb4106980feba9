//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Cancellation (shutdown.rs):
//!     trigger → dispatcher stops taking new items
//!             → in-flight submissions run to a terminal state
//!             → undispatched items reported as Cancelled
//!
//! Signals (signals.rs):
//!     SIGINT / SIGTERM → Shutdown::trigger
//! ```
//!
//! # Design Decisions
//! - Cancellation never aborts a submission already sent to the ledger;
//!   ledger submissions cannot be revoked locally
//! - A second signal is not needed: in-flight work is bounded by the
//!   receipt deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
