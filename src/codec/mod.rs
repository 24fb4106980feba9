//! Transaction codec subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound (host → core):
//!     base64 string | {"type":"Buffer","data":[..]}
//!     → format.rs (normalize to one canonical byte sequence)
//!     → wire.rs decode (magic, version, bincode envelope, semantic checks)
//!     → Transaction (unsigned or signed)
//!
//! Outbound (core → host / network):
//!     Transaction → wire.rs encode → bytes → format.rs to_base64
//! ```
//!
//! # Design Decisions
//! - Only the boundary knows about external formats; everything past
//!   `format::normalize` sees plain bytes
//! - Encoding is canonical, so re-encoding a decoded body reproduces the
//!   exact bytes that were signed
//! - Independent of transport

pub mod format;
pub mod wire;

use thiserror::Error;

pub use format::TransactionFormat;
pub use wire::{decode, encode, encode_body, transaction_hash};

/// Errors raised while decoding or encoding transactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("transaction bytes truncated ({0} bytes)")]
    Truncated(usize),

    #[error("not a transaction envelope (bad magic)")]
    BadMagic,

    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    #[error("structurally invalid transaction: {0}")]
    Structure(String),

    #[error("invalid transaction: {0}")]
    Invalid(String),

    #[error("transaction exceeds {0} bytes")]
    Oversize(usize),

    #[error("invalid base64 payload: {0}")]
    Base64(String),

    #[error("invalid buffer object payload: {0}")]
    BufferObject(String),

    #[error("unsupported transaction format '{0}': expected base64 or bufferObject")]
    UnsupportedFormat(String),
}
