//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events, batch span with batch_id)
//!     → metrics.rs (counters and histograms via the metrics facade)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → whatever metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Logs go to stderr so stdout carries only result records
//! - Secrets never reach a log field
//! - No metrics exporter is installed by the library

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
