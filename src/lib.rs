//! Hedera Account & Transaction Operations Library

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod transaction;

pub use config::schema::AppConfig;
pub use dispatch::{BatchAborted, BatchOptions, Dispatcher, FailureMode, SecretPolicy};
pub use error::{OperationError, OperationResult};
pub use lifecycle::Shutdown;
