//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → HEDERA_* environment overrides
//!     → validation.rs (semantic checks, all errors at once)
//!     → AppConfig (validated, immutable)
//!     → credentials.rs (operator account + secret key)
//!     → Dispatcher
//!
//! Host-supplied credential object {accountId, privateKey, network}
//!     → credentials.rs from_json → same path
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Credential problems abort before any request is processed

pub mod credentials;
pub mod loader;
pub mod schema;
pub mod validation;

pub use credentials::Credentials;
pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, BatchConfig, GatewayConfig, ObservabilityConfig, OperatorConfig, OutputConfig,
    SubmissionConfig, TransactionConfig,
};
pub use validation::{validate_config, ValidationError};
