//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the adapter.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ledger::amount::{AmountError, Hbar};
use crate::ledger::submission::SubmissionSettings;
use crate::ledger::types::Network;
use crate::resilience::BackoffPolicy;
use crate::transaction::TransactionDefaults;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Operator credentials and network.
    pub operator: OperatorConfig,

    /// Ledger gateway endpoint.
    pub gateway: GatewayConfig,

    /// Submission deadlines and retry pacing.
    pub submission: SubmissionConfig,

    /// Defaults applied to every built transaction.
    pub transaction: TransactionConfig,

    /// Batch processing behavior.
    pub batch: BatchConfig,

    /// Result rendering.
    pub output: OutputConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Operator credentials.
///
/// # Security
/// `private_key` is never serialized back out and is redacted in `Debug`.
#[derive(Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct OperatorConfig {
    /// Paying account, `shard.realm.num`.
    pub account_id: Option<String>,

    /// Operator private key (DER or raw hex).
    #[serde(skip_serializing)]
    pub private_key: Option<String>,

    /// Network the operator account lives on.
    pub network: Network,
}

impl std::fmt::Debug for OperatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorConfig")
            .field("account_id", &self.account_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("network", &self.network)
            .finish()
    }
}

/// HTTP ledger gateway.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL; unset means no network transport is available.
    pub url: Option<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            request_timeout_secs: 10,
        }
    }
}

/// Submission client timing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Budget for the precheck phase, and again for the receipt wait once
    /// precheck returns `OK`.
    pub receipt_timeout_secs: u64,

    /// First receipt poll / BUSY retry delay.
    pub poll_base_ms: u64,

    /// Ceiling for the exponential delay.
    pub poll_max_ms: u64,

    /// Resubmissions after a BUSY precheck.
    pub max_busy_retries: u32,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            receipt_timeout_secs: 30,
            poll_base_ms: 250,
            poll_max_ms: 2000,
            max_busy_retries: 3,
        }
    }
}

impl SubmissionConfig {
    pub fn to_settings(&self) -> SubmissionSettings {
        SubmissionSettings {
            receipt_timeout: Duration::from_secs(self.receipt_timeout_secs),
            backoff: BackoffPolicy::from_millis(self.poll_base_ms, self.poll_max_ms),
            max_busy_retries: self.max_busy_retries,
        }
    }
}

/// Transaction defaults.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransactionConfig {
    /// Maximum fee the operator pays per transaction, decimal HBAR.
    pub max_fee: String,

    /// Validity window in seconds (at most 180).
    pub valid_duration_secs: u64,

    /// Memo attached to every transaction.
    pub memo: String,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_fee: "2".to_string(),
            valid_duration_secs: 120,
            memo: String::new(),
        }
    }
}

impl TransactionConfig {
    pub fn to_defaults(&self) -> Result<TransactionDefaults, AmountError> {
        Ok(TransactionDefaults {
            max_transaction_fee: Hbar::from_decimal_str(&self.max_fee)?,
            valid_duration_secs: self.valid_duration_secs,
            memo: self.memo.clone(),
        })
    }
}

/// Batch behavior.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct BatchConfig {
    /// Abort the batch on the first per-item error.
    pub fail_fast: bool,

    /// Items processed concurrently; results keep input order regardless.
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            concurrency: 1,
        }
    }
}

/// Result rendering.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Include freshly generated private keys in create results.
    pub reveal_secrets: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            reveal_secrets: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Emit JSON lines instead of human-readable logs.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.operator.network, Network::Testnet);
        assert_eq!(config.submission.receipt_timeout_secs, 30);
        assert_eq!(config.batch.concurrency, 1);
        assert!(!config.batch.fail_fast);
        assert!(config.output.reveal_secrets);
        assert_eq!(
            config.transaction.to_defaults().unwrap().max_transaction_fee,
            Hbar::from_hbar(2)
        );
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [operator]
            account_id = "0.0.1001"
            network = "previewnet"

            [submission]
            receipt_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.operator.network, Network::Previewnet);
        assert_eq!(config.submission.receipt_timeout_secs, 5);
        assert_eq!(config.submission.poll_base_ms, 250);
        assert_eq!(config.gateway.request_timeout_secs, 10);
    }

    #[test]
    fn test_private_key_redacted() {
        let mut config = AppConfig::default();
        config.operator.private_key = Some("302e0201".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("302e0201"));
        let serialized = toml::to_string(&config).unwrap();
        assert!(!serialized.contains("302e0201"));
    }
}
