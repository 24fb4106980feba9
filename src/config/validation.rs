//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check credentials are present and parse
//! - Validate value ranges (timeouts > 0, fee > 0, validity window)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Messages never echo the private key

use std::fmt;

use crate::config::schema::AppConfig;
use crate::keys::PrivateKey;
use crate::ledger::amount::Hbar;
use crate::ledger::types::AccountId;
use crate::transaction::body::{MAX_MEMO_BYTES, MAX_VALID_DURATION_SECS};

/// Upper bound on concurrently processed items.
pub const MAX_CONCURRENCY: usize = 64;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    /// Missing or unparseable operator credentials.
    pub fn is_credential(&self) -> bool {
        self.field.starts_with("operator.")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.operator.account_id.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::new("operator.account_id", "missing")),
        Some(raw) => {
            if let Err(e) = raw.parse::<AccountId>() {
                errors.push(ValidationError::new("operator.account_id", e.to_string()));
            }
        }
    }

    match config.operator.private_key.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::new("operator.private_key", "missing")),
        Some(raw) => {
            if let Err(e) = raw.parse::<PrivateKey>() {
                errors.push(ValidationError::new("operator.private_key", e.to_string()));
            }
        }
    }

    if let Some(url) = &config.gateway.url {
        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => errors.push(ValidationError::new(
                "gateway.url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("gateway.url", e.to_string())),
        }
    }
    if config.gateway.request_timeout_secs == 0 {
        errors.push(ValidationError::new("gateway.request_timeout_secs", "must be > 0"));
    }

    let submission = &config.submission;
    if submission.receipt_timeout_secs == 0 {
        errors.push(ValidationError::new("submission.receipt_timeout_secs", "must be > 0"));
    }
    if submission.poll_base_ms == 0 {
        errors.push(ValidationError::new("submission.poll_base_ms", "must be > 0"));
    }
    if submission.poll_max_ms < submission.poll_base_ms {
        errors.push(ValidationError::new(
            "submission.poll_max_ms",
            "must not be below poll_base_ms",
        ));
    }

    match Hbar::from_decimal_str(&config.transaction.max_fee) {
        Ok(fee) if fee.is_positive() => {}
        Ok(_) => errors.push(ValidationError::new("transaction.max_fee", "must be > 0")),
        Err(e) => errors.push(ValidationError::new("transaction.max_fee", e.to_string())),
    }
    let duration = config.transaction.valid_duration_secs;
    if duration == 0 || duration > MAX_VALID_DURATION_SECS {
        errors.push(ValidationError::new(
            "transaction.valid_duration_secs",
            format!("must be within 1..={MAX_VALID_DURATION_SECS}"),
        ));
    }
    if config.transaction.memo.len() > MAX_MEMO_BYTES {
        errors.push(ValidationError::new(
            "transaction.memo",
            format!("longer than {MAX_MEMO_BYTES} bytes"),
        ));
    }

    if config.batch.concurrency == 0 || config.batch.concurrency > MAX_CONCURRENCY {
        errors.push(ValidationError::new(
            "batch.concurrency",
            format!("must be within 1..={MAX_CONCURRENCY}"),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str =
        "302e020100300506032b6570042204209d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.operator.account_id = Some("0.0.1001".into());
        config.operator.private_key = Some(KEY.into());
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_missing_credentials() {
        let errors = validate_config(&AppConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(ValidationError::is_credential));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.submission.receipt_timeout_secs = 0;
        config.transaction.max_fee = "0.000000001".into();
        config.transaction.valid_duration_secs = 500;
        config.batch.concurrency = 0;
        config.gateway.url = Some("ftp://example.com".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "gateway.url",
                "submission.receipt_timeout_secs",
                "transaction.max_fee",
                "transaction.valid_duration_secs",
                "batch.concurrency",
            ]
        );
    }

    #[test]
    fn test_bad_key_not_echoed() {
        let mut config = valid();
        config.operator.private_key = Some("deadbeefnotakey".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "operator.private_key");
        assert!(!errors[0].to_string().contains("deadbeefnotakey"));
    }
}
