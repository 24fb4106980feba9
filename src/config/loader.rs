//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file values.
pub const ENV_ACCOUNT_ID: &str = "HEDERA_ACCOUNT_ID";
pub const ENV_PRIVATE_KEY: &str = "HEDERA_PRIVATE_KEY";
pub const ENV_NETWORK: &str = "HEDERA_NETWORK";
pub const ENV_GATEWAY_URL: &str = "HEDERA_GATEWAY_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid environment override {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("invalid credentials: {0}")]
    Credentials(String),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply the
/// environment overrides.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = load_config_from_str(&content, |var| std::env::var(var).ok())?;
    tracing::info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Configuration from defaults plus environment only.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    load_config_from_str("", |var| std::env::var(var).ok())
}

/// Parse, override and validate. `lookup` resolves environment variables.
pub fn load_config_from_str<F>(content: &str, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: AppConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `HEDERA_*` overrides on top of file values.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

    if let Some(account_id) = lookup(ENV_ACCOUNT_ID) {
        config.operator.account_id = Some(account_id);
    }
    if let Some(private_key) = lookup(ENV_PRIVATE_KEY) {
        config.operator.private_key = Some(private_key);
    }
    if let Some(network) = lookup(ENV_NETWORK) {
        config.operator.network = network.parse().map_err(|e: crate::ledger::types::IdError| {
            ConfigError::Env {
                var: ENV_NETWORK,
                message: e.to_string(),
            }
        })?;
    }
    if let Some(url) = lookup(ENV_GATEWAY_URL) {
        config.gateway.url = Some(url);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::Network;
    use std::collections::HashMap;
    use std::io::Write;

    const KEY: &str =
        "302e020100300506032b6570042204209d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[operator]\naccount_id = \"0.0.1001\"\nprivate_key = \"{KEY}\"\nnetwork = \"local\"\n\n[batch]\nfail_fast = true"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.operator.network, Network::Local);
        assert!(config.batch.fail_fast);
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Path::new("/nonexistent/hedera-ops.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_env_overrides_file() {
        let content = "[operator]\naccount_id = \"0.0.1001\"\nnetwork = \"testnet\"";
        let config = load_config_from_str(
            content,
            env(&[
                (ENV_ACCOUNT_ID, "0.0.2002"),
                (ENV_PRIVATE_KEY, KEY),
                (ENV_NETWORK, "mainnet"),
                (ENV_GATEWAY_URL, "http://localhost:5551"),
            ]),
        )
        .unwrap();
        assert_eq!(config.operator.account_id.as_deref(), Some("0.0.2002"));
        assert_eq!(config.operator.network, Network::Mainnet);
        assert_eq!(config.gateway.url.as_deref(), Some("http://localhost:5551"));
    }

    #[test]
    fn test_env_key_reaches_signer_through_config() {
        use crate::config::credentials::Credentials;

        let config = load_config_from_str(
            "[operator]\naccount_id = \"0.0.1001\"",
            env(&[(ENV_PRIVATE_KEY, KEY)]),
        )
        .unwrap();
        let keys = Credentials::from_config(&config.operator)
            .unwrap()
            .key_manager()
            .unwrap();
        assert_eq!(keys.operator_account().to_string(), "0.0.1001");

        match load_config_from_str("[operator]\naccount_id = \"0.0.1001\"", env(&[])) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "operator.private_key");
                assert_eq!(errors[0].message, "missing");
            }
            other => panic!("expected missing key, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_network_override() {
        let result = load_config_from_str("", env(&[(ENV_NETWORK, "devnet")]));
        assert!(matches!(result, Err(ConfigError::Env { var: ENV_NETWORK, .. })));
    }

    #[test]
    fn test_validation_errors_reported_together() {
        let result = load_config_from_str("[batch]\nconcurrency = 0", env(&[]));
        match result {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error() {
        let result = load_config_from_str("[operator\n", env(&[]));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
