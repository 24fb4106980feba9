//! Operator credentials as supplied by the host platform.
//!
//! # Security
//! - The private key is held in a [`SecretString`] and zeroized on drop
//! - Errors name the missing field, never its value

use serde_json::Value;

use crate::config::loader::ConfigError;
use crate::config::schema::OperatorConfig;
use crate::keys::{KeyManager, SecretString};
use crate::ledger::types::{AccountId, Network};

/// Validated operator credentials.
#[derive(Debug)]
pub struct Credentials {
    pub account_id: AccountId,
    pub private_key: SecretString,
    pub network: Network,
}

impl Credentials {
    /// From the `[operator]` config section.
    pub fn from_config(operator: &OperatorConfig) -> Result<Self, ConfigError> {
        let account_id = required(operator.account_id.as_deref(), "accountId")?
            .parse::<AccountId>()
            .map_err(|e| ConfigError::Credentials(e.to_string()))?;
        let private_key = required(operator.private_key.as_deref(), "privateKey")?;
        Ok(Self {
            account_id,
            private_key: SecretString::new(private_key.to_string()),
            network: operator.network,
        })
    }

    /// From the host credential object `{accountId, privateKey, network}`.
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        let field = |name: &str| value.get(name).and_then(Value::as_str);

        let account_id = required(field("accountId"), "accountId")?
            .parse::<AccountId>()
            .map_err(|e| ConfigError::Credentials(e.to_string()))?;
        let private_key = required(field("privateKey"), "privateKey")?;
        let network = match field("network") {
            Some(raw) => raw
                .parse::<Network>()
                .map_err(|e| ConfigError::Credentials(e.to_string()))?,
            None => Network::default(),
        };

        Ok(Self {
            account_id,
            private_key: SecretString::new(private_key.to_string()),
            network,
        })
    }

    /// Parse the key and build the signing manager.
    pub fn key_manager(&self) -> Result<KeyManager, ConfigError> {
        KeyManager::from_credentials(self.account_id, self.private_key.expose())
            .map_err(|e| ConfigError::Credentials(format!("privateKey: {e}")))
    }

    /// Copy into a config section, e.g. to run a batch with host credentials.
    pub fn to_operator_config(&self) -> OperatorConfig {
        OperatorConfig {
            account_id: Some(self.account_id.to_string()),
            private_key: Some(self.private_key.expose().to_string()),
            network: self.network,
        }
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Credentials(format!("missing {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str =
        "302e020100300506032b6570042204209d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    #[test]
    fn test_from_json() {
        let credentials = Credentials::from_json(&json!({
            "accountId": "0.0.1001",
            "privateKey": KEY,
            "network": "testnet"
        }))
        .unwrap();
        assert_eq!(credentials.account_id, AccountId::new(0, 0, 1001));
        assert_eq!(credentials.network, Network::Testnet);
        assert_eq!(
            credentials.key_manager().unwrap().operator_account(),
            AccountId::new(0, 0, 1001)
        );
        assert!(!format!("{credentials:?}").contains(KEY));
    }

    #[test]
    fn test_missing_fields_fail_fast() {
        let err = Credentials::from_json(&json!({"privateKey": KEY})).unwrap_err();
        assert!(err.to_string().contains("accountId"));

        let err = Credentials::from_json(&json!({"accountId": "0.0.1001", "privateKey": "  "}))
            .unwrap_err();
        assert!(err.to_string().contains("privateKey"));
    }

    #[test]
    fn test_bad_network() {
        let err = Credentials::from_json(&json!({
            "accountId": "0.0.1001",
            "privateKey": KEY,
            "network": "devnet"
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Credentials(_)));
    }
}
