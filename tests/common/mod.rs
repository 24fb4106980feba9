//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use hedera_ops::codec::{self, format::to_base64};
use hedera_ops::config::AppConfig;
use hedera_ops::keys::{KeyManager, PrivateKey};
use hedera_ops::ledger::{AccountId, Hbar, MemoryLedger, Network, NodeSelector};
use hedera_ops::transaction::{Transaction, TransactionDefaults, TxBuilder};
use hedera_ops::Dispatcher;

/// ED25519 operator key (RFC 8032 test vector 1, DER encoded).
pub const OPERATOR_KEY: &str =
    "302e020100300506032b6570042204209d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

pub const OPERATOR: AccountId = AccountId::new(0, 0, 1001);

pub const RECIPIENT: AccountId = AccountId::new(0, 0, 2002);

/// Valid operator configuration with fast receipt polling.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.operator.account_id = Some(OPERATOR.to_string());
    config.operator.private_key = Some(OPERATOR_KEY.to_string());
    config.operator.network = Network::Local;
    config.submission.receipt_timeout_secs = 5;
    config.submission.poll_base_ms = 10;
    config.submission.poll_max_ms = 100;
    config
}

pub fn operator_keys() -> KeyManager {
    KeyManager::from_credentials(OPERATOR, OPERATOR_KEY).unwrap()
}

/// Simulated ledger holding the operator and a recipient account.
pub fn funded_ledger(operator_balance: Hbar) -> Arc<MemoryLedger> {
    let recipient_key = KeyManager::generate_key_pair(Default::default())
        .public_key()
        .clone();
    Arc::new(
        MemoryLedger::new(Network::Local)
            .with_account(OPERATOR, operator_keys().operator_public_key(), operator_balance)
            .with_account(RECIPIENT, recipient_key, Hbar::ZERO),
    )
}

pub fn dispatcher_with(config: &AppConfig, ledger: Arc<MemoryLedger>) -> Dispatcher {
    Dispatcher::new(config, ledger).unwrap()
}

pub fn dispatcher(ledger: Arc<MemoryLedger>) -> Dispatcher {
    dispatcher_with(&test_config(), ledger)
}

/// Builder producing transactions paid by the operator.
pub fn builder() -> TxBuilder {
    TxBuilder::new(
        OPERATOR,
        Arc::new(NodeSelector::for_network(Network::Local)),
        TransactionDefaults::default(),
    )
}

/// Base64 of an unsigned operator-to-recipient transfer.
pub fn unsigned_transfer_b64(amount: Hbar) -> String {
    let body = builder().build_transfer(OPERATOR, RECIPIENT, amount).unwrap();
    to_base64(&codec::encode(&Transaction::Unsigned(body)).unwrap())
}

/// Base64 of the same transfer signed with `key`.
pub fn signed_transfer_b64(amount: Hbar, key: &PrivateKey) -> String {
    let body = builder().build_transfer(OPERATOR, RECIPIENT, amount).unwrap();
    let signed = Transaction::Unsigned(body).sign_with_key(key).unwrap();
    to_base64(&codec::encode(&Transaction::Signed(signed)).unwrap())
}
