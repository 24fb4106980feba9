//! Transaction builder for the supported operations.
//!
//! # Responsibilities
//! - Assign transaction identity (payer + valid start) and target node
//! - Apply fee, validity window and memo defaults
//! - Validate operation fields before anything is signed

use std::sync::Arc;

use crate::keys::PublicKey;
use crate::ledger::amount::Hbar;
use crate::ledger::nodes::NodeSelector;
use crate::ledger::types::{AccountId, TransactionId};
use crate::transaction::body::{AccountAmount, TransactionBody, TransactionData, TransferList};
use crate::transaction::TransactionError;

/// Per-transaction defaults applied by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDefaults {
    pub max_transaction_fee: Hbar,
    pub valid_duration_secs: u64,
    pub memo: String,
}

impl Default for TransactionDefaults {
    fn default() -> Self {
        Self {
            max_transaction_fee: Hbar::from_hbar(2),
            valid_duration_secs: 120,
            memo: String::new(),
        }
    }
}

/// Builds unsigned transactions paid for by the operator account.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    payer: AccountId,
    nodes: Arc<NodeSelector>,
    defaults: TransactionDefaults,
}

impl TxBuilder {
    pub fn new(payer: AccountId, nodes: Arc<NodeSelector>, defaults: TransactionDefaults) -> Self {
        Self {
            payer,
            nodes,
            defaults,
        }
    }

    /// Build an account creation with `key` as the new account's key.
    pub fn build_account_create(
        &self,
        key: PublicKey,
        initial_balance: Hbar,
    ) -> Result<TransactionBody, TransactionError> {
        if initial_balance.is_negative() {
            return Err(TransactionError::NegativeInitialBalance(
                initial_balance.to_string(),
            ));
        }
        self.body(TransactionData::AccountCreate {
            key,
            initial_balance,
            memo: String::new(),
        })
    }

    /// Build a transfer of `amount` from `sender` to `recipient`.
    pub fn build_transfer(
        &self,
        sender: AccountId,
        recipient: AccountId,
        amount: Hbar,
    ) -> Result<TransactionBody, TransactionError> {
        let transfers = TransferList::two_party(sender, recipient, amount)?;
        self.body(TransactionData::CryptoTransfer { transfers })
    }

    /// Build a transfer between any number of accounts.
    pub fn build_multi_party_transfer(
        &self,
        legs: Vec<(AccountId, Hbar)>,
    ) -> Result<TransactionBody, TransactionError> {
        let legs = legs
            .into_iter()
            .map(|(account_id, amount)| AccountAmount { account_id, amount })
            .collect();
        let transfers = TransferList::new(legs)?;
        self.body(TransactionData::CryptoTransfer { transfers })
    }

    pub fn payer(&self) -> AccountId {
        self.payer
    }

    fn body(&self, data: TransactionData) -> Result<TransactionBody, TransactionError> {
        let node_account_id = self
            .nodes
            .next_node()
            .ok_or_else(|| TransactionError::InvalidField("no node accounts configured".into()))?;

        let body = TransactionBody {
            transaction_id: TransactionId::generate(self.payer),
            node_account_id,
            max_transaction_fee: self.defaults.max_transaction_fee,
            valid_duration_secs: self.defaults.valid_duration_secs,
            memo: self.defaults.memo.clone(),
            data,
        };
        body.validate()?;

        tracing::debug!(
            transaction_id = %body.transaction_id,
            node = %body.node_account_id,
            kind = body.data.kind(),
            "Built transaction"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyAlgorithm, KeyManager};
    use crate::ledger::types::Network;

    fn builder() -> TxBuilder {
        TxBuilder::new(
            AccountId::new(0, 0, 1001),
            Arc::new(NodeSelector::for_network(Network::Testnet)),
            TransactionDefaults::default(),
        )
    }

    #[test]
    fn test_build_account_create() {
        let pair = KeyManager::generate_key_pair(KeyAlgorithm::Ed25519);
        let body = builder()
            .build_account_create(pair.public_key().clone(), Hbar::from_hbar(5))
            .unwrap();
        assert_eq!(body.payer(), AccountId::new(0, 0, 1001));
        assert_eq!(body.node_account_id, AccountId::new(0, 0, 3));
        assert!(matches!(body.data, TransactionData::AccountCreate { .. }));
    }

    #[test]
    fn test_zero_initial_balance_allowed() {
        let pair = KeyManager::generate_key_pair(KeyAlgorithm::Ed25519);
        assert!(builder()
            .build_account_create(pair.public_key().clone(), Hbar::ZERO)
            .is_ok());
    }

    #[test]
    fn test_negative_initial_balance_rejected() {
        let pair = KeyManager::generate_key_pair(KeyAlgorithm::Ed25519);
        let result =
            builder().build_account_create(pair.public_key().clone(), Hbar::from_tinybars(-1));
        assert!(matches!(result, Err(TransactionError::NegativeInitialBalance(_))));
    }

    #[test]
    fn test_build_transfer_zero_sum() {
        let body = builder()
            .build_transfer(
                AccountId::new(0, 0, 1001),
                AccountId::new(0, 0, 2002),
                Hbar::from_tinybars(150_000_000),
            )
            .unwrap();
        match body.data {
            TransactionData::CryptoTransfer { transfers } => assert_eq!(transfers.net(), 0),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_build_transfer_rejects_bad_fields() {
        let b = builder();
        let me = AccountId::new(0, 0, 1001);
        assert!(b.build_transfer(me, AccountId::new(0, 0, 2), Hbar::ZERO).is_err());
        assert!(b.build_transfer(me, me, Hbar::from_hbar(1)).is_err());
    }

    #[test]
    fn test_nodes_rotate() {
        let b = builder();
        let first = b
            .build_transfer(AccountId::new(0, 0, 1), AccountId::new(0, 0, 2), Hbar::from_hbar(1))
            .unwrap();
        let second = b
            .build_transfer(AccountId::new(0, 0, 1), AccountId::new(0, 0, 2), Hbar::from_hbar(1))
            .unwrap();
        assert_ne!(first.node_account_id, second.node_account_id);
    }

    #[test]
    fn test_multi_party_transfer() {
        let body = builder()
            .build_multi_party_transfer(vec![
                (AccountId::new(0, 0, 1), Hbar::from_tinybars(-3)),
                (AccountId::new(0, 0, 2), Hbar::from_tinybars(1)),
                (AccountId::new(0, 0, 3), Hbar::from_tinybars(2)),
            ])
            .unwrap();
        assert_eq!(body.data.kind(), "crypto_transfer");
    }
}
