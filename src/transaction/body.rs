//! Transaction bodies: the unsigned, typed payload that gets signed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::keys::PublicKey;
use crate::ledger::amount::Hbar;
use crate::ledger::types::{AccountId, TransactionId};
use crate::transaction::TransactionError;

/// Longest memo the ledger accepts, in bytes.
pub const MAX_MEMO_BYTES: usize = 100;

/// Longest validity window the ledger accepts.
pub const MAX_VALID_DURATION_SECS: u64 = 180;

/// One leg of a transfer: a signed amount debited (negative) or credited
/// (positive) to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAmount {
    pub account_id: AccountId,
    pub amount: Hbar,
}

/// A zero-sum list of transfer legs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AccountAmount>", into = "Vec<AccountAmount>")]
pub struct TransferList(Vec<AccountAmount>);

impl TransferList {
    /// Validate legs: at least two, no zero amounts, no repeated account,
    /// and the signed amounts sum to exactly zero.
    pub fn new(legs: Vec<AccountAmount>) -> Result<Self, TransactionError> {
        if legs.len() < 2 {
            return Err(TransactionError::InvalidTransferList(
                "a transfer needs at least two accounts".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(legs.len());
        let mut sum: i128 = 0;
        for leg in &legs {
            if leg.amount == Hbar::ZERO {
                return Err(TransactionError::InvalidTransferList(format!(
                    "zero amount for account {}",
                    leg.account_id
                )));
            }
            if !seen.insert(leg.account_id) {
                return Err(TransactionError::InvalidTransferList(format!(
                    "account {} appears more than once",
                    leg.account_id
                )));
            }
            sum += i128::from(leg.amount.tinybars());
        }

        if sum != 0 {
            return Err(TransactionError::NotZeroSum(sum));
        }
        Ok(Self(legs))
    }

    /// Debit `amount` from `sender` and credit it to `recipient`.
    pub fn two_party(
        sender: AccountId,
        recipient: AccountId,
        amount: Hbar,
    ) -> Result<Self, TransactionError> {
        if !amount.is_positive() {
            return Err(TransactionError::NonPositiveAmount(amount.to_string()));
        }
        if sender == recipient {
            return Err(TransactionError::SelfTransfer(sender.to_string()));
        }
        let debit = amount
            .checked_neg()
            .ok_or_else(|| TransactionError::NonPositiveAmount(amount.to_string()))?;
        Self::new(vec![
            AccountAmount { account_id: sender, amount: debit },
            AccountAmount { account_id: recipient, amount },
        ])
    }

    pub fn legs(&self) -> &[AccountAmount] {
        &self.0
    }

    /// Sum of all signed amounts; zero for every constructed list.
    pub fn net(&self) -> i128 {
        self.0.iter().map(|leg| i128::from(leg.amount.tinybars())).sum()
    }

    /// Accounts whose balance decreases and therefore must sign.
    pub fn debited_accounts(&self) -> impl Iterator<Item = AccountId> + '_ {
        self.0
            .iter()
            .filter(|leg| leg.amount.is_negative())
            .map(|leg| leg.account_id)
    }
}

impl TryFrom<Vec<AccountAmount>> for TransferList {
    type Error = TransactionError;

    fn try_from(legs: Vec<AccountAmount>) -> Result<Self, Self::Error> {
        Self::new(legs)
    }
}

impl From<TransferList> for Vec<AccountAmount> {
    fn from(list: TransferList) -> Self {
        list.0
    }
}

/// Typed transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionData {
    AccountCreate {
        key: PublicKey,
        initial_balance: Hbar,
        memo: String,
    },
    CryptoTransfer {
        transfers: TransferList,
    },
}

impl TransactionData {
    pub fn kind(&self) -> &'static str {
        match self {
            TransactionData::AccountCreate { .. } => "account_create",
            TransactionData::CryptoTransfer { .. } => "crypto_transfer",
        }
    }
}

/// An unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    pub transaction_id: TransactionId,
    pub node_account_id: AccountId,
    pub max_transaction_fee: Hbar,
    pub valid_duration_secs: u64,
    pub memo: String,
    pub data: TransactionData,
}

impl TransactionBody {
    /// Semantic checks shared by the builder and the decoder.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if !self.max_transaction_fee.is_positive() {
            return Err(TransactionError::InvalidField(
                "max transaction fee must be positive".into(),
            ));
        }
        if self.valid_duration_secs == 0 || self.valid_duration_secs > MAX_VALID_DURATION_SECS {
            return Err(TransactionError::InvalidField(format!(
                "valid duration must be 1..={MAX_VALID_DURATION_SECS} seconds"
            )));
        }
        if self.memo.len() > MAX_MEMO_BYTES {
            return Err(TransactionError::InvalidField(format!(
                "memo longer than {MAX_MEMO_BYTES} bytes"
            )));
        }
        match &self.data {
            TransactionData::AccountCreate { initial_balance, memo, .. } => {
                if initial_balance.is_negative() {
                    return Err(TransactionError::NegativeInitialBalance(
                        initial_balance.to_string(),
                    ));
                }
                if memo.len() > MAX_MEMO_BYTES {
                    return Err(TransactionError::InvalidField(format!(
                        "account memo longer than {MAX_MEMO_BYTES} bytes"
                    )));
                }
            }
            TransactionData::CryptoTransfer { transfers } => {
                if transfers.net() != 0 {
                    return Err(TransactionError::NotZeroSum(transfers.net()));
                }
            }
        }
        Ok(())
    }

    /// The paying account.
    pub fn payer(&self) -> AccountId {
        self.transaction_id.account_id
    }
}
