//! In-process simulated ledger.
//!
//! # Responsibilities
//! - Precheck submissions the way a node does (node, signatures, validity
//!   window, duplicates, payer funds)
//! - Execute account creations and transfers against in-memory balances
//! - Serve receipts after a configurable consensus delay
//! - Inject faults: BUSY prechecks and receipts that never appear
//!
//! Used by the CLI `--simulate` mode and by tests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

use crate::codec::{self, CodecError};
use crate::keys::PublicKey;
use crate::ledger::amount::Hbar;
use crate::ledger::transport::{LedgerTransport, TransportError};
use crate::ledger::types::{AccountId, Network, Receipt, Status, TransactionId};
use crate::transaction::{SignedTransaction, TransactionData};

/// Fee charged to the payer for every accepted transaction.
pub const SIMULATED_FEE: Hbar = Hbar::from_tinybars(100_000);

/// First account number handed out by account creation.
const FIRST_CREATED_ACCOUNT: u64 = 5000;

/// Allowed clock skew into the future for a valid-start timestamp.
const MAX_START_SKEW_SECS: i64 = 10;

#[derive(Debug, Clone)]
struct SimAccount {
    key: PublicKey,
    balance: Hbar,
}

#[derive(Debug, Clone)]
struct StoredReceipt {
    receipt: Receipt,
    ready_at: Instant,
    visible: bool,
}

/// A single-process stand-in for a ledger network.
#[derive(Debug)]
pub struct MemoryLedger {
    nodes: Vec<AccountId>,
    accounts: DashMap<AccountId, SimAccount>,
    receipts: DashMap<TransactionId, StoredReceipt>,
    next_account_num: AtomicU64,
    receipt_delay_ms: AtomicU64,
    busy_remaining: AtomicU32,
    black_hole: AtomicBool,
    submissions: AtomicUsize,
    /// Serializes state transitions spanning several accounts.
    execution: Mutex<()>,
}

impl MemoryLedger {
    pub fn new(network: Network) -> Self {
        Self {
            nodes: network.node_accounts(),
            accounts: DashMap::new(),
            receipts: DashMap::new(),
            next_account_num: AtomicU64::new(FIRST_CREATED_ACCOUNT),
            receipt_delay_ms: AtomicU64::new(0),
            busy_remaining: AtomicU32::new(0),
            black_hole: AtomicBool::new(false),
            submissions: AtomicUsize::new(0),
            execution: Mutex::new(()),
        }
    }

    /// Register an existing account.
    pub fn with_account(self, id: AccountId, key: PublicKey, balance: Hbar) -> Self {
        self.register_account(id, key, balance);
        self
    }

    pub fn register_account(&self, id: AccountId, key: PublicKey, balance: Hbar) {
        self.accounts.insert(id, SimAccount { key, balance });
    }

    /// Delay between acceptance and receipt availability.
    pub fn set_receipt_delay(&self, delay: Duration) {
        self.receipt_delay_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    /// Answer the next `count` submissions with `BUSY`.
    pub fn respond_busy(&self, count: u32) {
        self.busy_remaining.store(count, Ordering::SeqCst);
    }

    /// Accept submissions but never publish their receipts.
    pub fn set_black_hole(&self, enabled: bool) {
        self.black_hole.store(enabled, Ordering::SeqCst);
    }

    pub fn balance(&self, id: &AccountId) -> Option<Hbar> {
        self.accounts.get(id).map(|account| account.balance)
    }

    pub fn account_key(&self, id: &AccountId) -> Option<PublicKey> {
        self.accounts.get(id).map(|account| account.key.clone())
    }

    /// Number of submit calls received, including BUSY answers.
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    fn precheck(&self, node: AccountId, bytes: &[u8]) -> Result<SignedTransaction, Status> {
        if !self.nodes.contains(&node) {
            return Err(Status::InvalidNodeAccount);
        }

        let transaction = codec::decode(bytes).map_err(|e| match e {
            CodecError::Oversize(_) => Status::TransactionOversize,
            _ => Status::InvalidTransaction,
        })?;
        let signed = transaction.into_signed().ok_or(Status::InvalidSignature)?;
        let body = signed.body();

        if body.node_account_id != node {
            return Err(Status::InvalidNodeAccount);
        }
        if signed.verify_signatures().is_err() {
            return Err(Status::InvalidSignature);
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        let start = body.transaction_id.valid_start_secs;
        if start > now + MAX_START_SKEW_SECS {
            return Err(Status::InvalidTransactionStart);
        }
        if start.saturating_add(body.valid_duration_secs as i64) < now {
            return Err(Status::TransactionExpired);
        }

        if self.receipts.contains_key(&body.transaction_id) {
            return Err(Status::DuplicateTransaction);
        }

        let payer = self
            .accounts
            .get(&body.payer())
            .map(|account| account.clone())
            .ok_or(Status::PayerAccountNotFound)?;
        if !signed.is_signed_by(&payer.key) {
            return Err(Status::InvalidSignature);
        }
        if body.max_transaction_fee < SIMULATED_FEE {
            return Err(Status::InsufficientTxFee);
        }
        if payer.balance < SIMULATED_FEE {
            return Err(Status::InsufficientPayerBalance);
        }

        Ok(signed)
    }

    fn adjust(&self, id: &AccountId, delta: Hbar) {
        if let Some(mut account) = self.accounts.get_mut(id) {
            account.balance = account.balance.checked_add(delta).unwrap_or(account.balance);
        }
    }

    /// Apply an accepted transaction; the returned receipt carries the outcome.
    fn execute(&self, signed: &SignedTransaction) -> Receipt {
        let body = signed.body();
        let payer = body.payer();
        self.adjust(&payer, Hbar::from_tinybars(-SIMULATED_FEE.tinybars()));

        let failed = |status| Receipt {
            status,
            account_id: None,
        };

        match &body.data {
            TransactionData::AccountCreate {
                key,
                initial_balance,
                ..
            } => {
                let funds = self.balance(&payer).unwrap_or(Hbar::ZERO);
                if funds < *initial_balance {
                    return failed(Status::InsufficientPayerBalance);
                }
                let id = AccountId::new(0, 0, self.next_account_num.fetch_add(1, Ordering::SeqCst));
                self.adjust(&payer, Hbar::from_tinybars(-initial_balance.tinybars()));
                self.register_account(id, key.clone(), *initial_balance);
                Receipt {
                    status: Status::Success,
                    account_id: Some(id),
                }
            }
            TransactionData::CryptoTransfer { transfers } => {
                for leg in transfers.legs() {
                    let Some(account) = self.accounts.get(&leg.account_id).map(|a| a.clone()) else {
                        return failed(Status::InvalidAccountId);
                    };
                    if leg.amount.is_negative() {
                        if !signed.is_signed_by(&account.key) {
                            return failed(Status::InvalidSignature);
                        }
                        let remaining = account.balance.checked_add(leg.amount);
                        if remaining.map_or(true, |balance| balance.is_negative()) {
                            return failed(Status::InsufficientAccountBalance);
                        }
                    }
                }
                for leg in transfers.legs() {
                    self.adjust(&leg.account_id, leg.amount);
                }
                Receipt {
                    status: Status::Success,
                    account_id: None,
                }
            }
        }
    }

    /// Precheck and, when accepted, execute under the execution lock.
    fn accept(&self, node: AccountId, bytes: &[u8]) -> Status {
        let _guard = self
            .execution
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let signed = match self.precheck(node, bytes) {
            Ok(signed) => signed,
            Err(status) => {
                tracing::debug!(node = %node, status = %status, "Simulated precheck rejected");
                return status;
            }
        };

        let receipt = self.execute(&signed);
        let delay = Duration::from_millis(self.receipt_delay_ms.load(Ordering::Relaxed));
        tracing::debug!(
            transaction_id = %signed.transaction_id(),
            status = %receipt.status,
            "Simulated ledger reached consensus"
        );
        self.receipts.insert(
            signed.transaction_id(),
            StoredReceipt {
                receipt,
                ready_at: Instant::now() + delay,
                visible: !self.black_hole.load(Ordering::SeqCst),
            },
        );
        Status::Ok
    }
}

#[async_trait]
impl LedgerTransport for MemoryLedger {
    async fn submit(&self, node: AccountId, bytes: &[u8]) -> Result<Status, TransportError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);

        let busy = self
            .busy_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if busy {
            return Ok(Status::Busy);
        }

        Ok(self.accept(node, bytes))
    }

    async fn get_receipt(&self, id: &TransactionId) -> Result<Option<Receipt>, TransportError> {
        let Some(stored) = self.receipts.get(id).map(|entry| entry.clone()) else {
            return Ok(None);
        };
        if !stored.visible {
            return Ok(None);
        }
        if Instant::now() < stored.ready_at {
            return Ok(Some(Receipt {
                status: Status::Unknown,
                account_id: None,
            }));
        }
        Ok(Some(stored.receipt))
    }
}
