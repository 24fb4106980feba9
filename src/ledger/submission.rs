//! Submission client: send, await receipt, classify.
//!
//! # Responsibilities
//! - Drive each transaction through `Built → Signed → Submitted → {Succeeded, Failed, TimedOut}`
//! - Retry precheck `BUSY` (the ledger never accepted the bytes)
//! - Poll for a receipt with backoff until a bounded deadline
//!
//! # Deadlines
//!
//! ```text
//! submit ──► precheck (+ BUSY retries) ──OK──► receipt polling ──► outcome
//!            └── receipt_timeout ─────┘       └── receipt_timeout ──┘
//! ```
//! - Surface every non-success status verbatim in the outcome
//!
//! # Design Decisions
//! - A failed ledger status is never retried: the same transaction identity
//!   would be rejected as a duplicate
//! - A missing receipt at the deadline is `TimedOut`, never coerced into
//!   success or failure; the caller may re-query by transaction id
//! - Transport errors while polling are logged and polling continues, since
//!   the transaction is already in flight

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout, Instant};

use crate::codec::{self, CodecError};
use crate::ledger::transport::{LedgerTransport, TransportError};
use crate::ledger::types::{AccountId, Receipt, Status, TransactionId};
use crate::observability::metrics;
use crate::resilience::BackoffPolicy;
use crate::transaction::{SignedTransaction, Transaction};

/// Lifecycle of one transaction inside the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionState {
    Built,
    Signed,
    Submitted,
    Succeeded,
    Failed,
    TimedOut,
}

impl SubmissionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SubmissionState::Succeeded | SubmissionState::Failed | SubmissionState::TimedOut
        )
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn advance(self, next: SubmissionState) -> Result<SubmissionState, SubmissionError> {
        use SubmissionState::*;
        let allowed = matches!(
            (self, next),
            (Built, Signed)
                | (Signed, Submitted)
                | (Submitted, Succeeded)
                | (Submitted, Failed)
                | (Submitted, TimedOut)
        );
        if allowed {
            Ok(next)
        } else {
            Err(SubmissionError::InvalidTransition { from: self, to: next })
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionState::Built => "built",
            SubmissionState::Signed => "signed",
            SubmissionState::Submitted => "submitted",
            SubmissionState::Succeeded => "succeeded",
            SubmissionState::Failed => "failed",
            SubmissionState::TimedOut => "timed_out",
        };
        f.write_str(name)
    }
}

/// Where a failure status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Node refused the bytes before consensus.
    Precheck,
    /// Consensus reached, execution failed.
    Receipt,
}

/// Classified result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Succeeded(Receipt),
    Failed { status: Status, stage: FailureStage },
    TimedOut { waited: Duration },
}

/// Everything known about a submission once it reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub transaction_id: TransactionId,
    pub node_id: AccountId,
    pub transaction_hash: String,
    pub outcome: SubmissionOutcome,
}

impl SubmissionResult {
    /// The ledger status, `None` when no status was observed.
    pub fn status(&self) -> Option<Status> {
        match &self.outcome {
            SubmissionOutcome::Succeeded(receipt) => Some(receipt.status.clone()),
            SubmissionOutcome::Failed { status, .. } => Some(status.clone()),
            SubmissionOutcome::TimedOut { .. } => None,
        }
    }

    pub fn state(&self) -> SubmissionState {
        match self.outcome {
            SubmissionOutcome::Succeeded(_) => SubmissionState::Succeeded,
            SubmissionOutcome::Failed { .. } => SubmissionState::Failed,
            SubmissionOutcome::TimedOut { .. } => SubmissionState::TimedOut,
        }
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        match &self.outcome {
            SubmissionOutcome::Succeeded(receipt) => Some(receipt),
            _ => None,
        }
    }
}

/// Errors that prevent a submission from reaching a classified outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("transaction carries no signatures")]
    Unsigned,

    #[error("cannot encode transaction: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid submission state transition {from} -> {to}")]
    InvalidTransition {
        from: SubmissionState,
        to: SubmissionState,
    },
}

/// Timing knobs for the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionSettings {
    pub receipt_timeout: Duration,
    pub backoff: BackoffPolicy,
    pub max_busy_retries: u32,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            receipt_timeout: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
            max_busy_retries: 3,
        }
    }
}

/// Sends signed transactions and waits for their receipts.
#[derive(Clone)]
pub struct SubmissionClient {
    transport: Arc<dyn LedgerTransport>,
    settings: SubmissionSettings,
}

impl SubmissionClient {
    pub fn new(transport: Arc<dyn LedgerTransport>, settings: SubmissionSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> &SubmissionSettings {
        &self.settings
    }

    /// Submit to the node named in the body and classify the outcome.
    pub async fn submit(
        &self,
        signed: &SignedTransaction,
    ) -> Result<SubmissionResult, SubmissionError> {
        let mut state = SubmissionState::Built;
        if signed.signatures().is_empty() {
            return Err(SubmissionError::Unsigned);
        }
        state = state.advance(SubmissionState::Signed)?;

        let transaction_id = signed.transaction_id();
        let node_id = signed.body().node_account_id;
        let bytes = codec::encode(&Transaction::Signed(signed.clone()))?;
        let transaction_hash = codec::transaction_hash(&bytes);
        let result = |outcome| SubmissionResult {
            transaction_id,
            node_id,
            transaction_hash: transaction_hash.clone(),
            outcome,
        };

        let started = Instant::now();
        let precheck = self.submit_with_busy_retry(node_id, &bytes, &transaction_id).await?;
        state = state.advance(SubmissionState::Submitted)?;

        let outcome = match precheck {
            Some(Status::Ok) => self.await_receipt(&transaction_id).await,
            Some(status) => SubmissionOutcome::Failed {
                status,
                stage: FailureStage::Precheck,
            },
            None => SubmissionOutcome::TimedOut {
                waited: started.elapsed(),
            },
        };

        let terminal = result(outcome);
        state = state.advance(terminal.state())?;
        debug_assert!(state.is_terminal());

        match &terminal.outcome {
            SubmissionOutcome::Succeeded(receipt) => {
                tracing::info!(
                    transaction_id = %transaction_id,
                    node = %node_id,
                    status = %receipt.status,
                    "Transaction succeeded"
                );
            }
            SubmissionOutcome::Failed { status, stage } => {
                tracing::warn!(
                    transaction_id = %transaction_id,
                    node = %node_id,
                    status = %status,
                    stage = ?stage,
                    "Transaction failed"
                );
            }
            SubmissionOutcome::TimedOut { waited } => {
                tracing::warn!(
                    transaction_id = %transaction_id,
                    waited_ms = waited.as_millis() as u64,
                    "No receipt before deadline"
                );
            }
        }
        metrics::record_submission(
            terminal.status().as_ref().map(Status::as_str).unwrap_or("TIMED_OUT"),
            started.elapsed(),
        );

        Ok(terminal)
    }

    /// Precheck with `BUSY` retries, all within one `receipt_timeout`.
    ///
    /// `None` means the node never answered in time. A node still busy when
    /// the budget runs out yields `Some(Status::Busy)`.
    async fn submit_with_busy_retry(
        &self,
        node: AccountId,
        bytes: &[u8],
        transaction_id: &TransactionId,
    ) -> Result<Option<Status>, SubmissionError> {
        let deadline = Instant::now() + self.settings.receipt_timeout;
        let mut attempt = 0u32;
        loop {
            let call = self.transport.submit(node, bytes);
            let remaining = deadline.saturating_duration_since(Instant::now());
            let status = match timeout(remaining, call).await {
                Ok(Ok(status)) => status,
                // The bytes may have reached the node; resubmitting is not safe.
                Ok(Err(TransportError::Timeout(_))) | Err(_) => return Ok(None),
                Ok(Err(e)) => return Err(e.into()),
            };

            if status != Status::Busy || attempt >= self.settings.max_busy_retries {
                return Ok(Some(status));
            }

            attempt += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            let delay = self.settings.backoff.delay(attempt);
            if delay >= remaining {
                tracing::debug!(
                    transaction_id = %transaction_id,
                    node = %node,
                    attempt,
                    "Node still busy at precheck deadline"
                );
                return Ok(Some(status));
            }
            tracing::debug!(
                transaction_id = %transaction_id,
                node = %node,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Node busy, resubmitting"
            );
            sleep(delay).await;
        }
    }

    /// Poll until a final receipt or `receipt_timeout` after precheck `OK`.
    ///
    /// The receipt is always queried at least once.
    async fn await_receipt(&self, id: &TransactionId) -> SubmissionOutcome {
        let started = Instant::now();
        let deadline = started + self.settings.receipt_timeout;
        let mut attempt = 0u32;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, self.transport.get_receipt(id)).await {
                Ok(Ok(Some(receipt))) if !receipt.status.is_pending() => {
                    metrics::record_receipt_wait(started.elapsed());
                    return if receipt.status.is_success() {
                        SubmissionOutcome::Succeeded(receipt)
                    } else {
                        SubmissionOutcome::Failed {
                            status: receipt.status,
                            stage: FailureStage::Receipt,
                        }
                    };
                }
                Ok(Ok(_)) => {
                    tracing::trace!(transaction_id = %id, "Receipt pending");
                }
                Ok(Err(e)) => {
                    tracing::warn!(transaction_id = %id, error = %e, "Receipt query failed, will retry");
                }
                Err(_) => break,
            }

            attempt += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sleep(self.settings.backoff.delay_within(attempt, remaining)).await;
        }

        SubmissionOutcome::TimedOut {
            waited: started.elapsed(),
        }
    }
}

impl fmt::Debug for SubmissionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyAlgorithm, KeyManager};
    use crate::ledger::amount::Hbar;
    use crate::ledger::memory::MemoryLedger;
    use crate::ledger::nodes::NodeSelector;
    use crate::ledger::types::Network;
    use crate::transaction::{TransactionDefaults, TxBuilder};
    use async_trait::async_trait;

    const OPERATOR_KEY: &str =
        "302e020100300506032b6570042204209d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn operator() -> KeyManager {
        KeyManager::from_credentials(AccountId::new(0, 0, 1001), OPERATOR_KEY).unwrap()
    }

    fn ledger(keys: &KeyManager) -> Arc<MemoryLedger> {
        Arc::new(
            MemoryLedger::new(Network::Local)
                .with_account(keys.operator_account(), keys.operator_public_key(), Hbar::from_hbar(100))
                .with_account(
                    AccountId::new(0, 0, 2002),
                    KeyManager::generate_key_pair(KeyAlgorithm::Ed25519).public_key().clone(),
                    Hbar::ZERO,
                ),
        )
    }

    fn signed_transfer(keys: &KeyManager, amount: Hbar) -> SignedTransaction {
        let body = TxBuilder::new(
            keys.operator_account(),
            Arc::new(NodeSelector::for_network(Network::Local)),
            TransactionDefaults::default(),
        )
        .build_transfer(keys.operator_account(), AccountId::new(0, 0, 2002), amount)
        .unwrap();
        Transaction::Unsigned(body).sign_with(keys).unwrap()
    }

    fn settings(timeout_secs: u64) -> SubmissionSettings {
        SubmissionSettings {
            receipt_timeout: Duration::from_secs(timeout_secs),
            backoff: BackoffPolicy::from_millis(100, 1000),
            max_busy_retries: 2,
        }
    }

    #[test]
    fn test_state_transitions() {
        use SubmissionState::*;
        assert_eq!(Built.advance(Signed).unwrap(), Signed);
        assert_eq!(Submitted.advance(TimedOut).unwrap(), TimedOut);
        assert!(Built.advance(Submitted).is_err());
        assert!(Signed.advance(Succeeded).is_err());
        assert!(Succeeded.advance(Failed).is_err());
        assert!(TimedOut.advance(Succeeded).is_err());
        assert!(TimedOut.is_terminal() && !Submitted.is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_delay() {
        let keys = operator();
        let ledger = ledger(&keys);
        ledger.set_receipt_delay(Duration::from_secs(2));
        let client = SubmissionClient::new(ledger.clone(), settings(30));

        let signed = signed_transfer(&keys, Hbar::from_hbar(1));
        let result = client.submit(&signed).await.unwrap();

        assert_eq!(result.state(), SubmissionState::Succeeded);
        assert_eq!(result.status(), Some(Status::Success));
        assert_eq!(result.transaction_id, signed.transaction_id());
        assert_eq!(result.node_id, AccountId::new(0, 0, 3));
        assert_eq!(result.transaction_hash.len(), 96);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_status_surfaced() {
        let keys = operator();
        let client = SubmissionClient::new(ledger(&keys), settings(30));

        let result = client
            .submit(&signed_transfer(&keys, Hbar::from_hbar(1_000)))
            .await
            .unwrap();

        assert_eq!(result.state(), SubmissionState::Failed);
        assert_eq!(
            result.outcome,
            SubmissionOutcome::Failed {
                status: Status::InsufficientAccountBalance,
                stage: FailureStage::Receipt,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_receipt_times_out() {
        let keys = operator();
        let ledger = ledger(&keys);
        ledger.set_black_hole(true);
        let client = SubmissionClient::new(ledger, settings(5));

        let result = client
            .submit(&signed_transfer(&keys, Hbar::from_hbar(1)))
            .await
            .unwrap();

        assert_eq!(result.state(), SubmissionState::TimedOut);
        assert_eq!(result.status(), None);
        match result.outcome {
            SubmissionOutcome::TimedOut { waited } => assert!(waited >= Duration::from_secs(5)),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_retried_then_accepted() {
        let keys = operator();
        let ledger = ledger(&keys);
        ledger.respond_busy(2);
        let client = SubmissionClient::new(ledger.clone(), settings(30));

        let result = client
            .submit(&signed_transfer(&keys, Hbar::from_hbar(1)))
            .await
            .unwrap();

        assert_eq!(result.status(), Some(Status::Success));
        assert_eq!(ledger.submission_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_exhausted_is_failure() {
        let keys = operator();
        let ledger = ledger(&keys);
        ledger.respond_busy(10);
        let client = SubmissionClient::new(ledger.clone(), settings(30));

        let result = client
            .submit(&signed_transfer(&keys, Hbar::from_hbar(1)))
            .await
            .unwrap();

        assert_eq!(
            result.outcome,
            SubmissionOutcome::Failed {
                status: Status::Busy,
                stage: FailureStage::Precheck,
            }
        );
        assert_eq!(ledger.submission_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_backoff_does_not_consume_receipt_wait() {
        let keys = operator();
        let ledger = ledger(&keys);
        ledger.respond_busy(3);
        ledger.set_receipt_delay(Duration::from_millis(500));
        let client = SubmissionClient::new(
            ledger.clone(),
            SubmissionSettings {
                receipt_timeout: Duration::from_secs(1),
                backoff: BackoffPolicy::from_millis(100, 1000),
                max_busy_retries: 3,
            },
        );

        let result = client
            .submit(&signed_transfer(&keys, Hbar::from_hbar(1)))
            .await
            .unwrap();

        assert_eq!(result.status(), Some(Status::Success));
        assert_eq!(ledger.submission_count(), 4);
        assert_eq!(ledger.balance(&AccountId::new(0, 0, 2002)), Some(Hbar::from_hbar(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_precheck_phase_is_bounded() {
        let keys = operator();
        let ledger = ledger(&keys);
        ledger.respond_busy(1_000);
        let client = SubmissionClient::new(
            ledger.clone(),
            SubmissionSettings {
                receipt_timeout: Duration::from_secs(1),
                backoff: BackoffPolicy::from_millis(100, 1000),
                max_busy_retries: 100,
            },
        );

        let started = Instant::now();
        let result = client
            .submit(&signed_transfer(&keys, Hbar::from_hbar(1)))
            .await
            .unwrap();

        assert!(started.elapsed() <= Duration::from_secs(1));
        assert_eq!(
            result.outcome,
            SubmissionOutcome::Failed {
                status: Status::Busy,
                stage: FailureStage::Precheck,
            }
        );
        assert!(ledger.submission_count() < 10);
    }

    struct SilentNode;

    #[async_trait]
    impl LedgerTransport for SilentNode {
        async fn submit(&self, _node: AccountId, _bytes: &[u8]) -> Result<Status, TransportError> {
            std::future::pending().await
        }

        async fn get_receipt(&self, _id: &TransactionId) -> Result<Option<Receipt>, TransportError> {
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_precheck_times_out() {
        let keys = operator();
        let client = SubmissionClient::new(Arc::new(SilentNode), settings(3));

        let result = client
            .submit(&signed_transfer(&keys, Hbar::from_hbar(1)))
            .await
            .unwrap();

        assert_eq!(result.state(), SubmissionState::TimedOut);
    }

    struct UnlistedReceipt(Arc<MemoryLedger>);

    #[async_trait]
    impl LedgerTransport for UnlistedReceipt {
        async fn submit(&self, node: AccountId, bytes: &[u8]) -> Result<Status, TransportError> {
            self.0.submit(node, bytes).await
        }

        async fn get_receipt(&self, _id: &TransactionId) -> Result<Option<Receipt>, TransportError> {
            Ok(Some(Receipt {
                status: Status::Other("ACCOUNT_FROZEN_FOR_TOKEN".into()),
                account_id: None,
            }))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlisted_receipt_status_is_failure() {
        let keys = operator();
        let client = SubmissionClient::new(Arc::new(UnlistedReceipt(ledger(&keys))), settings(30));

        let result = client
            .submit(&signed_transfer(&keys, Hbar::from_hbar(1)))
            .await
            .unwrap();

        assert_eq!(
            result.outcome,
            SubmissionOutcome::Failed {
                status: Status::Other("ACCOUNT_FROZEN_FOR_TOKEN".into()),
                stage: FailureStage::Receipt,
            }
        );
    }

    struct FlakyReceipts {
        inner: Arc<MemoryLedger>,
        failures: std::sync::atomic::AtomicU32,
    }

    #[async_trait]
    impl LedgerTransport for FlakyReceipts {
        async fn submit(&self, node: AccountId, bytes: &[u8]) -> Result<Status, TransportError> {
            self.inner.submit(node, bytes).await
        }

        async fn get_receipt(&self, id: &TransactionId) -> Result<Option<Receipt>, TransportError> {
            use std::sync::atomic::Ordering;
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(TransportError::Request("connection reset".into()));
            }
            self.inner.get_receipt(id).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_errors_do_not_abort() {
        let keys = operator();
        let transport = Arc::new(FlakyReceipts {
            inner: ledger(&keys),
            failures: std::sync::atomic::AtomicU32::new(2),
        });
        let client = SubmissionClient::new(transport, settings(30));

        let result = client
            .submit(&signed_transfer(&keys, Hbar::from_hbar(1)))
            .await
            .unwrap();
        assert_eq!(result.status(), Some(Status::Success));
    }
}
