//! Operation dispatcher.
//!
//! # Responsibilities
//! - Resolve each request to its handler sequence
//! - Run batches sequentially or with bounded concurrency, keeping input order
//! - Isolate per-item failures, or abort on the first one in fail-fast mode
//! - Stop dispatching new items on cancellation
//!
//! # Handler Sequences
//! ```text
//! create / transfer : build → sign → submit
//! sign              : decode → sign
//! submit            : decode → submit
//! signAndSubmit     : decode → sign → submit
//! ```

use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use crate::codec::{self, format::to_base64};
use crate::config::validation::MAX_CONCURRENCY;
use crate::config::{validate_config, AppConfig, Credentials};
use crate::dispatch::output::{ItemResult, OperationOutput, SecretPolicy};
use crate::dispatch::request::{OperationRequest, TransactionPayload};
use crate::error::{OperationError, OperationResult};
use crate::keys::{KeyAlgorithm, KeyManager};
use crate::ledger::amount::Hbar;
use crate::ledger::nodes::NodeSelector;
use crate::ledger::submission::{SubmissionClient, SubmissionOutcome, SubmissionResult};
use crate::ledger::transport::{HttpTransport, LedgerTransport};
use crate::ledger::types::{AccountId, Status, TransactionId};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::transaction::{SignedTransaction, Transaction, TxBuilder};

/// How per-item failures affect the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Capture failures as error records and continue.
    #[default]
    Isolated,
    /// Stop dispatching after the first failure and report it.
    FailFast,
}

/// Batch processing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub failure_mode: FailureMode,
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            failure_mode: FailureMode::Isolated,
            concurrency: 1,
        }
    }
}

/// A fail-fast batch stopped at `index`.
#[derive(Debug)]
pub struct BatchAborted {
    pub index: usize,
    pub error: OperationError,
    /// Every item's result; items after the failure are `Cancelled` unless
    /// they were already in flight.
    pub results: Vec<ItemResult>,
}

impl std::fmt::Display for BatchAborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "batch aborted at item {}: {}", self.index, self.error)
    }
}

impl std::error::Error for BatchAborted {}

/// Maps requests onto the build/codec/sign/submit pipeline.
#[derive(Debug)]
pub struct Dispatcher {
    keys: KeyManager,
    builder: TxBuilder,
    client: SubmissionClient,
    options: BatchOptions,
    secret_policy: SecretPolicy,
    shutdown: Arc<Shutdown>,
}

impl Dispatcher {
    /// Build a dispatcher from a configuration. Credential and configuration
    /// problems surface here, before any request is processed.
    pub fn new(config: &AppConfig, transport: Arc<dyn LedgerTransport>) -> OperationResult<Self> {
        validate_config(config).map_err(|errors| {
            OperationError::Configuration(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        })?;

        let credentials = Credentials::from_config(&config.operator)?;
        let keys = credentials.key_manager()?;
        let defaults = config
            .transaction
            .to_defaults()
            .map_err(|e| OperationError::Configuration(e.to_string()))?;
        let nodes = Arc::new(NodeSelector::for_network(credentials.network));

        tracing::info!(
            operator = %credentials.account_id,
            network = %credentials.network,
            nodes = nodes.nodes().len(),
            "Dispatcher ready"
        );

        Ok(Self {
            builder: TxBuilder::new(keys.operator_account(), nodes, defaults),
            keys,
            client: SubmissionClient::new(transport, config.submission.to_settings()),
            options: BatchOptions {
                failure_mode: if config.batch.fail_fast {
                    FailureMode::FailFast
                } else {
                    FailureMode::Isolated
                },
                concurrency: config.batch.concurrency.max(1),
            },
            secret_policy: SecretPolicy::from_reveal(config.output.reveal_secrets),
            shutdown: Arc::new(Shutdown::new()),
        })
    }

    /// The HTTP gateway transport named by `gateway.url`.
    pub fn gateway_transport(config: &AppConfig) -> OperationResult<Arc<dyn LedgerTransport>> {
        let url = config.gateway.url.as_deref().ok_or_else(|| {
            OperationError::Configuration("gateway.url is not set".into())
        })?;
        let transport = HttpTransport::new(url, Duration::from_secs(config.gateway.request_timeout_secs))
            .map_err(|e| OperationError::Configuration(e.to_string()))?;
        Ok(Arc::new(transport))
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = BatchOptions {
            concurrency: options.concurrency.clamp(1, MAX_CONCURRENCY),
            ..options
        };
        self
    }

    pub fn with_shutdown(mut self, shutdown: Arc<Shutdown>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_secret_policy(mut self, policy: SecretPolicy) -> Self {
        self.secret_policy = policy;
        self
    }

    pub fn options(&self) -> BatchOptions {
        self.options
    }

    pub fn secret_policy(&self) -> SecretPolicy {
        self.secret_policy
    }

    pub fn shutdown(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }

    pub fn operator_account(&self) -> AccountId {
        self.keys.operator_account()
    }

    /// Parse and run one raw request record.
    pub async fn dispatch_json(&self, raw: &Value) -> ItemResult {
        let request = OperationRequest::from_json(raw)?;
        self.dispatch(request).await
    }

    /// Run one typed request.
    pub async fn dispatch(&self, request: OperationRequest) -> ItemResult {
        let operation = request.operation();
        let result = match request {
            OperationRequest::CreateAccount {
                initial_balance,
                key_type,
            } => self.create_account(initial_balance, key_type).await,
            OperationRequest::Transfer { recipient, amount } => {
                self.transfer(recipient, amount).await
            }
            OperationRequest::Sign(payload) => self.sign(&payload),
            OperationRequest::Submit(payload) => self.submit(&payload).await,
            OperationRequest::SignAndSubmit(payload) => self.sign_and_submit(&payload).await,
        };
        metrics::record_request(operation, outcome_label(&result));
        result
    }

    /// Run a batch of raw request records, one result per record in input order.
    pub async fn run_batch(&self, items: &[Value]) -> Result<Vec<ItemResult>, BatchAborted> {
        let batch_id = Uuid::new_v4();
        let span = tracing::info_span!("batch", batch_id = %batch_id, items = items.len());
        self.run_batch_inner(items).instrument(span).await
    }

    async fn run_batch_inner(&self, items: &[Value]) -> Result<Vec<ItemResult>, BatchAborted> {
        let fail_fast = self.options.failure_mode == FailureMode::FailFast;
        let aborted = AtomicBool::new(false);
        let aborted = &aborted;

        tracing::info!(
            concurrency = self.options.concurrency,
            fail_fast,
            "Batch started"
        );

        let results: Vec<ItemResult> = stream::iter(items.iter().enumerate())
            .map(|(index, raw)| async move {
                if self.shutdown.is_triggered() || aborted.load(Ordering::SeqCst) {
                    return Err(OperationError::Cancelled);
                }
                let resource = raw.get("resource").and_then(Value::as_str).unwrap_or("-");
                let operation = raw.get("operation").and_then(Value::as_str).unwrap_or("-");
                let span = tracing::info_span!("item", index, resource, operation);
                let result = self.dispatch_json(raw).instrument(span).await;
                self.record(index, &result);
                if fail_fast && result.is_err() {
                    aborted.store(true, Ordering::SeqCst);
                }
                result
            })
            .buffered(self.options.concurrency)
            .collect()
            .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(
            succeeded = results.len() - failed,
            failed,
            "Batch finished"
        );

        if fail_fast {
            if let Some((index, error)) = results
                .iter()
                .enumerate()
                .find_map(|(i, r)| r.as_ref().err().map(|e| (i, e.clone())))
            {
                tracing::error!(index, error = %error, kind = error.kind(), "Batch aborted");
                return Err(BatchAborted {
                    index,
                    error,
                    results,
                });
            }
        }

        Ok(results)
    }

    fn record(&self, index: usize, result: &ItemResult) {
        match result {
            Ok(_) => tracing::debug!(index, "Item succeeded"),
            Err(e) => tracing::warn!(index, kind = e.kind(), error = %e, "Item failed"),
        }
    }

    async fn create_account(&self, initial_balance: Hbar, key_type: KeyAlgorithm) -> ItemResult {
        let pair = KeyManager::generate_key_pair(key_type);
        let body = self
            .builder
            .build_account_create(pair.public_key().clone(), initial_balance)?;
        let signed = Transaction::Unsigned(body).sign_with(&self.keys)?;
        let result = self.submit_signed(&signed).await?;
        let transaction_id = result.transaction_id;

        match result.outcome {
            SubmissionOutcome::Succeeded(receipt) => {
                let account_id = receipt.account_id.ok_or_else(|| {
                    OperationError::NetworkFailure(format!(
                        "receipt for {transaction_id} carries no account id"
                    ))
                })?;
                tracing::info!(account_id = %account_id, key_type = %key_type, "Account created");
                Ok(OperationOutput::AccountCreated {
                    account_id,
                    public_key: pair.public_key().clone(),
                    private_key: pair.reveal_private_key(),
                    evm_address: pair.private_key().evm_address(),
                    transaction_id,
                })
            }
            SubmissionOutcome::Failed { status, .. } => Err(OperationError::RejectedByNetwork {
                status,
                transaction_id,
            }),
            SubmissionOutcome::TimedOut { waited } => Err(timed_out(&transaction_id, waited)),
        }
    }

    async fn transfer(&self, recipient: AccountId, amount: Hbar) -> ItemResult {
        let body = self
            .builder
            .build_transfer(self.keys.operator_account(), recipient, amount)?;
        let signed = Transaction::Unsigned(body).sign_with(&self.keys)?;
        let result = self.submit_signed(&signed).await?;

        // A failure status is a normal, classified outcome for transfers.
        let status = settled_status(&result)?;
        Ok(OperationOutput::Transferred {
            status,
            transaction_id: result.transaction_id,
        })
    }

    fn sign(&self, payload: &TransactionPayload) -> ItemResult {
        let transaction = codec::decode(&payload.bytes)?;
        let signed = transaction.sign_with(&self.keys)?;
        tracing::info!(
            transaction_id = %signed.transaction_id(),
            signatures = signed.signatures().len(),
            "Transaction signed"
        );
        Ok(OperationOutput::Signed {
            signed_transaction: encode_signed(&signed)?,
        })
    }

    async fn submit(&self, payload: &TransactionPayload) -> ItemResult {
        let signed = codec::decode(&payload.bytes)?
            .into_signed()
            .ok_or_else(|| OperationError::Validation("transaction is not signed".into()))?;
        self.submit_and_report(&signed, None).await
    }

    async fn sign_and_submit(&self, payload: &TransactionPayload) -> ItemResult {
        let signed = codec::decode(&payload.bytes)?.sign_with(&self.keys)?;
        let encoded = encode_signed(&signed)?;
        self.submit_and_report(&signed, Some(encoded)).await
    }

    async fn submit_and_report(
        &self,
        signed: &SignedTransaction,
        signed_transaction: Option<String>,
    ) -> ItemResult {
        let result = self.submit_signed(signed).await?;
        let status = settled_status(&result)?;
        Ok(OperationOutput::Submitted {
            transaction_id: result.transaction_id,
            node_id: result.node_id,
            transaction_hash: result.transaction_hash,
            status,
            signed_transaction,
        })
    }

    async fn submit_signed(&self, signed: &SignedTransaction) -> OperationResult<SubmissionResult> {
        Ok(self.client.submit(signed).await?)
    }
}

/// Status of a settled submission; a missing receipt is an error, never a status.
fn settled_status(result: &SubmissionResult) -> OperationResult<Status> {
    match &result.outcome {
        SubmissionOutcome::Succeeded(receipt) => Ok(receipt.status.clone()),
        SubmissionOutcome::Failed { status, .. } => Ok(status.clone()),
        SubmissionOutcome::TimedOut { waited } => Err(timed_out(&result.transaction_id, *waited)),
    }
}

fn timed_out(id: &TransactionId, waited: Duration) -> OperationError {
    OperationError::TimedOut {
        transaction_id: *id,
        waited_secs: waited.as_secs(),
    }
}

fn encode_signed(signed: &SignedTransaction) -> OperationResult<String> {
    let bytes = codec::encode(&Transaction::Signed(signed.clone()))?;
    Ok(to_base64(&bytes))
}

fn outcome_label(outcome: &ItemResult) -> &'static str {
    match outcome {
        Ok(_) => "success",
        Err(e) => e.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::MemoryLedger;
    use crate::ledger::types::Network;
    use serde_json::json;

    const OPERATOR_KEY: &str =
        "302e020100300506032b6570042204209d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.operator.account_id = Some("0.0.1001".into());
        config.operator.private_key = Some(OPERATOR_KEY.into());
        config.operator.network = Network::Local;
        config
    }

    fn dispatcher() -> (Dispatcher, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new(Network::Local));
        let dispatcher = Dispatcher::new(&config(), ledger.clone()).unwrap();
        ledger.register_account(
            dispatcher.operator_account(),
            dispatcher.keys.operator_public_key(),
            Hbar::from_hbar(100),
        );
        (dispatcher, ledger)
    }

    #[test]
    fn test_missing_credentials_are_configuration_errors() {
        let ledger = Arc::new(MemoryLedger::new(Network::Local));
        let err = Dispatcher::new(&AppConfig::default(), ledger).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("operator.account_id"));
    }

    #[test]
    fn test_gateway_transport_requires_url() {
        match Dispatcher::gateway_transport(&config()) {
            Err(err) => assert_eq!(err.kind(), "ConfigurationError"),
            Ok(_) => panic!("gateway transport built without a url"),
        }

        let mut with_url = config();
        with_url.gateway.url = Some("http://127.0.0.1:5551".into());
        assert!(Dispatcher::gateway_transport(&with_url).is_ok());
    }

    #[tokio::test]
    async fn test_submit_unsigned_is_validation_error() {
        let (dispatcher, ledger) = dispatcher();
        let body = dispatcher
            .builder
            .build_transfer(dispatcher.operator_account(), AccountId::new(0, 0, 2002), Hbar::from_hbar(1))
            .unwrap();
        let bytes = codec::encode(&Transaction::Unsigned(body)).unwrap();

        let err = dispatcher
            .dispatch_json(&json!({
                "resource": "transaction",
                "operation": "submit",
                "transaction": to_base64(&bytes)
            }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert_eq!(ledger.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_create_failure_is_rejected_by_network() {
        let (dispatcher, _ledger) = dispatcher();
        let err = dispatcher
            .dispatch(OperationRequest::CreateAccount {
                initial_balance: Hbar::from_hbar(1_000),
                key_type: KeyAlgorithm::Ed25519,
            })
            .await
            .unwrap_err();
        match err {
            OperationError::RejectedByNetwork { status, .. } => {
                assert_eq!(status, Status::InsufficientPayerBalance)
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_batch_dispatches_nothing() {
        let (dispatcher, ledger) = dispatcher();
        dispatcher.shutdown().trigger();
        let items = vec![
            json!({"resource": "account", "operation": "create", "initialBalance": 1}),
            json!({"resource": "account", "operation": "create", "initialBalance": 1}),
        ];
        let results = dispatcher.run_batch(&items).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(OperationError::Cancelled))));
        assert_eq!(ledger.submission_count(), 0);
    }
}
