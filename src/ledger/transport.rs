//! Network transport seam for the submission client.
//!
//! # Responsibilities
//! - Deliver signed wire bytes to a node and return its precheck status
//! - Fetch the receipt for a transaction identity
//! - Keep transport-level failures distinct from ledger statuses
//!
//! # Design Decisions
//! - The ledger itself is a black box behind [`LedgerTransport`]
//! - `HttpTransport` talks to a JSON gateway; `MemoryLedger` simulates one
//! - A single pooled `reqwest::Client` is shared by all in-flight submissions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::codec::format::to_base64;
use crate::ledger::types::{AccountId, Receipt, Status, TransactionId};

/// Errors raised below the ledger protocol (connectivity, framing).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection or request failure.
    #[error("request to ledger gateway failed: {0}")]
    Request(String),

    /// The gateway answered with an unexpected HTTP status.
    #[error("ledger gateway returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The gateway answered with a body we cannot interpret.
    #[error("unexpected gateway response: {0}")]
    Protocol(String),

    /// The request did not complete in time.
    #[error("ledger gateway timed out after {0:?}")]
    Timeout(Duration),

    /// Gateway URL is unusable.
    #[error("invalid gateway url '{0}'")]
    InvalidUrl(String),
}

/// Black-box ledger client capability: send signed bytes, read receipts.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Send signed transaction bytes to `node`; returns the precheck status.
    async fn submit(&self, node: AccountId, bytes: &[u8]) -> Result<Status, TransportError>;

    /// Fetch the receipt of `id`, `None` while the ledger has none yet.
    async fn get_receipt(&self, id: &TransactionId) -> Result<Option<Receipt>, TransportError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    transaction: String,
    node_account_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    precheck_status: Status,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptResponse {
    status: Status,
    #[serde(default)]
    account_id: Option<String>,
}

/// Transport speaking JSON to an HTTP ledger gateway.
///
/// - `POST {base}/api/v1/transactions` with `{"transaction", "nodeAccountId"}`
/// - `GET {base}/api/v1/transactions/{id}/receipt`, 404 while pending
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(gateway_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut base: Url = gateway_url
            .parse()
            .map_err(|_| TransportError::InvalidUrl(gateway_url.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(TransportError::InvalidUrl(gateway_url.to_string()));
        }
        // Url::join replaces the last segment unless the base ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        tracing::info!(gateway = %base, timeout_secs = timeout.as_secs(), "HTTP ledger transport ready");

        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path)
            .map_err(|_| TransportError::InvalidUrl(format!("{}{}", self.base, path)))
    }

    fn map_reqwest(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Request(err.to_string())
        }
    }

    async fn error_body(response: reqwest::Response) -> TransportError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        TransportError::Http { status, body }
    }
}

#[async_trait]
impl LedgerTransport for HttpTransport {
    async fn submit(&self, node: AccountId, bytes: &[u8]) -> Result<Status, TransportError> {
        let url = self.endpoint("api/v1/transactions")?;
        let node = node.to_string();
        let request = SubmitRequest {
            transaction: to_base64(bytes),
            node_account_id: &node,
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        if !response.status().is_success() {
            return Err(Self::error_body(response).await);
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Protocol(e.to_string()))?;

        tracing::debug!(node = %node, precheck = %body.precheck_status, "Gateway precheck answered");
        Ok(body.precheck_status)
    }

    async fn get_receipt(&self, id: &TransactionId) -> Result<Option<Receipt>, TransportError> {
        let url = self.endpoint(&format!("api/v1/transactions/{id}/receipt"))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_body(response).await);
        }

        let body: ReceiptResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Protocol(e.to_string()))?;

        let account_id = body
            .account_id
            .map(|raw| {
                raw.parse::<AccountId>()
                    .map_err(|e| TransportError::Protocol(e.to_string()))
            })
            .transpose()?;

        Ok(Some(Receipt {
            status: body.status,
            account_id,
        }))
    }
}
