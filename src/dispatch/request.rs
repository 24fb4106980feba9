//! Operation requests: one discriminated variant per operation.
//!
//! Parsing is the boundary: external payload formats are normalized to
//! bytes here, amounts become tinybars and identities are parsed, so the
//! handlers only see typed values.

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::codec::format::{self, TransactionFormat};
use crate::error::{OperationError, OperationResult};
use crate::keys::KeyAlgorithm;
use crate::ledger::amount::Hbar;
use crate::ledger::types::AccountId;

/// Resource kinds accepted in the `resource` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Account,
    Transaction,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Account => "account",
            Resource::Transaction => "transaction",
        }
    }
}

impl FromStr for Resource {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "account" => Ok(Resource::Account),
            "transaction" => Ok(Resource::Transaction),
            other => Err(OperationError::unsupported("resource", other)),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction bytes already normalized from their external format.
#[derive(Clone, PartialEq, Eq)]
pub struct TransactionPayload {
    pub format: TransactionFormat,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for TransactionPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionPayload")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    CreateAccount {
        initial_balance: Hbar,
        key_type: KeyAlgorithm,
    },
    Transfer {
        recipient: AccountId,
        amount: Hbar,
    },
    Sign(TransactionPayload),
    Submit(TransactionPayload),
    SignAndSubmit(TransactionPayload),
}

impl OperationRequest {
    /// Parse a request record such as
    /// `{"resource":"account","operation":"transfer","recipientId":"0.0.2002","amount":1.5}`.
    pub fn from_json(value: &Value) -> OperationResult<Self> {
        let fields = value
            .as_object()
            .ok_or_else(|| OperationError::Validation("request must be a JSON object".into()))?;

        let resource: Resource = required_str(fields, "resource")?.parse()?;
        let operation = required_str(fields, "operation")?;

        match (resource, operation) {
            (Resource::Account, "create") => Self::create(fields),
            (Resource::Account, "transfer") => Self::transfer(fields),
            (Resource::Transaction, "sign") => Ok(Self::Sign(payload(fields)?)),
            (Resource::Transaction, "submit") => Ok(Self::Submit(payload(fields)?)),
            (Resource::Transaction, "signAndSubmit") => Ok(Self::SignAndSubmit(payload(fields)?)),
            (_, other) => Err(OperationError::unsupported("operation", other)),
        }
    }

    pub fn resource(&self) -> Resource {
        match self {
            Self::CreateAccount { .. } | Self::Transfer { .. } => Resource::Account,
            Self::Sign(_) | Self::Submit(_) | Self::SignAndSubmit(_) => Resource::Transaction,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::CreateAccount { .. } => "create",
            Self::Transfer { .. } => "transfer",
            Self::Sign(_) => "sign",
            Self::Submit(_) => "submit",
            Self::SignAndSubmit(_) => "signAndSubmit",
        }
    }

    fn create(fields: &Map<String, Value>) -> OperationResult<Self> {
        let initial_balance = match fields.get("initialBalance") {
            None | Some(Value::Null) => Hbar::ZERO,
            Some(value) => Hbar::from_json(value)?,
        };
        if initial_balance.is_negative() {
            return Err(OperationError::Validation(format!(
                "initialBalance must not be negative, got {initial_balance}"
            )));
        }

        let key_type = match optional_str(fields, "keyType")? {
            None => KeyAlgorithm::default(),
            Some(raw) => raw
                .parse()
                .map_err(|_| OperationError::unsupported("keyType", raw))?,
        };

        Ok(Self::CreateAccount {
            initial_balance,
            key_type,
        })
    }

    fn transfer(fields: &Map<String, Value>) -> OperationResult<Self> {
        let recipient: AccountId = required_str(fields, "recipientId")?.parse()?;
        let amount = Hbar::from_json(
            fields
                .get("amount")
                .ok_or_else(|| OperationError::Validation("missing amount".into()))?,
        )?;
        if !amount.is_positive() {
            return Err(OperationError::Validation(format!(
                "amount must be positive, got {amount}"
            )));
        }
        Ok(Self::Transfer { recipient, amount })
    }
}

fn payload(fields: &Map<String, Value>) -> OperationResult<TransactionPayload> {
    let format = match optional_str(fields, "transactionFormat")? {
        None => TransactionFormat::default(),
        Some(raw) => raw.parse()?,
    };
    let raw = fields
        .get("transaction")
        .filter(|value| !value.is_null())
        .ok_or_else(|| OperationError::Validation("missing transaction".into()))?;
    let bytes = format::normalize(format, raw)?;
    Ok(TransactionPayload { format, bytes })
}

fn required_str<'a>(fields: &'a Map<String, Value>, name: &str) -> OperationResult<&'a str> {
    optional_str(fields, name)?.ok_or_else(|| OperationError::Validation(format!("missing {name}")))
}

fn optional_str<'a>(fields: &'a Map<String, Value>, name: &str) -> OperationResult<Option<&'a str>> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(OperationError::Validation(format!(
            "{name} must be a string, got {other}"
        ))),
    }
}
