//! Canonical wire encoding.
//!
//! Layout: `b"HTX"`, one version byte, then the fixed-int little-endian
//! bincode encoding of the [`Transaction`] envelope. Trailing bytes are
//! rejected and the whole envelope is capped at [`MAX_TRANSACTION_BYTES`].

use bincode::Options;
use sha2::{Digest, Sha384};

use crate::codec::CodecError;
use crate::transaction::{TransactionBody, Transaction};

/// Envelope magic.
pub const MAGIC: &[u8; 3] = b"HTX";

/// Current envelope version.
pub const WIRE_VERSION: u8 = 1;

/// Largest transaction the ledger accepts.
pub const MAX_TRANSACTION_BYTES: usize = 6144;

const HEADER_LEN: usize = MAGIC.len() + 1;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_TRANSACTION_BYTES as u64)
        .reject_trailing_bytes()
}

fn map_bincode(err: bincode::Error) -> CodecError {
    match *err {
        bincode::ErrorKind::SizeLimit => CodecError::Oversize(MAX_TRANSACTION_BYTES),
        bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            CodecError::Structure("unexpected end of input".into())
        }
        other => CodecError::Structure(other.to_string()),
    }
}

/// Encode a transaction to wire bytes.
pub fn encode(transaction: &Transaction) -> Result<Vec<u8>, CodecError> {
    let payload = options().serialize(transaction).map_err(map_bincode)?;
    if HEADER_LEN + payload.len() > MAX_TRANSACTION_BYTES {
        return Err(CodecError::Oversize(MAX_TRANSACTION_BYTES));
    }
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(WIRE_VERSION);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Canonical body bytes: the message every signature covers.
pub fn encode_body(body: &TransactionBody) -> Result<Vec<u8>, CodecError> {
    options().serialize(body).map_err(map_bincode)
}

/// Decode wire bytes into an unsigned or signed transaction.
pub fn decode(bytes: &[u8]) -> Result<Transaction, CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated(bytes.len()));
    }
    if bytes.len() > MAX_TRANSACTION_BYTES {
        return Err(CodecError::Oversize(MAX_TRANSACTION_BYTES));
    }
    if &bytes[..MAGIC.len()] != MAGIC {
        return Err(CodecError::BadMagic);
    }
    let version = bytes[MAGIC.len()];
    if version != WIRE_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let transaction: Transaction = options()
        .deserialize(&bytes[HEADER_LEN..])
        .map_err(map_bincode)?;

    transaction
        .body()
        .validate()
        .map_err(|e| CodecError::Invalid(e.to_string()))?;
    if let Transaction::Signed(signed) = &transaction {
        if signed.signatures().is_empty() {
            return Err(CodecError::Invalid("signed envelope carries no signatures".into()));
        }
        if signed.signatures().iter().any(|pair| pair.signature.as_bytes().len() != 64) {
            return Err(CodecError::Invalid("signature must be 64 bytes".into()));
        }
    }
    Ok(transaction)
}

/// SHA-384 of the wire bytes, hex encoded.
pub fn transaction_hash(bytes: &[u8]) -> String {
    hex::encode(Sha384::digest(bytes))
}
