//! Redactable secret strings.

use std::fmt;
use zeroize::Zeroize;

const REDACTED: &str = "[REDACTED]";

/// A string that never shows up in `Debug` output and is wiped on drop.
///
/// Reading the value requires an explicit [`SecretString::expose`] call, so
/// logging and result-forwarding layers can redact it independently of
/// ordinary fields.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Explicit "reveal secret" capability.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Placeholder rendered in place of the value.
    pub fn redacted() -> &'static str {
        REDACTED
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
