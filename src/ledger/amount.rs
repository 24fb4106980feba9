//! Fixed-point HBAR amounts.
//!
//! Amounts are held as signed tinybars (10^-8 HBAR) so arithmetic never goes
//! through floating point. Decimal input is accepted only when it fits in
//! eight fractional digits; extra precision is rejected, never truncated.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional digits of one HBAR.
pub const HBAR_DECIMALS: u32 = 8;

/// Tinybars per HBAR.
pub const TINYBARS_PER_HBAR: i64 = 100_000_000;

/// Errors raised while constructing an amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("invalid amount '{0}': not a decimal number")]
    NotANumber(String),

    #[error("invalid amount '{0}': more than 8 decimal places")]
    TooPrecise(String),

    #[error("invalid amount '{0}': out of range")]
    OutOfRange(String),
}

/// A ledger currency value in tinybars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hbar(i64);

impl Hbar {
    pub const ZERO: Hbar = Hbar(0);

    pub const fn from_tinybars(tinybars: i64) -> Self {
        Self(tinybars)
    }

    pub const fn from_hbar(hbar: i64) -> Self {
        Self(hbar * TINYBARS_PER_HBAR)
    }

    /// Parse a decimal HBAR value such as `"1.5"` or `"0.00000001"`.
    ///
    /// Scientific notation (`"1e-8"`) is accepted as some JSON producers
    /// render small floats that way.
    pub fn from_decimal_str(raw: &str) -> Result<Self, AmountError> {
        let text = raw.trim();
        let parsed = if text.contains(['e', 'E']) {
            Decimal::from_scientific(text)
        } else {
            Decimal::from_str_exact(text)
        };
        let value = parsed.map_err(|_| AmountError::NotANumber(raw.to_string()))?;
        Self::from_decimal(value).map_err(|e| match e {
            AmountError::TooPrecise(_) => AmountError::TooPrecise(raw.to_string()),
            AmountError::OutOfRange(_) => AmountError::OutOfRange(raw.to_string()),
            other => other,
        })
    }

    /// Convert an exact decimal HBAR value.
    pub fn from_decimal(value: Decimal) -> Result<Self, AmountError> {
        // Trailing zeros are not precision: "1.500000000" is fine.
        let value = value.normalize();
        if value.scale() > HBAR_DECIMALS {
            return Err(AmountError::TooPrecise(value.to_string()));
        }
        let tinybars = value
            .checked_mul(Decimal::from(TINYBARS_PER_HBAR))
            .and_then(|v| v.to_i64())
            .ok_or_else(|| AmountError::OutOfRange(value.to_string()))?;
        Ok(Self(tinybars))
    }

    /// Parse a JSON number or numeric string.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AmountError> {
        match value {
            serde_json::Value::Number(n) => Self::from_decimal_str(&n.to_string()),
            serde_json::Value::String(s) => Self::from_decimal_str(s),
            other => Err(AmountError::NotANumber(other.to_string())),
        }
    }

    pub const fn tinybars(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Hbar) -> Option<Hbar> {
        self.0.checked_add(other.0).map(Hbar)
    }

    pub fn checked_sub(self, other: Hbar) -> Option<Hbar> {
        self.0.checked_sub(other.0).map(Hbar)
    }

    pub fn checked_neg(self) -> Option<Hbar> {
        self.0.checked_neg().map(Hbar)
    }

    /// Exact decimal HBAR value.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, HBAR_DECIMALS).normalize()
    }
}

impl fmt::Display for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ℏ", self.to_decimal())
    }
}

impl FromStr for Hbar {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scaling() {
        assert_eq!(Hbar::from_decimal_str("1.5").unwrap().tinybars(), 150_000_000);
        assert_eq!(Hbar::from_decimal_str("5").unwrap(), Hbar::from_hbar(5));
        assert_eq!(Hbar::from_decimal_str("-2.25").unwrap().tinybars(), -225_000_000);
    }

    #[test]
    fn test_precision_boundary() {
        assert_eq!(Hbar::from_decimal_str("0.00000001").unwrap().tinybars(), 1);
        assert_eq!(
            Hbar::from_decimal_str("12.34567891").unwrap().tinybars(),
            1_234_567_891
        );
        assert!(matches!(
            Hbar::from_decimal_str("0.000000001"),
            Err(AmountError::TooPrecise(_))
        ));
        assert!(matches!(
            Hbar::from_decimal_str("1.123456789"),
            Err(AmountError::TooPrecise(_))
        ));
        // Trailing zeros beyond the eighth place carry no precision.
        assert_eq!(Hbar::from_decimal_str("1.5000000000").unwrap().tinybars(), 150_000_000);
    }

    #[test]
    fn test_json_inputs() {
        assert_eq!(Hbar::from_json(&json!(1.5)).unwrap().tinybars(), 150_000_000);
        assert_eq!(Hbar::from_json(&json!(5)).unwrap(), Hbar::from_hbar(5));
        assert_eq!(Hbar::from_json(&json!("0.1")).unwrap().tinybars(), 10_000_000);
        assert_eq!(Hbar::from_json(&json!(1e-8)).unwrap().tinybars(), 1);
        assert!(Hbar::from_json(&json!(1e-9)).is_err());
        assert!(Hbar::from_json(&json!(true)).is_err());
        assert!(Hbar::from_json(&json!("abc")).is_err());
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            Hbar::from_decimal_str("100000000000000000000"),
            Err(AmountError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Hbar::from_tinybars(150_000_000).to_string(), "1.5 ℏ");
    }
}
