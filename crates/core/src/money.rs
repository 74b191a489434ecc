//! Money primitives for a single-currency deployment.
//!
//! Amounts are held as integer minor units (pence, cents) so that balance
//! arithmetic is exact. Input is parsed through [`Decimal`]; the wire
//! representation is a decimal string with exactly [`Amount::SCALE`]
//! fractional digits.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::error::DomainError;

/// A non-negative quantity of money in minor units.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    #[error("not a number")]
    NotANumber,

    #[error("amount must not be negative")]
    Negative,

    #[error("amount has more than {} decimal places", Amount::SCALE)]
    TooManyDecimals,

    #[error("amount is out of range")]
    OutOfRange,
}

impl Amount {
    /// Number of fractional digits carried by the deployment currency.
    pub const SCALE: u32 = 2;
    const MINOR_PER_MAJOR: i64 = 10_i64.pow(Self::SCALE);

    pub const ZERO: Amount = Amount(0);

    pub fn from_minor(minor: i64) -> Result<Self, AmountError> {
        if minor < 0 {
            return Err(AmountError::Negative);
        }
        Ok(Self(minor))
    }

    /// Whole currency units (e.g. `12` → `12.00`).
    pub fn from_major(major: i64) -> Result<Self, AmountError> {
        if major < 0 {
            return Err(AmountError::Negative);
        }
        major
            .checked_mul(Self::MINOR_PER_MAJOR)
            .map(Self)
            .ok_or(AmountError::OutOfRange)
    }

    /// Exact conversion; trailing zeros beyond the scale are ignored.
    pub fn from_decimal(value: Decimal) -> Result<Self, AmountError> {
        let value = value.normalize();
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }
        if value.scale() > Self::SCALE {
            return Err(AmountError::TooManyDecimals);
        }
        value
            .checked_mul(Decimal::from(Self::MINOR_PER_MAJOR))
            .and_then(|minor| minor.to_i64())
            .map(Self)
            .ok_or(AmountError::OutOfRange)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// `None` when the result would be negative.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        let rest = self.0.checked_sub(other.0)?;
        (rest >= 0).then_some(Amount(rest))
    }

    /// Parse a plain decimal string such as `"200"`, `"200.5"` or `"0.01"`.
    ///
    /// Trailing zeros beyond the scale are accepted (`"1.500"`), further
    /// significant digits are not. Exponent notation is rejected.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let s = input.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+')) {
            return Err(AmountError::NotANumber);
        }
        match Decimal::from_str_exact(s) {
            Ok(value) => Self::from_decimal(value),
            Err(rust_decimal::Error::ExceedsMaximumPossibleValue)
            | Err(rust_decimal::Error::LessThanMinimumPossibleValue) => {
                Err(AmountError::OutOfRange)
            }
            Err(rust_decimal::Error::Underflow) => Err(AmountError::TooManyDecimals),
            Err(_) => Err(AmountError::NotANumber),
        }
    }

    /// Parse a JSON number literal (`2500`, `10.25`, `1e16`).
    pub fn parse_number(literal: &str) -> Result<Self, AmountError> {
        let literal = literal.trim();
        let parsed = if literal.contains(['e', 'E']) {
            Decimal::from_scientific(&literal.to_ascii_lowercase().replace("e+", "e"))
        } else {
            Decimal::from_str_exact(literal)
        };
        match parsed {
            Ok(value) => Self::from_decimal(value),
            // Beyond `Decimal`: too large, or too many fractional digits.
            Err(_) => match literal.parse::<f64>() {
                Ok(f) if f.is_sign_negative() && f != 0.0 => Err(AmountError::Negative),
                Ok(f) if f.abs() >= 1.0 => Err(AmountError::OutOfRange),
                Ok(_) => Err(AmountError::TooManyDecimals),
                Err(_) => Err(AmountError::NotANumber),
            },
        }
    }

    /// Interpret a JSON value (number or numeric string) as an amount.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AmountError> {
        match value {
            serde_json::Value::Number(n) => Self::parse_number(&n.to_string()),
            serde_json::Value::String(s) => Self::parse(s),
            _ => Err(AmountError::NotANumber),
        }
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let major = self.0 / Self::MINOR_PER_MAJOR;
        let minor = self.0 % Self::MINOR_PER_MAJOR;
        write!(f, "{major}.{minor:0width$}", width = Self::SCALE as usize)
    }
}

impl core::str::FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// ISO-4217 style currency code of the deployment (e.g. `GBP`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self, DomainError> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(DomainError::validation(
                "currency",
                format!("'{code}' is not a three-letter currency code"),
            ));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self("GBP".to_string())
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
