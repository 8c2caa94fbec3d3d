//! Tax rate model for sales documents.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxRateError {
    #[error("Tax rate {0} is outside the range 0..=1")]
    OutOfRange(Decimal),

    #[error("Tax rate '{0}' is not a decimal number")]
    Unparsable(String),
}

/// Flat value-added tax rate (IVA/ITBMS) applied to a document subtotal,
/// expressed as a fraction: `0.16` is 16%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// General Mexican IVA rate, 16%.
    pub const IVA_GENERAL: TaxRate = TaxRate(Decimal::from_parts(16, 0, 0, false, 2));

    pub fn new(rate: Decimal) -> Result<Self, TaxRateError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(TaxRateError::OutOfRange(rate));
        }
        Ok(Self(rate))
    }

    pub fn rate(&self) -> Decimal {
        self.0
    }

    /// Tax owed on `subtotal`, or `None` when it is out of range.
    pub fn apply(&self, subtotal: Decimal) -> Option<Decimal> {
        subtotal.checked_mul(self.0)
    }
}

impl TryFrom<Decimal> for TaxRate {
    type Error = TaxRateError;

    fn try_from(rate: Decimal) -> Result<Self, Self::Error> {
        Self::new(rate)
    }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Self {
        rate.0
    }
}

impl FromStr for TaxRate {
    type Err = TaxRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rate = Decimal::from_str(s.trim())
            .map_err(|_| TaxRateError::Unparsable(s.to_string()))?;
        Self::new(rate)
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
