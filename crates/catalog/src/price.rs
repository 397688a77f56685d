use serde::{Deserialize, Serialize};

use medfind_core::{DomainError, DomainResult, ValueObject};

/// Monetary amount in the smallest currency unit (e.g. paise, cents).
///
/// Bounded by `i64::MAX` so every price fits a signed `BIGINT` column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Price(u64);

impl Price {
    pub const ZERO: Price = Price(0);
    pub const MAX: Price = Price(i64::MAX as u64);

    pub fn new(minor_units: u64) -> DomainResult<Self> {
        if minor_units > Self::MAX.0 {
            return Err(DomainError::validation(format!(
                "price {minor_units} exceeds maximum {}",
                Self::MAX.0
            )));
        }
        Ok(Self(minor_units))
    }

    /// Build a price from a caller-supplied signed amount (negative is rejected).
    pub fn from_signed(minor_units: i64) -> DomainResult<Self> {
        u64::try_from(minor_units)
            .map(Self)
            .map_err(|_| DomainError::validation(format!("price cannot be negative (got {minor_units})")))
    }

    pub fn minor_units(self) -> u64 {
        self.0
    }

    /// Signed representation for storage backends.
    pub fn as_i64(self) -> i64 {
        // `new`/`from_signed` keep the value <= i64::MAX.
        self.0 as i64
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl ValueObject for Price {}

impl TryFrom<u64> for Price {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for u64 {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(Price::from_signed(-1).is_err());
        assert_eq!(Price::from_signed(150).unwrap().minor_units(), 150);
    }

    #[test]
    fn amounts_above_bigint_range_are_rejected() {
        assert!(Price::new(u64::MAX).is_err());
        assert_eq!(Price::new(i64::MAX as u64).unwrap(), Price::MAX);
        assert!(serde_json::from_str::<Price>(&u64::MAX.to_string()).is_err());
    }
}
