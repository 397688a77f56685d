//! Domain error model shared by the catalog, inventory and bookings crates.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failure of a domain rule.
///
/// Domain constructors never touch storage, so every variant is reproducible
/// from the inputs alone. Missing rows, lost races and backend failures are
/// reported by the store layer instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Caller input was malformed (blank name, negative bound, zero quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A value would break a stock or pricing invariant.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// The bare message, without the variant prefix used by `Display`.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m) | Self::InvariantViolation(m) | Self::InvalidId(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_the_kind_and_message_does_not() {
        let err = DomainError::validation("maxPrice (5) is below minPrice (9)");
        assert_eq!(err.to_string(), "validation failed: maxPrice (5) is below minPrice (9)");
        assert_eq!(err.message(), "maxPrice (5) is below minPrice (9)");
    }
}
