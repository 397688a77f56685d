use serde::{Deserialize, Serialize};

use medfind_catalog::Price;
use medfind_core::{DomainError, DomainResult};

use crate::stock::StockEntry;

/// Eligibility filter applied to stock rows during availability search.
///
/// Always valid once constructed: `min_stock >= 0` and `min_price <= max_price`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockFilter {
    min_stock: i64,
    min_price: Price,
    max_price: Price,
}

impl StockFilter {
    pub fn new(min_stock: i64, min_price: i64, max_price: i64) -> DomainResult<Self> {
        if min_stock < 0 {
            return Err(DomainError::validation(format!(
                "minStock cannot be negative (got {min_stock})"
            )));
        }
        let min = Price::from_signed(min_price)
            .map_err(|_| DomainError::validation(format!("minPrice cannot be negative (got {min_price})")))?;
        let max = Price::from_signed(max_price)
            .map_err(|_| DomainError::validation(format!("maxPrice cannot be negative (got {max_price})")))?;
        if max < min {
            return Err(DomainError::validation(format!(
                "maxPrice ({max_price}) is below minPrice ({min_price})"
            )));
        }
        Ok(Self {
            min_stock,
            min_price: min,
            max_price: max,
        })
    }

    /// Build a filter from optional bounds, defaulting whatever is absent.
    pub fn from_bounds(min_stock: Option<i64>, min_price: Option<i64>, max_price: Option<i64>) -> DomainResult<Self> {
        Self::new(
            min_stock.unwrap_or(0),
            min_price.unwrap_or(0),
            max_price.unwrap_or(Price::MAX.as_i64()),
        )
    }

    pub fn min_stock(&self) -> i64 {
        self.min_stock
    }

    pub fn min_price(&self) -> Price {
        self.min_price
    }

    pub fn max_price(&self) -> Price {
        self.max_price
    }

    /// `quantity >= min_stock AND min_price <= price <= max_price`.
    pub fn matches(&self, entry: &StockEntry) -> bool {
        entry.quantity >= self.min_stock && entry.price >= self.min_price && entry.price <= self.max_price
    }
}

impl Default for StockFilter {
    fn default() -> Self {
        Self {
            min_stock: 0,
            min_price: Price::ZERO,
            max_price: Price::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medfind_core::{MedicineId, PharmacyId, StockEntryId};
    use proptest::prelude::*;

    fn entry(quantity: i64, price: u64) -> StockEntry {
        StockEntry::new(
            StockEntryId::new(),
            MedicineId::new(),
            PharmacyId::new(),
            quantity,
            Price::new(price).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn inverted_price_range_is_rejected() {
        let err = StockFilter::new(0, 100, 50).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("below minPrice")));
    }

    #[test]
    fn negative_bounds_are_rejected() {
        assert!(StockFilter::new(-1, 0, 10).is_err());
        assert!(StockFilter::new(0, -1, 10).is_err());
        assert!(StockFilter::new(0, 0, -10).is_err());
    }

    #[test]
    fn absent_bounds_default_to_everything() {
        assert_eq!(StockFilter::from_bounds(None, None, None).unwrap(), StockFilter::default());
        assert!(StockFilter::default().matches(&entry(0, 1)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let f = StockFilter::new(1, 0, 100).unwrap();
        assert!(f.matches(&entry(1, 100)));
        assert!(!f.matches(&entry(0, 100)));
        assert!(!f.matches(&entry(1, 150)));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a matching entry always satisfies every bound.
        #[test]
        fn matches_implies_bounds(
            min_stock in 0i64..50,
            lo in 0i64..500,
            span in 0i64..500,
            quantity in 0i64..100,
            price in 1u64..1_200,
        ) {
            let f = StockFilter::new(min_stock, lo, lo + span).unwrap();
            let e = entry(quantity, price);
            if f.matches(&e) {
                prop_assert!(e.quantity >= f.min_stock());
                prop_assert!(f.min_price() <= e.price && e.price <= f.max_price());
            } else {
                prop_assert!(
                    e.quantity < f.min_stock() || e.price < f.min_price() || e.price > f.max_price()
                );
            }
        }
    }
}
