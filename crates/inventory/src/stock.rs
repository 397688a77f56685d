use serde::{Deserialize, Serialize};
use thiserror::Error;

use medfind_catalog::Price;
use medfind_core::{DomainError, DomainResult, Entity, ExpectedQuantity, MedicineId, PharmacyId, StockEntryId};

/// How many units of one medicine one pharmacy has, at what price.
///
/// There is at most one entry per (medicine, pharmacy) pair; stores enforce that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub id: StockEntryId,
    pub medicine_id: MedicineId,
    pub pharmacy_id: PharmacyId,
    pub quantity: i64,
    pub price: Price,
}

impl StockEntry {
    pub fn new(
        id: StockEntryId,
        medicine_id: MedicineId,
        pharmacy_id: PharmacyId,
        quantity: i64,
        price: Price,
    ) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::invariant("stock quantity cannot be negative"));
        }
        if !price.is_positive() {
            return Err(DomainError::validation("selling price must be positive"));
        }
        Ok(Self {
            id,
            medicine_id,
            pharmacy_id,
            quantity,
            price,
        })
    }

    /// Decide how to take `amount` units from this row as read.
    ///
    /// The returned plan carries the quantity observed now; the store applies it
    /// only if the row still holds exactly that quantity.
    pub fn plan_decrement(&self, amount: i64) -> Result<StockDecrement, DecrementRejected> {
        if amount <= 0 {
            return Err(DecrementRejected::InvalidAmount(amount));
        }
        if amount > self.quantity {
            return Err(DecrementRejected::InsufficientStock {
                requested: amount,
                available: self.quantity,
            });
        }
        Ok(StockDecrement {
            entry_id: self.id,
            amount,
            expected: ExpectedQuantity::new(self.quantity),
        })
    }
}

impl Entity for StockEntry {
    type Id = StockEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A checked, not-yet-applied decrement of one stock row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    pub entry_id: StockEntryId,
    pub amount: i64,
    pub expected: ExpectedQuantity,
}

impl StockDecrement {
    /// Quantity the row will hold once the decrement is applied.
    pub fn remaining(&self) -> i64 {
        self.expected.value() - self.amount
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecrementRejected {
    #[error("decrement amount must be positive (got {0})")]
    InvalidAmount(i64),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },
}
