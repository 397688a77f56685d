use serde::{Deserialize, Serialize};

use medfind_core::{DomainError, DomainResult, StockEntryId, UserId};

/// Validated input to a reservation: who, which stock row, how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub user_id: UserId,
    pub stock_entry_id: StockEntryId,
    pub quantity: i64,
}

impl ReservationRequest {
    pub fn new(user_id: UserId, stock_entry_id: StockEntryId, quantity: i64) -> Self {
        Self {
            user_id,
            stock_entry_id,
            quantity,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity must be positive (got {})",
                self.quantity
            )));
        }
        Ok(())
    }
}
