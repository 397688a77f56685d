use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medfind_core::{BookingId, Entity, MedicineId, PharmacyId, StockEntryId, UserId};
use medfind_inventory::StockEntry;

/// Booking lifecycle. Reservations only ever produce `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(BookingStatus::Confirmed),
            _ => None,
        }
    }
}

/// A committed reservation. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub stock_entry_id: StockEntryId,
    pub medicine_id: MedicineId,
    pub pharmacy_id: PharmacyId,
    pub quantity: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Entity for Booking {
    type Id = BookingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A booking ready to be appended to the ledger (not yet assigned an id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: UserId,
    pub stock_entry_id: StockEntryId,
    pub medicine_id: MedicineId,
    pub pharmacy_id: PharmacyId,
    pub quantity: i64,
}

impl NewBooking {
    pub fn for_entry(user_id: UserId, entry: &StockEntry, quantity: i64) -> Self {
        Self {
            user_id,
            stock_entry_id: entry.id,
            medicine_id: entry.medicine_id,
            pharmacy_id: entry.pharmacy_id,
            quantity,
        }
    }

    pub fn confirm(self, id: BookingId, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id,
            user_id: self.user_id,
            stock_entry_id: self.stock_entry_id,
            medicine_id: self.medicine_id,
            pharmacy_id: self.pharmacy_id,
            quantity: self.quantity,
            status: BookingStatus::Confirmed,
            created_at,
        }
    }
}
