use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use medfind_bookings::{Booking, NewBooking};
use medfind_catalog::{Medicine, NamePattern, Pharmacy};
use medfind_core::{ExpectedQuantity, MedicineId, PharmacyId, StockEntryId};
use medfind_inventory::{StockDecrement, StockEntry, StockFilter};

/// Store operation error.
///
/// These are **infrastructure errors** (missing rows, lost races, backend
/// failures) as opposed to domain errors (validation, invariants).
///
/// `NotFound` and `Conflict` are kept distinct so the reservation engine can
/// choose between aborting and retrying.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Compare-and-swap lost: the row no longer holds the expected quantity
    /// (or the backend aborted the transaction on a serialization failure).
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// A uniqueness rule was violated (e.g. second stock row for a pair).
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// The backend could not serve the request (connection, timeout, poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be mapped back into a valid domain value, or a
    /// write would break a stored invariant.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn stock_not_found(id: StockEntryId) -> Self {
        Self::NotFound(format!("stock entry {id}"))
    }

    pub fn stale_quantity(expected: ExpectedQuantity, actual: i64) -> Self {
        Self::Conflict(format!("expected quantity {}, found {actual}", expected.value()))
    }
}

/// A ledger append must name the entry's own medicine and pharmacy and book
/// between 1 and the entry's current quantity.
pub(crate) fn check_booking_fits(booking: &NewBooking, entry: &StockEntry) -> Result<(), StoreError> {
    if booking.medicine_id != entry.medicine_id || booking.pharmacy_id != entry.pharmacy_id {
        return Err(StoreError::Corrupt(format!(
            "booking does not match stock entry {}",
            entry.id
        )));
    }
    if booking.quantity <= 0 {
        return Err(StoreError::Corrupt(format!(
            "booking quantity must be positive (got {})",
            booking.quantity
        )));
    }
    if booking.quantity > entry.quantity {
        return Err(StoreError::Corrupt(format!(
            "booking of {} exceeds stock entry {} holding {}",
            booking.quantity, entry.id, entry.quantity
        )));
    }
    Ok(())
}

/// Read access to immutable catalog data (medicines and pharmacies).
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Medicines matching `pattern`, ordered by case-folded name then id, at most `limit`.
    async fn find_medicines(&self, pattern: &NamePattern, limit: usize) -> Result<Vec<Medicine>, StoreError>;

    async fn get_medicine(&self, id: MedicineId) -> Result<Medicine, StoreError>;

    /// Pharmacies for the given ids; unknown ids are skipped.
    async fn get_pharmacies(&self, ids: &[PharmacyId]) -> Result<Vec<Pharmacy>, StoreError>;

    /// All pharmacies, ordered by name.
    async fn list_pharmacies(&self) -> Result<Vec<Pharmacy>, StoreError>;
}

/// Stock rows: the single source of truth for availability.
///
/// `apply_decrement` is the only quantity write on this trait, and it is a
/// compare-and-swap: it succeeds only while the row still holds `expected`.
#[async_trait]
pub trait StockStore: Send + Sync {
    async fn get_stock(&self, entry_id: StockEntryId) -> Result<StockEntry, StoreError>;

    /// Stock rows of one medicine that satisfy `filter`.
    async fn find_entries(&self, medicine_id: MedicineId, filter: &StockFilter) -> Result<Vec<StockEntry>, StoreError>;

    /// Stock rows of several medicines that satisfy `filter`, read in one snapshot.
    async fn find_entries_for_medicines(
        &self,
        medicine_ids: &[MedicineId],
        filter: &StockFilter,
    ) -> Result<Vec<StockEntry>, StoreError>;

    /// The unique row for a (medicine, pharmacy) pair, if any.
    async fn find_entry(&self, medicine_id: MedicineId, pharmacy_id: PharmacyId) -> Result<Option<StockEntry>, StoreError>;

    /// Decrement `amount` units iff the row currently holds `expected`.
    ///
    /// Returns the updated row, `NotFound` if the row is missing, or `Conflict`
    /// if another writer changed it first.
    async fn apply_decrement(
        &self,
        entry_id: StockEntryId,
        amount: i64,
        expected: ExpectedQuantity,
    ) -> Result<StockEntry, StoreError>;
}

/// Append-only record of committed reservations.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Append one confirmed booking. Stock is not decremented; the quantity
    /// must still be positive and fit the row, otherwise `Corrupt`.
    async fn record(&self, booking: NewBooking) -> Result<Booking, StoreError>;

    /// Bookings recorded against one stock row, oldest first.
    async fn bookings_for_entry(&self, entry_id: StockEntryId) -> Result<Vec<Booking>, StoreError>;
}

/// Atomic unit of work behind a reservation.
///
/// Implementations must apply the decrement (with its compare-and-swap check)
/// and append the booking as one unit: both persist or neither does.
#[async_trait]
pub trait ReservationUnit: Send + Sync {
    async fn commit_reservation(&self, decrement: StockDecrement, booking: NewBooking) -> Result<Booking, StoreError>;
}

/// Everything the engine needs from one backend.
pub trait PharmacyStore: CatalogReader + StockStore + BookingLedger + ReservationUnit {}

impl<T> PharmacyStore for T where T: CatalogReader + StockStore + BookingLedger + ReservationUnit + ?Sized {}

#[async_trait]
impl<S> CatalogReader for Arc<S>
where
    S: CatalogReader + ?Sized,
{
    async fn find_medicines(&self, pattern: &NamePattern, limit: usize) -> Result<Vec<Medicine>, StoreError> {
        (**self).find_medicines(pattern, limit).await
    }

    async fn get_medicine(&self, id: MedicineId) -> Result<Medicine, StoreError> {
        (**self).get_medicine(id).await
    }

    async fn get_pharmacies(&self, ids: &[PharmacyId]) -> Result<Vec<Pharmacy>, StoreError> {
        (**self).get_pharmacies(ids).await
    }

    async fn list_pharmacies(&self) -> Result<Vec<Pharmacy>, StoreError> {
        (**self).list_pharmacies().await
    }
}

#[async_trait]
impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    async fn get_stock(&self, entry_id: StockEntryId) -> Result<StockEntry, StoreError> {
        (**self).get_stock(entry_id).await
    }

    async fn find_entries(&self, medicine_id: MedicineId, filter: &StockFilter) -> Result<Vec<StockEntry>, StoreError> {
        (**self).find_entries(medicine_id, filter).await
    }

    async fn find_entries_for_medicines(
        &self,
        medicine_ids: &[MedicineId],
        filter: &StockFilter,
    ) -> Result<Vec<StockEntry>, StoreError> {
        (**self).find_entries_for_medicines(medicine_ids, filter).await
    }

    async fn find_entry(&self, medicine_id: MedicineId, pharmacy_id: PharmacyId) -> Result<Option<StockEntry>, StoreError> {
        (**self).find_entry(medicine_id, pharmacy_id).await
    }

    async fn apply_decrement(
        &self,
        entry_id: StockEntryId,
        amount: i64,
        expected: ExpectedQuantity,
    ) -> Result<StockEntry, StoreError> {
        (**self).apply_decrement(entry_id, amount, expected).await
    }
}

#[async_trait]
impl<S> BookingLedger for Arc<S>
where
    S: BookingLedger + ?Sized,
{
    async fn record(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        (**self).record(booking).await
    }

    async fn bookings_for_entry(&self, entry_id: StockEntryId) -> Result<Vec<Booking>, StoreError> {
        (**self).bookings_for_entry(entry_id).await
    }
}

#[async_trait]
impl<S> ReservationUnit for Arc<S>
where
    S: ReservationUnit + ?Sized,
{
    async fn commit_reservation(&self, decrement: StockDecrement, booking: NewBooking) -> Result<Booking, StoreError> {
        (**self).commit_reservation(decrement, booking).await
    }
}
