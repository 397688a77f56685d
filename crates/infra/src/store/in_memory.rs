use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use medfind_bookings::{Booking, NewBooking};
use medfind_catalog::{Medicine, NamePattern, Pharmacy};
use medfind_core::{BookingId, Entity, ExpectedQuantity, MedicineId, PharmacyId, StockEntryId};
use medfind_inventory::{StockDecrement, StockEntry, StockFilter};

use super::r#trait::{check_booking_fits, BookingLedger, CatalogReader, ReservationUnit, StockStore, StoreError};

#[derive(Debug, Default, Clone)]
struct State {
    medicines: HashMap<MedicineId, Medicine>,
    pharmacies: HashMap<PharmacyId, Pharmacy>,
    stock: HashMap<StockEntryId, StockEntry>,
    pairs: HashMap<(MedicineId, PharmacyId), StockEntryId>,
    bookings: Vec<Booking>,
}

impl State {
    fn decrement(&mut self, entry_id: StockEntryId, amount: i64, expected: ExpectedQuantity) -> Result<StockEntry, StoreError> {
        let entry = self
            .stock
            .get_mut(&entry_id)
            .ok_or_else(|| StoreError::stock_not_found(entry_id))?;

        if !expected.matches(entry.quantity) {
            return Err(StoreError::stale_quantity(expected, entry.quantity));
        }

        let remaining = entry.quantity - amount;
        if amount <= 0 || remaining < 0 {
            // The caller's plan was built from `expected`, so this only trips on a bad plan.
            return Err(StoreError::Corrupt(format!(
                "decrement of {amount} from {} would leave {remaining}",
                entry.quantity
            )));
        }

        entry.quantity = remaining;
        Ok(entry.clone())
    }

    fn append_booking(&mut self, booking: NewBooking) -> Booking {
        let committed = booking.confirm(BookingId::new(), Utc::now());
        self.bookings.push(committed.clone());
        committed
    }

    fn matching_entries(&self, medicine_ids: &[MedicineId], filter: &StockFilter) -> Vec<StockEntry> {
        let mut out: Vec<StockEntry> = self
            .stock
            .values()
            .filter(|e| medicine_ids.contains(&e.medicine_id) && filter.matches(e))
            .cloned()
            .collect();
        out.sort_by_key(|e| (e.price, e.id));
        out
    }

    fn insert_medicine(&mut self, medicine: Medicine) -> Result<(), StoreError> {
        let folded = medicine.name.to_lowercase();
        if self.medicines.values().any(|m| m.name.to_lowercase() == folded) {
            return Err(StoreError::Duplicate(format!("medicine '{}'", medicine.name)));
        }
        insert_new(&mut self.medicines, medicine, "medicine")
    }

    fn insert_pharmacy(&mut self, pharmacy: Pharmacy) -> Result<(), StoreError> {
        insert_new(&mut self.pharmacies, pharmacy, "pharmacy")
    }

    fn insert_stock_entry(&mut self, entry: StockEntry) -> Result<(), StoreError> {
        if !self.medicines.contains_key(&entry.medicine_id) {
            return Err(StoreError::NotFound(format!("medicine {}", entry.medicine_id)));
        }
        if !self.pharmacies.contains_key(&entry.pharmacy_id) {
            return Err(StoreError::NotFound(format!("pharmacy {}", entry.pharmacy_id)));
        }
        let pair = (entry.medicine_id, entry.pharmacy_id);
        if self.pairs.contains_key(&pair) {
            return Err(StoreError::Duplicate(format!(
                "stock entry for medicine {} at pharmacy {}",
                entry.medicine_id, entry.pharmacy_id
            )));
        }
        let id = entry.id;
        insert_new(&mut self.stock, entry, "stock entry")?;
        self.pairs.insert(pair, id);
        Ok(())
    }
}

/// In-memory pharmacy store.
///
/// Intended for tests/dev. One lock guards all tables, so every read sees a
/// single snapshot and a reservation's decrement + ledger append is atomic.
#[derive(Debug, Default)]
pub struct InMemoryPharmacyStore {
    state: RwLock<State>,
}

impl InMemoryPharmacyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    /// Register a medicine (out-of-band catalog creation). Names are unique, ignoring case.
    pub fn insert_medicine(&self, medicine: Medicine) -> Result<(), StoreError> {
        self.write()?.insert_medicine(medicine)
    }

    pub fn insert_pharmacy(&self, pharmacy: Pharmacy) -> Result<(), StoreError> {
        self.write()?.insert_pharmacy(pharmacy)
    }

    /// Register a stock row. Its medicine and pharmacy must exist and the pair must be new.
    pub fn insert_stock_entry(&self, entry: StockEntry) -> Result<(), StoreError> {
        self.write()?.insert_stock_entry(entry)
    }

    /// Run `work` against a copy of the tables and publish the copy only if it succeeds.
    pub(super) fn batch<T, E>(&self, work: impl FnOnce(&mut SeedBatch<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut state = self.write()?;
        let mut staged = state.clone();
        let out = work(&mut SeedBatch { state: &mut staged })?;
        *state = staged;
        Ok(out)
    }
}

/// Staged inserts for a seed load. Records that are already present are
/// skipped (`Ok(false)`): medicines and pharmacies by id, stock by pair.
pub(super) struct SeedBatch<'a> {
    state: &'a mut State,
}

impl SeedBatch<'_> {
    pub(super) fn medicine(&mut self, medicine: Medicine) -> Result<bool, StoreError> {
        if self.state.medicines.contains_key(&medicine.id) {
            return Ok(false);
        }
        self.state.insert_medicine(medicine).map(|()| true)
    }

    pub(super) fn pharmacy(&mut self, pharmacy: Pharmacy) -> Result<bool, StoreError> {
        if self.state.pharmacies.contains_key(&pharmacy.id) {
            return Ok(false);
        }
        self.state.insert_pharmacy(pharmacy).map(|()| true)
    }

    pub(super) fn stock_entry(&mut self, entry: StockEntry) -> Result<bool, StoreError> {
        if self.state.pairs.contains_key(&(entry.medicine_id, entry.pharmacy_id)) {
            return Ok(false);
        }
        self.state.insert_stock_entry(entry).map(|()| true)
    }
}

fn insert_new<E: Entity>(table: &mut HashMap<E::Id, E>, record: E, kind: &str) -> Result<(), StoreError> {
    let id = *record.id();
    if table.contains_key(&id) {
        return Err(StoreError::Duplicate(format!("{kind} {id}")));
    }
    table.insert(id, record);
    Ok(())
}

#[async_trait]
impl CatalogReader for InMemoryPharmacyStore {
    async fn find_medicines(&self, pattern: &NamePattern, limit: usize) -> Result<Vec<Medicine>, StoreError> {
        let state = self.read()?;
        let mut found: Vec<Medicine> = state
            .medicines
            .values()
            .filter(|m| pattern.matches(&m.name))
            .cloned()
            .collect();
        found.sort_by_key(Medicine::sort_key);
        found.truncate(limit);
        Ok(found)
    }

    async fn get_medicine(&self, id: MedicineId) -> Result<Medicine, StoreError> {
        let state = self.read()?;
        state
            .medicines
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("medicine {id}")))
    }

    async fn get_pharmacies(&self, ids: &[PharmacyId]) -> Result<Vec<Pharmacy>, StoreError> {
        let state = self.read()?;
        Ok(ids.iter().filter_map(|id| state.pharmacies.get(id).cloned()).collect())
    }

    async fn list_pharmacies(&self) -> Result<Vec<Pharmacy>, StoreError> {
        let state = self.read()?;
        let mut all: Vec<Pharmacy> = state.pharmacies.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(all)
    }
}

#[async_trait]
impl StockStore for InMemoryPharmacyStore {
    async fn get_stock(&self, entry_id: StockEntryId) -> Result<StockEntry, StoreError> {
        let state = self.read()?;
        state
            .stock
            .get(&entry_id)
            .cloned()
            .ok_or_else(|| StoreError::stock_not_found(entry_id))
    }

    async fn find_entries(&self, medicine_id: MedicineId, filter: &StockFilter) -> Result<Vec<StockEntry>, StoreError> {
        let state = self.read()?;
        Ok(state.matching_entries(&[medicine_id], filter))
    }

    async fn find_entries_for_medicines(
        &self,
        medicine_ids: &[MedicineId],
        filter: &StockFilter,
    ) -> Result<Vec<StockEntry>, StoreError> {
        let state = self.read()?;
        Ok(state.matching_entries(medicine_ids, filter))
    }

    async fn find_entry(&self, medicine_id: MedicineId, pharmacy_id: PharmacyId) -> Result<Option<StockEntry>, StoreError> {
        let state = self.read()?;
        Ok(state
            .pairs
            .get(&(medicine_id, pharmacy_id))
            .and_then(|id| state.stock.get(id))
            .cloned())
    }

    async fn apply_decrement(
        &self,
        entry_id: StockEntryId,
        amount: i64,
        expected: ExpectedQuantity,
    ) -> Result<StockEntry, StoreError> {
        let mut state = self.write()?;
        state.decrement(entry_id, amount, expected)
    }
}

#[async_trait]
impl BookingLedger for InMemoryPharmacyStore {
    async fn record(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let mut state = self.write()?;
        let entry = state
            .stock
            .get(&booking.stock_entry_id)
            .ok_or_else(|| StoreError::stock_not_found(booking.stock_entry_id))?;
        check_booking_fits(&booking, entry)?;
        Ok(state.append_booking(booking))
    }

    async fn bookings_for_entry(&self, entry_id: StockEntryId) -> Result<Vec<Booking>, StoreError> {
        let state = self.read()?;
        Ok(state
            .bookings
            .iter()
            .filter(|b| b.stock_entry_id == entry_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReservationUnit for InMemoryPharmacyStore {
    async fn commit_reservation(&self, decrement: StockDecrement, booking: NewBooking) -> Result<Booking, StoreError> {
        if booking.stock_entry_id != decrement.entry_id || booking.quantity != decrement.amount {
            return Err(StoreError::Corrupt("booking does not match its stock decrement".to_string()));
        }

        // Both writes happen under one write guard; a failed decrement leaves no booking.
        let mut state = self.write()?;
        state.decrement(decrement.entry_id, decrement.amount, decrement.expected)?;
        Ok(state.append_booking(booking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medfind_catalog::Price;
    use medfind_core::UserId;

    struct Fixture {
        store: InMemoryPharmacyStore,
        medicine: Medicine,
        pharmacy: Pharmacy,
        entry: StockEntry,
    }

    fn fixture(quantity: i64) -> Fixture {
        let store = InMemoryPharmacyStore::new();
        let medicine = Medicine::new(MedicineId::new(), "Paracetamol", Price::new(40).unwrap()).unwrap();
        let pharmacy = Pharmacy::new(PharmacyId::new(), "City Care", "MG Road", "080-1234", "9am-9pm").unwrap();
        let entry = StockEntry::new(
            StockEntryId::new(),
            medicine.id,
            pharmacy.id,
            quantity,
            Price::new(45).unwrap(),
        )
        .unwrap();
        store.insert_medicine(medicine.clone()).unwrap();
        store.insert_pharmacy(pharmacy.clone()).unwrap();
        store.insert_stock_entry(entry.clone()).unwrap();
        Fixture {
            store,
            medicine,
            pharmacy,
            entry,
        }
    }

    fn user() -> UserId {
        UserId::parse("user-1").unwrap()
    }

    #[tokio::test]
    async fn decrement_applies_when_expected_quantity_matches() {
        let f = fixture(5);
        let updated = f
            .store
            .apply_decrement(f.entry.id, 3, ExpectedQuantity::new(5))
            .await
            .unwrap();
        assert_eq!(updated.quantity, 2);
        assert_eq!(f.store.get_stock(f.entry.id).await.unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn stale_expectation_is_a_conflict_and_changes_nothing() {
        let f = fixture(5);
        let err = f
            .store
            .apply_decrement(f.entry.id, 1, ExpectedQuantity::new(4))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(msg) if msg.contains("expected quantity 4, found 5")));
        assert_eq!(f.store.get_stock(f.entry.id).await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn missing_row_is_not_found_rather_than_conflict() {
        let f = fixture(5);
        let err = f
            .store
            .apply_decrement(StockEntryId::new(), 1, ExpectedQuantity::new(5))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_commit_leaves_no_booking() {
        let f = fixture(5);
        let stale = StockDecrement {
            entry_id: f.entry.id,
            amount: 2,
            expected: ExpectedQuantity::new(7),
        };
        let err = f
            .store
            .commit_reservation(stale, NewBooking::for_entry(user(), &f.entry, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(f.store.bookings_for_entry(f.entry.id).await.unwrap().is_empty());
        assert_eq!(f.store.get_stock(f.entry.id).await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn commit_decrements_and_appends_together() {
        let f = fixture(5);
        let plan = f.entry.plan_decrement(2).unwrap();
        let booking = f
            .store
            .commit_reservation(plan, NewBooking::for_entry(user(), &f.entry, 2))
            .await
            .unwrap();

        assert_eq!(booking.quantity, 2);
        assert_eq!(booking.pharmacy_id, f.pharmacy.id);
        assert_eq!(booking.medicine_id, f.medicine.id);
        assert_eq!(f.store.get_stock(f.entry.id).await.unwrap().quantity, 3);
        assert_eq!(f.store.bookings_for_entry(f.entry.id).await.unwrap(), vec![booking]);
    }

    #[tokio::test]
    async fn second_row_for_the_same_pair_is_rejected() {
        let f = fixture(5);
        let dup = StockEntry::new(
            StockEntryId::new(),
            f.medicine.id,
            f.pharmacy.id,
            10,
            Price::new(50).unwrap(),
        )
        .unwrap();
        assert!(matches!(f.store.insert_stock_entry(dup), Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn stock_for_unknown_medicine_is_rejected() {
        let f = fixture(5);
        let orphan = StockEntry::new(
            StockEntryId::new(),
            MedicineId::new(),
            f.pharmacy.id,
            1,
            Price::new(5).unwrap(),
        )
        .unwrap();
        assert!(matches!(f.store.insert_stock_entry(orphan), Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn record_appends_a_valid_booking_without_touching_stock() {
        let f = fixture(5);
        let booking = f.store.record(NewBooking::for_entry(user(), &f.entry, 5)).await.unwrap();

        assert_eq!(booking.quantity, 5);
        assert_eq!(booking.status, medfind_bookings::BookingStatus::Confirmed);
        assert_eq!(f.store.bookings_for_entry(f.entry.id).await.unwrap(), vec![booking]);
        assert_eq!(f.store.get_stock(f.entry.id).await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn record_rejects_quantities_outside_the_stock_row() {
        let f = fixture(5);
        for quantity in [0, -7, 6, 50] {
            let err = f
                .store
                .record(NewBooking::for_entry(user(), &f.entry, quantity))
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::Corrupt(_)), "quantity {quantity}: {err:?}");
        }
        assert!(f.store.bookings_for_entry(f.entry.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_for_unknown_entry_is_not_found() {
        let f = fixture(5);
        let mut orphan = NewBooking::for_entry(user(), &f.entry, 1);
        orphan.stock_entry_id = StockEntryId::new();
        assert!(matches!(f.store.record(orphan).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn find_entry_resolves_the_pair() {
        let f = fixture(5);
        let found = f.store.find_entry(f.medicine.id, f.pharmacy.id).await.unwrap();
        assert_eq!(found, Some(f.entry.clone()));
        assert_eq!(f.store.find_entry(f.medicine.id, PharmacyId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn medicine_names_are_unique_ignoring_case() {
        let f = fixture(1);
        let twin = Medicine::new(MedicineId::new(), "PARACETAMOL", Price::ZERO).unwrap();
        assert!(matches!(f.store.insert_medicine(twin), Err(StoreError::Duplicate(_))));
    }
}
