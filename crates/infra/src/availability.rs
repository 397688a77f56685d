//! Availability search: medicines by name, joined with the pharmacy stock that
//! passes the caller's filter.
//!
//! Read-only. Stock for all matched medicines is read in one store call, so
//! one search reflects one stock snapshot; catalog rows are immutable and are
//! read separately.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{Span, instrument};

use medfind_catalog::{Medicine, NamePattern, Pharmacy, Price};
use medfind_core::{DomainError, MedicineId, PharmacyId, StockEntryId};
use medfind_inventory::{StockEntry, StockFilter};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::{CatalogReader, StockStore};

/// Search input. Absent bounds take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub name_pattern: Option<String>,
    #[serde(default)]
    pub min_stock: Option<i64>,
    #[serde(default)]
    pub min_price: Option<i64>,
    #[serde(default)]
    pub max_price: Option<i64>,
}

impl SearchRequest {
    pub fn named(pattern: impl Into<String>) -> Self {
        Self {
            name_pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, min_stock: i64, min_price: i64, max_price: i64) -> Self {
        self.min_stock = Some(min_stock);
        self.min_price = Some(min_price);
        self.max_price = Some(max_price);
        self
    }
}

/// A stock row that passed the filter, joined with its pharmacy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyOffer {
    pub pharmacy: Pharmacy,
    pub stock_entry_id: StockEntryId,
    pub quantity: i64,
    pub price: Price,
}

/// One matched medicine and its qualifying offers (possibly none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineMatch {
    pub medicine: Medicine,
    pub offers: Vec<PharmacyOffer>,
}

/// Read-only search over a catalog and a stock store.
#[derive(Debug, Clone)]
pub struct AvailabilitySearch<S> {
    store: S,
    limit: usize,
}

impl<S> AvailabilitySearch<S>
where
    S: CatalogReader + StockStore,
{
    pub fn new(store: S, config: &EngineConfig) -> Self {
        Self {
            store,
            limit: config.search_limit.max(1),
        }
    }

    /// Medicines are ordered by case-folded name then id; offers by price,
    /// then pharmacy name, then stock entry id.
    #[instrument(
        name = "availability_search",
        skip(self, request),
        fields(
            pattern = tracing::field::Empty,
            medicines = tracing::field::Empty,
            offers = tracing::field::Empty
        ),
        err
    )]
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<MedicineMatch>, EngineError> {
        // Bounds are checked before any storage access.
        let filter = StockFilter::from_bounds(request.min_stock, request.min_price, request.max_price)
            .map_err(invalid_filter)?;
        let pattern = NamePattern::parse(request.name_pattern.as_deref());

        let span = Span::current();
        span.record("pattern", tracing::field::display(&pattern));

        let medicines = self.store.find_medicines(&pattern, self.limit).await?;
        if medicines.is_empty() {
            span.record("medicines", 0);
            span.record("offers", 0);
            return Ok(vec![]);
        }

        let medicine_ids: Vec<MedicineId> = medicines.iter().map(|m| m.id).collect();
        let entries = self.store.find_entries_for_medicines(&medicine_ids, &filter).await?;

        let pharmacies = self.pharmacies_for(&entries).await?;
        let matches = assemble(medicines, entries, &filter, &pharmacies)?;

        span.record("medicines", matches.len());
        span.record("offers", matches.iter().map(|m| m.offers.len()).sum::<usize>());
        Ok(matches)
    }

    async fn pharmacies_for(&self, entries: &[StockEntry]) -> Result<HashMap<PharmacyId, Pharmacy>, EngineError> {
        let mut seen = HashSet::new();
        let ids: Vec<PharmacyId> = entries
            .iter()
            .map(|e| e.pharmacy_id)
            .filter(|id| seen.insert(*id))
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let pharmacies = self.store.get_pharmacies(&ids).await?;
        Ok(pharmacies.into_iter().map(|p| (p.id, p)).collect())
    }
}

fn invalid_filter(err: DomainError) -> EngineError {
    EngineError::InvalidFilter(err.message().to_string())
}

fn assemble(
    medicines: Vec<Medicine>,
    entries: Vec<StockEntry>,
    filter: &StockFilter,
    pharmacies: &HashMap<PharmacyId, Pharmacy>,
) -> Result<Vec<MedicineMatch>, EngineError> {
    let mut by_medicine: HashMap<MedicineId, Vec<PharmacyOffer>> = HashMap::new();

    for entry in entries {
        // Stores filter already; rows that slipped through are dropped.
        if !filter.matches(&entry) {
            continue;
        }
        let pharmacy = pharmacies.get(&entry.pharmacy_id).cloned().ok_or_else(|| {
            EngineError::StoreUnavailable(format!(
                "stock entry {} references unknown pharmacy {}",
                entry.id, entry.pharmacy_id
            ))
        })?;
        by_medicine.entry(entry.medicine_id).or_default().push(PharmacyOffer {
            pharmacy,
            stock_entry_id: entry.id,
            quantity: entry.quantity,
            price: entry.price,
        });
    }

    Ok(medicines
        .into_iter()
        .map(|medicine| {
            let mut offers = by_medicine.remove(&medicine.id).unwrap_or_default();
            offers.sort_by(|a, b| {
                a.price
                    .cmp(&b.price)
                    .then_with(|| a.pharmacy.name.cmp(&b.pharmacy.name))
                    .then_with(|| a.stock_entry_id.cmp(&b.stock_entry_id))
            });
            MedicineMatch { medicine, offers }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use proptest::prelude::*;

    use medfind_core::ExpectedQuantity;

    use super::*;
    use crate::store::{InMemoryPharmacyStore, StoreError};

    fn price(units: u64) -> Price {
        Price::new(units).unwrap()
    }

    fn add_medicine(store: &InMemoryPharmacyStore, name: &str) -> Medicine {
        let medicine = Medicine::new(MedicineId::new(), name, price(10)).unwrap();
        store.insert_medicine(medicine.clone()).unwrap();
        medicine
    }

    fn add_pharmacy(store: &InMemoryPharmacyStore, name: &str) -> Pharmacy {
        let pharmacy = Pharmacy::new(PharmacyId::new(), name, "", "", "").unwrap();
        store.insert_pharmacy(pharmacy.clone()).unwrap();
        pharmacy
    }

    fn add_stock(store: &InMemoryPharmacyStore, m: &Medicine, p: &Pharmacy, quantity: i64, units: u64) -> StockEntry {
        let entry = StockEntry::new(StockEntryId::new(), m.id, p.id, quantity, price(units)).unwrap();
        store.insert_stock_entry(entry.clone()).unwrap();
        entry
    }

    fn engine(store: Arc<InMemoryPharmacyStore>) -> AvailabilitySearch<Arc<InMemoryPharmacyStore>> {
        AvailabilitySearch::new(store, &EngineConfig::default())
    }

    #[tokio::test]
    async fn medicine_without_qualifying_offers_is_still_returned() {
        let store = Arc::new(InMemoryPharmacyStore::new());
        let para = add_medicine(&store, "Paracetamol");
        let city = add_pharmacy(&store, "City Care");
        add_stock(&store, &para, &city, 5, 150);

        let results = engine(store)
            .search(&SearchRequest::named("Para").with_bounds(1, 0, 100))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].medicine.id, para.id);
        assert!(results[0].offers.is_empty());
    }

    #[tokio::test]
    async fn prefix_match_ignores_case_and_respects_the_cap() {
        let store = Arc::new(InMemoryPharmacyStore::new());
        add_medicine(&store, "Paracetamol");
        add_medicine(&store, "Pantoprazole");
        add_medicine(&store, "Ibuprofen");
        for i in 0..12 {
            add_medicine(&store, &format!("Zinc {i:02}"));
        }
        let search = engine(store);

        let names: Vec<String> = search
            .search(&SearchRequest::named("pA"))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.medicine.name)
            .collect();
        assert_eq!(names, vec!["Pantoprazole", "Paracetamol"]);

        assert_eq!(search.search(&SearchRequest::named("zinc")).await.unwrap().len(), 10);
        assert_eq!(search.search(&SearchRequest::default()).await.unwrap().len(), 10);
        assert_eq!(search.search(&SearchRequest::named("   ")).await.unwrap().len(), 10);
        assert!(search.search(&SearchRequest::named("Aspirin")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offers_are_ordered_by_price_then_pharmacy_name() {
        let store = Arc::new(InMemoryPharmacyStore::new());
        let para = add_medicine(&store, "Paracetamol");
        let beta = add_pharmacy(&store, "Beta Pharma");
        let alpha = add_pharmacy(&store, "Alpha Meds");
        let cheap = add_pharmacy(&store, "Zed Discount");
        add_stock(&store, &para, &beta, 3, 50);
        add_stock(&store, &para, &alpha, 8, 50);
        add_stock(&store, &para, &cheap, 1, 20);

        let results = engine(store).search(&SearchRequest::named("para")).await.unwrap();
        let order: Vec<&str> = results[0].offers.iter().map(|o| o.pharmacy.name.as_str()).collect();
        assert_eq!(order, vec!["Zed Discount", "Alpha Meds", "Beta Pharma"]);
    }

    #[tokio::test]
    async fn identical_searches_return_identical_results() {
        let store = Arc::new(InMemoryPharmacyStore::new());
        let para = add_medicine(&store, "Paracetamol");
        let parox = add_medicine(&store, "Paroxetine");
        for name in ["A", "B", "C"] {
            let p = add_pharmacy(&store, name);
            add_stock(&store, &para, &p, 4, 30);
            add_stock(&store, &parox, &p, 2, 90);
        }
        let search = engine(store);
        let request = SearchRequest::named("par").with_bounds(1, 0, 100);

        let first = search.search(&request).await.unwrap();
        let second = search.search(&request).await.unwrap();
        assert_eq!(first, second);
    }

    /// A store that counts calls and fails every one of them.
    #[derive(Default)]
    struct DownStore {
        calls: AtomicUsize,
    }

    impl DownStore {
        fn fail<T>(&self) -> Result<T, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[async_trait]
    impl CatalogReader for DownStore {
        async fn find_medicines(&self, _: &NamePattern, _: usize) -> Result<Vec<Medicine>, StoreError> {
            self.fail()
        }
        async fn get_medicine(&self, _: MedicineId) -> Result<Medicine, StoreError> {
            self.fail()
        }
        async fn get_pharmacies(&self, _: &[PharmacyId]) -> Result<Vec<Pharmacy>, StoreError> {
            self.fail()
        }
        async fn list_pharmacies(&self) -> Result<Vec<Pharmacy>, StoreError> {
            self.fail()
        }
    }

    #[async_trait]
    impl StockStore for DownStore {
        async fn get_stock(&self, _: StockEntryId) -> Result<StockEntry, StoreError> {
            self.fail()
        }
        async fn find_entries(&self, _: MedicineId, _: &StockFilter) -> Result<Vec<StockEntry>, StoreError> {
            self.fail()
        }
        async fn find_entries_for_medicines(&self, _: &[MedicineId], _: &StockFilter) -> Result<Vec<StockEntry>, StoreError> {
            self.fail()
        }
        async fn find_entry(&self, _: MedicineId, _: PharmacyId) -> Result<Option<StockEntry>, StoreError> {
            self.fail()
        }
        async fn apply_decrement(&self, _: StockEntryId, _: i64, _: ExpectedQuantity) -> Result<StockEntry, StoreError> {
            self.fail()
        }
    }

    #[tokio::test]
    async fn bad_bounds_fail_before_storage_is_touched() {
        let store = Arc::new(DownStore::default());
        let search = AvailabilitySearch::new(store.clone(), &EngineConfig::default());

        let err = search
            .search(&SearchRequest::named("para").with_bounds(0, 100, 50))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidFilter(ref msg) if msg.contains("maxPrice")));

        let err = search
            .search(&SearchRequest::named("para").with_bounds(-1, 0, 50))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidFilter(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);

        let err = search.search(&SearchRequest::named("para")).await.unwrap_err();
        assert!(matches!(err, EngineError::StoreUnavailable(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

        #[test]
        fn every_offer_satisfies_the_filter(
            stock in prop::collection::vec((0i64..20, 1u64..300), 1..12),
            min_stock in 0i64..20,
            min_price in 0i64..300,
            span in 0i64..300,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let store = Arc::new(InMemoryPharmacyStore::new());
            let med = add_medicine(&store, "Paracetamol");
            for (i, (quantity, units)) in stock.iter().enumerate() {
                let p = add_pharmacy(&store, &format!("Pharmacy {i}"));
                add_stock(&store, &med, &p, *quantity, *units);
            }
            let max_price = min_price + span;

            let results = runtime
                .block_on(engine(store).search(&SearchRequest::named("para").with_bounds(min_stock, min_price, max_price)))
                .unwrap();

            prop_assert_eq!(results.len(), 1);
            let offers = &results[0].offers;
            for offer in offers {
                prop_assert!(offer.quantity >= min_stock);
                prop_assert!(offer.price.as_i64() >= min_price && offer.price.as_i64() <= max_price);
            }
            let expected = stock
                .iter()
                .filter(|(q, u)| *q >= min_stock && (*u as i64) >= min_price && (*u as i64) <= max_price)
                .count();
            prop_assert_eq!(offers.len(), expected);
        }
    }
}
