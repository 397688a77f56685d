//! JSON seed documents for out-of-band catalog and stock creation.
//!
//! ```json
//! {
//!   "medicines":  [{ "id": "…", "name": "Paracetamol", "referencePrice": 40 }],
//!   "pharmacies": [{ "id": "…", "name": "City Care", "location": "MG Road" }],
//!   "stock":      [{ "medicineId": "…", "pharmacyId": "…", "quantity": 5, "price": 45 }]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use medfind_catalog::{Medicine, Pharmacy, Price};
use medfind_core::{DomainError, MedicineId, PharmacyId, StockEntryId};
use medfind_inventory::StockEntry;

use super::in_memory::InMemoryPharmacyStore;
use super::postgres::{self, PostgresPharmacyStore};
use super::r#trait::StoreError;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed seed document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid seed record: {0}")]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedMedicine {
    pub id: MedicineId,
    pub name: String,
    #[serde(default)]
    pub reference_price: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedPharmacy {
    pub id: PharmacyId,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub operating_hours: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedStock {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<StockEntryId>,
    pub medicine_id: MedicineId,
    pub pharmacy_id: PharmacyId,
    pub quantity: i64,
    pub price: u64,
}

/// A whole seed document. Records are validated by the domain constructors,
/// not by deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub medicines: Vec<SeedMedicine>,
    #[serde(default)]
    pub pharmacies: Vec<SeedPharmacy>,
    #[serde(default)]
    pub stock: Vec<SeedStock>,
}

/// Counts of inserted records, plus those skipped because they were already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub medicines: usize,
    pub pharmacies: usize,
    pub stock_entries: usize,
    pub skipped: usize,
}

impl SeedSummary {
    fn tally(counter: &mut usize, skipped: &mut usize, inserted: bool) {
        if inserted {
            *counter += 1;
        } else {
            *skipped += 1;
        }
    }

    fn log(&self) {
        tracing::info!(
            medicines = self.medicines,
            pharmacies = self.pharmacies,
            stock_entries = self.stock_entries,
            skipped = self.skipped,
            "seed loaded"
        );
    }
}

struct Validated {
    medicines: Vec<Medicine>,
    pharmacies: Vec<Pharmacy>,
    stock: Vec<StockEntry>,
}

impl SeedData {
    pub fn from_json_str(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    fn validate(self) -> Result<Validated, SeedError> {
        let medicines = self
            .medicines
            .into_iter()
            .map(|m| Medicine::new(m.id, m.name, Price::new(m.reference_price)?))
            .collect::<Result<Vec<_>, DomainError>>()?;

        let pharmacies = self
            .pharmacies
            .into_iter()
            .map(|p| Pharmacy::new(p.id, p.name, p.location, p.contact, p.operating_hours))
            .collect::<Result<Vec<_>, DomainError>>()?;

        let stock = self
            .stock
            .into_iter()
            .map(|s| {
                StockEntry::new(
                    s.id.unwrap_or_default(),
                    s.medicine_id,
                    s.pharmacy_id,
                    s.quantity,
                    Price::new(s.price)?,
                )
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(Validated {
            medicines,
            pharmacies,
            stock,
        })
    }
}

impl InMemoryPharmacyStore {
    /// Insert every record of `seed` that is not already present.
    ///
    /// All or nothing: a rejected record leaves the store untouched.
    pub fn load_seed(&self, seed: SeedData) -> Result<SeedSummary, SeedError> {
        let validated = seed.validate()?;

        let summary = self.batch(|batch| {
            let mut summary = SeedSummary::default();
            for medicine in validated.medicines {
                let inserted = batch.medicine(medicine)?;
                SeedSummary::tally(&mut summary.medicines, &mut summary.skipped, inserted);
            }
            for pharmacy in validated.pharmacies {
                let inserted = batch.pharmacy(pharmacy)?;
                SeedSummary::tally(&mut summary.pharmacies, &mut summary.skipped, inserted);
            }
            for entry in validated.stock {
                let inserted = batch.stock_entry(entry)?;
                SeedSummary::tally(&mut summary.stock_entries, &mut summary.skipped, inserted);
            }
            Ok::<_, SeedError>(summary)
        })?;

        summary.log();
        Ok(summary)
    }
}

impl PostgresPharmacyStore {
    /// Insert every record of `seed` that is not already present, in one
    /// transaction. Safe to run on every startup.
    pub async fn load_seed(&self, seed: SeedData) -> Result<SeedSummary, SeedError> {
        let validated = seed.validate()?;
        let mut tx = self.begin("load_seed").await?;

        let outcome = async {
            let mut summary = SeedSummary::default();
            for medicine in &validated.medicines {
                let inserted = postgres::seed_medicine(&mut tx, medicine).await?;
                SeedSummary::tally(&mut summary.medicines, &mut summary.skipped, inserted);
            }
            for pharmacy in &validated.pharmacies {
                let inserted = postgres::seed_pharmacy(&mut tx, pharmacy).await?;
                SeedSummary::tally(&mut summary.pharmacies, &mut summary.skipped, inserted);
            }
            for entry in &validated.stock {
                let inserted = postgres::seed_stock_entry(&mut tx, entry).await?;
                SeedSummary::tally(&mut summary.stock_entries, &mut summary.skipped, inserted);
            }
            Ok::<_, StoreError>(summary)
        }
        .await;

        let summary = match outcome {
            Ok(summary) => {
                tx.commit().await.map_err(|e| postgres::map_sqlx_error("commit_transaction", e))?;
                summary
            }
            Err(err) => {
                tx.rollback().await.map_err(|e| postgres::map_sqlx_error("rollback", e))?;
                return Err(err.into());
            }
        };

        summary.log();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CatalogReader, StockStore};
    use medfind_catalog::NamePattern;

    const MED: &str = "0190c9a0-0000-7000-8000-000000000001";
    const PHARM: &str = "0190c9a0-0000-7000-8000-000000000002";

    fn document(quantity: i64, price: u64) -> String {
        format!(
            r#"{{
                "medicines": [{{ "id": "{MED}", "name": "Paracetamol", "referencePrice": 40 }}],
                "pharmacies": [{{ "id": "{PHARM}", "name": "City Care", "location": "MG Road" }}],
                "stock": [{{ "medicineId": "{MED}", "pharmacyId": "{PHARM}", "quantity": {quantity}, "price": {price} }}]
            }}"#
        )
    }

    #[tokio::test]
    async fn seed_populates_catalog_and_stock() {
        let store = InMemoryPharmacyStore::new();
        let summary = store
            .load_seed(SeedData::from_json_str(&document(5, 45)).unwrap())
            .unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                medicines: 1,
                pharmacies: 1,
                stock_entries: 1,
                skipped: 0,
            }
        );

        let found = store.find_medicines(&NamePattern::parse(Some("para")), 10).await.unwrap();
        assert_eq!(found.len(), 1);

        let entry = store
            .find_entry(MED.parse().unwrap(), PHARM.parse().unwrap())
            .await
            .unwrap()
            .expect("seeded entry");
        assert_eq!(entry.quantity, 5);
        assert_eq!(entry.price, Price::new(45).unwrap());
    }

    #[tokio::test]
    async fn reloading_the_same_seed_skips_what_is_already_there() {
        let store = InMemoryPharmacyStore::new();
        store.load_seed(SeedData::from_json_str(&document(5, 45)).unwrap()).unwrap();

        let again = store
            .load_seed(SeedData::from_json_str(&document(9, 99)).unwrap())
            .unwrap();
        assert_eq!(
            again,
            SeedSummary {
                skipped: 3,
                ..SeedSummary::default()
            }
        );

        let entry = store
            .find_entry(MED.parse().unwrap(), PHARM.parse().unwrap())
            .await
            .unwrap()
            .expect("seeded entry");
        assert_eq!(entry.quantity, 5);
    }

    #[tokio::test]
    async fn a_rejected_record_leaves_nothing_behind() {
        let store = InMemoryPharmacyStore::new();
        let orphan_stock = format!(
            r#"{{
                "medicines": [{{ "id": "{MED}", "name": "Paracetamol", "referencePrice": 40 }}],
                "stock": [{{ "medicineId": "{MED}", "pharmacyId": "{PHARM}", "quantity": 1, "price": 5 }}]
            }}"#
        );

        let err = store.load_seed(SeedData::from_json_str(&orphan_stock).unwrap()).unwrap_err();
        assert!(matches!(err, SeedError::Store(StoreError::NotFound(_))));
        assert!(store.find_medicines(&NamePattern::parse(None), 10).await.unwrap().is_empty());
    }

    /// Runs only when `MEDFIND_TEST_DATABASE_URL` points at a scratch database.
    #[tokio::test]
    async fn postgres_seed_survives_a_restart() {
        let Ok(url) = std::env::var("MEDFIND_TEST_DATABASE_URL") else {
            return;
        };
        let store = PostgresPharmacyStore::connect(&url, &Default::default()).await.unwrap();
        store.migrate().await.unwrap();

        store.load_seed(SeedData::from_json_str(&document(5, 45)).unwrap()).await.unwrap();
        let again = store
            .load_seed(SeedData::from_json_str(&document(5, 45)).unwrap())
            .await
            .unwrap();
        assert_eq!(again.skipped, 3);
        assert!(store.find_entry(MED.parse().unwrap(), PHARM.parse().unwrap()).await.unwrap().is_some());
    }

    #[test]
    fn negative_quantity_is_rejected_before_any_insert() {
        let store = InMemoryPharmacyStore::new();
        let err = store
            .load_seed(SeedData::from_json_str(&document(-1, 45)).unwrap())
            .unwrap_err();
        assert!(matches!(err, SeedError::Invalid(_)));
    }

    #[test]
    fn zero_price_is_rejected() {
        let err = SeedData::from_json_str(&document(3, 0)).unwrap().validate().err();
        assert!(matches!(err, Some(SeedError::Invalid(_))));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        assert!(matches!(SeedData::from_json_str("{ nope"), Err(SeedError::Parse(_))));
    }
}
