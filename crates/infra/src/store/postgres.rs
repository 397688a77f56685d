//! Postgres-backed pharmacy store.
//!
//! Stock, catalog and the booking ledger live in the tables created by
//! `migrations/0001_pharmacy_stock.sql`.
//!
//! ## Compare-and-swap
//!
//! A decrement is a single conditional statement:
//!
//! ```sql
//! UPDATE stock_entries SET quantity = quantity - $amount
//! WHERE stock_id = $id AND quantity = $expected
//! ```
//!
//! Under READ COMMITTED a concurrent writer blocks on the row lock and then
//! re-evaluates the `WHERE` clause against the committed row, so a stale
//! expectation updates zero rows instead of overwriting. A follow-up read
//! distinguishes a missing row (`NotFound`) from a lost race (`Conflict`).
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | Database (check violation) | `23514` | `Corrupt` |
//! | Database (serialization failure / deadlock) | `40001` / `40P01` | `Conflict` |
//! | Database (other) | any other | `Unavailable` |
//! | PoolTimedOut / PoolClosed / Io / Tls | N/A | `Unavailable` |
//! | ColumnDecode / Decode | N/A | `Corrupt` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{instrument, Span};
use uuid::Uuid;

use medfind_bookings::{Booking, BookingStatus, NewBooking};
use medfind_catalog::{Medicine, NamePattern, Pharmacy, Price};
use medfind_core::{BookingId, ExpectedQuantity, MedicineId, PharmacyId, StockEntryId, UserId};
use medfind_inventory::{StockDecrement, StockEntry, StockFilter};

use super::r#trait::{check_booking_fits, BookingLedger, CatalogReader, ReservationUnit, StockStore, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_pharmacy_stock.sql");

/// Connection settings for [`PostgresPharmacyStore::connect`].
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    pub max_connections: u32,
    /// Waiting longer than this for a pooled connection surfaces as `Unavailable`.
    pub acquire_timeout: Duration,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Postgres-backed store for catalog, stock and bookings.
///
/// Uses the SQLx connection pool, so it is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresPharmacyStore {
    pool: Arc<PgPool>,
}

impl PostgresPharmacyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    pub async fn connect(database_url: &str, options: &PostgresOptions) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables, indexes and the append-only trigger (idempotent).
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    #[instrument(skip(self, medicine), fields(medicine_id = %medicine.id), err)]
    pub async fn insert_medicine(&self, medicine: &Medicine) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO medicines (medicine_id, name, reference_price) VALUES ($1, $2, $3)")
            .bind(medicine.id.as_uuid())
            .bind(&medicine.name)
            .bind(medicine.reference_price.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_medicine", e))?;
        Ok(())
    }

    #[instrument(skip(self, pharmacy), fields(pharmacy_id = %pharmacy.id), err)]
    pub async fn insert_pharmacy(&self, pharmacy: &Pharmacy) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO pharmacies (pharmacy_id, name, location, contact, operating_hours)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(pharmacy.id.as_uuid())
        .bind(&pharmacy.name)
        .bind(&pharmacy.location)
        .bind(&pharmacy.contact)
        .bind(&pharmacy.operating_hours)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_pharmacy", e))?;
        Ok(())
    }

    /// Register a stock row. A second row for the same pair fails with `Duplicate`.
    #[instrument(skip(self, entry), fields(stock_id = %entry.id), err)]
    pub async fn insert_stock_entry(&self, entry: &StockEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO stock_entries (stock_id, medicine_id, pharmacy_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.medicine_id.as_uuid())
        .bind(entry.pharmacy_id.as_uuid())
        .bind(entry.quantity)
        .bind(entry.price.as_i64())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_stock_entry", e))?;
        Ok(())
    }

    pub(super) async fn begin(&self, operation: &str) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool.begin().await.map_err(|e| map_sqlx_error(operation, e))
    }
}

#[async_trait]
impl CatalogReader for PostgresPharmacyStore {
    #[instrument(skip(self), fields(pattern = %pattern, found = tracing::field::Empty), err)]
    async fn find_medicines(&self, pattern: &NamePattern, limit: usize) -> Result<Vec<Medicine>, StoreError> {
        let like = pattern.prefix().map(|p| format!("{}%", escape_like(p)));

        let rows = sqlx::query(
            r#"
            SELECT medicine_id, name, reference_price
            FROM medicines
            WHERE ($1::text IS NULL OR lower(name) LIKE $1 ESCAPE '\')
            ORDER BY lower(name) ASC, medicine_id ASC
            LIMIT $2
            "#,
        )
        .bind(like)
        .bind(sql_limit(limit))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_medicines", e))?;

        let medicines = rows
            .iter()
            .map(|row| MedicineRow::from_row(row).map_err(|e| map_sqlx_error("find_medicines", e))?.try_into())
            .collect::<Result<Vec<Medicine>, StoreError>>()?;

        Span::current().record("found", medicines.len());
        Ok(medicines)
    }

    #[instrument(skip(self), err)]
    async fn get_medicine(&self, id: MedicineId) -> Result<Medicine, StoreError> {
        let row = sqlx::query("SELECT medicine_id, name, reference_price FROM medicines WHERE medicine_id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_medicine", e))?
            .ok_or_else(|| StoreError::NotFound(format!("medicine {id}")))?;

        MedicineRow::from_row(&row)
            .map_err(|e| map_sqlx_error("get_medicine", e))?
            .try_into()
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    async fn get_pharmacies(&self, ids: &[PharmacyId]) -> Result<Vec<Pharmacy>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let rows = sqlx::query(
            r#"
            SELECT pharmacy_id, name, location, contact, operating_hours
            FROM pharmacies
            WHERE pharmacy_id = ANY($1)
            ORDER BY name ASC, pharmacy_id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_pharmacies", e))?;

        rows.iter()
            .map(|row| PharmacyRow::from_row(row).map_err(|e| map_sqlx_error("get_pharmacies", e))?.try_into())
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn list_pharmacies(&self) -> Result<Vec<Pharmacy>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT pharmacy_id, name, location, contact, operating_hours
            FROM pharmacies
            ORDER BY name ASC, pharmacy_id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_pharmacies", e))?;

        rows.iter()
            .map(|row| PharmacyRow::from_row(row).map_err(|e| map_sqlx_error("list_pharmacies", e))?.try_into())
            .collect()
    }
}

#[async_trait]
impl StockStore for PostgresPharmacyStore {
    #[instrument(skip(self), fields(stock_id = %entry_id), err)]
    async fn get_stock(&self, entry_id: StockEntryId) -> Result<StockEntry, StoreError> {
        let row = sqlx::query(
            "SELECT stock_id, medicine_id, pharmacy_id, quantity, price FROM stock_entries WHERE stock_id = $1",
        )
        .bind(entry_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_stock", e))?
        .ok_or_else(|| StoreError::stock_not_found(entry_id))?;

        StockRow::from_row(&row).map_err(|e| map_sqlx_error("get_stock", e))?.try_into()
    }

    async fn find_entries(&self, medicine_id: MedicineId, filter: &StockFilter) -> Result<Vec<StockEntry>, StoreError> {
        self.find_entries_for_medicines(&[medicine_id], filter).await
    }

    /// One statement, so every row comes from the same snapshot.
    #[instrument(skip(self, medicine_ids, filter), fields(medicines = medicine_ids.len(), found = tracing::field::Empty), err)]
    async fn find_entries_for_medicines(
        &self,
        medicine_ids: &[MedicineId],
        filter: &StockFilter,
    ) -> Result<Vec<StockEntry>, StoreError> {
        if medicine_ids.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<Uuid> = medicine_ids.iter().map(|id| *id.as_uuid()).collect();

        let rows = sqlx::query(
            r#"
            SELECT stock_id, medicine_id, pharmacy_id, quantity, price
            FROM stock_entries
            WHERE medicine_id = ANY($1)
                AND quantity >= $2
                AND price >= $3
                AND price <= $4
            ORDER BY price ASC, stock_id ASC
            "#,
        )
        .bind(&ids)
        .bind(filter.min_stock())
        .bind(filter.min_price().as_i64())
        .bind(filter.max_price().as_i64())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_entries", e))?;

        let entries = rows
            .iter()
            .map(|row| StockRow::from_row(row).map_err(|e| map_sqlx_error("find_entries", e))?.try_into())
            .collect::<Result<Vec<StockEntry>, StoreError>>()?;

        Span::current().record("found", entries.len());
        Ok(entries)
    }

    #[instrument(skip(self), err)]
    async fn find_entry(&self, medicine_id: MedicineId, pharmacy_id: PharmacyId) -> Result<Option<StockEntry>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT stock_id, medicine_id, pharmacy_id, quantity, price
            FROM stock_entries
            WHERE medicine_id = $1 AND pharmacy_id = $2
            "#,
        )
        .bind(medicine_id.as_uuid())
        .bind(pharmacy_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_entry", e))?;

        row.map(|r| StockRow::from_row(&r).map_err(|e| map_sqlx_error("find_entry", e))?.try_into())
            .transpose()
    }

    #[instrument(skip(self), fields(stock_id = %entry_id, expected = expected.value()), err)]
    async fn apply_decrement(
        &self,
        entry_id: StockEntryId,
        amount: i64,
        expected: ExpectedQuantity,
    ) -> Result<StockEntry, StoreError> {
        let mut tx = self.begin("apply_decrement").await?;

        match decrement_in(&mut tx, entry_id, amount, expected).await {
            Ok(entry) => {
                tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;
                Ok(entry)
            }
            Err(err) => {
                tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
                Err(err)
            }
        }
    }
}

#[async_trait]
impl BookingLedger for PostgresPharmacyStore {
    #[instrument(skip(self, booking), fields(stock_id = %booking.stock_entry_id), err)]
    async fn record(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let mut tx = self.begin("record_booking").await?;

        let outcome = async {
            let entry = stock_for_share(&mut tx, booking.stock_entry_id).await?;
            check_booking_fits(&booking, &entry)?;
            record_in(&mut tx, booking).await
        }
        .await;

        match outcome {
            Ok(committed) => {
                tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;
                Ok(committed)
            }
            Err(err) => {
                tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
                Err(err)
            }
        }
    }

    #[instrument(skip(self), fields(stock_id = %entry_id), err)]
    async fn bookings_for_entry(&self, entry_id: StockEntryId) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT booking_id, user_id, stock_id, medicine_id, pharmacy_id, quantity, status, created_at
            FROM bookings
            WHERE stock_id = $1
            ORDER BY created_at ASC, booking_id ASC
            "#,
        )
        .bind(entry_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("bookings_for_entry", e))?;

        rows.iter()
            .map(|row| BookingRow::from_row(row).map_err(|e| map_sqlx_error("bookings_for_entry", e))?.try_into())
            .collect()
    }
}

#[async_trait]
impl ReservationUnit for PostgresPharmacyStore {
    /// Decrement and ledger append share one transaction.
    #[instrument(
        skip(self, decrement, booking),
        fields(
            stock_id = %decrement.entry_id,
            amount = decrement.amount,
            expected = decrement.expected.value()
        ),
        err
    )]
    async fn commit_reservation(&self, decrement: StockDecrement, booking: NewBooking) -> Result<Booking, StoreError> {
        if booking.stock_entry_id != decrement.entry_id || booking.quantity != decrement.amount {
            return Err(StoreError::Corrupt("booking does not match its stock decrement".to_string()));
        }

        let mut tx = self.begin("commit_reservation").await?;

        let outcome = async {
            decrement_in(&mut tx, decrement.entry_id, decrement.amount, decrement.expected).await?;
            record_in(&mut tx, booking).await
        }
        .await;

        match outcome {
            Ok(committed) => {
                tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;
                Ok(committed)
            }
            Err(err) => {
                tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
                Err(err)
            }
        }
    }
}

/// Seed inserts. Rows already present are skipped (`Ok(false)`): medicines
/// and pharmacies by id, stock by (medicine, pharmacy) pair. A medicine whose
/// name collides with a different id still fails with `Duplicate`.
pub(super) async fn seed_medicine(tx: &mut Transaction<'_, Postgres>, medicine: &Medicine) -> Result<bool, StoreError> {
    let done = sqlx::query(
        r#"
        INSERT INTO medicines (medicine_id, name, reference_price) VALUES ($1, $2, $3)
        ON CONFLICT (medicine_id) DO NOTHING
        "#,
    )
    .bind(medicine.id.as_uuid())
    .bind(&medicine.name)
    .bind(medicine.reference_price.as_i64())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("seed_medicine", e))?;
    Ok(done.rows_affected() == 1)
}

pub(super) async fn seed_pharmacy(tx: &mut Transaction<'_, Postgres>, pharmacy: &Pharmacy) -> Result<bool, StoreError> {
    let done = sqlx::query(
        r#"
        INSERT INTO pharmacies (pharmacy_id, name, location, contact, operating_hours)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (pharmacy_id) DO NOTHING
        "#,
    )
    .bind(pharmacy.id.as_uuid())
    .bind(&pharmacy.name)
    .bind(&pharmacy.location)
    .bind(&pharmacy.contact)
    .bind(&pharmacy.operating_hours)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("seed_pharmacy", e))?;
    Ok(done.rows_affected() == 1)
}

pub(super) async fn seed_stock_entry(tx: &mut Transaction<'_, Postgres>, entry: &StockEntry) -> Result<bool, StoreError> {
    let done = sqlx::query(
        r#"
        INSERT INTO stock_entries (stock_id, medicine_id, pharmacy_id, quantity, price)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT ON CONSTRAINT stock_entries_pair_key DO NOTHING
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(entry.medicine_id.as_uuid())
    .bind(entry.pharmacy_id.as_uuid())
    .bind(entry.quantity)
    .bind(entry.price.as_i64())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("seed_stock_entry", e))?;
    Ok(done.rows_affected() == 1)
}

/// Read a stock row and hold a share lock on it until the transaction ends.
async fn stock_for_share(tx: &mut Transaction<'_, Postgres>, entry_id: StockEntryId) -> Result<StockEntry, StoreError> {
    let row = sqlx::query(
        "SELECT stock_id, medicine_id, pharmacy_id, quantity, price FROM stock_entries WHERE stock_id = $1 FOR SHARE",
    )
    .bind(entry_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("stock_for_share", e))?
    .ok_or_else(|| StoreError::stock_not_found(entry_id))?;

    StockRow::from_row(&row).map_err(|e| map_sqlx_error("stock_for_share", e))?.try_into()
}

/// Conditional decrement inside an open transaction.
async fn decrement_in(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: StockEntryId,
    amount: i64,
    expected: ExpectedQuantity,
) -> Result<StockEntry, StoreError> {
    if amount <= 0 || amount > expected.value() {
        return Err(StoreError::Corrupt(format!(
            "decrement of {amount} from expected {} is not a valid plan",
            expected.value()
        )));
    }

    let updated = sqlx::query(
        r#"
        UPDATE stock_entries
        SET quantity = quantity - $2, updated_at = NOW()
        WHERE stock_id = $1 AND quantity = $3
        RETURNING stock_id, medicine_id, pharmacy_id, quantity, price
        "#,
    )
    .bind(entry_id.as_uuid())
    .bind(amount)
    .bind(expected.value())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("apply_decrement", e))?;

    if let Some(row) = updated {
        return StockRow::from_row(&row)
            .map_err(|e| map_sqlx_error("apply_decrement", e))?
            .try_into();
    }

    // Zero rows updated: either the row is gone or someone else moved it first.
    let current: Option<i64> = sqlx::query_scalar("SELECT quantity FROM stock_entries WHERE stock_id = $1")
        .bind(entry_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("check_stock_quantity", e))?;

    match current {
        None => Err(StoreError::stock_not_found(entry_id)),
        Some(actual) => Err(StoreError::stale_quantity(expected, actual)),
    }
}

/// Ledger append inside an open transaction.
async fn record_in(tx: &mut Transaction<'_, Postgres>, booking: NewBooking) -> Result<Booking, StoreError> {
    let id = BookingId::new();
    let status = BookingStatus::Confirmed;

    let created_at: DateTime<Utc> = sqlx::query_scalar(
        r#"
        INSERT INTO bookings (booking_id, user_id, stock_id, medicine_id, pharmacy_id, quantity, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING created_at
        "#,
    )
    .bind(id.as_uuid())
    .bind(booking.user_id.as_str())
    .bind(booking.stock_entry_id.as_uuid())
    .bind(booking.medicine_id.as_uuid())
    .bind(booking.pharmacy_id.as_uuid())
    .bind(booking.quantity)
    .bind(status.as_str())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_booking", e))?;

    Ok(booking.confirm(id, created_at))
}

/// `LIMIT` takes a BIGINT; anything larger means "no limit".
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Map SQLx errors to StoreError.
pub(super) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                Some("23503") => StoreError::NotFound(msg),
                Some("23514") => StoreError::Corrupt(msg),
                Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out acquiring a connection in {}", operation))
        }
        sqlx::Error::PoolClosed => StoreError::Unavailable(format!("connection pool closed in {}", operation)),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Corrupt(format!("failed to decode row in {}: {}", operation, err))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}

// SQLx row types

#[derive(Debug)]
struct MedicineRow {
    medicine_id: Uuid,
    name: String,
    reference_price: i64,
}

impl<'r> FromRow<'r, PgRow> for MedicineRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(MedicineRow {
            medicine_id: row.try_get("medicine_id")?,
            name: row.try_get("name")?,
            reference_price: row.try_get("reference_price")?,
        })
    }
}

impl TryFrom<MedicineRow> for Medicine {
    type Error = StoreError;

    fn try_from(row: MedicineRow) -> Result<Self, Self::Error> {
        let price = Price::from_signed(row.reference_price).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Medicine::new(MedicineId::from_uuid(row.medicine_id), row.name, price)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}

#[derive(Debug)]
struct PharmacyRow {
    pharmacy_id: Uuid,
    name: String,
    location: String,
    contact: String,
    operating_hours: String,
}

impl<'r> FromRow<'r, PgRow> for PharmacyRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PharmacyRow {
            pharmacy_id: row.try_get("pharmacy_id")?,
            name: row.try_get("name")?,
            location: row.try_get("location")?,
            contact: row.try_get("contact")?,
            operating_hours: row.try_get("operating_hours")?,
        })
    }
}

impl TryFrom<PharmacyRow> for Pharmacy {
    type Error = StoreError;

    fn try_from(row: PharmacyRow) -> Result<Self, Self::Error> {
        Pharmacy::new(
            PharmacyId::from_uuid(row.pharmacy_id),
            row.name,
            row.location,
            row.contact,
            row.operating_hours,
        )
        .map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}

#[derive(Debug)]
struct StockRow {
    stock_id: Uuid,
    medicine_id: Uuid,
    pharmacy_id: Uuid,
    quantity: i64,
    price: i64,
}

impl<'r> FromRow<'r, PgRow> for StockRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(StockRow {
            stock_id: row.try_get("stock_id")?,
            medicine_id: row.try_get("medicine_id")?,
            pharmacy_id: row.try_get("pharmacy_id")?,
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
        })
    }
}

impl TryFrom<StockRow> for StockEntry {
    type Error = StoreError;

    fn try_from(row: StockRow) -> Result<Self, Self::Error> {
        let price = Price::from_signed(row.price).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        StockEntry::new(
            StockEntryId::from_uuid(row.stock_id),
            MedicineId::from_uuid(row.medicine_id),
            PharmacyId::from_uuid(row.pharmacy_id),
            row.quantity,
            price,
        )
        .map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}

#[derive(Debug)]
struct BookingRow {
    booking_id: Uuid,
    user_id: String,
    stock_id: Uuid,
    medicine_id: Uuid,
    pharmacy_id: Uuid,
    quantity: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for BookingRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(BookingRow {
            booking_id: row.try_get("booking_id")?,
            user_id: row.try_get("user_id")?,
            stock_id: row.try_get("stock_id")?,
            medicine_id: row.try_get("medicine_id")?,
            pharmacy_id: row.try_get("pharmacy_id")?,
            quantity: row.try_get("quantity")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = BookingStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown booking status '{}'", row.status)))?;
        let user_id = UserId::parse(row.user_id).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Booking {
            id: BookingId::from_uuid(row.booking_id),
            user_id,
            stock_entry_id: StockEntryId::from_uuid(row.stock_id),
            medicine_id: MedicineId::from_uuid(row.medicine_id),
            pharmacy_id: PharmacyId::from_uuid(row.pharmacy_id),
            quantity: row.quantity,
            status,
            created_at: row.created_at,
        })
    }
}
