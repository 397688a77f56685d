//! Stock store, booking ledger and catalog boundary.
//!
//! The traits make no storage assumptions; the in-memory store backs tests
//! and local runs, the Postgres store backs deployments.

pub mod in_memory;
pub mod postgres;
pub mod seed;
pub mod r#trait;

pub use in_memory::InMemoryPharmacyStore;
pub use postgres::{PostgresOptions, PostgresPharmacyStore};
pub use seed::{SeedData, SeedError, SeedSummary};
pub use r#trait::{BookingLedger, CatalogReader, PharmacyStore, ReservationUnit, StockStore, StoreError};
