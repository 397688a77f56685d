//! `medfind-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod concurrency;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use concurrency::ExpectedQuantity;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BookingId, MedicineId, PharmacyId, StockEntryId, UserId};
pub use value_object::ValueObject;
