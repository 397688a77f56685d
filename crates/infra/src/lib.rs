//! Infrastructure layer: stores, the availability search and the reservation
//! engine, plus their configuration.

pub mod availability;
pub mod config;
pub mod error;
pub mod reservation;
pub mod store;


pub use availability::{AvailabilitySearch, MedicineMatch, PharmacyOffer, SearchRequest};
pub use config::EngineConfig;
pub use error::EngineError;
pub use reservation::ReservationEngine;
