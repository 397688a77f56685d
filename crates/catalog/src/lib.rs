//! Catalog domain module: medicines and pharmacies.
//!
//! Reference data is immutable in this scope; it is created out-of-band and
//! only read by the availability and reservation paths.

pub mod medicine;
pub mod pharmacy;
pub mod price;

pub use medicine::{Medicine, NamePattern};
pub use pharmacy::Pharmacy;
pub use price::Price;
