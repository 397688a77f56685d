//! Inventory domain module: per-pharmacy stock rows.
//!
//! This crate contains business rules for stock, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod filter;
pub mod stock;

pub use filter::StockFilter;
pub use stock::{DecrementRejected, StockDecrement, StockEntry};
