//! Entity trait: records keyed by a typed id.

/// Anything stored and looked up by a typed id (medicines, pharmacies, stock
/// rows, bookings).
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}
