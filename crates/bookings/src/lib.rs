//! Bookings domain module.
//!
//! A booking is the immutable record of a committed reservation. This crate
//! only models bookings and validates reservation requests; committing them is
//! the infra layer's job.

pub mod booking;
pub mod request;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use request::ReservationRequest;
