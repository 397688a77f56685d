//! Reservation engine: the only path that mutates stock.
//!
//! ## Reservation flow
//!
//! ```text
//! ReservationRequest
//!   ↓
//! 1. Validate (quantity > 0)                 → InvalidRequest
//!   ↓
//! 2. Read the stock row                       → NotFound
//!   ↓
//! 3. Plan the decrement against that read     → InsufficientStock
//!   ↓
//! 4. Commit decrement + booking as one unit
//!      row changed since step 2 → back to 2 (bounded)
//!   ↓
//! Booking
//! ```
//!
//! Step 4 is a compare-and-swap on the quantity read in step 2, so two
//! reservations that both read the same quantity cannot both commit. The loser
//! re-reads and either fits into what is left or fails with
//! `InsufficientStock`. After `max_attempts` lost swaps it fails with
//! `Conflict`; nothing is written on any failure path.

use tracing::{debug, info, instrument, warn};

use medfind_bookings::{Booking, NewBooking, ReservationRequest};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::{ReservationUnit, StockStore, StoreError};

#[derive(Debug, Clone)]
pub struct ReservationEngine<S> {
    store: S,
    max_attempts: u32,
}

impl<S> ReservationEngine<S> {
    pub fn new(store: S, config: &EngineConfig) -> Self {
        Self {
            store,
            max_attempts: config.reservation_max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S> ReservationEngine<S>
where
    S: StockStore + ReservationUnit,
{
    /// Reserve `request.quantity` units of one stock row for `request.user_id`.
    ///
    /// On success exactly one booking was appended and the row was decremented
    /// by the booked quantity. On any error neither happened.
    #[instrument(
        skip(self, request),
        fields(
            user_id = %request.user_id,
            stock_id = %request.stock_entry_id,
            quantity = request.quantity
        ),
        err
    )]
    pub async fn reserve(&self, request: &ReservationRequest) -> Result<Booking, EngineError> {
        request.validate()?;

        let mut last_conflict = String::new();
        for attempt in 1..=self.max_attempts {
            debug!(attempt, "reservation attempt");

            let entry = self.store.get_stock(request.stock_entry_id).await?;
            let plan = entry.plan_decrement(request.quantity)?;
            let booking = NewBooking::for_entry(request.user_id.clone(), &entry, request.quantity);

            match self.store.commit_reservation(plan, booking).await {
                Ok(committed) => {
                    info!(
                        booking_id = %committed.id,
                        stock_id = %committed.stock_entry_id,
                        quantity = committed.quantity,
                        remaining = plan.remaining(),
                        attempt,
                        "reservation confirmed"
                    );
                    return Ok(committed);
                }
                Err(StoreError::Conflict(msg)) => {
                    debug!(attempt, reason = %msg, "stock changed during reservation; retrying");
                    last_conflict = msg;
                }
                Err(other) => return Err(other.into()),
            }
        }

        warn!(
            attempts = self.max_attempts,
            reason = %last_conflict,
            "reservation abandoned after repeated conflicts"
        );
        Err(EngineError::Conflict(format!(
            "stock entry {} changed on each of {} attempts",
            request.stock_entry_id, self.max_attempts
        )))
    }
}
