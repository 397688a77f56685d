use axum::{
    Router,
    routing::{get, post},
};

pub mod bookings;
pub mod medicines;
pub mod pharmacies;
pub mod stock;
pub mod system;

/// Router for read-only endpoints that need no identity.
pub fn public_router() -> Router {
    Router::new()
        .nest("/medicines", medicines::router())
        .route("/pharmacies", get(pharmacies::list_pharmacies))
        .route("/stock", get(stock::lookup_stock))
}

/// Router for endpoints that act on behalf of an authenticated user.
pub fn protected_router() -> Router {
    Router::new().route("/bookings", post(bookings::create_booking))
}
