use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use medfind_bookings::ReservationRequest;
use medfind_core::StockEntryId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub async fn create_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    body: Result<Json<dto::CreateBookingRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text());
        }
    };
    let stock_id: StockEntryId = match body.stock_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_request", "invalid stock id"),
    };

    let request = ReservationRequest::new(user.user_id().clone(), stock_id, body.quantity);

    match services.reservations.reserve(&request).await {
        Ok(booking) => (StatusCode::CREATED, Json(serde_json::json!({ "booking": booking }))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
