use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};

use medfind_core::{MedicineId, PharmacyId};
use medfind_infra::EngineError;
use medfind_infra::store::StockStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Resolve the stock row for a (medicine, pharmacy) pair.
pub async fn lookup_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::StockQuery>,
) -> axum::response::Response {
    let medicine_id: MedicineId = match parse_id(query.medicine_id.as_deref(), "medicineId") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let pharmacy_id: PharmacyId = match parse_id(query.pharmacy_id.as_deref(), "pharmacyId") {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.store.find_entry(medicine_id, pharmacy_id).await {
        Ok(Some(entry)) => Json(dto::StockLookupResponse {
            stock_id: entry.id,
            quantity: entry.quantity,
            price: entry.price,
        })
        .into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("no stock for medicine {medicine_id} at pharmacy {pharmacy_id}"),
        ),
        Err(e) => errors::engine_error_to_response(EngineError::from(e)),
    }
}

fn parse_id<T: FromStr>(raw: Option<&str>, field: &str) -> Result<T, axum::response::Response> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            format!("{field} is required"),
        )),
        Some(v) => v
            .parse()
            .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_request", format!("invalid {field}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_malformed_ids_are_told_apart() {
        assert!(parse_id::<MedicineId>(Some(" 0190c9a0-0000-7000-8000-000000000001 "), "medicineId").is_ok());
        assert_eq!(
            parse_id::<MedicineId>(None, "medicineId").unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
        assert!(parse_id::<MedicineId>(Some(""), "medicineId").is_err());
        assert!(parse_id::<PharmacyId>(Some("nope"), "pharmacyId").is_err());
    }
}
