use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use medfind_infra::EngineError;
use medfind_infra::store::CatalogReader;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list_pharmacies(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.store.list_pharmacies().await {
        Ok(pharmacies) => Json(dto::PharmaciesResponse { pharmacies }).into_response(),
        Err(e) => errors::engine_error_to_response(EngineError::from(e)),
    }
}
