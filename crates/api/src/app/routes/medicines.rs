use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    response::IntoResponse,
    routing::get,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/search", get(search_medicines))
}

pub async fn search_medicines(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    match services.search.search(&query.into_request()).await {
        Ok(results) => Json(dto::SearchResponse { results }).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
