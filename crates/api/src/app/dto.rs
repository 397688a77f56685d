use serde::{Deserialize, Serialize};

use medfind_catalog::{Pharmacy, Price};
use medfind_core::StockEntryId;
use medfind_infra::{MedicineMatch, SearchRequest};

// -------------------------
// Request DTOs
// -------------------------

/// `GET /medicines/search` query string.
///
/// Numbers arrive as raw strings; ones that fail to parse are dropped so the
/// default bound applies.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query: Option<String>,
    pub min_stock: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

impl SearchQuery {
    pub fn into_request(self) -> SearchRequest {
        SearchRequest {
            name_pattern: self.query,
            min_stock: lenient(self.min_stock),
            min_price: lenient(self.min_price),
            max_price: lenient(self.max_price),
        }
    }
}

fn lenient(raw: Option<String>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse().ok())
}

/// `GET /stock` query string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuery {
    pub medicine_id: Option<String>,
    pub pharmacy_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub stock_id: String,
    pub quantity: i64,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<MedicineMatch>,
}

#[derive(Debug, Serialize)]
pub struct PharmaciesResponse {
    pub pharmacies: Vec<Pharmacy>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLookupResponse {
    pub stock_id: StockEntryId,
    pub quantity: i64,
    pub price: Price,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_bounds_fall_back_to_defaults() {
        let query = SearchQuery {
            query: Some("para".into()),
            min_stock: Some("abc".into()),
            min_price: Some(" 10 ".into()),
            max_price: Some("".into()),
        };
        let request = query.into_request();
        assert_eq!(request.name_pattern.as_deref(), Some("para"));
        assert_eq!(request.min_stock, None);
        assert_eq!(request.min_price, Some(10));
        assert_eq!(request.max_price, None);
    }

    #[test]
    fn negative_bounds_are_passed_through_for_validation() {
        let query = SearchQuery {
            min_stock: Some("-1".into()),
            ..SearchQuery::default()
        };
        assert_eq!(query.into_request().min_stock, Some(-1));
    }
}
