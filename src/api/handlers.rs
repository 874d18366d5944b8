use axum::{
    extract::{rejection::JsonRejection, State},
    http::{StatusCode, Uri},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{
    CatalogItem, RecommendationRequest, RecommendationResponse, RecommendedTitle,
};

use super::AppState;

/// Number of titles returned per recommendation request
pub const RECOMMENDATION_COUNT: usize = 5;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

/// Catalog slice offered for selection
pub async fn list_movies(State(state): State<AppState>) -> Json<Vec<CatalogItem>> {
    let items = state
        .engine
        .list_catalog_items(state.catalog_limit)
        .iter()
        .map(CatalogItem::from)
        .collect();
    Json(items)
}

/// Recommends movies similar to the selected ones, or the best rated ones
/// when fewer than three were selected
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(request_id = %request_id, error = %rejection, "Rejected recommendation payload");
        AppError::InvalidInput(rejection.body_text())
    })?;

    tracing::info!(
        request_id = %request_id,
        seed_count = request.movie_ids.len(),
        "Processing recommendation request"
    );

    let malformed = request
        .movie_ids
        .iter()
        .filter(|seed| seed.item_id().is_none())
        .count();
    if malformed > 0 {
        tracing::warn!(request_id = %request_id, malformed, "Ignoring malformed movie ids");
    }

    let items = state
        .engine
        .recommend(&request.movie_ids, RECOMMENDATION_COUNT)?;

    tracing::info!(
        request_id = %request_id,
        returned = items.len(),
        "Recommendations computed"
    );

    Ok(Json(RecommendationResponse {
        recommendations: items.into_iter().map(RecommendedTitle::from).collect(),
    }))
}
