use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde_json::json;

use crate::error::ApiError;
use crate::models::StatsQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/stats", post(calculate))
}

/// POST /api/stats - Compute the statistics report for one tenant viewpoint
async fn calculate(
    State(state): State<AppState>,
    Json(query): Json<StatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.stats.calculate_stats(&query).await?;
    Ok(Json(json!({ "success": true, "data": report })))
}
