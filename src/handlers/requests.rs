use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::ActorContext;
use crate::models::NewRequest;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/requests", get(list).post(create))
        .route("/api/requests/:id", get(show).patch(update))
        .route("/api/requests/:id/log", get(show_log))
}

/// POST /api/requests - Create a request on behalf of the acting proxy user
async fn create(
    State(state): State<AppState>,
    actor: Option<Extension<ActorContext>>,
    Json(payload): Json<NewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .requests
        .create_request(payload, actor.as_ref().map(|e| &e.0))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": request })),
    ))
}

/// GET /api/requests - Requests visible from the actor's side
async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state.requests.list_for_actor(&actor).await?;
    Ok(Json(json!({ "success": true, "data": requests })))
}

/// GET /api/requests/:id - Single request by id
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state.requests.get_request(&id).await?;
    Ok(Json(json!({ "success": true, "data": request })))
}

/// PATCH /api/requests/:id - Partial update with audit logging
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: Option<Extension<ActorContext>>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = match payload {
        Value::Object(map) => map,
        _ => return Err(ApiError::bad_request("patch body must be a JSON object")),
    };

    let request = state
        .requests
        .update_request(&id, patch, actor.as_ref().map(|e| &e.0))
        .await?;

    Ok(Json(json!({ "success": true, "data": request })))
}

/// GET /api/requests/:id/log - The request's audit trail
async fn show_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let log = state.requests.get_log_for_request(&id).await?;
    Ok(Json(json!({ "success": true, "data": log })))
}
