use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{SaveOfferTemplate, Tenant, TenantType};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tenants", get(list).post(create))
        .route("/api/tenants/:id", get(show))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewTenant {
    name: String,
    #[serde(rename = "type")]
    tenant_type: TenantType,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    required_customer_info: Vec<String>,
    #[serde(default)]
    save_offers: Vec<SaveOfferTemplate>,
    #[serde(default)]
    admins: Vec<String>,
}

fn default_active() -> bool {
    true
}

/// GET /api/tenants - All organizations
async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tenants = state.tenants.get_all().await?;
    Ok(Json(json!({ "success": true, "data": tenants })))
}

/// GET /api/tenants/:id - Single organization by id
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = state
        .tenants
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("tenant {id} not found")))?;
    Ok(Json(json!({ "success": true, "data": tenant })))
}

/// POST /api/tenants - Register an organization
async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NewTenant>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = Tenant {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        tenant_type: payload.tenant_type,
        active: payload.active,
        required_customer_info: payload.required_customer_info,
        save_offers: payload.save_offers,
        admins: payload.admins,
    };

    state.tenants.set(&tenant.id, &tenant).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": tenant })),
    ))
}
