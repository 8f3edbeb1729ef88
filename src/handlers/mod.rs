pub mod requests;
pub mod stats;
pub mod tenants;

use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Compose the full application router over the injected state.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(requests::routes())
        .merge(stats::routes())
        .merge(tenants::routes())
        .route_layer(axum::middleware::from_fn(jwt_auth_middleware));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "ProxyLink API",
            "version": version,
            "description": "Customer-support request mediation between proxy and provider organizations",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "requests": "/api/requests[/:id] (protected)",
                "logs": "/api/requests/:id/log (protected)",
                "stats": "/api/stats (protected)",
                "tenants": "/api/tenants[/:id] (protected)",
            }
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    // Any store read works as a liveness probe
    match state.store.get("health", "ping").await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "document store unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}
