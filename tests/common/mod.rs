use anyhow::{Context, Result};

use proxylink_api::auth::{generate_jwt, Claims};
use proxylink_api::handlers;
use proxylink_api::models::TenantType;
use proxylink_api::state::AppState;

pub struct TestServer {
    pub base_url: String,
}

/// Serve the application in-process over the in-memory store on an unused
/// port. Each test gets its own isolated server and data.
pub async fn spawn() -> Result<TestServer> {
    let state = AppState::in_memory();
    let app = handlers::router(state);

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    Ok(TestServer { base_url })
}

/// Mint a bearer token the way the session layer would.
pub fn bearer_token(email: &str, tenant_type: TenantType, tenant_id: &str) -> Result<String> {
    let claims = Claims::new(email.to_string(), tenant_type, tenant_id.to_string());
    generate_jwt(claims).context("failed to sign test token")
}
