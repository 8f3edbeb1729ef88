use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

/// Operations CLI for a running ProxyLink API.
#[derive(Parser)]
#[command(name = "proxylink", about = "ProxyLink API operations CLI", version)]
pub struct Cli {
    /// Base URL of the API
    #[arg(long, global = true, default_value = "http://127.0.0.1:3000")]
    pub url: String,

    /// Bearer token for protected endpoints (falls back to PROXYLINK_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check service health
    Health,
    /// Fetch the statistics report for a tenant viewpoint
    Stats {
        /// Viewpoint: proxy, provider, or management
        #[arg(long)]
        tenant_type: String,
        #[arg(long)]
        tenant_id: String,
        /// Inclusive lower bound on submission date (yyyy-MM-dd or RFC 3339)
        #[arg(long)]
        from_date: Option<String>,
        /// Inclusive upper bound on submission date
        #[arg(long)]
        to_date: Option<String>,
        /// Restrict to one proxy source (provider viewpoint only)
        #[arg(long)]
        source_id: Option<String>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    let client = reqwest::Client::new();

    match cli.command {
        Command::Health => {
            let res = client
                .get(format!("{}/health", cli.url))
                .send()
                .await
                .context("health request failed")?;
            let status = res.status();
            let body: serde_json::Value = res.json().await.context("invalid health response")?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            ensure!(status.is_success(), "service degraded: {status}");
        }
        Command::Stats {
            tenant_type,
            tenant_id,
            from_date,
            to_date,
            source_id,
        } => {
            let token = cli
                .token
                .or_else(|| std::env::var("PROXYLINK_TOKEN").ok())
                .context("--token (or PROXYLINK_TOKEN) is required for stats")?;
            let payload = json!({
                "tenantType": tenant_type,
                "tenantId": tenant_id,
                "fromDate": from_date,
                "toDate": to_date,
                "sourceId": source_id,
            });

            let res = client
                .post(format!("{}/api/stats", cli.url))
                .bearer_auth(token)
                .json(&payload)
                .send()
                .await
                .context("stats request failed")?;
            let status = res.status();
            let body: serde_json::Value = res.json().await.context("invalid stats response")?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            ensure!(status.is_success(), "stats request failed: {status}");
        }
    }

    Ok(())
}
