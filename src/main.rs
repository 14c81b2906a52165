mod config;
mod constants;
mod fetch;
mod http_client;
mod providers;
mod runner;
mod selection;
mod session;
mod storage;
mod types;
mod utils;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::constants::USER_AGENT;
use crate::http_client::ApiClient;
use crate::providers::default_catalog;
use crate::runner::{run, RunPlan};
use crate::session::authenticate;
use crate::utils::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::from_env()?;

    let http = Client::builder()
        .timeout(cfg.request_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build reqwest client")?;

    let session = authenticate(&http, &cfg.api_base_url, &cfg.credentials).await?;
    let api = ApiClient::new(http, cfg.api_base_url.clone(), session);

    let selection_override = cfg.selection_policy_override();
    let providers = default_catalog(cfg.lookback_hours)
        .into_iter()
        .filter(|provider| cfg.hazards.contains(&provider.hazard))
        .map(|provider| provider.with_overrides(selection_override, cfg.missing_time_override))
        .collect();
    let plan = RunPlan {
        providers,
        lookback_hours: cfg.lookback_hours,
    };

    let summaries = run(&api, &plan, &cfg.output_dir, Utc::now()).await?;
    info!(
        "Hazard retrieval complete: {} summaries written to {}",
        summaries.len(),
        cfg.output_dir.display()
    );
    Ok(())
}
