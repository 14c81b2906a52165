use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::http_client::HazardApi;
use crate::providers::{FetchMode, ProviderConfig};
use crate::selection::{AnalysisTimeSelector, SelectionPolicy};
use crate::types::{parse_advertised_times, HazardLayer, ProviderReport};

pub async fn fetch_provider<A: HazardApi>(
    api: &A,
    provider: &ProviderConfig,
    now: DateTime<Utc>,
) -> Result<ProviderReport> {
    match provider.mode {
        FetchMode::AnalysisTime { selector, .. } => {
            fetch_by_analysis_time(api, provider, selector, now).await
        }
        FetchMode::ForecastChain { num_forecasts } => {
            fetch_forecast_chain(api, provider, num_forecasts).await
        }
    }
}

async fn fetch_by_analysis_time<A: HazardApi>(
    api: &A,
    provider: &ProviderConfig,
    selector: AnalysisTimeSelector,
    now: DateTime<Utc>,
) -> Result<ProviderReport> {
    let label = provider.label();
    let mut report = ProviderReport::new(*provider);

    let times_body = match api.get_json(&provider.analysis_times_path()).await {
        Ok(body) => body,
        Err(error) if selector.policy == SelectionPolicy::Implicit => {
            warn!("{label}: analysis times unavailable, fetching current layer anyway: {error:#}");
            Value::Null
        }
        Err(error) => {
            return Err(error).with_context(|| format!("{label}: failed to list analysis times"))
        }
    };

    let (raw_times, times) = parse_advertised_times(&times_body);
    info!("{label}: {} analysis times advertised", raw_times.len());
    report.advertised_times = raw_times;

    let queries = selector.plan(&times, now);
    if queries.is_empty() {
        info!("{label}: no analysis time selected, skipping fetch");
        return Ok(report);
    }

    for query in queries {
        let analysis_time = query.analysis_time();
        let shown = analysis_time.map_or("<current>", |time| time.as_str());
        if let Some(time) = analysis_time {
            report.used_times.push(time.as_str().to_string());
        }

        let path = provider.hazard_data_path(analysis_time);
        match api.get_json(&path).await {
            Ok(Value::Null) => debug!("{label}: empty payload for {shown}"),
            Ok(data) => {
                info!("{label}: retrieved layer for {shown}");
                report.layers.push(HazardLayer::at(analysis_time, data));
            }
            Err(error) => {
                warn!("{label}: fetch for {shown} failed: {error:#}");
                report.failures.push(format!("{shown}: {error:#}"));
            }
        }
    }

    Ok(report)
}

async fn fetch_forecast_chain<A: HazardApi>(
    api: &A,
    provider: &ProviderConfig,
    num_forecasts: u32,
) -> Result<ProviderReport> {
    let label = provider.label();
    let mut report = ProviderReport::new(*provider);

    let forecasts = api
        .get_json(&provider.forecasts_path(num_forecasts))
        .await
        .with_context(|| format!("{label}: failed to list forecasts"))?;
    let Some(forecast_time) = first_string_field(&forecasts, "forecast_time") else {
        info!("{label}: no forecasts available");
        return Ok(report);
    };
    report.advertised_times.push(forecast_time.clone());

    let files = api
        .get_json(&provider.forecast_files_path(&forecast_time))
        .await
        .with_context(|| format!("{label}: failed to list files for {forecast_time}"))?;
    let Some(filename) = first_string_field(&files, "filename") else {
        info!("{label}: forecast {forecast_time} lists no files");
        return Ok(report);
    };
    report.used_times.push(forecast_time.clone());

    let data = api
        .get_json(&provider.forecast_content_path(&filename))
        .await
        .with_context(|| format!("{label}: failed to download {filename}"))?;
    if data.is_null() {
        debug!("{label}: {filename} is empty");
        return Ok(report);
    }

    info!("{label}: retrieved {filename} for forecast {forecast_time}");
    report.layers.push(HazardLayer {
        analysis_time: None,
        forecast_time: Some(forecast_time),
        filename: Some(filename),
        data,
    });
    Ok(report)
}

fn first_string_field(body: &Value, field: &str) -> Option<String> {
    body.as_array()?
        .first()?
        .get(field)?
        .as_str()
        .map(str::to_string)
}
