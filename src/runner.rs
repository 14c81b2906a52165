use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::fetch::fetch_provider;
use crate::http_client::HazardApi;
use crate::providers::{Hazard, ProviderConfig};
use crate::selection::{desired_probe_times, AnalysisTime};
use crate::storage::{persist_json, persist_report};
use crate::types::{HazardSummary, SourceSummary};

pub struct RunPlan {
    pub providers: Vec<ProviderConfig>,
    pub lookback_hours: u32,
}

pub async fn run<A: HazardApi>(
    api: &A,
    plan: &RunPlan,
    output_dir: &Path,
    now: DateTime<Utc>,
) -> Result<BTreeMap<Hazard, HazardSummary>> {
    let desired_intervals: Vec<String> = desired_probe_times(now, plan.lookback_hours)
        .iter()
        .map(AnalysisTime::to_string)
        .collect();
    let mut summaries: BTreeMap<Hazard, HazardSummary> = BTreeMap::new();

    for provider in &plan.providers {
        let summary = summaries
            .entry(provider.hazard)
            .or_insert_with(|| HazardSummary {
                timestamp: now.to_rfc3339(),
                desired_intervals: desired_intervals.clone(),
                sources: BTreeMap::new(),
            });

        let source_summary = match fetch_provider(api, provider, now).await {
            Ok(report) => {
                let persisted = persist_report(output_dir, &report).await;
                let mut source_summary = SourceSummary::from(report);
                if let Err(error) = persisted {
                    warn!("{}: failed to persist: {error:#}", provider.label());
                    source_summary.error = Some(format!("artifact not written: {error:#}"));
                }
                source_summary
            }
            Err(error) => {
                warn!("{error:#}");
                SourceSummary {
                    error: Some(format!("{error:#}")),
                    ..SourceSummary::default()
                }
            }
        };
        summary
            .sources
            .insert(provider.source.name().to_string(), source_summary);
    }

    for (hazard, summary) in &summaries {
        let fetched: usize = summary
            .sources
            .values()
            .map(|source| source.layers.len())
            .sum();
        info!("{hazard}: {fetched} layers from {} sources", summary.sources.len());
        persist_json(output_dir, &format!("all_{hazard}_data"), summary).await?;
    }

    Ok(summaries)
}
