use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::fs;
use tracing::info;

use crate::types::{HazardLayer, ProviderReport};

pub async fn persist_json<T: Serialize + ?Sized>(
    dir: &Path,
    identifier: &str,
    payload: &T,
) -> Result<PathBuf> {
    let encoded = serde_json::to_vec_pretty(payload)
        .with_context(|| format!("Failed to encode {identifier}"))?;

    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(format!("{identifier}.json"));
    let tmp_path = dir.join(format!("{identifier}.tmp"));

    fs::write(&tmp_path, encoded)
        .await
        .with_context(|| format!("Failed writing {}", tmp_path.display()))?;
    fs::rename(&tmp_path, &path).await.with_context(|| {
        format!(
            "Failed renaming {} -> {}",
            tmp_path.display(),
            path.display()
        )
    })?;

    info!("Saved {}", path.display());
    Ok(path)
}

#[derive(Serialize)]
struct SeriesEntry<'a> {
    analysis_time: Option<&'a str>,
    data: &'a Value,
}

pub async fn persist_report(dir: &Path, report: &ProviderReport) -> Result<Option<PathBuf>> {
    let identifier = report.provider.artifact_name();
    match report.layers.as_slice() {
        [] => Ok(None),
        [single] if !report.provider.is_series() => {
            persist_json(dir, &identifier, &single.data).await.map(Some)
        }
        layers => {
            let entries: Vec<SeriesEntry<'_>> = layers.iter().map(series_entry).collect();
            persist_json(dir, &identifier, &entries).await.map(Some)
        }
    }
}

fn series_entry(layer: &HazardLayer) -> SeriesEntry<'_> {
    SeriesEntry {
        analysis_time: layer
            .analysis_time
            .as_deref()
            .or(layer.forecast_time.as_deref()),
        data: &layer.data,
    }
}
