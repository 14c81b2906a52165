use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::providers::ProviderConfig;
use crate::selection::{parse_analysis_times, AnalysisTime};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnalysisTimesBody {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(default)]
        analysis_times: Option<Vec<Value>>,
    },
}

/// Extracts the raw advertised times from either a bare array or an
/// `{"analysis_times": [...]}` object. Anything else is the empty set.
pub fn advertised_times(body: &Value) -> Vec<String> {
    if body.is_null() {
        return Vec::new();
    }
    let entries = match AnalysisTimesBody::deserialize(body) {
        Ok(AnalysisTimesBody::Bare(entries)) => entries,
        Ok(AnalysisTimesBody::Wrapped { analysis_times }) => analysis_times.unwrap_or_default(),
        Err(_) => Vec::new(),
    };
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(text) => Some(text),
            _ => None,
        })
        .collect()
}

pub fn parse_advertised_times(body: &Value) -> (Vec<String>, Vec<AnalysisTime>) {
    let raw = advertised_times(body);
    let parsed = parse_analysis_times(&raw);
    (raw, parsed)
}

#[derive(Clone, Debug, Serialize)]
pub struct HazardLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub data: Value,
}

impl HazardLayer {
    pub fn at(analysis_time: Option<&AnalysisTime>, data: Value) -> Self {
        Self {
            analysis_time: analysis_time.map(|time| time.as_str().to_string()),
            forecast_time: None,
            filename: None,
            data,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProviderReport {
    pub provider: ProviderConfig,
    pub advertised_times: Vec<String>,
    pub used_times: Vec<String>,
    pub layers: Vec<HazardLayer>,
    pub failures: Vec<String>,
}

impl ProviderReport {
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            advertised_times: Vec::new(),
            used_times: Vec::new(),
            layers: Vec::new(),
            failures: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SourceSummary {
    pub analysis_times: Vec<String>,
    pub used_analysis_times: Vec<String>,
    pub layers: Vec<HazardLayer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ProviderReport> for SourceSummary {
    fn from(report: ProviderReport) -> Self {
        Self {
            analysis_times: report.advertised_times,
            used_analysis_times: report.used_times,
            layers: report.layers,
            failures: report.failures,
            error: None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HazardSummary {
    pub timestamp: String,
    pub desired_intervals: Vec<String>,
    pub sources: BTreeMap<String, SourceSummary>,
}
