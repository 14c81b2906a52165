use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::constants::{GEOJSON_FORMAT, GLOBAL_AREA_NAME, WSI_FORECAST_COUNT};
use crate::selection::{AnalysisTime, AnalysisTimeSelector, MissingTimePolicy, SelectionPolicy};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hazard {
    Convection,
    Turbulence,
    Icing,
}

impl Hazard {
    pub const ALL: [Hazard; 3] = [Hazard::Convection, Hazard::Turbulence, Hazard::Icing];

    pub fn name(self) -> &'static str {
        match self {
            Self::Convection => "convection",
            Self::Turbulence => "turbulence",
            Self::Icing => "icing",
        }
    }

    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Convection => "convections",
            Self::Turbulence => "turbulence",
            Self::Icing => "icing",
        }
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Hazard {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "convection" | "convections" => Ok(Self::Convection),
            "turbulence" => Ok(Self::Turbulence),
            "icing" => Ok(Self::Icing),
            other => bail!("Unknown hazard {other:?}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    MeteoFrance,
    Meandair,
    Meteomatics,
    Wsi,
}

impl Source {
    pub fn name(self) -> &'static str {
        match self {
            Self::MeteoFrance => "meteofrance",
            Self::Meandair => "meandair",
            Self::Meteomatics => "meteomatics",
            Self::Wsi => "wsi",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchMode {
    AnalysisTime {
        selector: AnalysisTimeSelector,
        area_name: Option<&'static str>,
    },
    /// Forecast listing, then per-forecast file listing, then file content.
    ForecastChain { num_forecasts: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
    pub hazard: Hazard,
    pub source: Source,
    pub mode: FetchMode,
}

impl ProviderConfig {
    pub fn analysis_time(hazard: Hazard, source: Source, policy: SelectionPolicy) -> Self {
        Self {
            hazard,
            source,
            mode: FetchMode::AnalysisTime {
                selector: AnalysisTimeSelector::new(policy, MissingTimePolicy::Skip),
                area_name: None,
            },
        }
    }

    pub fn implicit_area(hazard: Hazard, source: Source, area_name: &'static str) -> Self {
        Self {
            hazard,
            source,
            mode: FetchMode::AnalysisTime {
                selector: AnalysisTimeSelector::new(
                    SelectionPolicy::Implicit,
                    MissingTimePolicy::Implicit,
                ),
                area_name: Some(area_name),
            },
        }
    }

    pub fn forecast_chain(hazard: Hazard, source: Source) -> Self {
        Self {
            hazard,
            source,
            mode: FetchMode::ForecastChain {
                num_forecasts: WSI_FORECAST_COUNT,
            },
        }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.source, self.hazard)
    }

    pub fn is_series(&self) -> bool {
        matches!(
            self.mode,
            FetchMode::AnalysisTime { selector, .. } if selector.policy.is_series()
        )
    }

    pub fn artifact_name(&self) -> String {
        format!("{}_{}", self.source, self.hazard)
    }

    pub fn analysis_times_path(&self) -> String {
        format!(
            "/v1/{}/analysis_time?source={}",
            self.hazard.path_segment(),
            self.source
        )
    }

    pub fn hazard_data_path(&self, analysis_time: Option<&AnalysisTime>) -> String {
        let mut path = format!(
            "/v1/{}/?source={}&format={GEOJSON_FORMAT}",
            self.hazard.path_segment(),
            self.source
        );
        if let FetchMode::AnalysisTime {
            area_name: Some(area),
            ..
        } = self.mode
        {
            path.push_str("&area_name=");
            path.push_str(&urlencoding::encode(area));
        }
        if let Some(time) = analysis_time {
            path.push_str("&analysis_time=");
            path.push_str(&urlencoding::encode(time.as_str()));
        }
        path
    }

    pub fn forecasts_path(&self, num_forecasts: u32) -> String {
        format!("/v1/{}/?num_fc={num_forecasts}", self.hazard.path_segment())
    }

    pub fn forecast_files_path(&self, forecast_time: &str) -> String {
        format!(
            "/v1/{}/{}",
            self.hazard.path_segment(),
            urlencoding::encode(forecast_time)
        )
    }

    pub fn forecast_content_path(&self, filename: &str) -> String {
        format!(
            "/v1/{}/content/{}",
            self.hazard.path_segment(),
            urlencoding::encode(filename)
        )
    }

    /// Replaces the selection policy and/or fallback. Implicit providers keep theirs.
    pub fn with_overrides(
        mut self,
        policy: Option<SelectionPolicy>,
        missing: Option<MissingTimePolicy>,
    ) -> Self {
        if let FetchMode::AnalysisTime { selector, .. } = &mut self.mode {
            if selector.policy == SelectionPolicy::Implicit {
                return self;
            }
            if let Some(policy) = policy {
                selector.policy = policy;
            }
            if let Some(missing) = missing {
                selector.missing = missing;
            }
        }
        self
    }
}

pub fn default_catalog(lookback_hours: u32) -> Vec<ProviderConfig> {
    let window = SelectionPolicy::Window { lookback_hours };
    vec![
        ProviderConfig::implicit_area(Hazard::Convection, Source::MeteoFrance, GLOBAL_AREA_NAME),
        ProviderConfig::analysis_time(Hazard::Convection, Source::Meandair, window),
        ProviderConfig::analysis_time(Hazard::Convection, Source::Meteomatics, window),
        ProviderConfig::forecast_chain(Hazard::Turbulence, Source::Wsi),
        ProviderConfig::analysis_time(Hazard::Turbulence, Source::Meandair, SelectionPolicy::Latest),
        ProviderConfig::analysis_time(
            Hazard::Turbulence,
            Source::Meteomatics,
            SelectionPolicy::Latest,
        ),
        ProviderConfig::analysis_time(
            Hazard::Turbulence,
            Source::MeteoFrance,
            SelectionPolicy::Latest,
        ),
        ProviderConfig::forecast_chain(Hazard::Icing, Source::Wsi),
        ProviderConfig::analysis_time(Hazard::Icing, Source::Meandair, SelectionPolicy::Latest),
        ProviderConfig::analysis_time(Hazard::Icing, Source::MeteoFrance, SelectionPolicy::Latest),
    ]
}
