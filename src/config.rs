use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_DEVICE_ID, DEFAULT_DEVICE_NAME, DEFAULT_LOOKBACK_HOURS,
    DEFAULT_OUTPUT_DIR, DEFAULT_REQUEST_TIMEOUT_SECONDS, MAX_LOOKBACK_HOURS,
};
use crate::providers::Hazard;
use crate::selection::{MissingTimePolicy, SelectionPolicy};
use crate::session::Credentials;
use crate::utils::normalize_base_url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyKind {
    Latest,
    Window,
    Closest,
}

impl PolicyKind {
    pub fn with_lookback(self, lookback_hours: u32) -> SelectionPolicy {
        match self {
            Self::Latest => SelectionPolicy::Latest,
            Self::Window => SelectionPolicy::Window { lookback_hours },
            Self::Closest => SelectionPolicy::ClosestToProbes { lookback_hours },
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub api_base_url: String,
    pub credentials: Credentials,
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
    pub lookback_hours: u32,
    pub selection_override: Option<PolicyKind>,
    pub missing_time_override: Option<MissingTimePolicy>,
    pub hazards: Vec<Hazard>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_base_url =
            normalize_base_url(&env_string("HAZARDS_API_BASE_URL", DEFAULT_API_BASE_URL));
        let credentials = Credentials {
            email: env_required("HAZARDS_API_EMAIL")?,
            password: env_required("HAZARDS_API_PASSWORD")?,
            device_id: env_string("HAZARDS_DEVICE_ID", DEFAULT_DEVICE_ID),
            device_name: env_string("HAZARDS_DEVICE_NAME", DEFAULT_DEVICE_NAME),
        };
        let output_dir = PathBuf::from(env_string("HAZARDS_OUTPUT_DIR", DEFAULT_OUTPUT_DIR));
        let request_timeout = Duration::from_secs(env_u64(
            "HAZARDS_REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT_SECONDS,
        )?);
        let lookback_hours = check_lookback_hours(env_u64(
            "HAZARDS_LOOKBACK_HOURS",
            u64::from(DEFAULT_LOOKBACK_HOURS),
        )?)?;
        let selection_override = env_optional("HAZARDS_SELECTION_POLICY")
            .map(|value| parse_policy_kind(&value))
            .transpose()?;
        let missing_time_override = env_optional("HAZARDS_MISSING_TIME_POLICY")
            .map(|value| parse_missing_time_policy(&value))
            .transpose()?;
        let hazards = match env_optional("HAZARDS_HAZARDS") {
            Some(value) => parse_hazard_list(&value)?,
            None => Hazard::ALL.to_vec(),
        };

        Ok(Self {
            api_base_url,
            credentials,
            output_dir,
            request_timeout,
            lookback_hours,
            selection_override,
            missing_time_override,
            hazards,
        })
    }

    pub fn selection_policy_override(&self) -> Option<SelectionPolicy> {
        self.selection_override
            .map(|kind| kind.with_lookback(self.lookback_hours))
    }
}

pub fn check_lookback_hours(value: u64) -> Result<u32> {
    match u32::try_from(value) {
        Ok(hours) if hours <= MAX_LOOKBACK_HOURS => Ok(hours),
        _ => bail!("HAZARDS_LOOKBACK_HOURS={value} exceeds the {MAX_LOOKBACK_HOURS} h limit"),
    }
}

pub fn parse_policy_kind(value: &str) -> Result<PolicyKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "latest" => Ok(PolicyKind::Latest),
        "window" => Ok(PolicyKind::Window),
        "closest" => Ok(PolicyKind::Closest),
        other => bail!("Unknown selection policy {other:?} (expected latest, window or closest)"),
    }
}

pub fn parse_missing_time_policy(value: &str) -> Result<MissingTimePolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "skip" => Ok(MissingTimePolicy::Skip),
        "current-hour" | "current_hour" => Ok(MissingTimePolicy::CurrentHour),
        "implicit" => Ok(MissingTimePolicy::Implicit),
        other => bail!("Unknown missing-time policy {other:?}"),
    }
}

pub fn parse_hazard_list(value: &str) -> Result<Vec<Hazard>> {
    let mut hazards = Vec::new();
    for entry in value.split(',').filter(|entry| !entry.trim().is_empty()) {
        let hazard = entry.parse::<Hazard>()?;
        if !hazards.contains(&hazard) {
            hazards.push(hazard);
        }
    }
    if hazards.is_empty() {
        bail!("No hazards selected in {value:?}");
    }
    Ok(hazards)
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn env_required(name: &str) -> Result<String> {
    env_optional(name).with_context(|| format!("{name} must be set"))
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {}={} as u64", name, value)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_hours_are_capped() {
        assert_eq!(check_lookback_hours(0).unwrap(), 0);
        assert_eq!(check_lookback_hours(6).unwrap(), 6);
        assert_eq!(
            check_lookback_hours(u64::from(MAX_LOOKBACK_HOURS)).unwrap(),
            MAX_LOOKBACK_HOURS
        );
        assert!(check_lookback_hours(u64::from(MAX_LOOKBACK_HOURS) + 1).is_err());
        assert!(check_lookback_hours(u64::from(u32::MAX)).is_err());
        assert!(check_lookback_hours(u64::MAX).is_err());
    }

    #[test]
    fn policy_names_parse() {
        assert_eq!(parse_policy_kind("Window").unwrap(), PolicyKind::Window);
        assert_eq!(
            PolicyKind::Closest.with_lookback(3),
            SelectionPolicy::ClosestToProbes { lookback_hours: 3 }
        );
        assert!(parse_policy_kind("newest").is_err());
    }

    #[test]
    fn missing_time_policy_names_parse() {
        assert_eq!(
            parse_missing_time_policy("current-hour").unwrap(),
            MissingTimePolicy::CurrentHour
        );
        assert_eq!(
            parse_missing_time_policy(" SKIP ").unwrap(),
            MissingTimePolicy::Skip
        );
        assert!(parse_missing_time_policy("retry").is_err());
    }

    #[test]
    fn hazard_list_dedups_and_keeps_order() {
        assert_eq!(
            parse_hazard_list("icing, convection,icing,").unwrap(),
            vec![Hazard::Icing, Hazard::Convection]
        );
        assert!(parse_hazard_list(" , ").is_err());
        assert!(parse_hazard_list("icing,hail").is_err());
    }
}
