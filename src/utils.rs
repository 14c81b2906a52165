use chrono::{DateTime, TimeDelta, Timelike, Utc};

use crate::constants::PROBE_STEP_SECONDS;

pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

pub fn floor_timestamp(timestamp: DateTime<Utc>, step_seconds: i64) -> DateTime<Utc> {
    let step = step_seconds.max(1);
    let floored = timestamp.timestamp().div_euclid(step) * step;
    DateTime::<Utc>::from_timestamp(floored, 0).unwrap_or(timestamp)
}

pub fn round_to_nearest_hour(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let floored = floor_timestamp(timestamp, PROBE_STEP_SECONDS);
    if timestamp.minute() >= 30 {
        floored + TimeDelta::hours(1)
    } else {
        floored
    }
}

pub fn normalize_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}
