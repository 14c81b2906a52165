//! Analysis-time reconciliation.
//!
//! Providers advertise the forecast snapshots they hold as RFC 3339 strings, with
//! inconsistent `Z` / `+00:00` spellings. Everything here compares parsed instants,
//! while the provider's own spelling is kept for echoing back in queries.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

use crate::constants::{CURRENT_HOUR_FORMAT, PROBE_STEP_SECONDS, PROBE_TIME_FORMAT};
use crate::utils::{floor_timestamp, round_to_nearest_hour};

#[derive(Clone, Debug)]
pub struct AnalysisTime {
    raw: String,
    instant: DateTime<Utc>,
}

impl AnalysisTime {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let instant = DateTime::parse_from_rfc3339(trimmed)
            .ok()?
            .with_timezone(&Utc);
        Some(Self {
            raw: trimmed.to_string(),
            instant,
        })
    }

    pub fn from_instant(instant: DateTime<Utc>, format: &str) -> Self {
        Self {
            raw: instant.format(format).to_string(),
            instant,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}

impl PartialEq for AnalysisTime {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for AnalysisTime {}

impl Hash for AnalysisTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instant.hash(state);
    }
}

impl fmt::Display for AnalysisTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn lookback(now: DateTime<Utc>, hours: u32) -> Self {
        Self {
            start: now - TimeDelta::hours(i64::from(hours)),
            end: now,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionPolicy {
    Latest,
    Window { lookback_hours: u32 },
    ClosestToProbes { lookback_hours: u32 },
    Implicit,
}

impl SelectionPolicy {
    pub fn is_series(&self) -> bool {
        matches!(self, Self::Window { .. } | Self::ClosestToProbes { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingTimePolicy {
    Skip,
    CurrentHour,
    Implicit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeQuery {
    At(AnalysisTime),
    Implicit,
}

impl TimeQuery {
    pub fn analysis_time(&self) -> Option<&AnalysisTime> {
        match self {
            Self::At(time) => Some(time),
            Self::Implicit => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalysisTimeSelector {
    pub policy: SelectionPolicy,
    pub missing: MissingTimePolicy,
}

impl AnalysisTimeSelector {
    pub fn new(policy: SelectionPolicy, missing: MissingTimePolicy) -> Self {
        Self { policy, missing }
    }

    pub fn plan(&self, times: &[AnalysisTime], now: DateTime<Utc>) -> Vec<TimeQuery> {
        let selected: Vec<AnalysisTime> = match self.policy {
            SelectionPolicy::Implicit => return vec![TimeQuery::Implicit],
            SelectionPolicy::Latest => select_latest(times).into_iter().collect(),
            SelectionPolicy::Window { lookback_hours } => {
                select_in_window(times, &TimeWindow::lookback(now, lookback_hours))
            }
            SelectionPolicy::ClosestToProbes { lookback_hours } => {
                desired_probe_times(now, lookback_hours)
                    .iter()
                    .filter_map(|probe| closest_to(probe, times))
                    .collect()
            }
        };

        let selected = dedup_instants(selected);
        if !selected.is_empty() {
            return selected.into_iter().map(TimeQuery::At).collect();
        }

        match self.missing {
            MissingTimePolicy::Skip => Vec::new(),
            MissingTimePolicy::Implicit => vec![TimeQuery::Implicit],
            MissingTimePolicy::CurrentHour => vec![TimeQuery::At(AnalysisTime::from_instant(
                floor_timestamp(now, PROBE_STEP_SECONDS),
                CURRENT_HOUR_FORMAT,
            ))],
        }
    }
}

pub fn parse_analysis_times<S: AsRef<str>>(raw: &[S]) -> Vec<AnalysisTime> {
    raw.iter()
        .filter_map(|value| {
            let value = value.as_ref();
            let parsed = AnalysisTime::parse(value);
            if parsed.is_none() {
                warn!("Skipping malformed analysis time {value:?}");
            }
            parsed
        })
        .collect()
}

pub fn select_latest(times: &[AnalysisTime]) -> Option<AnalysisTime> {
    times.first().cloned()
}

pub fn select_in_window(times: &[AnalysisTime], window: &TimeWindow) -> Vec<AnalysisTime> {
    times
        .iter()
        .filter(|time| window.contains(time.instant))
        .cloned()
        .collect()
}

pub fn closest_to(target: &AnalysisTime, times: &[AnalysisTime]) -> Option<AnalysisTime> {
    let mut best: Option<(&AnalysisTime, TimeDelta)> = None;
    for time in times {
        let diff = (time.instant() - target.instant()).abs();
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((time, diff)),
        }
    }
    best.map(|(time, _)| time.clone())
}

pub fn desired_probe_times(now: DateTime<Utc>, lookback_hours: u32) -> Vec<AnalysisTime> {
    let probes = (0..=lookback_hours).rev().map(|offset| {
        let rounded = round_to_nearest_hour(now - TimeDelta::hours(i64::from(offset)));
        AnalysisTime::from_instant(rounded, PROBE_TIME_FORMAT)
    });
    dedup_instants(probes)
}

fn dedup_instants<I>(times: I) -> Vec<AnalysisTime>
where
    I: IntoIterator<Item = AnalysisTime>,
{
    let mut seen = HashSet::new();
    times
        .into_iter()
        .filter(|time| seen.insert(time.instant))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(value: &str) -> AnalysisTime {
        AnalysisTime::parse(value).unwrap()
    }

    fn set(values: &[&str]) -> Vec<AnalysisTime> {
        values.iter().map(|value| t(value)).collect()
    }

    fn now() -> DateTime<Utc> {
        t("2024-01-01T10:15:00Z").instant()
    }

    #[test]
    fn latest_is_first_element_regardless_of_order() {
        let times = set(&["2024-01-01T06:00:00Z", "2024-01-01T09:00:00Z"]);
        let latest = select_latest(&times).unwrap();
        assert_eq!(latest.as_str(), "2024-01-01T06:00:00Z");
    }

    #[test]
    fn latest_of_empty_set_is_none() {
        assert!(select_latest(&[]).is_none());
    }

    #[test]
    fn z_and_utc_offset_compare_equal() {
        assert_eq!(t("2024-01-01T00:00:00Z"), t("2024-01-01T00:00:00+00:00"));
        assert_eq!(t("2024-01-01T02:00:00+02:00"), t("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let times = parse_analysis_times(&["nope", "2024-01-01T09:00:00Z", "2024-13-01T00:00:00Z"]);
        assert_eq!(times, set(&["2024-01-01T09:00:00Z"]));
    }

    #[test]
    fn parse_keeps_provider_spelling() {
        let time = t("2024-01-01T09:00:00+00:00");
        assert_eq!(time.to_string(), "2024-01-01T09:00:00+00:00");
    }

    #[test]
    fn window_is_inclusive_and_order_preserving() {
        let times = set(&[
            "2024-01-01T10:15:00Z",
            "2024-01-01T03:00:00Z",
            "2024-01-01T04:15:00+00:00",
            "2024-01-01T11:00:00Z",
            "2024-01-01T07:00:00Z",
        ]);
        let window = TimeWindow::lookback(now(), 6);
        let selected = select_in_window(&times, &window);
        let raw: Vec<&str> = selected.iter().map(AnalysisTime::as_str).collect();
        assert_eq!(
            raw,
            vec![
                "2024-01-01T10:15:00Z",
                "2024-01-01T04:15:00+00:00",
                "2024-01-01T07:00:00Z"
            ]
        );
    }

    #[test]
    fn window_without_matches_is_empty() {
        let times = set(&["2023-12-31T00:00:00Z"]);
        assert!(select_in_window(&times, &TimeWindow::lookback(now(), 6)).is_empty());
    }

    #[test]
    fn closest_breaks_ties_by_first_occurrence() {
        let times = set(&["2024-01-01T09:00:00Z", "2024-01-01T11:00:00Z"]);
        let closest = closest_to(&t("2024-01-01T10:00:00Z"), &times).unwrap();
        assert_eq!(closest.as_str(), "2024-01-01T09:00:00Z");
    }

    #[test]
    fn closest_matches_across_offset_spellings() {
        let times = set(&["2024-01-01T08:00:00Z", "2024-01-01T10:00:00+00:00"]);
        let closest = closest_to(&t("2024-01-01T10:00:00Z"), &times).unwrap();
        assert_eq!(closest.as_str(), "2024-01-01T10:00:00+00:00");
    }

    #[test]
    fn closest_of_empty_set_is_none() {
        assert!(closest_to(&t("2024-01-01T10:00:00Z"), &[]).is_none());
    }

    #[test]
    fn probe_times_cover_seven_rounded_hours() {
        let probes = desired_probe_times(now(), 6);
        let expected = set(&[
            "2024-01-01T04:00:00Z",
            "2024-01-01T05:00:00Z",
            "2024-01-01T06:00:00Z",
            "2024-01-01T07:00:00Z",
            "2024-01-01T08:00:00Z",
            "2024-01-01T09:00:00Z",
            "2024-01-01T10:00:00Z",
        ]);
        assert_eq!(probes, expected);
        assert_eq!(probes[0].as_str(), "2024-01-01T04:00:00+00:00");
    }

    #[test]
    fn zero_lookback_yields_single_probe() {
        let probes = desired_probe_times(t("2024-01-01T10:45:00Z").instant(), 0);
        assert_eq!(probes, set(&["2024-01-01T11:00:00Z"]));
    }

    #[test]
    fn implicit_policy_ignores_advertised_times() {
        let selector = AnalysisTimeSelector::new(SelectionPolicy::Implicit, MissingTimePolicy::Skip);
        let times = set(&["2024-01-01T09:00:00Z"]);
        assert_eq!(selector.plan(&times, now()), vec![TimeQuery::Implicit]);
    }

    #[test]
    fn latest_policy_falls_back_per_missing_policy() {
        let skip = AnalysisTimeSelector::new(SelectionPolicy::Latest, MissingTimePolicy::Skip);
        assert!(skip.plan(&[], now()).is_empty());

        let implicit =
            AnalysisTimeSelector::new(SelectionPolicy::Latest, MissingTimePolicy::Implicit);
        assert_eq!(implicit.plan(&[], now()), vec![TimeQuery::Implicit]);

        let current =
            AnalysisTimeSelector::new(SelectionPolicy::Latest, MissingTimePolicy::CurrentHour);
        let plan = current.plan(&[], now());
        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan[0].analysis_time().map(AnalysisTime::as_str),
            Some("2024-01-01T10:00:00Z")
        );
    }

    #[test]
    fn window_plan_drops_duplicate_instants() {
        let selector = AnalysisTimeSelector::new(
            SelectionPolicy::Window { lookback_hours: 6 },
            MissingTimePolicy::Skip,
        );
        let times = set(&[
            "2024-01-01T09:00:00Z",
            "2024-01-01T09:00:00+00:00",
            "2024-01-01T08:00:00Z",
        ]);
        let plan = selector.plan(&times, now());
        let raw: Vec<&str> = plan
            .iter()
            .filter_map(TimeQuery::analysis_time)
            .map(AnalysisTime::as_str)
            .collect();
        assert_eq!(raw, vec!["2024-01-01T09:00:00Z", "2024-01-01T08:00:00Z"]);
    }

    #[test]
    fn closest_to_probes_collapses_onto_available_times() {
        let selector = AnalysisTimeSelector::new(
            SelectionPolicy::ClosestToProbes { lookback_hours: 6 },
            MissingTimePolicy::Skip,
        );
        let times = set(&["2024-01-01T09:30:00Z", "2024-01-01T05:10:00Z"]);
        let plan = selector.plan(&times, now());
        let raw: Vec<&str> = plan
            .iter()
            .filter_map(TimeQuery::analysis_time)
            .map(AnalysisTime::as_str)
            .collect();
        assert_eq!(raw, vec!["2024-01-01T05:10:00Z", "2024-01-01T09:30:00Z"]);
    }
}
