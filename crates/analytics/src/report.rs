use crate::window::{EventWindow, WindowShortfall};
use chrono::NaiveDate;
use core_types::{Event, RelativeMatrix};
use serde::Serialize;
use std::fmt;

/// Result of studying one event in display mode.
///
/// Windows that run off the series are clamped rather than rejected; `warning`
/// says how much is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleEventStudy {
    pub event: Event,
    /// The trading day used as T.
    pub anchor_date: NaiveDate,
    pub window: EventWindow,
    /// Raw closes of the selected instruments over the whole window.
    pub prices: RelativeMatrix,
    /// Closes rebased to 100 at T.
    pub normalized_prices: RelativeMatrix,
    pub abnormal: RelativeMatrix,
    pub car: RelativeMatrix,
    pub warning: Option<WindowShortfall>,
}

impl SingleEventStudy {
    /// False when every CAR value is undefined, which callers must treat as insufficient data.
    pub fn is_usable(&self) -> bool {
        !self.car.is_all_nan()
    }
}

/// CAR of one event that contributed to an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventCar {
    pub label: String,
    pub anchor_date: NaiveDate,
    pub car: RelativeMatrix,
}

/// Why an event was left out of an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The market-data source returned no rows.
    EmptyFetch,
    /// The full window does not fit in the fetched series.
    InsufficientWindow {
        anchor: usize,
        radius: usize,
        len: usize,
    },
    /// Every abnormal return in the window is undefined.
    NoUsableReturns,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyFetch => write!(f, "no price data"),
            SkipReason::InsufficientWindow { anchor, radius, len } => write!(
                f,
                "window of ±{radius} around trading day {anchor} does not fit {len} trading days"
            ),
            SkipReason::NoUsableReturns => write!(f, "no defined abnormal returns"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEvent {
    pub label: String,
    pub reason: SkipReason,
}

/// Result of averaging CAR across several events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStudy {
    /// Cell-wise mean of the contributing events' CAR.
    pub caar: RelativeMatrix,
    /// Number of defined contributions behind each CAAR cell, aligned with `caar`.
    pub contributions: Vec<Vec<usize>>,
    /// Contributing events in input order, for overlay charts.
    pub per_event: Vec<EventCar>,
    pub skipped: Vec<SkippedEvent>,
}

impl AggregateStudy {
    pub fn event_count(&self) -> usize {
        self.per_event.len()
    }

    pub fn was_skipped(&self, label: &str) -> bool {
        self.skipped.iter().any(|s| s.label == label)
    }
}
