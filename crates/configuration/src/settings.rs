use core_types::{Event, Instrument, InstrumentUniverse};
use serde::Deserialize;
use std::collections::HashSet;

use crate::error::ConfigError;

/// The root configuration structure for the entire application.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub study: Study,
    /// Symbol of the broad market index abnormal returns are measured against.
    pub benchmark: String,
    /// Industries available for selection, in display order.
    pub industries: Vec<Instrument>,
    /// Events available for selection, in display order.
    pub events: Vec<Event>,
    #[serde(default = "default_intervals")]
    pub intervals: Vec<Interval>,
    #[serde(default)]
    pub output: Output,
}

/// Parameters shared by every event in a study.
#[derive(Debug, Clone, Deserialize)]
pub struct Study {
    /// Half-width of the event window in trading days.
    #[serde(default = "default_radius")]
    pub radius: usize,
    /// Multiplier applied to cumulated returns. 100 reports percentage points.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

/// A named relative-time range to summarise, e.g. `{ name = "T→T+3", from = 0, to = 3 }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Interval {
    pub name: String,
    pub from: i64,
    pub to: i64,
}

/// How results are written out.
#[derive(Debug, Clone, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub format: OutputFormat,
    /// Decimal places shown in tables.
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable terminal tables.
    #[default]
    Table,
    /// Pretty-printed JSON for an external chart renderer.
    Json,
}

// --- Default Implementations ---
// This allows a user to omit the `[study]`, `[output]` and `[[intervals]]`
// sections from their toml and still have it work with sensible defaults.

fn default_radius() -> usize {
    20
}

fn default_scale() -> f64 {
    100.0
}

fn default_decimals() -> usize {
    2
}

fn default_intervals() -> Vec<Interval> {
    vec![
        Interval { name: "T-5→T".to_string(), from: -5, to: 0 },
        Interval { name: "T→T+3".to_string(), from: 0, to: 3 },
        Interval { name: "T→T+10".to_string(), from: 0, to: 10 },
    ]
}

impl Default for Study {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            scale: default_scale(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            decimals: default_decimals(),
        }
    }
}

impl Config {
    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.study.radius == 0 {
            return invalid("study.radius must be at least 1".to_string());
        }
        if !self.study.scale.is_finite() || self.study.scale == 0.0 {
            return invalid(format!("study.scale must be a non-zero number, got {}", self.study.scale));
        }
        if self.benchmark.trim().is_empty() {
            return invalid("benchmark must name a symbol".to_string());
        }
        if self.industries.is_empty() {
            return invalid("at least one [[industries]] entry is required".to_string());
        }
        if self.events.is_empty() {
            return invalid("at least one [[events]] entry is required".to_string());
        }

        if let Some(name) = first_duplicate(self.industries.iter().map(|i| i.name.as_str())) {
            return invalid(format!("industry '{name}' is defined twice"));
        }
        if let Some(symbol) = first_duplicate(self.industries.iter().map(|i| i.symbol.as_str())) {
            return invalid(format!("symbol '{symbol}' is used by two industries"));
        }
        if let Some(industry) = self.industries.iter().find(|i| i.symbol == self.benchmark) {
            return invalid(format!(
                "industry '{}' uses the benchmark symbol {}",
                industry.name, self.benchmark
            ));
        }
        if let Some(label) = first_duplicate(self.events.iter().map(|e| e.label.as_str())) {
            return invalid(format!("event '{label}' is defined twice"));
        }

        if let Some(interval) = self.intervals.iter().find(|i| i.from > i.to) {
            return invalid(format!(
                "interval '{}' starts at {} after it ends at {}",
                interval.name, interval.from, interval.to
            ));
        }
        if let Some(name) = first_duplicate(self.intervals.iter().map(|i| i.name.as_str())) {
            return invalid(format!("interval '{name}' is defined twice"));
        }

        Ok(())
    }

    /// Industries and benchmark as a lookup table.
    pub fn universe(&self) -> InstrumentUniverse {
        InstrumentUniverse::new(self.industries.clone(), self.benchmark.clone())
    }

    pub fn event(&self, label: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.label == label)
    }

    /// Events of one disaster type, in configured order.
    pub fn events_in(&self, category: &str) -> Vec<&Event> {
        self.events.iter().filter(|e| e.is_in(category)).collect()
    }

    /// Distinct event categories in order of first appearance.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for category in self.events.iter().filter_map(|e| e.category.as_deref()) {
            if !categories.iter().any(|c| c.eq_ignore_ascii_case(category)) {
                categories.push(category);
            }
        }
        categories
    }
}

fn first_duplicate<'a>(mut items: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    items.find(|item| !seen.insert(*item))
}
