use core_types::{RelativeMatrix, Sign};
use serde::{Deserialize, Serialize};

/// A named set of relative-time offsets to average over, e.g. "T-5→T".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedInterval {
    pub name: String,
    pub offsets: Vec<i64>,
}

impl NamedInterval {
    pub fn new(name: impl Into<String>, offsets: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            offsets,
        }
    }

    /// Every offset from `from` to `to`, inclusive.
    pub fn span(name: impl Into<String>, from: i64, to: i64) -> Self {
        Self::new(name, (from..=to).collect())
    }

    /// Pre-event drift, short-horizon reaction and medium-horizon recovery.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::span("T-5→T", -5, 0),
            Self::span("T→T+3", 0, 3),
            Self::span("T→T+10", 0, 10),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Unavailable {
    /// The series does not reach these offsets (only after a clamped window).
    MissingOffsets { offsets: Vec<i64> },
    /// All offsets exist but at least one value is undefined.
    UndefinedValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntervalOutcome {
    Mean { value: f64, sign: Sign },
    Unavailable { reason: Unavailable },
}

impl IntervalOutcome {
    pub fn mean(&self) -> Option<f64> {
        match self {
            IntervalOutcome::Mean { value, .. } => Some(*value),
            IntervalOutcome::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalValue {
    pub interval: String,
    pub outcome: IntervalOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentSummary {
    pub instrument: String,
    pub intervals: Vec<IntervalValue>,
}

/// Interval means of a CAR or CAAR matrix, per instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalSummary {
    pub instruments: Vec<InstrumentSummary>,
}

impl IntervalSummary {
    pub fn get(&self, instrument: &str, interval: &str) -> Option<&IntervalOutcome> {
        self.instruments
            .iter()
            .find(|s| s.instrument == instrument)?
            .intervals
            .iter()
            .find(|v| v.interval == interval)
            .map(|v| &v.outcome)
    }

    /// Only the intervals that produced a mean, as (instrument, interval, mean, sign).
    pub fn available(&self) -> impl Iterator<Item = (&str, &str, f64, Sign)> + '_ {
        self.instruments.iter().flat_map(|s| {
            s.intervals.iter().filter_map(move |v| match v.outcome {
                IntervalOutcome::Mean { value, sign } => {
                    Some((s.instrument.as_str(), v.interval.as_str(), value, sign))
                }
                IntervalOutcome::Unavailable { .. } => None,
            })
        })
    }
}

/// Averages `matrix` over each named interval, for every instrument.
pub fn summarize(matrix: &RelativeMatrix, intervals: &[NamedInterval]) -> IntervalSummary {
    let instruments = matrix
        .instruments()
        .iter()
        .map(|symbol| InstrumentSummary {
            instrument: symbol.clone(),
            intervals: intervals
                .iter()
                .map(|interval| IntervalValue {
                    interval: interval.name.clone(),
                    outcome: interval_mean(matrix, symbol, interval),
                })
                .collect(),
        })
        .collect();
    IntervalSummary { instruments }
}

fn interval_mean(matrix: &RelativeMatrix, symbol: &str, interval: &NamedInterval) -> IntervalOutcome {
    let missing: Vec<i64> = interval
        .offsets
        .iter()
        .copied()
        .filter(|o| matrix.position(*o).is_none())
        .collect();
    if !missing.is_empty() {
        tracing::debug!(symbol, interval = %interval.name, ?missing, "Interval reaches outside the series.");
        return IntervalOutcome::Unavailable {
            reason: Unavailable::MissingOffsets { offsets: missing },
        };
    }

    let values: Option<Vec<f64>> = interval
        .offsets
        .iter()
        .map(|o| matrix.value(*o, symbol).filter(|v| v.is_finite()))
        .collect();
    match values {
        Some(values) if !values.is_empty() => {
            let value = values.iter().sum::<f64>() / values.len() as f64;
            IntervalOutcome::Mean {
                value,
                sign: Sign::of(value),
            }
        }
        _ => IntervalOutcome::Unavailable {
            reason: Unavailable::UndefinedValues,
        },
    }
}
