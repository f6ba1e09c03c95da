use crate::report::SkippedEvent;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Price series is empty; there is no trading day to anchor on")]
    EmptySeries,

    #[error("No price data for event '{0}'")]
    EmptyFetch(String),

    #[error("A window of radius {radius} around trading day {anchor} runs off a series of {len} trading days")]
    InsufficientWindow {
        anchor: usize,
        radius: usize,
        len: usize,
    },

    #[error("All {} events were skipped; there are no usable events to show", .skipped.len())]
    AllEventsSkipped { skipped: Vec<SkippedEvent> },

    #[error("Select at least one industry")]
    NoInstruments,

    #[error("Invalid study parameter: {0}")]
    InvalidParameter(String),

    #[error("Event matrices do not share the same relative-time axis and instruments")]
    MisalignedAxes,

    #[error("Error in core data: {0}")]
    Core(#[from] CoreError),
}
