//! # Aftershock Analytics Engine
//!
//! This crate computes event-study statistics: abnormal returns, CAR and CAAR
//! of industry price series around dated events, and their interval means.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   market-data sources or renderers. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** `EventStudyEngine` takes already-fetched
//!   `PriceSeries` and produces immutable reports. Nothing is mutated after it
//!   is handed in.
//! - **Explicit sentinels:** undefined values stay `NaN`, insufficient events
//!   are reported as `SkippedEvent`s, unavailable intervals are flagged. None of
//!   them are silently turned into zeros.
//!
//! ## Pipeline
//!
//! 1. `locator`: nearest trading day to the event date (the anchor).
//! 2. `window`: symmetric window of `radius` trading days around the anchor.
//! 3. `returns`: abnormal returns against the benchmark and their cumulative sum.
//!    The first row of each window is dropped because it has no prior close.
//! 4. `engine`: single-event studies and multi-event CAAR.
//! 5. `summary`: interval means per instrument.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod locator;
pub mod report;
pub mod returns;
pub mod summary;
pub mod window;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{EventPrices, EventStudyEngine, StudyParameters};
pub use error::AnalyticsError;
pub use locator::nearest_trading_day;
pub use report::{AggregateStudy, EventCar, SingleEventStudy, SkipReason, SkippedEvent};
pub use returns::{AbnormalReturns, ReturnCalculator, PERCENTAGE_POINTS};
pub use summary::{
    summarize, InstrumentSummary, IntervalOutcome, IntervalSummary, IntervalValue, NamedInterval,
    Unavailable,
};
pub use window::{calendar_span, EventWindow, WindowMode, WindowShortfall, DEFAULT_RADIUS};
