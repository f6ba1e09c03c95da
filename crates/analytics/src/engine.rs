use crate::aggregate::mean_ignoring_nan;
use crate::error::AnalyticsError;
use crate::locator::nearest_trading_day;
use crate::report::{AggregateStudy, EventCar, SingleEventStudy, SkipReason, SkippedEvent};
use crate::returns::{ReturnCalculator, PERCENTAGE_POINTS};
use crate::window::{EventWindow, WindowMode, DEFAULT_RADIUS};
use core_types::{Event, PriceSeries, RelativeMatrix};
use serde::{Deserialize, Serialize};

/// Fixed settings shared by every event in a study.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudyParameters {
    /// Half-width of the event window in trading days.
    pub radius: usize,
    /// Multiplier applied to cumulated returns (100 for percentage points).
    pub scale: f64,
}

impl Default for StudyParameters {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            scale: PERCENTAGE_POINTS,
        }
    }
}

/// An event together with the prices fetched for it.
///
/// A failed or empty fetch is represented by an empty series.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPrices {
    pub event: Event,
    pub prices: PriceSeries,
}

impl EventPrices {
    pub fn new(event: Event, prices: PriceSeries) -> Self {
        Self { event, prices }
    }
}

/// A stateless calculator for event-study statistics.
#[derive(Debug, Clone, Default)]
pub struct EventStudyEngine {
    params: StudyParameters,
    calculator: ReturnCalculator,
}

impl EventStudyEngine {
    pub fn new(params: StudyParameters) -> Self {
        Self {
            params,
            calculator: ReturnCalculator::new(params.scale),
        }
    }

    pub fn params(&self) -> &StudyParameters {
        &self.params
    }

    /// Studies one event for display.
    ///
    /// A window that runs off the series is clamped and reported through
    /// `SingleEventStudy::warning` instead of failing.
    ///
    /// # Arguments
    ///
    /// * `event` - The event to anchor on.
    /// * `prices` - Closes covering the event for `instruments` and `benchmark`.
    /// * `instruments` - The symbols to measure, in display order.
    /// * `benchmark` - The symbol abnormal returns are measured against.
    pub fn single_event(
        &self,
        event: &Event,
        prices: &PriceSeries,
        instruments: &[String],
        benchmark: &str,
    ) -> Result<SingleEventStudy, AnalyticsError> {
        self.validate(instruments)?;
        if prices.is_empty() {
            return Err(AnalyticsError::EmptyFetch(event.label.clone()));
        }

        let anchor = nearest_trading_day(prices.dates(), event.date)?;
        let window = EventWindow::extract(anchor, self.params.radius, prices.len(), WindowMode::Clamp)?;
        let window_prices = prices.slice(window.start, window.end)?;
        let returns = self
            .calculator
            .compute(&window_prices, &window, instruments, benchmark)?;

        let anchor_date = prices.dates()[anchor];
        tracing::debug!(event = %event.label, %anchor_date, partial = window.partial, "Anchored single event.");

        let prices_matrix = price_matrix(&window_prices, &window, instruments)?;
        let normalized_prices = rebase(&prices_matrix, 100.0)?;

        Ok(SingleEventStudy {
            event: event.clone(),
            anchor_date,
            window,
            prices: prices_matrix,
            normalized_prices,
            abnormal: returns.abnormal,
            car: returns.car,
            warning: window.shortfall(),
        })
    }

    /// Averages CAR across events into CAAR.
    ///
    /// Events whose full window does not fit, whose fetch came back empty, or
    /// whose returns are entirely undefined are skipped and reported. If every
    /// event is skipped the study fails with `AllEventsSkipped`.
    pub fn aggregate(
        &self,
        inputs: &[EventPrices],
        instruments: &[String],
        benchmark: &str,
    ) -> Result<AggregateStudy, AnalyticsError> {
        self.validate(instruments)?;

        let mut per_event = Vec::with_capacity(inputs.len());
        let mut skipped = Vec::new();

        for input in inputs {
            let label = &input.event.label;
            let reason = match self.event_car(input, instruments, benchmark) {
                Ok(event_car) if event_car.car.is_all_nan() => SkipReason::NoUsableReturns,
                Ok(event_car) => {
                    per_event.push(event_car);
                    continue;
                }
                Err(AnalyticsError::EmptyFetch(_)) => SkipReason::EmptyFetch,
                Err(AnalyticsError::InsufficientWindow { anchor, radius, len }) => {
                    SkipReason::InsufficientWindow { anchor, radius, len }
                }
                Err(e) => return Err(e),
            };
            tracing::warn!(event = %label, %reason, "Skipping event.");
            skipped.push(SkippedEvent {
                label: label.clone(),
                reason,
            });
        }

        if per_event.is_empty() {
            return Err(AnalyticsError::AllEventsSkipped { skipped });
        }

        let (caar, contributions) = mean_ignoring_nan(per_event.iter().map(|e| &e.car))?;
        tracing::info!(
            events = per_event.len(),
            skipped = skipped.len(),
            instruments = instruments.len(),
            "Computed CAAR."
        );

        Ok(AggregateStudy {
            caar,
            contributions,
            per_event,
            skipped,
        })
    }

    /// CAR of one event over a full, unclamped window.
    fn event_car(
        &self,
        input: &EventPrices,
        instruments: &[String],
        benchmark: &str,
    ) -> Result<EventCar, AnalyticsError> {
        let prices = &input.prices;
        if prices.is_empty() {
            return Err(AnalyticsError::EmptyFetch(input.event.label.clone()));
        }

        let anchor = nearest_trading_day(prices.dates(), input.event.date)?;
        let window = EventWindow::extract(anchor, self.params.radius, prices.len(), WindowMode::Strict)?;
        let window_prices = prices.slice(window.start, window.end)?;
        let returns = self
            .calculator
            .compute(&window_prices, &window, instruments, benchmark)?;

        let anchor_date = prices.dates()[anchor];
        tracing::debug!(event = %input.event.label, %anchor_date, "Anchored event.");

        Ok(EventCar {
            label: input.event.label.clone(),
            anchor_date,
            car: returns.car,
        })
    }

    fn validate(&self, instruments: &[String]) -> Result<(), AnalyticsError> {
        if instruments.is_empty() {
            return Err(AnalyticsError::NoInstruments);
        }
        if self.params.radius == 0 {
            return Err(AnalyticsError::InvalidParameter("radius must be at least 1".to_string()));
        }
        if !self.params.scale.is_finite() || self.params.scale == 0.0 {
            return Err(AnalyticsError::InvalidParameter(format!(
                "scale must be a non-zero number, got {}",
                self.params.scale
            )));
        }
        Ok(())
    }
}

/// Window closes for the selected instruments over the full relative axis.
fn price_matrix(
    window_prices: &PriceSeries,
    window: &EventWindow,
    instruments: &[String],
) -> Result<RelativeMatrix, AnalyticsError> {
    let columns: Vec<Vec<f64>> = instruments
        .iter()
        .map(|symbol| match window_prices.column(symbol) {
            Some(closes) => closes.to_vec(),
            None => vec![f64::NAN; window_prices.len()],
        })
        .collect();
    Ok(RelativeMatrix::new(
        window.offsets().collect(),
        instruments.to_vec(),
        columns,
    )?)
}

/// Rebases every column so its value at T equals `base`.
fn rebase(prices: &RelativeMatrix, base: f64) -> Result<RelativeMatrix, AnalyticsError> {
    let columns: Vec<Vec<f64>> = prices
        .instruments()
        .iter()
        .map(|symbol| {
            let anchor = prices.value(0, symbol).unwrap_or(f64::NAN);
            let closes = prices.column(symbol).unwrap_or_default();
            if anchor.is_finite() && anchor > 0.0 {
                closes.iter().map(|p| p / anchor * base).collect()
            } else {
                vec![f64::NAN; closes.len()]
            }
        })
        .collect();
    Ok(RelativeMatrix::new(
        prices.offsets().to_vec(),
        prices.instruments().to_vec(),
        columns,
    )?)
}
