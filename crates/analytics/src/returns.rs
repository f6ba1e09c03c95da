use crate::error::AnalyticsError;
use crate::window::EventWindow;
use core_types::{PriceSeries, RelativeMatrix};
use serde::Serialize;

/// Scale factor that turns fractional returns into percentage points.
pub const PERCENTAGE_POINTS: f64 = 100.0;

/// Abnormal returns and their running sum for one event window.
///
/// Both matrices share the window's relative-time axis minus its first point,
/// which has no prior price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbnormalReturns {
    pub abnormal: RelativeMatrix,
    /// Cumulative abnormal return in percentage points.
    pub car: RelativeMatrix,
}

/// Simple return between two closes. Undefined when either close is missing or not positive.
pub fn simple_return(previous: f64, current: f64) -> f64 {
    if previous.is_finite() && current.is_finite() && previous > 0.0 && current > 0.0 {
        current / previous - 1.0
    } else {
        f64::NAN
    }
}

/// Period-over-period returns. The output is one shorter than the input.
pub fn period_returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| simple_return(w[0], w[1])).collect()
}

/// Running sum of `values` times `scale`.
///
/// No gap filling: once a `NaN` enters the sum every later point is `NaN` too.
pub fn cumulate(values: &[f64], scale: f64) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |total, v| {
            *total += v;
            Some(*total * scale)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnCalculator {
    scale: f64,
}

impl Default for ReturnCalculator {
    fn default() -> Self {
        Self::new(PERCENTAGE_POINTS)
    }
}

impl ReturnCalculator {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    /// Computes abnormal returns of `instruments` against `benchmark` over a windowed slice.
    ///
    /// `window_prices` must be exactly the rows covered by `window`. A symbol
    /// missing from the slice yields an all-`NaN` column.
    pub fn compute(
        &self,
        window_prices: &PriceSeries,
        window: &EventWindow,
        instruments: &[String],
        benchmark: &str,
    ) -> Result<AbnormalReturns, AnalyticsError> {
        if window_prices.len() != window.row_count() {
            return Err(AnalyticsError::InvalidParameter(format!(
                "window covers {} rows but the slice has {}",
                window.row_count(),
                window_prices.len()
            )));
        }

        // The first row has no prior close and is dropped.
        let offsets: Vec<i64> = window.offsets().skip(1).collect();
        let benchmark_returns = symbol_returns(window_prices, benchmark);

        let mut abnormal_columns = Vec::with_capacity(instruments.len());
        let mut car_columns = Vec::with_capacity(instruments.len());
        for symbol in instruments {
            let abnormal: Vec<f64> = symbol_returns(window_prices, symbol)
                .iter()
                .zip(&benchmark_returns)
                .map(|(r, b)| r - b)
                .collect();
            car_columns.push(cumulate(&abnormal, self.scale));
            abnormal_columns.push(abnormal);
        }

        Ok(AbnormalReturns {
            abnormal: RelativeMatrix::new(offsets.clone(), instruments.to_vec(), abnormal_columns)?,
            car: RelativeMatrix::new(offsets, instruments.to_vec(), car_columns)?,
        })
    }
}

fn symbol_returns(prices: &PriceSeries, symbol: &str) -> Vec<f64> {
    match prices.column(symbol) {
        Some(closes) => period_returns(closes),
        None => {
            tracing::debug!(symbol, "Symbol absent from the window; its returns are undefined.");
            vec![f64::NAN; prices.len().saturating_sub(1)]
        }
    }
}
