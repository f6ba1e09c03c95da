use crate::error::ApiError;
use crate::MarketDataClient;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::PriceSeries;

/// Serves closes from a series held in memory.
///
/// Used for offline runs and tests. Requested symbols the series does not
/// carry are left out of the result.
#[derive(Debug, Clone)]
pub struct StaticClient {
    series: PriceSeries,
}

impl StaticClient {
    pub fn new(series: PriceSeries) -> Self {
        Self { series }
    }
}

#[async_trait]
impl MarketDataClient for StaticClient {
    async fn fetch_closes(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError> {
        let window = self.series.between(start, end);
        let observations = symbols
            .iter()
            .filter_map(|symbol| {
                let closes = window.column(symbol)?;
                let pairs = window
                    .dates()
                    .iter()
                    .copied()
                    .zip(closes.iter().copied())
                    .collect();
                Some((symbol.clone(), pairs))
            })
            .collect();
        Ok(PriceSeries::from_observations(observations)?)
    }
}
