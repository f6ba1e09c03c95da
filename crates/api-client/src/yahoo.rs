use crate::error::ApiError;
use crate::MarketDataClient;
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate};
use core_types::PriceSeries;
use futures::future::try_join_all;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) aftershock/0.1";

/// Daily closes from the public Yahoo Finance chart endpoint.
///
/// Adjusted closes are used when the response carries them.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn fetch_symbol(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(String, Vec<(NaiveDate, f64)>), ApiError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        // period2 is exclusive.
        let period1 = start.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp());
        let period2 = end
            .checked_add_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|t| t.and_utc().timestamp());
        let (Some(period1), Some(period2)) = (period1, period2) else {
            return Err(ApiError::InvalidData(format!("date range {start}..={end} out of bounds")));
        };

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!(%symbol, status = status.as_u16(), "Chart request failed.");
            return Err(ApiError::Status {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let closes = parse_chart(symbol, &text)?;
        tracing::debug!(%symbol, rows = closes.len(), "Fetched daily closes.");
        Ok((symbol.to_string(), closes))
    }
}

#[async_trait]
impl MarketDataClient for YahooClient {
    async fn fetch_closes(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError> {
        let requests = symbols.iter().map(|s| self.fetch_symbol(s, start, end));
        let observations = try_join_all(requests).await?;
        Ok(PriceSeries::from_observations(observations)?)
    }
}

/// Extracts `(trading day, close)` pairs from a chart response body.
///
/// Days whose close is null are left out. Timestamps are shifted by the
/// exchange's GMT offset before taking the calendar date.
pub fn parse_chart(symbol: &str, body: &str) -> Result<Vec<(NaiveDate, f64)>, ApiError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| ApiError::Deserialization(format!("chart for {symbol}: {e}")))?;

    if let Some(error) = response.chart.error.filter(|e| !e.is_null()) {
        return Err(ApiError::InvalidData(format!("chart API error for {symbol}: {error}")));
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(ApiError::InvalidData(format!("no chart data for {symbol}")));
    };
    let timestamps = result.timestamp.unwrap_or_default();
    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

    let adjusted = result
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .map(|a| a.adjclose);
    let closes = match adjusted {
        Some(values) if !values.is_empty() => values,
        _ => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default(),
    };

    if closes.len() != timestamps.len() {
        return Err(ApiError::InvalidData(format!(
            "{symbol}: {} timestamps but {} closes",
            timestamps.len(),
            closes.len()
        )));
    }

    let mut observations = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.into_iter().zip(closes) {
        let Some(close) = close else {
            continue;
        };
        let date = DateTime::from_timestamp(ts + offset, 0)
            .ok_or_else(|| ApiError::InvalidData(format!("{symbol}: invalid timestamp {ts}")))?
            .date_naive();
        // Intraday snapshots of the current session can repeat the last date.
        if observations.last().is_some_and(|(last, _)| *last == date) {
            observations.pop();
        }
        observations.push((date, close));
    }
    Ok(observations)
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
    #[serde(default)]
    adjclose: Option<Vec<ChartAdjClose>>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}
