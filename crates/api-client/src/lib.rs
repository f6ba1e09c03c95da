use crate::error::ApiError;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::PriceSeries;

pub mod error;
pub mod static_client;
pub mod yahoo;

// --- Public API ---
pub use static_client::StaticClient;
pub use yahoo::{parse_chart, YahooClient};

/// The generic, abstract interface for a source of daily closing prices.
/// This trait is the contract the CLI fetches through, allowing the
/// underlying implementation (live or canned) to be swapped out.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetches daily closes for `symbols` on trading days within `[start, end]`,
    /// aligned on the union of their dates.
    async fn fetch_closes(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ApiError>;
}
