use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A dated occurrence around which price reactions are measured.
///
/// The date is a calendar date and does not have to fall on a trading day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Human-readable description, e.g. "Hurricane Ida (Aug 29, 2021)".
    pub label: String,
    pub date: NaiveDate,
    /// Disaster type used to group events, e.g. "Hurricanes".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Event {
    pub fn new(label: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            label: label.into(),
            date,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Case-insensitive match on the category name.
    pub fn is_in(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(category.trim()))
    }
}

/// An industry and the ticker that tracks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Display name, e.g. "Electric Utilities".
    pub name: String,
    /// Ticker, e.g. "XLU".
    pub symbol: String,
}

impl Instrument {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

/// The industries available for study plus the benchmark they are measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentUniverse {
    pub industries: Vec<Instrument>,
    /// Symbol of the broad market index, e.g. "SPY".
    pub benchmark: String,
}

impl InstrumentUniverse {
    pub fn new(industries: Vec<Instrument>, benchmark: impl Into<String>) -> Self {
        Self {
            industries,
            benchmark: benchmark.into(),
        }
    }

    /// Looks up the ticker for an industry name.
    pub fn symbol_for(&self, name: &str) -> Option<&str> {
        self.industries
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.symbol.as_str())
    }

    /// Looks up the display name for a ticker.
    pub fn name_for(&self, symbol: &str) -> Option<&str> {
        self.industries
            .iter()
            .find(|i| i.symbol == symbol)
            .map(|i| i.name.as_str())
    }

    /// Resolves a selection of industry names into tickers, preserving the selection order.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<String>, CoreError> {
        names
            .iter()
            .map(|name| {
                self.symbol_for(name)
                    .map(str::to_string)
                    .ok_or_else(|| CoreError::UnknownIndustry(name.clone()))
            })
            .collect()
    }

    /// The tickers to request from a market-data source: the selection followed by the benchmark.
    pub fn fetch_symbols(&self, selected: &[String]) -> Vec<String> {
        let mut symbols = selected.to_vec();
        if !symbols.iter().any(|s| s == &self.benchmark) {
            symbols.push(self.benchmark.clone());
        }
        symbols
    }
}
