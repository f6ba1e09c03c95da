use crate::error::CoreError;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Closing prices on trading days for a set of symbols.
///
/// Invariants upheld by every constructor:
/// - dates are strictly increasing,
/// - every symbol column has one value per date,
/// - no row is missing for *all* symbols.
///
/// A missing close is stored as `NaN`. Partial missingness is tolerated and
/// flows downstream as undefined returns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl PriceSeries {
    /// Builds a series from column-major data, dropping rows where every symbol is missing.
    pub fn new(
        dates: Vec<NaiveDate>,
        symbols: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, CoreError> {
        if symbols.len() != columns.len() {
            return Err(CoreError::InvalidInput(
                "columns".to_string(),
                format!("{} symbols but {} columns", symbols.len(), columns.len()),
            ));
        }

        let mut seen = HashSet::new();
        for (symbol, column) in symbols.iter().zip(&columns) {
            if !seen.insert(symbol.as_str()) {
                return Err(CoreError::InvalidInput(
                    "symbols".to_string(),
                    format!("duplicate symbol {symbol}"),
                ));
            }
            if column.len() != dates.len() {
                return Err(CoreError::InvalidInput(
                    symbol.clone(),
                    format!("{} values for {} dates", column.len(), dates.len()),
                ));
            }
        }

        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CoreError::UnorderedDates {
                previous: w[0],
                next: w[1],
            });
        }

        Ok(Self {
            dates,
            symbols,
            columns,
        }
        .without_empty_rows())
    }

    /// Aligns per-symbol observations onto the union of their dates.
    ///
    /// A symbol with no observation on a given date gets `NaN` there. The symbol
    /// order of `observations` is kept.
    pub fn from_observations(
        observations: Vec<(String, Vec<(NaiveDate, f64)>)>,
    ) -> Result<Self, CoreError> {
        let all_dates: BTreeSet<NaiveDate> = observations
            .iter()
            .flat_map(|(_, obs)| obs.iter().map(|(date, _)| *date))
            .collect();
        let dates: Vec<NaiveDate> = all_dates.into_iter().collect();

        let mut symbols = Vec::with_capacity(observations.len());
        let mut columns = Vec::with_capacity(observations.len());
        for (symbol, obs) in observations {
            let mut by_date: HashMap<NaiveDate, f64> = HashMap::with_capacity(obs.len());
            for (date, close) in obs {
                if by_date.insert(date, close).is_some() {
                    return Err(CoreError::DuplicateObservation { symbol, date });
                }
            }
            let column = dates
                .iter()
                .map(|d| by_date.get(d).copied().unwrap_or(f64::NAN))
                .collect();
            symbols.push(symbol);
            columns.push(column);
        }

        Self::new(dates, symbols, columns)
    }

    /// A series with no rows and no symbols, the shape of a failed fetch.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Closes for one symbol, aligned with `dates()`.
    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.position(symbol).map(|i| self.columns[i].as_slice())
    }

    pub fn close(&self, row: usize, symbol: &str) -> Option<f64> {
        self.column(symbol).and_then(|c| c.get(row).copied())
    }

    /// Returns rows `start..=end` as a new series.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self, CoreError> {
        if start > end || end >= self.len() {
            return Err(CoreError::InvalidInput(
                "slice".to_string(),
                format!("rows {start}..={end} out of bounds for {} rows", self.len()),
            ));
        }
        Ok(Self {
            dates: self.dates[start..=end].to_vec(),
            symbols: self.symbols.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c[start..=end].to_vec())
                .collect(),
        })
    }

    /// Restricts the series to dates within `[from, to]`.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> Self {
        let start = self.dates.partition_point(|d| *d < from);
        let end = self.dates.partition_point(|d| *d <= to);
        Self {
            dates: self.dates[start..end].to_vec(),
            symbols: self.symbols.clone(),
            columns: self.columns.iter().map(|c| c[start..end].to_vec()).collect(),
        }
    }

    fn without_empty_rows(self) -> Self {
        let keep: Vec<bool> = (0..self.dates.len())
            .map(|row| self.columns.iter().any(|c| c[row].is_finite()))
            .collect();
        if keep.iter().all(|k| *k) {
            return self;
        }

        let dropped = keep.iter().filter(|k| !**k).count();
        tracing::debug!(dropped, "Dropping trading days with no closes for any symbol.");

        let filter = |values: Vec<f64>| -> Vec<f64> {
            values
                .into_iter()
                .zip(&keep)
                .filter_map(|(v, k)| k.then_some(v))
                .collect()
        };
        Self {
            dates: self
                .dates
                .into_iter()
                .zip(&keep)
                .filter_map(|(d, k)| k.then_some(d))
                .collect(),
            symbols: self.symbols,
            columns: self.columns.into_iter().map(filter).collect(),
        }
    }
}
