use crate::error::CoreError;
use serde::Serialize;

/// Formats a relative-time offset as an event-time label: "T", "T+3", "T-4".
pub fn relative_label(offset: i64) -> String {
    if offset == 0 {
        "T".to_string()
    } else {
        format!("T{offset:+}")
    }
}

/// Values keyed by relative time and instrument symbol.
///
/// This is the shape of abnormal returns, CAR and CAAR. Offsets are strictly
/// increasing. `NaN` marks a value that is unavailable and is serialised as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeMatrix {
    offsets: Vec<i64>,
    instruments: Vec<String>,
    /// One column per instrument, aligned with `offsets`.
    columns: Vec<Vec<f64>>,
}

impl RelativeMatrix {
    pub fn new(
        offsets: Vec<i64>,
        instruments: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, CoreError> {
        if instruments.len() != columns.len() {
            return Err(CoreError::InvalidInput(
                "columns".to_string(),
                format!("{} instruments but {} columns", instruments.len(), columns.len()),
            ));
        }
        if let Some(w) = offsets.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CoreError::InvalidInput(
                "offsets".to_string(),
                format!("offsets must increase, found {} then {}", w[0], w[1]),
            ));
        }
        if let Some((symbol, column)) = instruments
            .iter()
            .zip(&columns)
            .find(|(_, c)| c.len() != offsets.len())
        {
            return Err(CoreError::InvalidInput(
                symbol.clone(),
                format!("{} values for {} offsets", column.len(), offsets.len()),
            ));
        }
        Ok(Self {
            offsets,
            instruments,
            columns,
        })
    }

    pub fn offsets(&self) -> &[i64] {
        &self.offsets
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn labels(&self) -> Vec<String> {
        self.offsets.iter().copied().map(relative_label).collect()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.instruments
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.columns[i].as_slice())
    }

    /// Row position of an offset, if the axis contains it.
    pub fn position(&self, offset: i64) -> Option<usize> {
        self.offsets.binary_search(&offset).ok()
    }

    /// The value at `(offset, symbol)`. `None` when either key is absent; the
    /// value itself may be `NaN`.
    pub fn value(&self, offset: i64, symbol: &str) -> Option<f64> {
        let row = self.position(offset)?;
        self.column(symbol).map(|c| c[row])
    }

    /// Row-major view for rendering: each offset with one value per instrument.
    pub fn rows(&self) -> Vec<(i64, Vec<f64>)> {
        self.offsets
            .iter()
            .enumerate()
            .map(|(row, offset)| (*offset, self.columns.iter().map(|c| c[row]).collect()))
            .collect()
    }

    /// True when no cell holds a usable number.
    pub fn is_all_nan(&self) -> bool {
        self.columns.iter().flatten().all(|v| v.is_nan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_relative_labels() {
        assert_eq!(relative_label(0), "T");
        assert_eq!(relative_label(3), "T+3");
        assert_eq!(relative_label(-4), "T-4");
    }

    #[test]
    fn looks_up_by_offset_and_symbol() {
        let m = RelativeMatrix::new(
            vec![-1, 0, 1],
            vec!["XLU".to_string(), "XLE".to_string()],
            vec![vec![1.0, 2.0, 3.0], vec![-1.0, f64::NAN, -3.0]],
        )
        .expect("valid matrix");

        assert_eq!(m.value(1, "XLU"), Some(3.0));
        assert!(m.value(0, "XLE").expect("cell exists").is_nan());
        assert_eq!(m.value(2, "XLU"), None);
        assert_eq!(m.value(0, "SPY"), None);
        assert_eq!(m.labels(), vec!["T-1", "T", "T+1"]);
        assert_eq!(m.rows()[2], (1, vec![3.0, -3.0]));
        assert!(!m.is_all_nan());
    }

    #[test]
    fn rejects_misaligned_columns() {
        let err = RelativeMatrix::new(vec![0, 1], vec!["XLU".to_string()], vec![vec![1.0]])
            .expect_err("must fail");
        assert!(matches!(err, CoreError::InvalidInput(field, _) if field == "XLU"));
    }

    #[test]
    fn serialises_nan_as_null() {
        let m = RelativeMatrix::new(vec![0], vec!["XLU".to_string()], vec![vec![f64::NAN]])
            .expect("valid matrix");
        let json = serde_json::to_value(&m).expect("serialisable");
        assert!(json["columns"][0][0].is_null());
    }
}
