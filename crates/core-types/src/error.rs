use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Trading dates must be strictly increasing, found {previous} followed by {next}")]
    UnorderedDates { previous: NaiveDate, next: NaiveDate },

    #[error("Duplicate observation for {symbol} on {date}")]
    DuplicateObservation { symbol: String, date: NaiveDate },

    #[error("Unknown industry: {0}")]
    UnknownIndustry(String),
}
