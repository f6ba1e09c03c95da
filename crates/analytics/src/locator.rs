use crate::error::AnalyticsError;
use chrono::NaiveDate;

/// Index of the trading day closest to `target`.
///
/// Distance is measured in calendar days. When the target sits exactly between
/// two trading days the earlier one wins.
pub fn nearest_trading_day(dates: &[NaiveDate], target: NaiveDate) -> Result<usize, AnalyticsError> {
    if dates.is_empty() {
        return Err(AnalyticsError::EmptySeries);
    }

    // First trading day on or after the target.
    let after = dates.partition_point(|d| *d < target);
    if after == 0 {
        return Ok(0);
    }
    if after == dates.len() {
        return Ok(dates.len() - 1);
    }

    let before = after - 1;
    let gap_before = (target - dates[before]).num_days();
    let gap_after = (dates[after] - target).num_days();
    Ok(if gap_after < gap_before { after } else { before })
}
