use crate::error::AnalyticsError;
use chrono::{Duration, NaiveDate};
use core_types::relative_label;
use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;

/// Half-width of the event window in trading days.
pub const DEFAULT_RADIUS: usize = 20;

/// How to treat a window that would run off the edge of the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// Reject the window. Used when averaging across events.
    Strict,
    /// Shrink the window to the available rows. Used for single-event display.
    Clamp,
}

/// A symmetric slice of trading days around an event's anchor.
///
/// `start` and `end` are inclusive row positions in the source series.
/// Relative time is always measured from `anchor`, so a clamped window keeps
/// correct labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventWindow {
    pub anchor: usize,
    pub radius: usize,
    pub start: usize,
    pub end: usize,
    pub partial: bool,
}

/// Trading days a clamped window is missing on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowShortfall {
    pub before: usize,
    pub after: usize,
}

impl fmt::Display for WindowShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partial window: {} trading days missing before T and {} after",
            self.before, self.after
        )
    }
}

impl EventWindow {
    /// Carves `[anchor - radius, anchor + radius]` out of a series of `len` rows.
    pub fn extract(
        anchor: usize,
        radius: usize,
        len: usize,
        mode: WindowMode,
    ) -> Result<Self, AnalyticsError> {
        if anchor >= len {
            return Err(AnalyticsError::InvalidParameter(format!(
                "anchor {anchor} outside a series of {len} rows"
            )));
        }

        let start = anchor.checked_sub(radius);
        let end = anchor.saturating_add(radius);

        match start {
            Some(start) if end < len => Ok(Self {
                anchor,
                radius,
                start,
                end,
                partial: false,
            }),
            _ => match mode {
                WindowMode::Strict => Err(AnalyticsError::InsufficientWindow { anchor, radius, len }),
                WindowMode::Clamp => {
                    let window = Self {
                        anchor,
                        radius,
                        start: start.unwrap_or(0),
                        end: end.min(len - 1),
                        partial: true,
                    };
                    tracing::warn!(
                        anchor,
                        radius,
                        len,
                        start = window.start,
                        end = window.end,
                        "Event window runs off the series; clamping to the available rows."
                    );
                    Ok(window)
                }
            },
        }
    }

    /// Relative-time axis: row position minus anchor.
    pub fn offsets(&self) -> RangeInclusive<i64> {
        let anchor = self.anchor as i64;
        (self.start as i64 - anchor)..=(self.end as i64 - anchor)
    }

    pub fn labels(&self) -> Vec<String> {
        self.offsets().map(relative_label).collect()
    }

    pub fn row_count(&self) -> usize {
        self.end - self.start + 1
    }

    /// Row of the anchor within the windowed slice.
    pub fn anchor_row(&self) -> usize {
        self.anchor - self.start
    }

    pub fn shortfall(&self) -> Option<WindowShortfall> {
        if !self.partial {
            return None;
        }
        Some(WindowShortfall {
            before: self.radius - (self.anchor - self.start),
            after: self.radius - (self.end - self.anchor),
        })
    }
}

/// Calendar range to request from a market-data source for an event.
///
/// Twice the radius in calendar days on each side leaves enough trading days
/// once weekends and holidays are excluded.
pub fn calendar_span(date: NaiveDate, radius: usize) -> (NaiveDate, NaiveDate) {
    let days = Duration::days(radius as i64 * 2);
    (date - days, date + days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_window_has_symmetric_axis() {
        let window = EventWindow::extract(25, 20, 60, WindowMode::Strict).expect("sufficient");

        assert_eq!((window.start, window.end), (5, 45));
        assert_eq!(window.row_count(), 41);
        let offsets: Vec<i64> = window.offsets().collect();
        assert_eq!(offsets, (-20..=20).collect::<Vec<_>>());
        assert_eq!(window.anchor_row(), 20);
        assert_eq!(window.labels()[20], "T");
        assert!(window.shortfall().is_none());
    }

    #[test]
    fn window_touching_both_edges_is_sufficient() {
        let window = EventWindow::extract(20, 20, 41, WindowMode::Strict).expect("sufficient");
        assert_eq!((window.start, window.end), (0, 40));
    }

    #[test]
    fn strict_mode_rejects_windows_near_either_edge() {
        for anchor in [0, 19, 41, 59] {
            let err = EventWindow::extract(anchor, 20, 60, WindowMode::Strict).expect_err("insufficient");
            assert_eq!(err, AnalyticsError::InsufficientWindow { anchor, radius: 20, len: 60 });
        }
    }

    #[test]
    fn clamp_mode_keeps_labels_relative_to_anchor() {
        let window = EventWindow::extract(3, 5, 20, WindowMode::Clamp).expect("clamped");

        assert!(window.partial);
        assert_eq!((window.start, window.end), (0, 8));
        assert_eq!(window.labels().first().map(String::as_str), Some("T-3"));
        assert_eq!(window.labels().last().map(String::as_str), Some("T+5"));
        assert_eq!(window.shortfall(), Some(WindowShortfall { before: 2, after: 0 }));
    }

    #[test]
    fn clamp_mode_trims_the_tail() {
        let window = EventWindow::extract(18, 5, 20, WindowMode::Clamp).expect("clamped");
        assert_eq!((window.start, window.end), (13, 19));
        assert_eq!(window.shortfall(), Some(WindowShortfall { before: 0, after: 4 }));
    }

    #[test]
    fn calendar_span_is_twice_the_radius() {
        let date = NaiveDate::from_ymd_opt(2021, 8, 29).expect("valid date");
        let (from, to) = calendar_span(date, 20);
        assert_eq!(from, NaiveDate::from_ymd_opt(2021, 7, 20).expect("valid date"));
        assert_eq!(to, NaiveDate::from_ymd_opt(2021, 10, 8).expect("valid date"));
    }
}
