use analytics::{
    AggregateStudy, EventCar, IntervalOutcome, IntervalSummary, SingleEventStudy, SkippedEvent,
    Unavailable, WindowShortfall,
};
use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, Table};
use core_types::{relative_label, Event, InstrumentUniverse, RelativeMatrix};
use serde::Serialize;

/// Formats tables for the terminal.
pub struct Renderer<'a> {
    universe: &'a InstrumentUniverse,
    decimals: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(universe: &'a InstrumentUniverse, decimals: usize) -> Self {
        Self { universe, decimals }
    }

    pub fn events(&self, events: &[Event]) -> Table {
        let mut table = new_table(vec!["Event", "Date", "Category"]);
        for event in events {
            table.add_row(vec![
                Cell::new(&event.label),
                Cell::new(event.date.format("%Y-%m-%d")),
                Cell::new(event.category.as_deref().unwrap_or("-")),
            ]);
        }
        table
    }

    pub fn industries(&self) -> Table {
        let mut table = new_table(vec!["Industry", "Symbol"]);
        for industry in &self.universe.industries {
            table.add_row(vec![Cell::new(&industry.name), Cell::new(&industry.symbol)]);
        }
        table.add_row(vec![
            Cell::new("Benchmark").fg(Color::DarkGrey),
            Cell::new(&self.universe.benchmark).fg(Color::DarkGrey),
        ]);
        table
    }

    /// Values by event-time label, one column per instrument.
    pub fn matrix(&self, matrix: &RelativeMatrix) -> Table {
        let mut header = vec!["Day".to_string()];
        header.extend(matrix.instruments().iter().map(|s| self.display_name(s)));
        let mut table = new_table(header);

        for (offset, values) in matrix.rows() {
            let mut row = vec![Cell::new(relative_label(offset))];
            row.extend(values.iter().map(|v| self.number(*v)));
            table.add_row(row);
        }
        table
    }

    /// CAAR with the number of contributing events shown wherever it falls short of the total.
    pub fn caar(&self, study: &AggregateStudy) -> Table {
        let mut header = vec!["Day".to_string()];
        header.extend(study.caar.instruments().iter().map(|s| self.display_name(s)));
        let mut table = new_table(header);

        let total = study.event_count();
        for (row, (offset, values)) in study.caar.rows().into_iter().enumerate() {
            let mut cells = vec![Cell::new(relative_label(offset))];
            for (column, value) in values.iter().enumerate() {
                let count = study
                    .contributions
                    .get(column)
                    .and_then(|c| c.get(row))
                    .copied()
                    .unwrap_or(0);
                if value.is_finite() && count < total {
                    cells.push(
                        Cell::new(format!("{:.*} ({count}/{total})", self.decimals, value))
                            .set_alignment(CellAlignment::Right),
                    );
                } else {
                    cells.push(self.number(*value));
                }
            }
            table.add_row(cells);
        }
        table
    }

    /// CAR of every contributing event for one instrument.
    pub fn per_event(&self, per_event: &[EventCar], symbol: &str) -> Table {
        let mut header = vec!["Day".to_string()];
        header.extend(per_event.iter().map(|e| e.label.clone()));
        let mut table = new_table(header);

        let Some(first) = per_event.first() else {
            return table;
        };
        for offset in first.car.offsets() {
            let mut row = vec![Cell::new(relative_label(*offset))];
            row.extend(
                per_event
                    .iter()
                    .map(|e| self.number(e.car.value(*offset, symbol).unwrap_or(f64::NAN))),
            );
            table.add_row(row);
        }
        table
    }

    /// Interval means, colored by sign.
    pub fn summary(&self, summary: &IntervalSummary) -> Table {
        let mut header = vec!["Industry".to_string()];
        if let Some(first) = summary.instruments.first() {
            header.extend(first.intervals.iter().map(|v| v.interval.clone()));
        }
        let mut table = new_table(header);

        for instrument in &summary.instruments {
            let mut row = vec![Cell::new(self.display_name(&instrument.instrument))];
            for value in &instrument.intervals {
                row.push(match &value.outcome {
                    IntervalOutcome::Mean { value, sign } => {
                        let color = if sign.is_negative() { Color::Red } else { Color::Green };
                        Cell::new(format!("{:+.*}", self.decimals, value))
                            .fg(color)
                            .set_alignment(CellAlignment::Right)
                    }
                    IntervalOutcome::Unavailable { reason } => {
                        let text = match reason {
                            Unavailable::MissingOffsets { .. } => "n/a (outside window)",
                            Unavailable::UndefinedValues => "n/a (missing data)",
                        };
                        Cell::new(text).fg(Color::DarkGrey)
                    }
                });
            }
            table.add_row(row);
        }
        table
    }

    pub fn skipped(&self, skipped: &[SkippedEvent]) -> Table {
        let mut table = new_table(vec!["Skipped event", "Reason"]);
        for event in skipped {
            table.add_row(vec![
                Cell::new(&event.label),
                Cell::new(event.reason.to_string()).fg(Color::Yellow),
            ]);
        }
        table
    }

    pub fn shortfall(&self, shortfall: &WindowShortfall) -> String {
        format!("Warning: {shortfall}.")
    }

    fn display_name(&self, symbol: &str) -> String {
        match self.universe.name_for(symbol) {
            Some(name) => format!("{name} ({symbol})"),
            None => symbol.to_string(),
        }
    }

    fn number(&self, value: f64) -> Cell {
        if value.is_finite() {
            Cell::new(format!("{:.*}", self.decimals, value)).set_alignment(CellAlignment::Right)
        } else {
            Cell::new("n/a").fg(Color::DarkGrey)
        }
    }
}

fn new_table<T: ToString>(header: Vec<T>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(header.iter().map(|h| Cell::new(h.to_string())));
    table
}

// --- JSON Output ---
// Shapes handed to an external chart renderer. Undefined values are `null`.

#[derive(Serialize)]
pub struct SingleEventReport<'a> {
    pub event: &'a Event,
    pub anchor_date: NaiveDate,
    pub normalized: bool,
    pub prices: &'a RelativeMatrix,
    pub abnormal: &'a RelativeMatrix,
    pub car: &'a RelativeMatrix,
    pub warning: Option<WindowShortfall>,
    pub summary: &'a IntervalSummary,
}

impl<'a> SingleEventReport<'a> {
    pub fn new(study: &'a SingleEventStudy, summary: &'a IntervalSummary, normalized: bool) -> Self {
        Self {
            event: &study.event,
            anchor_date: study.anchor_date,
            normalized,
            prices: if normalized {
                &study.normalized_prices
            } else {
                &study.prices
            },
            abnormal: &study.abnormal,
            car: &study.car,
            warning: study.warning,
            summary,
        }
    }
}

#[derive(Serialize)]
pub struct AggregateReport<'a> {
    #[serde(flatten)]
    pub study: &'a AggregateStudy,
    pub summary: &'a IntervalSummary,
}
