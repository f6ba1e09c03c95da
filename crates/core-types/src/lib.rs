//! # Aftershock Core Types
//!
//! Layer 0 of the workspace: the shared vocabulary of the event-study engine.
//! Every other crate speaks in these types.
//!
//! - `PriceSeries`: closing prices on trading days for a set of symbols.
//! - `Event`, `Instrument`, `InstrumentUniverse`: read-only study configuration.
//! - `RelativeMatrix`: values keyed by relative time (offset from the event day) and symbol.

pub mod enums;
pub mod error;
pub mod matrix;
pub mod series;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::Sign;
pub use error::CoreError;
pub use matrix::{relative_label, RelativeMatrix};
pub use series::PriceSeries;
pub use structs::{Event, Instrument, InstrumentUniverse};
