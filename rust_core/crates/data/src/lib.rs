//! Swing Data
//!
//! Gap-filled OHLCV series, split adjustment, cursor navigation and bar statistics.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(missing_docs)]

/// Data-layer error types.
pub mod error;
/// Series loading and gap filling.
pub mod loader;
/// Cursor-bearing price series.
pub mod series;
/// Bar, split and calendar source traits.
pub mod source;
/// Split index.
pub mod splits;
/// Single-bar statistics.
pub mod stats;
/// Bar sequence validation.
pub mod validation;

/// Re-export: data-layer error type.
pub use error::DataError;
/// Re-export: series loader.
pub use loader::SeriesLoader;
/// Re-export: seek resolution mode.
pub use series::SeekMode;
/// Re-export: price series with cursor.
pub use series::TimeSeries;
/// Re-export: source traits and the in-memory source.
pub use source::{BarSource, CalendarSource, MemorySource, SplitSource};
/// Re-export: split index.
pub use splits::SplitList;
/// Re-export: bar statistics.
pub use stats::{gap, strong_close, true_range, weighted_price};
/// Re-export: bar validation.
pub use validation::validate_bars;
