//! Engine error types.

use swing_calendar::CalendarError;
use swing_data::DataError;
use thiserror::Error;

/// Errors that can occur while building, stepping or querying an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The series is shorter than the averaging window
    #[error("insufficient history: need {required} bars, got {available}")]
    InsufficientHistory {
        /// Averaging window.
        required: usize,
        /// Bars in the series.
        available: usize,
    },

    /// Not enough pivots to build a channel
    #[error("insufficient pivots: need {required}, got {available}")]
    InsufficientPivots {
        /// Entries required, tentative pivot included.
        required: usize,
        /// Entries available.
        available: usize,
    },

    /// Channel boundaries collapse or cross
    #[error("degenerate channel: {0}")]
    DegenerateChannel(String),

    /// Factor label not present in the configuration
    #[error("unknown factor: {0}")]
    UnknownFactor(String),

    /// Series loading or navigation failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Calendar lookup failed
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}
