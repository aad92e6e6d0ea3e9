//! Collaborator interfaces for bars and splits.
//!
//! Sources are synchronous; the core assumes a call has completed before
//! computation resumes. Returned bars must be in non-decreasing stamp order.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use swing_calendar::{CalendarDay, CalendarError};
use swing_types::{Bar, SplitEvent};

use crate::error::DataError;

pub use swing_calendar::CalendarSource;

/// Source of OHLCV bars.
pub trait BarSource {
    /// Daily bars dated in `[start, end]`.
    ///
    /// # Errors
    /// Returns [`DataError::Source`] when the source cannot be read.
    fn fetch_daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError>;

    /// Intraday bars stamped in `[start, end]`.
    ///
    /// # Errors
    /// Returns [`DataError::Source`] when the source cannot be read.
    fn fetch_intraday(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, DataError>;
}

/// Source of split events.
pub trait SplitSource {
    /// Splits dated in `[start, end]`, in date order.
    ///
    /// # Errors
    /// Returns [`DataError::Source`] when the source cannot be read.
    fn splits_for(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<SplitEvent>, DataError>;
}

/// In-memory source for fixtures and tests.
///
/// Bars are returned in the order they were stored, so out-of-order fixtures
/// reach the loader unchanged.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    daily: HashMap<String, Vec<Bar>>,
    intraday: HashMap<String, Vec<Bar>>,
    splits: HashMap<String, Vec<SplitEvent>>,
    calendar: Vec<CalendarDay>,
}

impl MemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores daily bars for `symbol`.
    #[must_use]
    pub fn with_daily(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.daily.insert(symbol.to_string(), bars);
        self
    }

    /// Stores intraday bars for `symbol`.
    #[must_use]
    pub fn with_intraday(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.intraday.insert(symbol.to_string(), bars);
        self
    }

    /// Stores split events for `symbol`.
    #[must_use]
    pub fn with_splits(mut self, symbol: &str, splits: Vec<SplitEvent>) -> Self {
        self.splits.insert(symbol.to_string(), splits);
        self
    }

    /// Stores calendar rows.
    #[must_use]
    pub fn with_calendar(mut self, rows: Vec<CalendarDay>) -> Self {
        self.calendar = rows;
        self
    }
}

impl BarSource for MemorySource {
    fn fetch_daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        Ok(self
            .daily
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date() >= start && b.date() <= end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_intraday(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, DataError> {
        Ok(self
            .intraday
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.stamp >= start && b.stamp <= end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl SplitSource for MemorySource {
    fn splits_for(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<SplitEvent>, DataError> {
        Ok(self
            .splits
            .get(symbol)
            .map(|splits| {
                splits
                    .iter()
                    .filter(|s| s.date >= start && s.date <= end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl CalendarSource for MemorySource {
    fn calendar_rows(&self) -> Result<Vec<CalendarDay>, CalendarError> {
        if self.calendar.is_empty() {
            return Err(CalendarError::Empty);
        }
        Ok(self.calendar.clone())
    }
}
