//! Calendar backing data.

use crate::calendar::{CalendarDay, TradingCalendar};
use crate::error::CalendarError;

/// Bulk source of calendar rows, read once per calendar.
pub trait CalendarSource {
    /// All rows in date order.
    ///
    /// # Errors
    /// Returns [`CalendarError::Source`] when the rows cannot be read.
    fn calendar_rows(&self) -> Result<Vec<CalendarDay>, CalendarError>;
}

impl TradingCalendar {
    /// Builds the calendar from a source.
    ///
    /// # Errors
    /// Propagates source failures and the checks of
    /// [`TradingCalendar::from_days`].
    pub fn from_source(source: &dyn CalendarSource) -> Result<Self, CalendarError> {
        Self::from_days(source.calendar_rows()?)
    }
}

impl CalendarSource for Vec<CalendarDay> {
    fn calendar_rows(&self) -> Result<Vec<CalendarDay>, CalendarError> {
        Ok(self.clone())
    }
}
