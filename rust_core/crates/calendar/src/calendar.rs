//! Business-day arithmetic over a contiguous calendar table.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::assoc::{AssocCache, CacheValue, CalendarInfo};
use crate::error::CalendarError;

/// One row of the calendar table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CalendarDay {
    /// Calendar date
    pub date: NaiveDate,
    /// Sequential day number
    pub day_number: i64,
    /// Sequential business day number; a holiday repeats the number of the
    /// business day before it
    pub busday_number: i64,
    /// Whether the exchange trades on this day
    pub is_busday: bool,
}

impl CalendarDay {
    /// Builds a row from the packed storage form.
    #[must_use]
    pub fn from_packed(date: NaiveDate, info: i32) -> Self {
        Self::from_info(date, CalendarInfo::from_packed(info))
    }

    /// Builds a row from decoded numbers.
    #[must_use]
    pub fn from_info(date: NaiveDate, info: CalendarInfo) -> Self {
        Self {
            date,
            day_number: info.day_number,
            busday_number: info.busday_number,
            is_busday: info.is_busday,
        }
    }

    /// Numbers of the row without the date.
    #[must_use]
    pub fn info(&self) -> CalendarInfo {
        CalendarInfo {
            day_number: self.day_number,
            busday_number: self.busday_number,
            is_busday: self.is_busday,
        }
    }
}

/// Cache key for a date.
#[must_use]
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Trading calendar.
///
/// Rows are stored by position; `day_number` of the row at position `p` is
/// `first_day_number + p`. Public positions are day numbers.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    days: Vec<CalendarDay>,
    index: AssocCache,
}

impl TradingCalendar {
    /// Builds the calendar from rows in date order.
    ///
    /// # Errors
    /// - [`CalendarError::Empty`] for no rows.
    /// - [`CalendarError::NonMonotonic`] when dates do not strictly increase.
    /// - [`CalendarError::NonContiguous`] when day numbers skip.
    pub fn from_days(days: Vec<CalendarDay>) -> Result<Self, CalendarError> {
        let Some(first) = days.first() else {
            return Err(CalendarError::Empty);
        };
        let base = first.day_number;
        let mut entries = Vec::with_capacity(days.len());
        for (pos, day) in days.iter().enumerate() {
            if pos > 0 && day.date <= days[pos - 1].date {
                return Err(CalendarError::NonMonotonic(day.date));
            }
            let expected = base + to_i64(pos);
            if day.day_number != expected {
                return Err(CalendarError::NonContiguous {
                    date: day.date,
                    found: day.day_number,
                    expected,
                });
            }
            entries.push((date_key(day.date), CacheValue::Calendar(day.info())));
        }
        let index = AssocCache::with_sorted(entries)?;
        tracing::info!(
            "Trading calendar built: {} days from {} to {}",
            days.len(),
            days[0].date,
            days[days.len() - 1].date
        );
        Ok(Self { days, index })
    }

    /// Builds the calendar from packed `(date, info)` rows.
    ///
    /// # Errors
    /// See [`TradingCalendar::from_days`].
    pub fn from_packed_rows(rows: &[(NaiveDate, i32)]) -> Result<Self, CalendarError> {
        Self::from_days(
            rows.iter()
                .map(|(date, info)| CalendarDay::from_packed(*date, *info))
                .collect(),
        )
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Always false for a built calendar.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First date in the table.
    #[must_use]
    pub fn first_date(&self) -> NaiveDate {
        self.days[0].date
    }

    /// Last date in the table.
    #[must_use]
    pub fn last_date(&self) -> NaiveDate {
        self.days[self.days.len() - 1].date
    }

    /// True when `date` lies inside the table.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.index.contains(&date_key(date))
    }

    /// Row at day number `index`.
    #[must_use]
    pub fn day(&self, index: i64) -> Option<&CalendarDay> {
        let pos = usize::try_from(index - self.days[0].day_number).ok()?;
        self.days.get(pos)
    }

    /// Row for `date`.
    ///
    /// # Errors
    /// Returns [`CalendarError::UnknownDate`] outside the table.
    pub fn entry(&self, date: NaiveDate) -> Result<CalendarDay, CalendarError> {
        self.index
            .calendar(&date_key(date))
            .map(|info| CalendarDay::from_info(date, info))
            .ok_or(CalendarError::UnknownDate(date))
    }

    /// Sequential day number of `date`.
    ///
    /// # Errors
    /// Returns [`CalendarError::UnknownDate`] outside the table.
    pub fn day_index(&self, date: NaiveDate) -> Result<i64, CalendarError> {
        Ok(self.entry(date)?.day_number)
    }

    /// Business day number of `date`, or `None` if it is not a business day.
    ///
    /// # Errors
    /// Returns [`CalendarError::UnknownDate`] outside the table.
    pub fn busday_index(&self, date: NaiveDate) -> Result<Option<i64>, CalendarError> {
        let entry = self.entry(date)?;
        Ok(entry.is_busday.then_some(entry.busday_number))
    }

    /// Whether `date` is a business day.
    ///
    /// # Errors
    /// Returns [`CalendarError::UnknownDate`] outside the table.
    pub fn is_busday(&self, date: NaiveDate) -> Result<bool, CalendarError> {
        Ok(self.entry(date)?.is_busday)
    }

    /// Day number of `date` rounded down to a table row. Dates after the
    /// table map to its last row; dates before it map to `None`.
    #[must_use]
    pub fn ordinal_position(&self, date: NaiveDate) -> Option<i64> {
        self.index
            .ordinal_index(&date_key(date))
            .map(|pos| self.days[pos].day_number)
    }

    /// First business day after day number `index`.
    ///
    /// # Errors
    /// Returns [`CalendarError::OutOfRange`] if the table ends first.
    pub fn next_busday(&self, index: i64) -> Result<(i64, NaiveDate), CalendarError> {
        let mut ix = index + 1;
        while let Some(day) = self.day(ix) {
            if day.is_busday {
                return Ok((ix, day.date));
            }
            ix += 1;
        }
        Err(CalendarError::OutOfRange(ix))
    }

    /// Last business day before day number `index`.
    ///
    /// # Errors
    /// Returns [`CalendarError::OutOfRange`] if the table starts first.
    pub fn prev_busday(&self, index: i64) -> Result<(i64, NaiveDate), CalendarError> {
        let mut ix = index - 1;
        while let Some(day) = self.day(ix) {
            if day.is_busday {
                return Ok((ix, day.date));
            }
            ix -= 1;
        }
        Err(CalendarError::OutOfRange(ix))
    }

    /// Snaps `date` to a business day, forward or backward. Business days
    /// are returned unchanged.
    ///
    /// # Errors
    /// [`CalendarError::UnknownDate`] or [`CalendarError::OutOfRange`].
    pub fn move_to_busday(&self, date: NaiveDate, forward: bool) -> Result<NaiveDate, CalendarError> {
        let entry = self.entry(date)?;
        if entry.is_busday {
            return Ok(date);
        }
        let (_, moved) = if forward {
            self.next_busday(entry.day_number)?
        } else {
            self.prev_busday(entry.day_number)?
        };
        Ok(moved)
    }

    /// Moves `n` business days from `date`.
    ///
    /// `n == 0` snaps a non-business day to the previous business day.
    /// Otherwise each step lands on the next (or previous) business day, so
    /// starting from a holiday the first step reaches the adjacent
    /// business day.
    ///
    /// # Errors
    /// [`CalendarError::UnknownDate`] or [`CalendarError::OutOfRange`].
    pub fn move_busdays(&self, date: NaiveDate, n: i64) -> Result<NaiveDate, CalendarError> {
        let entry = self.entry(date)?;
        if n == 0 {
            return if entry.is_busday {
                Ok(date)
            } else {
                Ok(self.prev_busday(entry.day_number)?.1)
            };
        }
        let mut ix = entry.day_number;
        let mut moved = date;
        for _ in 0..n.unsigned_abs() {
            (ix, moved) = if n > 0 {
                self.next_busday(ix)?
            } else {
                self.prev_busday(ix)?
            };
        }
        Ok(moved)
    }

    /// Signed number of business days from `d1` to `d2`.
    ///
    /// For `d1 < d2` the count includes `d1` if it is a business day and
    /// `d2` if it is one; for `d1 > d2` the result is the negated count for
    /// the swapped range. Equal dates give 0.
    ///
    /// # Errors
    /// Returns [`CalendarError::UnknownDate`] outside the table.
    pub fn busdays_between(&self, d1: NaiveDate, d2: NaiveDate) -> Result<i64, CalendarError> {
        let e1 = self.entry(d1)?;
        let e2 = self.entry(d2)?;
        let num = e2.busday_number - e1.busday_number;
        Ok(match d1.cmp(&d2) {
            std::cmp::Ordering::Less => num + i64::from(e1.is_busday),
            std::cmp::Ordering::Greater => num - i64::from(e2.is_busday),
            std::cmp::Ordering::Equal => 0,
        })
    }

    /// Business days in the inclusive range `[start, end]`; 0 when
    /// `start > end`.
    ///
    /// # Errors
    /// Returns [`CalendarError::UnknownDate`] outside the table.
    pub fn busday_count(&self, start: NaiveDate, end: NaiveDate) -> Result<i64, CalendarError> {
        if start > end {
            return Ok(0);
        }
        let s = self.entry(start)?;
        let e = self.entry(end)?;
        Ok(e.busday_number - s.busday_number + i64::from(s.is_busday))
    }

    /// Business days in `[start, end]`, in order.
    ///
    /// # Errors
    /// Returns [`CalendarError::UnknownDate`] outside the table.
    pub fn busdays(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, CalendarError> {
        if start > end {
            return Ok(Vec::new());
        }
        let s = self.day_index(start)?;
        let e = self.day_index(end)?;
        Ok((s..=e)
            .filter_map(|ix| self.day(ix))
            .filter(|d| d.is_busday)
            .map(|d| d.date)
            .collect())
    }

    /// Rows of the table.
    #[must_use]
    pub fn days(&self) -> &[CalendarDay] {
        &self.days
    }
}

/// Generates calendar rows from `start` to `end` in which weekends and the
/// given holidays are closed.
///
/// # Errors
/// Returns [`CalendarError::NonMonotonic`] when `end < start`.
pub fn weekday_calendar(
    start: NaiveDate,
    end: NaiveDate,
    holidays: &[NaiveDate],
) -> Result<TradingCalendar, CalendarError> {
    if end < start {
        return Err(CalendarError::NonMonotonic(end));
    }
    let mut days = Vec::new();
    let mut busday_number = 0;
    for (day_number, date) in start.iter_days().take_while(|d| *d <= end).enumerate() {
        let is_busday = !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
            && !holidays.contains(&date);
        if is_busday {
            busday_number += 1;
        }
        days.push(CalendarDay {
            date,
            day_number: to_i64(day_number),
            busday_number,
            is_busday,
        });
    }
    TradingCalendar::from_days(days)
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
