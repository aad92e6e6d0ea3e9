//! Price series with a cursor and lazy split adjustment.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use swing_calendar::TradingCalendar;
use swing_types::{Bar, BarInterval, SplitEvent};

use crate::error::DataError;
use crate::splits::SplitList;
use crate::validation::validate_bars;

/// How a seek resolves a stamp that has no bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekMode {
    /// Only an exact match succeeds.
    #[default]
    Exact,
    /// Fall forward to the first bar after the stamp.
    NextIfMissing,
    /// Fall back to the last bar before the stamp.
    PrevIfMissing,
}

/// Bars of one symbol at one interval.
///
/// Bars are stored raw and adjusted for splits only once the cursor reaches
/// them: every bar dated on or before an applied split is rescaled, so the
/// bars up to the cursor are always expressed in the latest units seen.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    symbol: String,
    interval: BarInterval,
    calendar: Arc<TradingCalendar>,
    bars: Vec<Bar>,
    pos: usize,
    last_adj: Option<usize>,
    splits: SplitList,
}

impl TimeSeries {
    /// Wraps validated bars. The cursor starts on the last bar.
    ///
    /// # Errors
    /// - [`DataError::EmptyData`] when `bars` is empty.
    /// - [`DataError::CorruptData`] when the bars fail validation.
    pub fn new(
        symbol: impl Into<String>,
        interval: BarInterval,
        calendar: Arc<TradingCalendar>,
        bars: Vec<Bar>,
        splits: SplitList,
    ) -> Result<Self, DataError> {
        validate_bars(&bars)?;
        let pos = bars.len() - 1;
        Ok(Self {
            symbol: symbol.into(),
            interval,
            calendar,
            bars,
            pos,
            last_adj: None,
            splits,
        })
    }

    /// Symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Bar interval.
    #[must_use]
    pub fn interval(&self) -> BarInterval {
        self.interval
    }

    /// Calendar the series was built against.
    #[must_use]
    pub fn calendar(&self) -> &Arc<TradingCalendar> {
        &self.calendar
    }

    /// All bars, adjusted up to [`TimeSeries::last_adjusted`].
    #[must_use]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Bar at index `i`.
    #[must_use]
    pub fn bar(&self, i: usize) -> Option<&Bar> {
        self.bars.get(i)
    }

    /// Bar under the cursor.
    #[must_use]
    pub fn current(&self) -> &Bar {
        &self.bars[self.pos]
    }

    /// Number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false: a series holds at least one bar.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Cursor position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Index of the last applied split.
    #[must_use]
    pub fn last_adjusted(&self) -> Option<usize> {
        self.last_adj
    }

    /// Splits covering the bar range.
    #[must_use]
    pub fn splits(&self) -> &SplitList {
        &self.splits
    }

    /// Resolves `stamp` to a bar index without moving the cursor.
    ///
    /// Daily series compare dates only; the guess from business-day
    /// arithmetic is checked against the bar and falls back to a binary
    /// search when the series is not contiguous.
    ///
    /// # Errors
    /// Returns [`DataError::DateNotFound`] when `mode` cannot resolve the stamp.
    pub fn find(&self, stamp: NaiveDateTime, mode: SeekMode) -> Result<usize, DataError> {
        let located = if self.interval.is_intraday() {
            self.bars.binary_search_by_key(&stamp, |b| b.stamp)
        } else {
            self.locate_day(stamp.date())
        };
        let resolved = match (located, mode) {
            (Ok(ix), _) => Some(ix),
            (Err(_), SeekMode::Exact) => None,
            (Err(ix), SeekMode::NextIfMissing) => (ix < self.bars.len()).then_some(ix),
            (Err(ix), SeekMode::PrevIfMissing) => ix.checked_sub(1),
        };
        resolved.ok_or_else(|| DataError::DateNotFound {
            symbol: self.symbol.clone(),
            stamp,
        })
    }

    fn locate_day(&self, date: NaiveDate) -> Result<usize, usize> {
        let first = self.bars[0].date();
        if date >= first
            && let Ok(count) = self.calendar.busday_count(first, date)
            && let Some(guess) = usize::try_from(count - 1).ok()
            && let Some(bar) = self.bars.get(guess)
            && bar.date() == date
        {
            return Ok(guess);
        }
        self.bars.binary_search_by_key(&date, Bar::date)
    }

    /// Moves the cursor to `stamp` and applies every split dated on or
    /// before the bar it lands on.
    ///
    /// # Errors
    /// Returns [`DataError::DateNotFound`] and leaves the cursor unchanged
    /// when the stamp cannot be resolved.
    pub fn set_cursor(&mut self, stamp: NaiveDateTime, mode: SeekMode) -> Result<Vec<SplitEvent>, DataError> {
        if self.current().stamp == stamp {
            return Ok(Vec::new());
        }
        let ix = self.find(stamp, mode)?;
        self.pos = ix;
        match self.splits.ordinal_index(self.bars[ix].date()) {
            Some(split_ix) => Ok(self.apply_splits_up_to(split_ix)),
            None => Ok(Vec::new()),
        }
    }

    /// [`TimeSeries::set_cursor`] at midnight of `date`.
    ///
    /// # Errors
    /// See [`TimeSeries::set_cursor`].
    pub fn set_day(&mut self, date: NaiveDate, mode: SeekMode) -> Result<Vec<SplitEvent>, DataError> {
        self.set_cursor(swing_calendar::clock::start_of_day(date), mode)
    }

    /// Moves the cursor one bar forward, applying a split dated on the new
    /// bar. Returns `None` at the end of the series, otherwise the splits
    /// that were applied.
    pub fn next_bar(&mut self) -> Option<Vec<SplitEvent>> {
        if self.pos + 1 >= self.bars.len() {
            return None;
        }
        self.pos += 1;
        let date = self.bars[self.pos].date();
        if self.splits.ratio_on(date).is_some()
            && let Some(split_ix) = self.splits.ordinal_index(date)
        {
            return Some(self.apply_splits_up_to(split_ix));
        }
        Some(Vec::new())
    }

    /// Moves the cursor one bar forward. Returns `false` at the end.
    pub fn advance(&mut self) -> bool {
        self.next_bar().is_some()
    }

    /// Advances while the current bar is before `stamp`. Returns the
    /// number of bars moved.
    pub fn advance_to(&mut self, stamp: NaiveDateTime) -> usize {
        let mut moved = 0;
        while self.current().stamp < stamp && self.advance() {
            moved += 1;
        }
        moved
    }

    /// Applies every split after the last applied one up to `split_ix`.
    ///
    /// Prices of bars dated on or before the split are multiplied by its
    /// ratio and volumes divided by it, both rounded. Already applied
    /// splits are skipped, so calling this twice has no further effect.
    pub fn apply_splits_up_to(&mut self, split_ix: usize) -> Vec<SplitEvent> {
        let start = self.last_adj.map_or(0, |adj| adj + 1);
        let mut applied = Vec::new();
        for ix in start..=split_ix {
            let Some(split) = self.splits.get(ix).copied() else {
                break;
            };
            let end = self.bars.partition_point(|b| b.date() <= split.date);
            for bar in &mut self.bars[..end] {
                bar.rescale(split.ratio);
            }
            self.last_adj = Some(ix);
            tracing::debug!(
                "Split applied for {}: {} ratio {} over {} bars",
                self.symbol,
                split.date,
                split.ratio,
                end
            );
            applied.push(split);
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swing_calendar::weekday_calendar;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn calendar() -> Arc<TradingCalendar> {
        Arc::new(weekday_calendar(d(1, 1), d(3, 31), &[d(1, 1), d(1, 15)]).unwrap())
    }

    fn series(splits: Vec<SplitEvent>) -> TimeSeries {
        let cal = calendar();
        let bars = cal
            .busdays(d(1, 2), d(1, 31))
            .unwrap()
            .into_iter()
            .map(|date| Bar::daily(date, 10_000, 10_100, 9_900, 10_000, 1_000))
            .collect();
        TimeSeries::new("TEST", BarInterval::Daily, cal, bars, SplitList::new(splits).unwrap()).unwrap()
    }

    #[test]
    fn test_cursor_starts_at_end() {
        let ts = series(Vec::new());
        assert_eq!(ts.pos(), ts.len() - 1);
        assert_eq!(ts.current().date(), d(1, 31));
    }

    #[test]
    fn test_find_modes() {
        let ts = series(Vec::new());
        let holiday = d(1, 15).and_hms_opt(0, 0, 0).unwrap();
        assert!(ts.find(holiday, SeekMode::Exact).is_err());
        let prev = ts.find(holiday, SeekMode::PrevIfMissing).unwrap();
        let next = ts.find(holiday, SeekMode::NextIfMissing).unwrap();
        assert_eq!(ts.bar(prev).unwrap().date(), d(1, 12));
        assert_eq!(ts.bar(next).unwrap().date(), d(1, 16));
        let jan3 = d(1, 3).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(ts.find(jan3, SeekMode::Exact).unwrap(), 1);
        let late = d(2, 5).and_hms_opt(0, 0, 0).unwrap();
        assert!(ts.find(late, SeekMode::NextIfMissing).is_err());
        assert_eq!(ts.find(late, SeekMode::PrevIfMissing).unwrap(), ts.len() - 1);
    }

    #[test]
    fn test_failed_seek_keeps_cursor() {
        let mut ts = series(Vec::new());
        let before = ts.pos();
        let err = ts.set_day(d(1, 13), SeekMode::Exact).unwrap_err();
        assert!(matches!(err, DataError::DateNotFound { .. }));
        assert_eq!(ts.pos(), before);
    }

    #[test]
    fn test_split_applied_once_on_advance() {
        let mut ts = series(vec![SplitEvent::new(d(1, 10), 0.5)]);
        ts.set_day(d(1, 5), SeekMode::Exact).unwrap();
        assert_eq!(ts.last_adjusted(), None);
        assert_eq!(ts.bars()[0].close, 10_000);

        assert_eq!(ts.advance_to(d(1, 10).and_hms_opt(0, 0, 0).unwrap()), 3);
        assert_eq!(ts.last_adjusted(), Some(0));
        assert_eq!(ts.bars()[0].close, 5_000);
        assert_eq!(ts.bars()[0].volume, 2_000);
        assert_eq!(ts.current().close, 5_000);
        assert_eq!(ts.bar(ts.pos() + 1).unwrap().close, 10_000);

        assert!(ts.apply_splits_up_to(0).is_empty());
        ts.set_day(d(1, 31), SeekMode::Exact).unwrap();
        assert_eq!(ts.bars()[0].close, 5_000);
    }

    #[test]
    fn test_seek_past_split_applies_it() {
        let mut ts = series(vec![SplitEvent::new(d(1, 10), 0.5)]);
        ts.set_day(d(1, 2), SeekMode::Exact).unwrap();
        let applied = ts.set_day(d(1, 22), SeekMode::Exact).unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(ts.bars()[6].close, 5_000);
        assert_eq!(ts.bars()[7].close, 10_000);
    }

    #[test]
    fn test_advance_stops_at_end() {
        let mut ts = series(Vec::new());
        assert!(!ts.advance());
        let end = ts.pos();
        assert_eq!(ts.advance_to(d(3, 1).and_hms_opt(0, 0, 0).unwrap()), 0);
        assert_eq!(ts.pos(), end);
    }
}
