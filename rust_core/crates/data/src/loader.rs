//! Loading gap-filled series from a [`BarSource`].

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use swing_calendar::intraday::floor_to_slot;
use swing_calendar::{Clock, SESSION_OPEN, TradingCalendar, slot_of};
use swing_types::{Bar, BarInterval, EngineConfig};

use crate::error::DataError;
use crate::series::TimeSeries;
use crate::source::{BarSource, SplitSource};
use crate::splits::SplitList;

/// Builds [`TimeSeries`] from bar and split sources.
///
/// Missing business days (daily) and missing 5-minute slots (intraday) are
/// filled with zero-volume flat bars so bar indices follow the calendar.
pub struct SeriesLoader<'a> {
    calendar: &'a Arc<TradingCalendar>,
    bars: &'a dyn BarSource,
    splits: &'a dyn SplitSource,
    config: &'a EngineConfig,
    clock: &'a dyn Clock,
}

impl<'a> SeriesLoader<'a> {
    /// Creates a loader over borrowed collaborators.
    #[must_use]
    pub fn new(
        calendar: &'a Arc<TradingCalendar>,
        bars: &'a dyn BarSource,
        splits: &'a dyn SplitSource,
        config: &'a EngineConfig,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            calendar,
            bars,
            splits,
            config,
            clock,
        }
    }

    /// Loads `symbol` up to `end`.
    ///
    /// Daily loads cover `num_days` business days before `end`, or the
    /// whole history from the configured start when `num_days <= 0`. A
    /// missing `end` means the current trading date. Intraday loads use the
    /// configured default when `num_days <= 0` and never extend past the
    /// current trading date.
    ///
    /// Returns `Ok(None)` when the source has no bars in the window.
    ///
    /// # Errors
    /// - [`DataError::OrderingViolation`] when source bars are out of order,
    ///   duplicated, or dated on a closed day.
    /// - [`DataError::Calendar`] when the window leaves the calendar.
    /// - [`DataError::Source`] when a source fails.
    pub fn load(
        &self,
        symbol: &str,
        end: Option<NaiveDate>,
        num_days: i64,
        interval: BarInterval,
    ) -> Result<Option<TimeSeries>, DataError> {
        let bars = match interval {
            BarInterval::Daily => self.load_daily(symbol, end, num_days)?,
            BarInterval::FiveMinute => self.load_intraday(symbol, end, num_days)?,
        };
        let Some(bars) = bars else {
            tracing::info!("No {} data for {}", interval, symbol);
            return Ok(None);
        };
        let (first, last) = (bars[0].date(), bars[bars.len() - 1].date());
        let splits = SplitList::new(self.splits.splits_for(symbol, first, last)?)?;
        let series = TimeSeries::new(symbol, interval, Arc::clone(self.calendar), bars, splits)?;
        tracing::info!(
            "Series loaded for {}: {} {} bars from {} to {}, {} splits",
            symbol,
            series.len(),
            interval,
            first,
            last,
            series.splits().len()
        );
        Ok(Some(series))
    }

    fn load_daily(&self, symbol: &str, end: Option<NaiveDate>, num_days: i64) -> Result<Option<Vec<Bar>>, DataError> {
        let cal = self.calendar.as_ref();
        let end = match end {
            Some(end) => end,
            None => cal.current_trading_date(self.clock)?,
        };
        let start = if num_days > 0 {
            cal.move_busdays(end, -num_days)?
        } else {
            self.config.history_start
        };
        let raw = self.bars.fetch_daily(symbol, start, end)?;
        let (Some(first), Some(last)) = (raw.first(), raw.last()) else {
            return Ok(None);
        };
        let days = cal.busdays(first.date(), last.date())?;
        fill_daily(symbol, &raw, &days).map(Some)
    }

    fn load_intraday(&self, symbol: &str, end: Option<NaiveDate>, num_days: i64) -> Result<Option<Vec<Bar>>, DataError> {
        let cal = self.calendar.as_ref();
        let num_days = if num_days <= 0 {
            self.config.default_intraday_days
        } else {
            num_days
        };
        let today = cal.current_trading_date(self.clock)?;
        let end = end.map_or(today, |end| end.min(today));
        let start = cal.move_busdays(end, -num_days)?;
        let session_end = NaiveTime::from_hms_opt(15, 59, 59).unwrap_or(NaiveTime::MIN);
        let raw = self
            .bars
            .fetch_intraday(symbol, start.and_time(SESSION_OPEN), end.and_time(session_end))?;

        let mut ticks = Vec::with_capacity(raw.len());
        for bar in raw {
            let on_session = cal.is_busday(bar.date())? && slot_of(bar.stamp.time()).is_some();
            if !on_session {
                tracing::warn!("Dropping off-session bar for {} at {}", symbol, bar.stamp);
                continue;
            }
            ticks.push(Bar {
                stamp: bar.date().and_time(floor_to_slot(bar.stamp.time())),
                ..bar
            });
        }
        if ticks.is_empty() {
            return Ok(None);
        }

        let mut slots = cal.session_slots(start, end)?;
        let count = usize::try_from(cal.intraday_slot_count(start, end, self.clock)?).unwrap_or(0);
        slots.truncate(count);
        fill_intraday(symbol, &ticks, &slots).map(Some)
    }
}

/// Pairs source bars with business days, inserting flat bars at the
/// previous close for days the source skipped.
fn fill_daily(symbol: &str, raw: &[Bar], days: &[NaiveDate]) -> Result<Vec<Bar>, DataError> {
    let mut out: Vec<Bar> = Vec::with_capacity(days.len());
    let mut src = raw.iter().peekable();
    let mut filled = 0usize;
    for &day in days {
        let stamp = swing_calendar::clock::start_of_day(day);
        let Some(bar) = src.peek() else {
            break;
        };
        if bar.date() < day {
            tracing::warn!("Ordering violation for {}: {} before {}", symbol, bar.stamp, day);
            return Err(DataError::OrderingViolation {
                symbol: symbol.to_string(),
                expected: stamp,
                found: bar.stamp,
            });
        }
        if bar.date() == day {
            out.push(Bar { stamp, ..**bar });
            src.next();
        } else if let Some(prev) = out.last() {
            out.push(Bar::flat(stamp, prev.close));
            filled += 1;
        }
    }
    if let Some(bar) = src.next() {
        let expected = out.last().map_or(bar.stamp, |b| b.stamp);
        tracing::warn!("Ordering violation for {}: unmatched bar at {}", symbol, bar.stamp);
        return Err(DataError::OrderingViolation {
            symbol: symbol.to_string(),
            expected,
            found: bar.stamp,
        });
    }
    tracing::debug!("Filled {} missing days for {}", filled, symbol);
    Ok(out)
}

/// Lays ticks onto the slot grid. Slots before the first tick take its
/// open; every other empty slot takes the latest close.
fn fill_intraday(symbol: &str, ticks: &[Bar], slots: &[NaiveDateTime]) -> Result<Vec<Bar>, DataError> {
    let mut out: Vec<Bar> = Vec::with_capacity(slots.len());
    let mut fill_price = ticks[0].open;
    let mut k = 0usize;
    for tick in ticks {
        while k < slots.len() && slots[k] < tick.stamp {
            out.push(Bar::flat(slots[k], fill_price));
            k += 1;
        }
        let Some(&slot) = slots.get(k) else {
            tracing::warn!("Dropping bar for {} past the last slot: {}", symbol, tick.stamp);
            break;
        };
        if slot != tick.stamp {
            tracing::warn!("Ordering violation for {}: expected {}, got {}", symbol, slot, tick.stamp);
            return Err(DataError::OrderingViolation {
                symbol: symbol.to_string(),
                expected: slot,
                found: tick.stamp,
            });
        }
        out.push(*tick);
        fill_price = tick.close;
        k += 1;
    }
    for &slot in &slots[k..] {
        out.push(Bar::flat(slot, fill_price));
    }
    Ok(out)
}
