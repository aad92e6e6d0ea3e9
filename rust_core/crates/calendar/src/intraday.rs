//! The 5-minute session grid: 78 slots from 09:30 to 15:55.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::calendar::TradingCalendar;
use crate::clock::{Clock, start_of_day};
use crate::error::CalendarError;

/// Slots per regular session.
pub const SLOTS_PER_SESSION: i64 = 78;
/// Minutes per slot.
pub const SLOT_MINUTES: u32 = 5;
/// Open time of the first slot.
pub const SESSION_OPEN: NaiveTime = match NaiveTime::from_hms_opt(9, 30, 0) {
    Some(t) => t,
    None => NaiveTime::MIN,
};
/// Open time of the last slot.
pub const SESSION_CLOSE: NaiveTime = match NaiveTime::from_hms_opt(15, 55, 0) {
    Some(t) => t,
    None => NaiveTime::MIN,
};

const LAST_SLOT: i64 = SLOTS_PER_SESSION - 1;

fn minutes_since_open(time: NaiveTime) -> i64 {
    (time - SESSION_OPEN).num_minutes()
}

/// Slot number of `time`, if it lies inside the session. Off-grid times
/// map to the slot containing them.
#[must_use]
pub fn slot_of(time: NaiveTime) -> Option<i64> {
    if time < SESSION_OPEN || time > SESSION_CLOSE + chrono::Duration::seconds(299) {
        return None;
    }
    Some(minutes_since_open(time) / i64::from(SLOT_MINUTES))
}

/// Open time of slot `slot`.
#[must_use]
pub fn slot_time(slot: i64) -> NaiveTime {
    SESSION_OPEN + chrono::Duration::minutes(slot.clamp(0, LAST_SLOT) * i64::from(SLOT_MINUTES))
}

/// `time` with minutes floored to a multiple of 5 and seconds cleared.
#[must_use]
pub fn floor_to_slot(time: NaiveTime) -> NaiveTime {
    let minute = time.minute() - time.minute() % SLOT_MINUTES;
    NaiveTime::from_hms_opt(time.hour(), minute, 0).unwrap_or(time)
}

impl TradingCalendar {
    /// Moves `n` slots along the session grid, skipping closed days.
    ///
    /// A stamp before the open steps forward to the open of its day and
    /// backward to the last slot of the previous business day; a stamp after
    /// the last slot steps forward to the next business day and backward to
    /// its own last slot. Off-grid stamps inside the session step to the
    /// adjacent grid point.
    ///
    /// # Errors
    /// Returns a [`CalendarError`] when the walk leaves the table.
    pub fn move_5mins(&self, stamp: NaiveDateTime, n: i64) -> Result<NaiveDateTime, CalendarError> {
        let mut crt = stamp;
        for _ in 0..n.unsigned_abs() {
            crt = self.step_slot(crt, n > 0)?;
        }
        Ok(crt)
    }

    /// Snaps a target to the grid of its series.
    ///
    /// Daily targets become midnight of the date, moved back to a business
    /// day. Intraday targets are floored to a slot inside a session, or moved
    /// back to the last slot of the latest session at or before them.
    ///
    /// # Errors
    /// Returns a [`CalendarError`] when the target is outside the table.
    pub fn sanitize(&self, stamp: NaiveDateTime, intraday: bool) -> Result<NaiveDateTime, CalendarError> {
        let date = stamp.date();
        if !intraday {
            return Ok(start_of_day(self.move_busdays(date, 0)?));
        }
        if self.is_busday(date)?
            && let Some(slot) = slot_of(stamp.time())
        {
            return Ok(date.and_time(slot_time(slot)));
        }
        self.step_slot(stamp, false)
    }

    /// Number of 5-minute bars between the sessions of `start` and `end`.
    ///
    /// When `end` is the current trading date and the session is open, only
    /// the slots up to the current one are counted.
    ///
    /// # Errors
    /// Returns a [`CalendarError`] when a date is outside the table.
    pub fn intraday_slot_count(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        clock: &dyn Clock,
    ) -> Result<i64, CalendarError> {
        let full = SLOTS_PER_SESSION * self.busday_count(start, end)?;
        if end != self.current_trading_date(clock)? {
            return Ok(full);
        }
        let now = clock.now();
        if now.date() != end {
            return Ok(full);
        }
        match slot_of(now.time()) {
            Some(slot) => Ok(full - (LAST_SLOT - slot)),
            None => Ok(full),
        }
    }

    /// Every slot stamp of the sessions from `start` through `end`.
    ///
    /// # Errors
    /// Returns a [`CalendarError`] when a date is outside the table.
    pub fn session_slots(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDateTime>, CalendarError> {
        Ok(self
            .busdays(start, end)?
            .into_iter()
            .flat_map(|date| (0..SLOTS_PER_SESSION).map(move |slot| date.and_time(slot_time(slot))))
            .collect())
    }

    fn step_slot(&self, stamp: NaiveDateTime, forward: bool) -> Result<NaiveDateTime, CalendarError> {
        let date = stamp.date();
        let ix = self.day_index(date)?;
        let next_open = |ix: i64| -> Result<NaiveDateTime, CalendarError> {
            Ok(self.next_busday(ix)?.1.and_time(SESSION_OPEN))
        };
        let prev_close = |ix: i64| -> Result<NaiveDateTime, CalendarError> {
            Ok(self.prev_busday(ix)?.1.and_time(SESSION_CLOSE))
        };
        if !self.is_busday(date)? {
            return if forward { next_open(ix) } else { prev_close(ix) };
        }
        let time = stamp.time();
        if time < SESSION_OPEN {
            return if forward {
                Ok(date.and_time(SESSION_OPEN))
            } else {
                prev_close(ix)
            };
        }
        if time > SESSION_CLOSE {
            return if forward {
                next_open(ix)
            } else {
                Ok(date.and_time(SESSION_CLOSE))
            };
        }
        let minutes = minutes_since_open(time);
        let step = i64::from(SLOT_MINUTES);
        let on_grid = minutes % step == 0 && time.second() == 0 && time.nanosecond() == 0;
        let slot = if forward {
            minutes / step + 1
        } else if on_grid {
            minutes / step - 1
        } else {
            minutes / step
        };
        if slot > LAST_SLOT {
            next_open(ix)
        } else if slot < 0 {
            prev_close(ix)
        } else {
            Ok(date.and_time(slot_time(slot)))
        }
    }
}
