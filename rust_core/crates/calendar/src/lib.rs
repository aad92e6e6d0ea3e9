//! Swing Calendar
//!
//! Trading-calendar arithmetic for the swing analytics workspace: the
//! fixed-capacity associative cache that indexes the calendar, business-day
//! navigation, option expiry, the 5-minute session grid and clock-dependent
//! "current date" helpers.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(missing_docs)]

/// Fixed-capacity double-hashing cache.
pub mod assoc;
/// Calendar table and business-day arithmetic.
pub mod calendar;
/// Wall-clock helpers.
pub mod clock;
/// Calendar and cache error types.
pub mod error;
/// Monthly option expiry.
pub mod expiry;
/// 5-minute session grid.
pub mod intraday;
/// Calendar backing data.
pub mod source;

/// Re-export: associative cache.
pub use assoc::AssocCache;
/// Re-export: cache payloads.
pub use assoc::{CacheValue, CalendarInfo};
/// Re-export: calendar row.
pub use calendar::CalendarDay;
/// Re-export: trading calendar.
pub use calendar::TradingCalendar;
/// Re-export: cache key for a date.
pub use calendar::date_key;
/// Re-export: weekday calendar generator.
pub use calendar::weekday_calendar;
/// Re-export: clock abstraction and implementations.
pub use clock::{Clock, FixedClock, SystemClock};
/// Re-export: error types.
pub use error::{CacheError, CalendarError};
/// Re-export: legacy expiry cutover.
pub use expiry::SATURDAY_EXPIRY_CUTOVER;
/// Re-export: session grid constants and helpers.
pub use intraday::{SESSION_CLOSE, SESSION_OPEN, SLOTS_PER_SESSION, slot_of, slot_time};
/// Re-export: calendar source.
pub use source::CalendarSource;
