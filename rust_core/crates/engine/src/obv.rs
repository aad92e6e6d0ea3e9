//! On-balance volume decomposition.
//!
//! A bar's volume is spread over three legs, prev close to first extreme,
//! first extreme to second extreme, second extreme to close, in proportion
//! to the distance each leg travels. A close below the bar midpoint means
//! the high came first.

use swing_types::{Bar, TrendState};

use crate::record::BarRecord;

/// Average volume substituted when a record's window has not filled yet.
const FALLBACK_VOLUME: i64 = 1_000_000;

/// True when the high is assumed to precede the low within the bar.
#[must_use]
pub fn high_first(bar: &Bar) -> bool {
    2 * bar.close < bar.high + bar.low
}

/// Signed volume of the three legs of bar `i`.
///
/// # Panics
/// Panics if `i` is out of bounds.
#[must_use]
pub fn split_volume(bars: &[Bar], i: usize) -> [i64; 3] {
    let bar = &bars[i];
    let prev_close = if i > 0 { bars[i - 1].close } else { bar.open };
    let (e1, e2) = if high_first(bar) {
        (bar.high, bar.low)
    } else {
        (bar.low, bar.high)
    };
    let legs = [e1 - prev_close, e2 - e1, bar.close - e2];
    let travel = legs.iter().map(|l| l.abs()).sum::<i64>().max(1);
    legs.map(|leg| leg * bar.volume / travel)
}

/// Net OBV of a record relative to its average volume, in tenths.
#[must_use]
pub fn daily_obv(rec: &BarRecord) -> Option<i64> {
    (rec.volume > 0).then(|| 10 * rec.obv.iter().sum::<i64>() / rec.volume)
}

/// OBV accumulated from the bar at `start`, entered in `start_state`,
/// through `end`.
///
/// Only the legs of the start bar after the extreme that set the state are
/// counted. Returns 0 when the start record has no average volume yet.
#[must_use]
pub fn accumulated_obv(records: &[BarRecord], bars: &[Bar], start: usize, start_state: TrendState, end: usize) -> i64 {
    let first = &records[start];
    if first.volume == 0 {
        return 0;
    }
    let hi_first = high_first(&bars[start]);
    let mut obv = 0;
    if (start_state.is_up() && hi_first) || (start_state.is_down() && !hi_first) {
        obv += 100 * first.obv[1] / first.volume;
    }
    obv += 100 * first.obv[2] / first.volume;
    for rec in &records[start + 1..=end] {
        let volume = if rec.volume > 0 { rec.volume } else { FALLBACK_VOLUME };
        obv += 100 * rec.obv.iter().sum::<i64>() / volume;
    }
    obv / 10
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(o: i64, h: i64, l: i64, c: i64, v: i64) -> Bar {
        Bar::daily(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), o, h, l, c, v)
    }

    #[test]
    fn test_split_volume_low_first() {
        // 100 -> 90 -> 120 -> 115: legs -10, +30, -5 over 45 travel
        let bars = vec![bar(100, 100, 100, 100, 0), bar(100, 120, 90, 115, 4500)];
        assert_eq!(split_volume(&bars, 1), [-1000, 3000, -500]);
    }

    #[test]
    fn test_split_volume_high_first() {
        // 100 -> 120 -> 90 -> 95
        let bars = vec![bar(100, 100, 100, 100, 0), bar(100, 120, 90, 95, 5500)];
        assert!(high_first(&bars[1]));
        assert_eq!(split_volume(&bars, 1), [2000, -3000, 500]);
    }

    #[test]
    fn test_flat_bar_has_no_obv() {
        let bars = vec![bar(100, 100, 100, 100, 700)];
        assert_eq!(split_volume(&bars, 0), [0, 0, 0]);
    }

    #[test]
    fn test_accumulated_obv() {
        let bars = vec![bar(100, 120, 90, 95, 0), bar(95, 100, 95, 100, 0)];
        let records = vec![
            BarRecord {
                volume: 1000,
                obv: [200, -300, 50],
                ..BarRecord::default()
            },
            BarRecord {
                volume: 1000,
                obv: [0, 100, 0],
                ..BarRecord::default()
            },
        ];
        // high first, up state: legs 1 and 2 of the start bar, then bar 1
        assert_eq!(accumulated_obv(&records, &bars, 0, TrendState::UpTrend, 1), (-30 + 5 + 10) / 10);
        // down state with the high first: only the last leg
        assert_eq!(accumulated_obv(&records, &bars, 0, TrendState::Reaction, 1), (5 + 10) / 10);
        assert_eq!(daily_obv(&records[1]), Some(1));
        assert_eq!(daily_obv(&BarRecord::default()), None);
    }
}
