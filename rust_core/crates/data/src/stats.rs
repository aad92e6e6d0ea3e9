//! Single-bar statistics used by the trend engine and setups.

use swing_types::Bar;

/// Weight of the extreme in the strong-close test: a close is strong when
/// `(SC + 1) * c >= SC * h + l`.
pub const STRONG_CLOSE_WEIGHT: i64 = 4;

/// True range of bar `i`.
///
/// TR = max(High - Low, High - Prev_Close, Prev_Close - Low). The first bar
/// has no previous close, so its range is just High - Low.
///
/// # Panics
/// Panics if `i` is out of bounds.
#[must_use]
pub fn true_range(bars: &[Bar], i: usize) -> i64 {
    let bar = &bars[i];
    let hl = bar.high - bar.low;
    if i == 0 {
        return hl;
    }
    let prev_close = bars[i - 1].close;
    hl.max(bar.high - prev_close).max(prev_close - bar.low)
}

/// Direction of a strong close: `1` near the high, `-1` near the low.
///
/// A bar with `high == low` never closes strong.
#[must_use]
pub fn strong_close(bar: &Bar) -> i32 {
    if bar.high == bar.low {
        return 0;
    }
    let c = (STRONG_CLOSE_WEIGHT + 1) * bar.close;
    if c <= bar.high + STRONG_CLOSE_WEIGHT * bar.low {
        -1
    } else if c >= STRONG_CLOSE_WEIGHT * bar.high + bar.low {
        1
    } else {
        0
    }
}

/// Opening gap of bar `i` against the previous bar.
///
/// `2` opens above the previous high, `1` above the previous close, `-2`
/// below the previous low, `-1` below the previous close.
///
/// # Panics
/// Panics if `i` is out of bounds.
#[must_use]
pub fn gap(bars: &[Bar], i: usize) -> i32 {
    if i < 1 {
        return 0;
    }
    let (bar, prev) = (&bars[i], &bars[i - 1]);
    if bar.open > prev.high {
        2
    } else if bar.open > prev.close {
        1
    } else if bar.open < prev.low {
        -2
    } else if bar.open < prev.close {
        -1
    } else {
        0
    }
}

/// `(high + low + close) / 3`, truncated.
#[must_use]
pub fn weighted_price(bar: &Bar) -> i64 {
    (bar.high + bar.low + bar.close) / 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(o: i64, h: i64, l: i64, c: i64) -> Bar {
        Bar::daily(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), o, h, l, c, 100)
    }

    #[test]
    fn test_true_range_uses_previous_close() {
        let bars = vec![bar(100, 110, 90, 95), bar(120, 130, 118, 125), bar(80, 85, 70, 75)];
        assert_eq!(true_range(&bars, 0), 20);
        assert_eq!(true_range(&bars, 1), 35);
        assert_eq!(true_range(&bars, 2), 55);
    }

    #[test]
    fn test_strong_close() {
        assert_eq!(strong_close(&bar(100, 110, 100, 109)), 1);
        assert_eq!(strong_close(&bar(100, 110, 100, 108)), 1);
        assert_eq!(strong_close(&bar(100, 110, 100, 101)), -1);
        assert_eq!(strong_close(&bar(100, 110, 100, 105)), 0);
        assert_eq!(strong_close(&bar(100, 100, 100, 100)), 0);
    }

    #[test]
    fn test_gap_codes() {
        let prev = bar(100, 110, 90, 100);
        let cases = [(115, 2), (105, 1), (100, 0), (95, -1), (85, -2)];
        for (open, code) in cases {
            let bars = vec![prev, bar(open, 120, 80, open)];
            assert_eq!(gap(&bars, 1), code, "open {open}");
        }
        assert_eq!(gap(&[prev], 0), 0);
    }

    #[test]
    fn test_weighted_price() {
        assert_eq!(weighted_price(&bar(0, 110, 90, 101)), 100);
    }
}
