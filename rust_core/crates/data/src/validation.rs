//! Structural checks on bar sequences.

use crate::error::DataError;
use swing_types::Bar;

/// Validates a sequence of bars: every bar keeps open and close inside
/// `low..=high` with non-negative volume, and stamps strictly increase.
///
/// # Errors
/// - [`DataError::EmptyData`] when `bars` is empty.
/// - [`DataError::CorruptData`] naming the first offending bar.
pub fn validate_bars(bars: &[Bar]) -> Result<(), DataError> {
    if bars.is_empty() {
        return Err(DataError::EmptyData);
    }
    for (i, bar) in bars.iter().enumerate() {
        if let Some(fault) = bar_fault(bar) {
            return Err(DataError::CorruptData(format!("bar {i} at {}: {fault}", bar.stamp)));
        }
    }
    if let Some(i) = bars.windows(2).position(|pair| pair[1].stamp <= pair[0].stamp) {
        return Err(DataError::CorruptData(format!(
            "bar {} at {} does not follow {}",
            i + 1,
            bars[i + 1].stamp,
            bars[i].stamp
        )));
    }
    Ok(())
}

fn bar_fault(bar: &Bar) -> Option<String> {
    if bar.low > bar.high {
        return Some(format!("low {} above high {}", bar.low, bar.high));
    }
    let range = bar.low..=bar.high;
    if !range.contains(&bar.open) || !range.contains(&bar.close) {
        return Some(format!(
            "open {} or close {} outside {}..={}",
            bar.open, bar.close, bar.low, bar.high
        ));
    }
    if bar.volume < 0 {
        return Some(format!("volume {}", bar.volume));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    #[test]
    fn test_valid_sequence() {
        let bars = vec![
            Bar::daily(day(2), 100, 110, 90, 105, 1000),
            Bar::daily(day(3), 105, 108, 100, 101, 0),
        ];
        assert!(validate_bars(&bars).is_ok());
    }

    #[test]
    fn test_empty() {
        assert!(matches!(validate_bars(&[]), Err(DataError::EmptyData)));
    }

    #[test]
    fn test_invalid_ohlc() {
        let bars = vec![Bar::daily(day(2), 100, 95, 90, 92, 10)];
        assert!(matches!(validate_bars(&bars), Err(DataError::CorruptData(_))));
    }

    #[test]
    fn test_negative_volume() {
        let bars = vec![Bar::daily(day(2), 100, 100, 100, 100, -1)];
        assert!(matches!(validate_bars(&bars), Err(DataError::CorruptData(_))));
    }

    #[test]
    fn test_fault_names_first_bad_bar() {
        let bars = vec![
            Bar::daily(day(2), 100, 110, 90, 105, 1000),
            Bar::daily(day(3), 100, 110, 90, 120, 10),
        ];
        let Err(DataError::CorruptData(msg)) = validate_bars(&bars) else {
            panic!("expected corrupt data");
        };
        assert!(msg.starts_with("bar 1 at 2024-01-03"), "{msg}");
    }

    #[test]
    fn test_non_monotonic() {
        let bars = vec![
            Bar::daily(day(3), 100, 100, 100, 100, 1),
            Bar::daily(day(3), 100, 100, 100, 100, 1),
        ];
        assert!(matches!(validate_bars(&bars), Err(DataError::CorruptData(_))));
    }
}
