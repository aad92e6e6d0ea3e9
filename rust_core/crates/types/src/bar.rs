use chrono::{NaiveDate, NaiveDateTime};

/// One OHLCV bar.
///
/// Prices are integer hundredths of the quote currency. Daily bars carry a
/// midnight `stamp`; intraday bars carry the open time of their 5-minute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Bar {
    /// Bar open time (midnight for daily bars)
    pub stamp: NaiveDateTime,
    /// Open price
    pub open: i64,
    /// High price
    pub high: i64,
    /// Low price
    pub low: i64,
    /// Close price
    pub close: i64,
    /// Volume
    pub volume: i64,
}

impl Bar {
    /// Creates a bar.
    #[must_use]
    pub fn new(stamp: NaiveDateTime, open: i64, high: i64, low: i64, close: i64, volume: i64) -> Self {
        Self {
            stamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Creates a daily bar stamped at midnight of `date`.
    #[must_use]
    pub fn daily(date: NaiveDate, open: i64, high: i64, low: i64, close: i64, volume: i64) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN), open, high, low, close, volume)
    }

    /// Creates a zero-volume bar with all four prices equal to `price`.
    #[must_use]
    pub fn flat(stamp: NaiveDateTime, price: i64) -> Self {
        Self::new(stamp, price, price, price, price, 0)
    }

    /// Trading date of the bar.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.stamp.date()
    }

    /// Scales prices by `ratio` and volume by `1 / ratio`, rounding to integers.
    pub fn rescale(&mut self, ratio: f64) {
        self.open = scale(self.open, ratio);
        self.high = scale(self.high, ratio);
        self.low = scale(self.low, ratio);
        self.close = scale(self.close, ratio);
        self.volume = unscale(self.volume, ratio);
    }
}

/// `round(value * ratio)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn scale(value: i64, ratio: f64) -> i64 {
    (value as f64 * ratio).round() as i64
}

/// `round(value / ratio)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn unscale(value: i64, ratio: f64) -> i64 {
    (value as f64 / ratio).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_bar_serde_roundtrip() {
        let bar = Bar::daily(day(2024, 3, 4), 10_050, 10_200, 9_980, 10_100, 1_250_000);
        let json = serde_json::to_string(&bar).unwrap();
        let deserialized: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deserialized);
    }

    #[test]
    fn test_rescale_rounds_prices_and_volume() {
        let mut bar = Bar::daily(day(2020, 8, 28), 50_001, 50_003, 49_999, 50_002, 1_001);
        bar.rescale(0.25);
        assert_eq!(bar.open, 12_500);
        assert_eq!(bar.high, 12_501);
        assert_eq!(bar.low, 12_500);
        assert_eq!(bar.close, 12_501);
        assert_eq!(bar.volume, 4_004);
    }

    #[test]
    fn test_flat_bar_has_no_volume() {
        let bar = Bar::flat(day(2024, 1, 2).and_hms_opt(9, 35, 0).unwrap(), 4_200);
        assert_eq!(bar.open, bar.close);
        assert_eq!(bar.high, bar.low);
        assert_eq!(bar.volume, 0);
        assert_eq!(bar.date(), day(2024, 1, 2));
    }
}
