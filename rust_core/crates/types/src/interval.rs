/// Bar interval of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarInterval {
    /// One bar per business day
    #[default]
    Daily,
    /// 78 bars per session, 09:30 through 15:55
    FiveMinute,
}

/// Error parsing an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseIntervalError;

impl std::fmt::Display for ParseIntervalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid bar interval string")
    }
}

impl std::error::Error for ParseIntervalError {}

impl std::str::FromStr for BarInterval {
    type Err = ParseIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "D" | "D1" | "DAILY" | "EOD" => Ok(BarInterval::Daily),
            "M5" | "5MIN" | "INTRADAY" => Ok(BarInterval::FiveMinute),
            _ => Err(ParseIntervalError),
        }
    }
}

impl BarInterval {
    /// Returns the bar duration in seconds
    #[must_use]
    pub fn to_seconds(self) -> u64 {
        match self {
            BarInterval::Daily => 86_400,
            BarInterval::FiveMinute => 300,
        }
    }

    /// True for the 5-minute grid
    #[must_use]
    pub fn is_intraday(self) -> bool {
        matches!(self, BarInterval::FiveMinute)
    }

    /// Convert to string representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BarInterval::Daily => "D1",
            BarInterval::FiveMinute => "M5",
        }
    }
}

impl std::fmt::Display for BarInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
