use chrono::NaiveDate;

/// A stock split (or other price re-basing event).
///
/// Bars dated on or before `date` are multiplied by `ratio` once the split
/// is applied; their volume is divided by it.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SplitEvent {
    /// Last date priced on the pre-split basis
    pub date: NaiveDate,
    /// Price multiplier, e.g. `0.5` for a 2:1 split
    pub ratio: f64,
}

impl SplitEvent {
    /// Creates a split event.
    #[must_use]
    pub fn new(date: NaiveDate, ratio: f64) -> Self {
        Self { date, ratio }
    }
}
