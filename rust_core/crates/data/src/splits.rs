//! Per-series split index.

use chrono::NaiveDate;
use swing_calendar::{AssocCache, CacheValue, date_key};
use swing_types::SplitEvent;

use crate::error::DataError;

/// Split events of one series, in date order.
///
/// Exact date lookups go through the hash index; rounding a date down to
/// the latest split on or before it uses the sorted key list.
#[derive(Debug, Clone, Default)]
pub struct SplitList {
    events: Vec<SplitEvent>,
    index: Option<AssocCache>,
}

impl SplitList {
    /// Builds the list.
    ///
    /// # Errors
    /// - [`DataError::CorruptData`] unless dates strictly increase and
    ///   ratios are positive and finite.
    /// - [`DataError::Cache`] if the index cannot be built.
    pub fn new(events: Vec<SplitEvent>) -> Result<Self, DataError> {
        if events.is_empty() {
            return Ok(Self::default());
        }
        for (i, e) in events.iter().enumerate() {
            if !e.ratio.is_finite() || e.ratio <= 0.0 {
                return Err(DataError::CorruptData(format!(
                    "split ratio {} on {} must be positive",
                    e.ratio, e.date
                )));
            }
            if i > 0 && e.date <= events[i - 1].date {
                return Err(DataError::CorruptData(format!(
                    "split dates out of order: {} after {}",
                    e.date,
                    events[i - 1].date
                )));
            }
        }
        let index = AssocCache::with_sorted(
            events
                .iter()
                .map(|e| (date_key(e.date), CacheValue::Ratio(e.ratio)))
                .collect(),
        )?;
        Ok(Self {
            events,
            index: Some(index),
        })
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when there are no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at position `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&SplitEvent> {
        self.events.get(i)
    }

    /// All events.
    #[must_use]
    pub fn events(&self) -> &[SplitEvent] {
        &self.events
    }

    /// Ratio of a split dated exactly `date`.
    #[must_use]
    pub fn ratio_on(&self, date: NaiveDate) -> Option<f64> {
        self.index.as_ref()?.ratio(&date_key(date))
    }

    /// Position of the latest split dated on or before `date`.
    #[must_use]
    pub fn ordinal_index(&self, date: NaiveDate) -> Option<usize> {
        self.index.as_ref()?.ordinal_index(&date_key(date))
    }
}
