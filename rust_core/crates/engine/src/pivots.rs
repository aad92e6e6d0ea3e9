//! Pivot arena.

use chrono::{NaiveDate, NaiveDateTime};
use swing_types::TrendState;
use swing_types::bar::scale;

/// A bar where the primary trend reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Pivot {
    /// Stamp of the pivot bar
    pub date: NaiveDateTime,
    /// Index of the pivot bar in the series
    pub index: usize,
    /// Primary state at the pivot
    pub state: TrendState,
    /// Pivot price
    pub price: i64,
    /// Average true range at the pivot
    pub range: i64,
    /// OBV accumulated from the pivot to the current bar
    pub obv: i64,
    /// False for the tentative entry built from the last primary record
    pub confirmed: bool,
}

/// Append-only pivot storage, oldest first.
#[derive(Debug, Clone, Default)]
pub struct PivotList {
    pivots: Vec<Pivot>,
}

impl PivotList {
    /// Number of pivots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pivots.len()
    }

    /// True when no pivot has formed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pivots.is_empty()
    }

    /// Most recent pivot.
    #[must_use]
    pub fn newest(&self) -> Option<&Pivot> {
        self.pivots.last()
    }

    /// The `n` most recent pivots, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> &[Pivot] {
        &self.pivots[self.pivots.len().saturating_sub(n)..]
    }

    /// Pivots dated on or after `date`, oldest first.
    #[must_use]
    pub fn since(&self, date: NaiveDateTime) -> &[Pivot] {
        let start = self.pivots.partition_point(|p| p.date < date);
        &self.pivots[start..]
    }

    /// Confirmed pivot on bar `index` with state `state`.
    #[must_use]
    pub fn find(&self, index: usize, state: TrendState) -> Option<&Pivot> {
        self.pivots
            .iter()
            .rev()
            .find(|p| p.index == index && p.state == state)
    }

    pub(crate) fn push(&mut self, pivot: Pivot) {
        self.pivots.push(pivot);
    }

    pub(crate) fn add_obv(&mut self, delta: i64) {
        for pivot in &mut self.pivots {
            pivot.obv += delta;
        }
    }

    pub(crate) fn rescale_until(&mut self, date: NaiveDate, ratio: f64) {
        for pivot in self.pivots.iter_mut().filter(|p| p.date.date() <= date) {
            pivot.price = scale(pivot.price, ratio);
            pivot.range = scale(pivot.range, ratio);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pivot(day: u32, price: i64) -> Pivot {
        Pivot {
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            index: day as usize,
            state: TrendState::Rally,
            price,
            range: 10,
            obv: 0,
            confirmed: true,
        }
    }

    #[test]
    fn test_recent_and_since() {
        let mut list = PivotList::default();
        for (day, px) in [(2, 100), (5, 90), (9, 120)] {
            list.push(pivot(day, px));
        }
        assert_eq!(list.recent(2).iter().map(|p| p.price).collect::<Vec<_>>(), [90, 120]);
        assert_eq!(list.recent(10).len(), 3);
        assert_eq!(list.since(pivot(5, 0).date).len(), 2);
        assert_eq!(list.newest().map(|p| p.price), Some(120));
    }

    #[test]
    fn test_rescale_includes_oldest() {
        let mut list = PivotList::default();
        list.push(pivot(2, 100));
        list.push(pivot(9, 120));
        list.rescale_until(pivot(5, 0).date.date(), 0.5);
        assert_eq!(list.recent(2)[0].price, 50);
        assert_eq!(list.recent(2)[1].price, 120);
    }
}
