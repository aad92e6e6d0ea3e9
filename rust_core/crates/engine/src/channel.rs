//! Trend channels through the last four pivots.
//!
//! Each line joins two pivots of the same direction, taken from the four
//! confirmed pivots and the tentative one. Both lines are projected onto
//! the current bar.

use chrono::NaiveDateTime;
use swing_types::TrendState;

use crate::engine::TrendEngine;
use crate::error::EngineError;
use crate::pivots::Pivot;

/// Confirmed pivots needed on top of the tentative one.
const CHANNEL_PIVOTS: usize = 4;

/// One channel line.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChannelBoundary {
    /// Bars from the older pivot through the current bar
    pub d1: i64,
    /// Bars from the newer pivot through the current bar
    pub d2: i64,
    /// Older pivot price
    pub px1: i64,
    /// Newer pivot price
    pub px2: i64,
    /// Older pivot state
    pub s1: TrendState,
    /// Newer pivot state
    pub s2: TrendState,
    /// Line value projected onto the current bar
    pub ipx: i64,
    /// Price change per bar
    pub slope: f64,
    /// Older pivot OBV
    pub obv1: i64,
    /// Newer pivot OBV
    pub obv2: i64,
}

impl ChannelBoundary {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    fn through(p1: &Pivot, p2: &Pivot, pos: usize) -> Result<Self, EngineError> {
        let d1 = bars_through(p1.index, pos);
        let d2 = bars_through(p2.index, pos);
        if d1 == d2 {
            return Err(EngineError::DegenerateChannel(format!(
                "pivots {} and {} share a bar",
                p1.date, p2.date
            )));
        }
        let slope = (p2.price - p1.price) as f64 / (d1 - d2) as f64;
        Ok(Self {
            d1,
            d2,
            px1: p1.price,
            px2: p2.price,
            s1: p1.state,
            s2: p2.state,
            ipx: (p1.price as f64 + slope * d1 as f64) as i64,
            slope,
            obv1: p1.obv,
            obv2: p2.obv,
        })
    }

    /// Line value at the bar `dist` bars through the current bar, both
    /// ends counted. `value_at(d1)` is the older pivot's price.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn value_at(&self, dist: i64) -> f64 {
        self.ipx as f64 - self.slope * dist as f64
    }
}

/// Bars from `index` through `pos`, both ends counted. On a gap-filled
/// daily series this is the business-day count between the two dates.
#[allow(clippy::cast_possible_wrap)]
fn bars_through(index: usize, pos: usize) -> i64 {
    pos as i64 - index as i64 + 1
}

/// Upper and lower lines at the current bar.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Channel {
    /// Stamp of the bar the channel is projected onto
    pub date: NaiveDateTime,
    /// Index of that bar
    pub index: usize,
    /// Resistance line
    pub upper: ChannelBoundary,
    /// Support line
    pub lower: ChannelBoundary,
}

/// How a pivot sits against a channel line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bounce {
    /// Up pivot that turned just under the upper line
    UnderUpper,
    /// Up pivot that turned just under the lower line
    UnderLower,
    /// No touch
    None,
    /// Down pivot that turned just above the lower line
    AboveLower,
    /// Down pivot that turned just above the upper line
    AboveUpper,
}

impl Bounce {
    /// Signed code: -2, -1, 0, 1 or 2.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Bounce::UnderUpper => -2,
            Bounce::UnderLower => -1,
            Bounce::None => 0,
            Bounce::AboveLower => 1,
            Bounce::AboveUpper => 2,
        }
    }
}

impl TrendEngine {
    /// Channel through the last four confirmed pivots and the tentative one,
    /// projected onto the current bar.
    ///
    /// # Errors
    /// Returns [`EngineError::InsufficientPivots`] with fewer than five
    /// entries and [`EngineError::DegenerateChannel`] when two pivots of a
    /// line share a bar or the lines cross at the current bar.
    pub fn channel(&self) -> Result<Channel, EngineError> {
        let pivs = self.pivots(CHANNEL_PIVOTS);
        let n = pivs.len();
        if n < CHANNEL_PIVOTS + 1 {
            return Err(EngineError::InsufficientPivots {
                required: CHANNEL_PIVOTS + 1,
                available: n,
            });
        }
        let pos = self.pos();
        let line = |offset: usize| ChannelBoundary::through(&pivs[n - 4 - offset], &pivs[n - 2 - offset], pos);
        let (upper, lower) = if pivs[n - 1].state.is_up() {
            (line(1)?, line(0)?)
        } else {
            (line(0)?, line(1)?)
        };
        if upper.ipx <= lower.ipx {
            return Err(EngineError::DegenerateChannel(format!(
                "upper {} not above lower {}",
                upper.ipx, lower.ipx
            )));
        }
        Ok(Channel {
            date: self.series().current().stamp,
            index: pos,
            upper,
            lower,
        })
    }
}

/// Classifies how `pivot` turned against `channel`, using a tolerance of a
/// fifth of the pivot's range.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn pivot_bounce(pivot: &Pivot, channel: &Channel) -> Bounce {
    let dist = bars_through(pivot.index, channel.index);
    let ub = channel.upper.value_at(dist);
    let lb = channel.lower.value_at(dist);
    if ub <= lb {
        return Bounce::None;
    }
    let tol = (pivot.range / 5) as f64;
    let px = pivot.price as f64;
    if pivot.state.is_up() {
        if px <= ub && px > ub - tol {
            return Bounce::UnderUpper;
        }
        if px <= lb && px > lb - tol {
            return Bounce::UnderLower;
        }
    } else {
        if px >= ub && px < ub + tol {
            return Bounce::AboveUpper;
        }
        if px >= lb && px < lb + tol {
            return Bounce::AboveLower;
        }
    }
    Bounce::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn pivot(index: usize, state: TrendState, price: i64) -> Pivot {
        Pivot {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap() + chrono::Duration::days(index as i64),
            index,
            state,
            price,
            range: 100,
            obv: 0,
            confirmed: true,
        }
    }

    fn flat_channel(upper: i64, lower: i64) -> Channel {
        let line = |px: i64| ChannelBoundary::through(&pivot(0, TrendState::Rally, px), &pivot(10, TrendState::Rally, px), 20).unwrap();
        Channel {
            date: pivot(20, TrendState::Rally, 0).date,
            index: 20,
            upper: line(upper),
            lower: line(lower),
        }
    }

    #[test]
    fn test_boundary_projection() {
        // 1000 on bar 0, 1100 on bar 10, current bar 20: +10 per bar
        let b = ChannelBoundary::through(&pivot(0, TrendState::Rally, 1000), &pivot(10, TrendState::Rally, 1100), 20).unwrap();
        assert_eq!((b.d1, b.d2), (21, 11));
        assert!((b.slope - 10.0).abs() < 1e-9);
        assert_eq!(b.ipx, 1210);
        assert!((b.value_at(6) - 1150.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_counts_both_ends() {
        assert_eq!(bars_through(20, 20), 1);
        assert_eq!(bars_through(0, 20), 21);
    }

    #[test]
    fn test_boundary_same_bar_is_degenerate() {
        let p = pivot(4, TrendState::Rally, 1000);
        assert!(matches!(ChannelBoundary::through(&p, &p, 9), Err(EngineError::DegenerateChannel(_))));
    }

    #[test]
    fn test_bounce_codes() {
        let ch = flat_channel(1000, 800);
        assert_eq!(pivot_bounce(&pivot(5, TrendState::Rally, 990), &ch), Bounce::UnderUpper);
        assert_eq!(pivot_bounce(&pivot(5, TrendState::UpTrend, 795), &ch), Bounce::UnderLower);
        assert_eq!(pivot_bounce(&pivot(5, TrendState::Reaction, 1010), &ch), Bounce::AboveUpper);
        assert_eq!(pivot_bounce(&pivot(5, TrendState::DownTrend, 800), &ch), Bounce::AboveLower);
        assert_eq!(pivot_bounce(&pivot(5, TrendState::Rally, 900), &ch), Bounce::None);
        // tolerance is a fifth of the range, exclusive
        assert_eq!(pivot_bounce(&pivot(5, TrendState::Rally, 980), &ch), Bounce::None);
        assert_eq!(Bounce::UnderUpper.code(), -2);
        assert_eq!(Bounce::AboveLower.code(), 1);
    }

    #[test]
    fn test_crossed_lines_never_bounce() {
        let ch = flat_channel(800, 1000);
        assert_eq!(pivot_bounce(&pivot(5, TrendState::Rally, 800), &ch), Bounce::None);
    }
}
