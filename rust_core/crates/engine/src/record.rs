//! Per-bar classification records and the engine's level table.

use std::ops::{Index, IndexMut};

use swing_types::TrendState;
use swing_types::bar::{scale, unscale};

/// A state assigned to a bar, with the price that set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Mark {
    /// Assigned state
    pub state: TrendState,
    /// High for upward states, low for downward ones
    pub price: i64,
    /// Whether the mark was later confirmed as a pivot
    pub pivot: bool,
}

impl Mark {
    /// Creates an unconfirmed mark.
    #[must_use]
    pub fn new(state: TrendState, price: i64) -> Self {
        Self {
            state,
            price,
            pivot: false,
        }
    }
}

/// Classification of one bar.
///
/// A bar that moved far enough both ways carries two marks; `first` is the
/// extreme reached first within the bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BarRecord {
    /// First (or only) state of the bar
    pub first: Option<Mark>,
    /// Second state of a dual-state bar
    pub second: Option<Mark>,
    /// Average true range over the window, 0 until the window fills
    pub range: i64,
    /// Average volume over the window, 0 until the window fills
    pub volume: i64,
    /// Volume split along prev close, first extreme, second extreme, close
    pub obv: [i64; 3],
    /// Index of the last record with a primary state
    pub last_primary: Option<usize>,
    /// Index of the last record with any state
    pub last_state: Option<usize>,
}

impl BarRecord {
    /// First state, if any.
    #[must_use]
    pub fn state(&self) -> Option<TrendState> {
        self.first.map(|m| m.state)
    }

    /// Second state, if any.
    #[must_use]
    pub fn state2(&self) -> Option<TrendState> {
        self.second.map(|m| m.state)
    }

    /// The mark that counts as the record's primary state: the second
    /// mark when it is primary, otherwise the first.
    #[must_use]
    pub fn primary_mark(&self) -> Option<Mark> {
        match self.second {
            Some(m) if m.state.is_primary() => Some(m),
            _ => self.first,
        }
    }

    /// Whether either mark is a pivot.
    #[must_use]
    pub fn is_pivot(&self) -> bool {
        self.first.is_some_and(|m| m.pivot) || self.second.is_some_and(|m| m.pivot)
    }

    pub(crate) fn rescale(&mut self, ratio: f64) {
        self.range = scale(self.range, ratio);
        self.volume = unscale(self.volume, ratio);
        for part in &mut self.obv {
            *part = unscale(*part, ratio);
        }
        for mark in [&mut self.first, &mut self.second].into_iter().flatten() {
            mark.price = scale(mark.price, ratio);
        }
    }
}

/// Last price reached in each state, meta levels included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Levels([i64; TrendState::COUNT]);

impl Levels {
    /// Level table as an array in [`TrendState::ALL`] order.
    #[must_use]
    pub fn as_array(&self) -> &[i64; TrendState::COUNT] {
        &self.0
    }

    pub(crate) fn rescale(&mut self, ratio: f64) {
        for level in &mut self.0 {
            *level = scale(*level, ratio);
        }
    }
}

impl Index<TrendState> for Levels {
    type Output = i64;

    fn index(&self, state: TrendState) -> &i64 {
        &self.0[state.index()]
    }
}

impl IndexMut<TrendState> for Levels {
    fn index_mut(&mut self, state: TrendState) -> &mut i64 {
        &mut self.0[state.index()]
    }
}

/// Most recent state and primary state, with their prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastSeen {
    /// Latest state
    pub state: Option<TrendState>,
    /// Price of the latest state
    pub price: i64,
    /// Latest primary state
    pub prim_state: Option<TrendState>,
    /// Price of the latest primary state
    pub prim_price: i64,
    /// OBV accumulated since the last primary record
    pub lns_obv: i64,
}

impl Default for LastSeen {
    fn default() -> Self {
        Self {
            state: None,
            price: -1,
            prim_state: None,
            prim_price: -1,
            lns_obv: 0,
        }
    }
}

impl LastSeen {
    pub(crate) fn rescale(&mut self, ratio: f64) {
        self.price = scale(self.price, ratio);
        self.prim_price = scale(self.prim_price, ratio);
    }
}
