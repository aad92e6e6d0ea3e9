//! Swing engine.

use chrono::NaiveDateTime;
use swing_data::{SeekMode, TimeSeries, true_range};
use swing_types::{SplitEvent, TrendState, is_reversal};

use crate::error::EngineError;
use crate::obv::{accumulated_obv, daily_obv, high_first, split_volume};
use crate::pivots::{Pivot, PivotList};
use crate::record::{BarRecord, LastSeen, Levels, Mark};
use crate::state::transition;

/// Swing engine for one series and one factor.
///
/// The engine owns its series and stays in lockstep with it: after
/// construction and after every step there is exactly one record per bar up
/// to and including the series cursor.
#[derive(Debug, Clone)]
pub struct TrendEngine {
    series: TimeSeries,
    factor: f64,
    window: usize,
    records: Vec<BarRecord>,
    ranges: Vec<i64>,
    volumes: Vec<i64>,
    levels: Levels,
    last: LastSeen,
    pivots: PivotList,
}

impl TrendEngine {
    /// Builds an engine from the first `window` bars of `series`.
    ///
    /// The highest bar of the window is classified `Rally` and the lowest
    /// `Reaction`; every level is seeded from those two prices.
    ///
    /// # Errors
    /// Returns [`EngineError::InsufficientHistory`] when the series holds
    /// fewer than `window` bars, or a data error if the seek fails.
    pub fn new(mut series: TimeSeries, factor: f64, window: usize) -> Result<Self, EngineError> {
        if window == 0 || series.len() < window {
            return Err(EngineError::InsufficientHistory {
                required: window.max(1),
                available: series.len(),
            });
        }
        let seed = series.bars()[window - 1].stamp;
        series.set_cursor(seed, SeekMode::Exact)?;

        let bars = &series.bars()[..window];
        let (mut max_ix, mut min_ix) = (0, 0);
        for (ix, bar) in bars.iter().enumerate() {
            if bar.high > bars[max_ix].high {
                max_ix = ix;
            }
            if bar.low < bars[min_ix].low {
                min_ix = ix;
            }
        }
        let (max, min) = (bars[max_ix].high, bars[min_ix].low);

        let mut engine = Self {
            series,
            factor,
            window,
            records: Vec::new(),
            ranges: vec![0; window],
            volumes: vec![0; window],
            levels: Levels::default(),
            last: LastSeen::default(),
            pivots: PivotList::default(),
        };
        for ix in 0..window {
            let up = (ix == max_ix).then_some(TrendState::Rally);
            let down = (ix == min_ix).then_some(TrendState::Reaction);
            engine.record_day(ix, up, down);
        }
        for state in [TrendState::SRally, TrendState::Rally, TrendState::UpTrend, TrendState::MRally] {
            engine.levels[state] = max;
        }
        for state in [TrendState::DownTrend, TrendState::Reaction, TrendState::SReaction, TrendState::MReaction] {
            engine.levels[state] = min;
        }

        tracing::info!(
            "Engine built for {} (factor {}, window {}): high {} at {}, low {} at {}",
            engine.series.symbol(),
            factor,
            window,
            max,
            max_ix,
            min,
            min_ix
        );
        Ok(engine)
    }

    /// Builds an engine and advances it to `target`.
    ///
    /// # Errors
    /// See [`TrendEngine::new`] and [`TrendEngine::advance_to`].
    pub fn run_to(series: TimeSeries, target: NaiveDateTime, factor: f64, window: usize) -> Result<Self, EngineError> {
        let mut engine = Self::new(series, factor, window)?;
        engine.advance_to(target)?;
        Ok(engine)
    }

    /// Steps until the current bar is at or past `target`, which is first
    /// moved onto the calendar grid. Returns the number of steps taken.
    ///
    /// # Errors
    /// Returns a calendar error if the target cannot be placed on the grid.
    pub fn advance_to(&mut self, target: NaiveDateTime) -> Result<usize, EngineError> {
        let intraday = self.series.interval().is_intraday();
        let target = self.series.calendar().sanitize(target, intraday)?;
        let mut steps = 0;
        while self.series.current().stamp < target && self.step() {
            steps += 1;
        }
        Ok(steps)
    }

    /// Classifies the next bar. Returns `false` at the end of the series.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn step(&mut self) -> bool {
        let Some(applied) = self.series.next_bar() else {
            return false;
        };
        for split in &applied {
            self.rescale(split);
        }

        let ix = self.series.pos();
        let threshold = (self.factor * self.records[ix - 1].range as f64) as i64;
        let bar = *self.series.current();
        let next = match self.last.state {
            Some(state) => transition(state, &bar, &mut self.levels, &self.last, threshold),
            None => None,
        };
        let (up, down) = next.unwrap_or_else(|| {
            tracing::warn!(
                "Unknown state {:?} for {} at {}, recording an empty day",
                self.last.state,
                self.series.symbol(),
                bar.stamp
            );
            (None, None)
        });
        self.record_day(ix, up, down);
        true
    }

    fn rescale(&mut self, split: &SplitEvent) {
        let ratio = split.ratio;
        for rec in &mut self.records {
            rec.rescale(ratio);
        }
        for range in &mut self.ranges {
            *range = swing_types::bar::scale(*range, ratio);
        }
        for volume in &mut self.volumes {
            *volume = swing_types::bar::unscale(*volume, ratio);
        }
        self.last.rescale(ratio);
        self.levels.rescale(ratio);
        self.pivots.rescale_until(split.date, ratio);
    }

    fn init_record(&mut self, ix: usize) -> BarRecord {
        let (last_primary, last_state) = ix
            .checked_sub(1)
            .and_then(|prev| self.records.get(prev))
            .map_or((None, None), |prev| (prev.last_primary, prev.last_state));
        let slot = ix % self.window;
        self.ranges[slot] = true_range(self.series.bars(), ix);
        self.volumes[slot] = self.series.bars()[ix].volume;
        let (range, volume) = if ix + 1 < self.window {
            (0, 0)
        } else {
            (mean(&self.ranges), mean(&self.volumes))
        };
        BarRecord {
            range,
            volume,
            last_primary,
            last_state,
            ..BarRecord::default()
        }
    }

    fn record_day(&mut self, ix: usize, up: Option<TrendState>, down: Option<TrendState>) {
        let mut rec = self.init_record(ix);
        let bar = self.series.bars()[ix];
        match (up, down) {
            (Some(up), Some(down)) => {
                let high = Mark::new(up, bar.high);
                let low = Mark::new(down, bar.low);
                if high_first(&bar) {
                    rec.first = Some(high);
                    rec.second = Some(low);
                } else {
                    rec.first = Some(low);
                    rec.second = Some(high);
                }
            }
            (Some(up), None) => rec.first = Some(Mark::new(up, bar.high)),
            (None, Some(down)) => rec.first = Some(Mark::new(down, bar.low)),
            (None, None) => {}
        }
        rec.obv = split_volume(self.series.bars(), ix);
        if let Some(delta) = daily_obv(&rec) {
            self.last.lns_obv += delta;
            self.pivots.add_obv(delta);
        }
        let marked = rec.first.is_some();
        self.records.push(rec);

        if marked {
            self.update_last(ix);
            if up.is_some_and(TrendState::is_primary) || down.is_some_and(TrendState::is_primary) {
                self.update_pivots(ix);
            }
        }
    }

    fn update_last(&mut self, ix: usize) {
        let rec = &mut self.records[ix];
        match (rec.first, rec.second) {
            (Some(only), None) => {
                self.last.state = Some(only.state);
                self.last.price = only.price;
                if only.state.is_primary() {
                    self.last.prim_state = Some(only.state);
                    self.last.prim_price = only.price;
                }
                self.levels[only.state] = only.price;
            }
            (Some(first), Some(second)) => {
                self.last.state = Some(second.state);
                self.last.price = second.price;
                self.levels[first.state] = first.price;
                self.levels[second.state] = second.price;
                let prim = [second, first].into_iter().find(|m| m.state.is_primary());
                if let Some(prim) = prim {
                    self.last.prim_state = Some(prim.state);
                    self.last.prim_price = prim.price;
                }
            }
            (None, _) => return,
        }
        rec.last_state = Some(ix);
    }

    fn update_pivots(&mut self, ix: usize) {
        let rec = self.records[ix].clone();
        let current = if rec.state().is_some_and(TrendState::is_primary) {
            rec.state()
        } else {
            rec.state2()
        };

        if let Some(lns) = rec.last_primary {
            let lns_rec = &self.records[lns];
            let second_is_primary = lns_rec.state2().is_some_and(TrendState::is_primary);
            if let Some(mark) = lns_rec.primary_mark()
                && is_reversal(Some(mark.state), current)
            {
                let range = lns_rec.range;
                let target = if second_is_primary {
                    &mut self.records[lns].second
                } else {
                    &mut self.records[lns].first
                };
                if let Some(m) = target.as_mut() {
                    m.pivot = true;
                }
                self.add_pivot(lns, mark, range, ix);
            }
        }

        if let (Some(first), Some(second)) = (rec.first, rec.second)
            && is_reversal(Some(first.state), Some(second.state))
        {
            if let Some(m) = self.records[ix].first.as_mut() {
                m.pivot = true;
            }
            self.add_pivot(ix, first, rec.range, ix);
        }

        let rec = &mut self.records[ix];
        rec.last_primary = Some(ix);
        if let Some(mark) = rec.primary_mark() {
            self.last.lns_obv = accumulated_obv(&self.records, self.series.bars(), ix, mark.state, ix);
        }
    }

    fn add_pivot(&mut self, index: usize, mark: Mark, range: i64, until: usize) {
        let bars = self.series.bars();
        let pivot = Pivot {
            date: bars[index].stamp,
            index,
            state: mark.state,
            price: mark.price,
            range,
            obv: accumulated_obv(&self.records, bars, index, mark.state, until),
            confirmed: true,
        };
        tracing::debug!(
            "Pivot {} {} at {} for {} (factor {})",
            pivot.state,
            pivot.price,
            pivot.date,
            self.series.symbol(),
            self.factor
        );
        self.pivots.push(pivot);
    }

    fn tentative(&self) -> Option<Pivot> {
        let lns = self.records.get(self.series.pos())?.last_primary?;
        let rec = &self.records[lns];
        let mark = rec.primary_mark()?;
        Some(Pivot {
            date: self.series.bars()[lns].stamp,
            index: lns,
            state: mark.state,
            price: mark.price,
            range: rec.range,
            obv: self.last.lns_obv,
            confirmed: false,
        })
    }

    /// Up to `n` confirmed pivots, oldest first, followed by the tentative
    /// pivot at the last primary record.
    #[must_use]
    pub fn pivots(&self, n: usize) -> Vec<Pivot> {
        let mut out = self.pivots.recent(n).to_vec();
        out.extend(self.tentative());
        out
    }

    /// Confirmed pivots dated on or after `date`, oldest first, followed by
    /// the tentative pivot.
    #[must_use]
    pub fn pivots_since(&self, date: NaiveDateTime) -> Vec<Pivot> {
        let mut out = self.pivots.since(date).to_vec();
        out.extend(self.tentative());
        out
    }

    /// Primary state in force before the current bar.
    ///
    /// On a bar carrying two primary states this is the first of them.
    #[must_use]
    pub fn previous_primary_state(&self) -> Option<TrendState> {
        let pos = self.series.pos();
        let rec = self.records.get(pos)?;
        if let (Some(first), Some(second)) = (rec.first, rec.second)
            && first.state.is_primary()
            && second.state.is_primary()
        {
            return Some(first.state);
        }
        let prev = self.records.get(pos.checked_sub(1)?)?;
        let lns = prev.last_primary?;
        self.records[lns].primary_mark().map(|m| m.state)
    }

    /// True when the current bar's first state is primary and points the
    /// other way from the previous primary state.
    #[must_use]
    pub fn is_first_in_new_trend(&self) -> bool {
        let Some(current) = self.records.get(self.series.pos()).and_then(BarRecord::state) else {
            return false;
        };
        if !current.is_primary() {
            return false;
        }
        match self.previous_primary_state() {
            Some(prev) => !((prev.is_up() && current.is_up()) || (prev.is_down() && current.is_down())),
            None => true,
        }
    }

    /// Average volume over the last `window` bars.
    #[must_use]
    pub fn avg_volume(&self) -> i64 {
        mean(&self.volumes)
    }

    /// Average true range over the last `window` bars.
    #[must_use]
    pub fn avg_range(&self) -> i64 {
        mean(&self.ranges)
    }

    /// All records up to the cursor.
    #[must_use]
    pub fn records(&self) -> &[BarRecord] {
        &self.records
    }

    /// Record of bar `i`.
    #[must_use]
    pub fn record(&self, i: usize) -> Option<&BarRecord> {
        self.records.get(i)
    }

    /// Record of the current bar.
    #[must_use]
    pub fn current(&self) -> &BarRecord {
        &self.records[self.series.pos()]
    }

    /// Level table.
    #[must_use]
    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    /// Most recent state and primary state.
    #[must_use]
    pub fn last(&self) -> &LastSeen {
        &self.last
    }

    /// Confirmed pivots.
    #[must_use]
    pub fn pivot_list(&self) -> &PivotList {
        &self.pivots
    }

    /// Threshold multiplier.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Averaging window.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// The engine's series.
    #[must_use]
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// Index of the current bar.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.series.pos()
    }
}

#[allow(clippy::cast_possible_wrap)]
fn mean(values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    values.iter().sum::<i64>() / values.len() as i64
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use swing_calendar::weekday_calendar;
    use swing_data::SplitList;
    use swing_types::{Bar, BarInterval};

    use super::*;

    fn series(prices: &[(i64, i64)]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let cal = Arc::new(weekday_calendar(start, end, &[]).unwrap());
        let days = cal.busdays(start, end).unwrap();
        let bars = prices
            .iter()
            .zip(days)
            .map(|(&(high, low), day)| Bar::daily(day, low, high, low, (high + low) / 2, 1000))
            .collect();
        TimeSeries::new("TEST", BarInterval::Daily, cal, bars, SplitList::default()).unwrap()
    }

    #[test]
    fn test_window_longer_than_series() {
        let err = TrendEngine::new(series(&[(110, 90); 3]), 1.0, 5).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientHistory { required: 5, available: 3 }));
    }

    #[test]
    fn test_seed_first_extreme_wins() {
        let engine = TrendEngine::new(series(&[(110, 90), (120, 95), (120, 80), (100, 80)]), 1.0, 4).unwrap();
        assert_eq!(engine.pos(), 3);
        assert_eq!(engine.records().len(), 4);
        assert_eq!(engine.records()[1].state(), Some(TrendState::Rally));
        assert_eq!(engine.records()[2].state(), Some(TrendState::Reaction));
        assert_eq!(engine.records()[3].state(), None);
        assert_eq!(engine.levels()[TrendState::MRally], 120);
        assert_eq!(engine.levels()[TrendState::SReaction], 80);
        assert_eq!(engine.last().state, Some(TrendState::Reaction));
    }

    #[test]
    fn test_step_stays_in_lockstep() {
        let mut engine = TrendEngine::new(series(&[(110, 90); 6]), 1.0, 4).unwrap();
        assert!(engine.step());
        assert_eq!(engine.records().len(), engine.pos() + 1);
        assert!(engine.step());
        assert!(!engine.step());
        assert_eq!(engine.records().len(), 6);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0);
        assert_eq!(mean(&[3, 4]), 3);
    }
}
