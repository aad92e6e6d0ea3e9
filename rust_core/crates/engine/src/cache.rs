//! Per-symbol series and per-(factor, symbol) engine cache.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use swing_calendar::clock::start_of_day;
use swing_calendar::{Clock, TradingCalendar};
use swing_data::{BarSource, SeekMode, SeriesLoader, SplitSource, TimeSeries};
use swing_types::{BarInterval, EngineConfig};

use crate::engine::TrendEngine;
use crate::error::EngineError;

/// Explicit analytics context: loaded daily series by symbol and engines
/// by factor label and symbol.
///
/// Entries are never evicted. Callers that detect stale data replace the
/// entry with [`AnalyticsCache::replace_series`] or
/// [`AnalyticsCache::replace_engine`].
pub struct AnalyticsCache {
    calendar: Arc<TradingCalendar>,
    bars: Box<dyn BarSource>,
    splits: Box<dyn SplitSource>,
    config: EngineConfig,
    clock: Box<dyn Clock>,
    series: HashMap<String, TimeSeries>,
    engines: HashMap<String, HashMap<String, TrendEngine>>,
}

impl AnalyticsCache {
    /// Creates an empty cache over the given collaborators.
    #[must_use]
    pub fn new(
        calendar: Arc<TradingCalendar>,
        bars: Box<dyn BarSource>,
        splits: Box<dyn SplitSource>,
        config: EngineConfig,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            calendar,
            bars,
            splits,
            config,
            clock,
            series: HashMap::new(),
            engines: HashMap::new(),
        }
    }

    /// Shared calendar.
    #[must_use]
    pub fn calendar(&self) -> &Arc<TradingCalendar> {
        &self.calendar
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loads a series without caching it.
    ///
    /// # Errors
    /// See [`SeriesLoader::load`].
    pub fn load_series(
        &self,
        symbol: &str,
        end: Option<NaiveDate>,
        num_days: i64,
        interval: BarInterval,
    ) -> Result<Option<TimeSeries>, EngineError> {
        let loader = SeriesLoader::new(
            &self.calendar,
            self.bars.as_ref(),
            self.splits.as_ref(),
            &self.config,
            self.clock.as_ref(),
        );
        Ok(loader.load(symbol, end, num_days, interval)?)
    }

    /// Full daily history of `symbol` with the cursor on `date`.
    ///
    /// The first request loads and caches the history; later requests only
    /// move the cursor. Returns `Ok(None)` when the source has no bars.
    ///
    /// # Errors
    /// Returns a data error if loading fails or `date` cannot be resolved
    /// with `mode`.
    pub fn series_for(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        mode: SeekMode,
    ) -> Result<Option<&mut TimeSeries>, EngineError> {
        let series = match self.series.entry(symbol.to_string()) {
            Entry::Occupied(entry) => {
                tracing::debug!("Series cache hit for {}", symbol);
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                tracing::debug!("Series cache miss for {}", symbol);
                let loader = SeriesLoader::new(
                    &self.calendar,
                    self.bars.as_ref(),
                    self.splits.as_ref(),
                    &self.config,
                    self.clock.as_ref(),
                );
                let Some(loaded) = loader.load(symbol, None, 0, BarInterval::Daily)? else {
                    return Ok(None);
                };
                entry.insert(loaded)
            }
        };
        series.set_day(date, mode)?;
        Ok(Some(series))
    }

    /// Cached series of `symbol`, if loaded.
    #[must_use]
    pub fn series(&self, symbol: &str) -> Option<&TimeSeries> {
        self.series.get(symbol)
    }

    /// Moves the cached series of `symbol` forward to `stamp`. Returns the
    /// number of bars stepped, or `None` if the symbol is not cached.
    pub fn advance_series_to(&mut self, symbol: &str, stamp: NaiveDateTime) -> Option<usize> {
        self.series.get_mut(symbol).map(|s| s.advance_to(stamp))
    }

    /// Replaces the cached series of `symbol`.
    pub fn replace_series(&mut self, series: TimeSeries) {
        tracing::debug!("Series replaced for {}", series.symbol());
        self.series.insert(series.symbol().to_string(), series);
    }

    /// Engine for `symbol` under factor `label`, advanced to `date`.
    ///
    /// The first request loads the full daily history and runs a new
    /// engine to `date`; later requests advance the cached engine. Engines
    /// never move backwards. Returns `Ok(None)` when the source has no bars.
    ///
    /// # Errors
    /// - [`EngineError::UnknownFactor`] when `label` is not configured.
    /// - [`EngineError::InsufficientHistory`] when the history is shorter
    ///   than the daily window.
    /// - Data and calendar errors from loading and stepping.
    pub fn get_or_create_engine(
        &mut self,
        symbol: &str,
        label: &str,
        date: NaiveDate,
    ) -> Result<Option<&mut TrendEngine>, EngineError> {
        let factor = self
            .config
            .factor(label)
            .ok_or_else(|| EngineError::UnknownFactor(label.to_string()))?;
        let target = start_of_day(date);
        let by_symbol = self.engines.entry(label.to_string()).or_default();
        let engine = match by_symbol.entry(symbol.to_string()) {
            Entry::Occupied(entry) => {
                tracing::debug!("Engine cache hit for {} at factor {}", symbol, label);
                let engine = entry.into_mut();
                engine.advance_to(target)?;
                engine
            }
            Entry::Vacant(entry) => {
                tracing::debug!("Engine cache miss for {} at factor {}", symbol, label);
                let loader = SeriesLoader::new(
                    &self.calendar,
                    self.bars.as_ref(),
                    self.splits.as_ref(),
                    &self.config,
                    self.clock.as_ref(),
                );
                let Some(series) = loader.load(symbol, None, 0, BarInterval::Daily)? else {
                    return Ok(None);
                };
                let engine = TrendEngine::run_to(series, target, factor, self.config.window_for(BarInterval::Daily))?;
                entry.insert(engine)
            }
        };
        Ok(Some(engine))
    }

    /// Cached engine for `symbol` under `label`, if built.
    #[must_use]
    pub fn engine(&self, symbol: &str, label: &str) -> Option<&TrendEngine> {
        self.engines.get(label).and_then(|m| m.get(symbol))
    }

    /// Replaces the cached engine for `symbol` under `label`.
    pub fn replace_engine(&mut self, symbol: &str, label: &str, engine: TrendEngine) {
        tracing::debug!("Engine replaced for {} at factor {}", symbol, label);
        self.engines
            .entry(label.to_string())
            .or_default()
            .insert(symbol.to_string(), engine);
    }

    /// Number of cached engines across all factors.
    #[must_use]
    pub fn engine_count(&self) -> usize {
        self.engines.values().map(HashMap::len).sum()
    }

    /// Monthly option expiry on or after `date`, honoring the configured
    /// Saturday cutover.
    ///
    /// # Errors
    /// Returns a calendar error when `date` or its expiry month is outside
    /// the calendar.
    pub fn option_expiry(&self, date: NaiveDate) -> Result<NaiveDate, EngineError> {
        let ix = self.calendar.day_index(date)?;
        let (_, expiry) = self.calendar.option_expiry_with_cutover(ix, self.config.expiry_cutover)?;
        Ok(expiry)
    }
}
