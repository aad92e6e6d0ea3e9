use std::path::Path;

use chrono::NaiveDate;

use crate::error::CoreError;

/// Engine configuration, usually loaded from YAML.
///
/// Every field has a default, so an empty document is a valid config.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Named factor values engines are cached under
    #[serde(default = "default_factors")]
    pub factors: Vec<FactorConfig>,
    /// Averaging window for daily series
    #[serde(default = "default_daily_window")]
    pub daily_window: usize,
    /// Averaging window for 5-minute series (two sessions)
    #[serde(default = "default_intraday_window")]
    pub intraday_window: usize,
    /// Business days loaded when an intraday request asks for none
    #[serde(default = "default_intraday_days")]
    pub default_intraday_days: i64,
    /// First date of a full daily history load
    #[serde(default = "default_history_start")]
    pub history_start: NaiveDate,
    /// Last date on which options expired on the Saturday after the third Friday
    #[serde(default = "default_expiry_cutover")]
    pub expiry_cutover: NaiveDate,
}

/// A labelled factor, e.g. `"150"` for `1.5`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FactorConfig {
    /// Cache label
    pub label: String,
    /// Multiplier applied to the average true range
    pub factor: f64,
}

fn default_factors() -> Vec<FactorConfig> {
    [("050", 0.5), ("100", 1.0), ("150", 1.5), ("200", 2.0)]
        .into_iter()
        .map(|(label, factor)| FactorConfig {
            label: label.to_string(),
            factor,
        })
        .collect()
}

fn default_daily_window() -> usize {
    20
}

fn default_intraday_window() -> usize {
    156
}

fn default_intraday_days() -> i64 {
    20
}

fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1985, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_expiry_cutover() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 17).unwrap_or(NaiveDate::MIN)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            factors: default_factors(),
            daily_window: default_daily_window(),
            intraday_window: default_intraday_window(),
            default_intraday_days: default_intraday_days(),
            history_start: default_history_start(),
            expiry_cutover: default_expiry_cutover(),
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from a YAML file.
    ///
    /// # Errors
    /// Returns [`CoreError::Io`] if the file cannot be read, [`CoreError::Yaml`]
    /// if it does not parse and [`CoreError::Config`] if it parses to
    /// inconsistent values.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads the configuration from a YAML string.
    ///
    /// # Errors
    /// See [`EngineConfig::load`].
    pub fn from_yaml(yaml: &str) -> Result<Self, CoreError> {
        let config: EngineConfig = if yaml.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks windows and factors.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.daily_window == 0 || self.intraday_window == 0 {
            return Err(CoreError::Config("averaging windows must be positive".into()));
        }
        for (i, f) in self.factors.iter().enumerate() {
            if !f.factor.is_finite() || f.factor <= 0.0 {
                return Err(CoreError::Config(format!(
                    "factor {} must be positive, got {}",
                    f.label, f.factor
                )));
            }
            if self.factors[..i].iter().any(|g| g.label == f.label) {
                return Err(CoreError::Config(format!("duplicate factor label {}", f.label)));
            }
        }
        Ok(())
    }

    /// Factor value for a label.
    #[must_use]
    pub fn factor(&self, label: &str) -> Option<f64> {
        self.factors.iter().find(|f| f.label == label).map(|f| f.factor)
    }

    /// Averaging window for a series interval.
    #[must_use]
    pub fn window_for(&self, interval: crate::BarInterval) -> usize {
        if interval.is_intraday() {
            self.intraday_window
        } else {
            self.daily_window
        }
    }
}
