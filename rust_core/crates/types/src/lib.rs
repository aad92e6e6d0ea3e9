//! Swing Types
//!
//! Core data structures for the swing analytics workspace.
//! This crate provides bars, split events, swing states, bar intervals
//! and the YAML-backed engine configuration.

#![deny(clippy::all)]

pub mod bar;
pub mod config;
pub mod error;
pub mod interval;
pub mod split;
pub mod state;

// Re-export main types for convenience
pub use bar::Bar;
pub use config::{EngineConfig, FactorConfig};
pub use error::CoreError;
pub use interval::{BarInterval, ParseIntervalError};
pub use split::SplitEvent;
pub use state::{TrendState, is_reversal};
