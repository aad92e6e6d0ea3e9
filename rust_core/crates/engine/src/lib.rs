//! Swing Engine
//!
//! Livermore-style swing classification for the swing analytics workspace.
//! Walks a price series bar by bar, assigns each bar one of six swing
//! states and tracks the pivots where the primary trend reversed.
//!
//! # Features
//! - Six-state transition rules with meta rally/reaction levels
//! - Dual-state bars resolved by intrabar order
//! - Pivot arena with on-balance-volume accumulation
//! - Trend channels through the last four pivots and bounce detection
//! - Split-aware rescaling of every stored price and volume
//! - Text and JSON reports
//! - Symbol and factor cache over bar, split and calendar sources

#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod channel;
pub mod engine;
pub mod error;
pub mod obv;
pub mod pivots;
pub mod record;
pub mod report;
pub mod state;

// Re-export main types
pub use cache::AnalyticsCache;
pub use channel::{Bounce, Channel, ChannelBoundary, pivot_bounce};
pub use engine::TrendEngine;
pub use error::EngineError;
pub use pivots::{Pivot, PivotList};
pub use record::{BarRecord, LastSeen, Levels, Mark};
pub use report::RenderOptions;
pub use state::{Transition, transition};
