//! Streaming statistics over speed readings
//!
//! - [`StatisticsEngine`] - Extremes, windowed average and latest reading
//! - [`RollingWindow`] - Lazily pruned time window of magnitudes
//! - [`RunningExtremes`] - Monotonically widening max/min

pub mod engine;
pub mod window;

pub use engine::{RunningExtremes, StatisticsEngine};
pub use window::{RollingWindow, DEFAULT_WINDOW};
