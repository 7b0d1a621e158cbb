//! Statistics engine
//!
//! Owns the running extremes and the rolling window. Magnitudes are stored
//! in m/s; the display unit is applied only when a snapshot is built, so a
//! unit change never touches history.

use super::window::RollingWindow;
use crate::types::{Direction, DisplaySnapshot, Reading};
use crate::units::SpeedUnit;
use std::time::{Duration, Instant};

/// Largest and smallest magnitudes seen since the last reset
///
/// The first magnitude observed seeds both values. After that `max_seen`
/// never decreases and `min_seen` never increases.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningExtremes {
    pub max_seen: Option<f64>,
    pub min_seen: Option<f64>,
}

impl RunningExtremes {
    /// Widen the extremes to include `magnitude`
    pub fn update(&mut self, magnitude: f64) {
        self.max_seen = Some(self.max_seen.map_or(magnitude, |m| m.max(magnitude)));
        self.min_seen = Some(self.min_seen.map_or(magnitude, |m| m.min(magnitude)));
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Running statistics over the reading stream of one connection
#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    extremes: RunningExtremes,
    window: RollingWindow,
    unit: SpeedUnit,
    /// Magnitude and direction of the latest reading
    latest: Option<(f64, Direction)>,
    readings_observed: u64,
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new(super::window::DEFAULT_WINDOW, SpeedUnit::default())
    }
}

impl StatisticsEngine {
    /// Create an engine averaging over `window_span`
    pub fn new(window_span: Duration, unit: SpeedUnit) -> Self {
        Self {
            extremes: RunningExtremes::default(),
            window: RollingWindow::new(window_span),
            unit,
            latest: None,
            readings_observed: 0,
        }
    }

    /// Fold a reading into the statistics and return the new snapshot
    pub fn observe(&mut self, reading: &Reading, now: Instant) -> DisplaySnapshot {
        let magnitude = reading.magnitude();
        let direction = reading.direction();

        self.extremes.update(magnitude);
        self.window.push(now, magnitude);
        self.latest = Some((magnitude, direction));
        self.readings_observed += 1;

        self.snapshot()
    }

    /// Re-prune the window without a new reading
    ///
    /// Called from the idle tick so the average decays to unavailable once
    /// readings stop arriving.
    pub fn refresh(&mut self, now: Instant) -> DisplaySnapshot {
        self.window.prune(now);
        self.snapshot()
    }

    /// Current values converted to the display unit
    pub fn snapshot(&self) -> DisplaySnapshot {
        let unit = self.unit;
        DisplaySnapshot {
            speed: self.latest.map(|(m, _)| unit.convert(m)),
            max: self.extremes.max_seen.map(|m| unit.convert(m)),
            min: self.extremes.min_seen.map(|m| unit.convert(m)),
            average: self.window.mean().map(|m| unit.convert(m)),
            direction: self.latest.map(|(_, d)| d),
            unit,
        }
    }

    /// Change the display unit; history is kept
    pub fn set_unit(&mut self, unit: SpeedUnit) {
        self.unit = unit;
    }

    pub fn unit(&self) -> SpeedUnit {
        self.unit
    }

    pub fn extremes(&self) -> RunningExtremes {
        self.extremes
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    pub fn readings_observed(&self) -> u64 {
        self.readings_observed
    }

    /// Forget everything; used when a new connection starts
    pub fn reset(&mut self) {
        self.extremes.reset();
        self.window.clear();
        self.latest = None;
        self.readings_observed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_first_reading_seeds_extremes() {
        let t0 = Instant::now();
        let mut engine = StatisticsEngine::new(Duration::from_secs(5), SpeedUnit::MetersPerSecond);
        let snap = engine.observe(&Reading::new(t0, -4.0), t0);

        assert_eq!(snap.speed, Some(4.0));
        assert_eq!(snap.max, Some(4.0));
        assert_eq!(snap.min, Some(4.0));
        assert_eq!(snap.average, Some(4.0));
        assert_eq!(snap.direction, Some(Direction::Receding));
    }

    #[test]
    fn test_zero_speed_is_receding() {
        let t0 = Instant::now();
        let mut engine = StatisticsEngine::default();
        let snap = engine.observe(&Reading::new(t0, 0.0), t0);
        assert_eq!(snap.direction, Some(Direction::Receding));
        assert_eq!(snap.min, Some(0.0));
    }

    #[test]
    fn test_unit_applied_at_snapshot_time() {
        let t0 = Instant::now();
        let mut engine = StatisticsEngine::new(Duration::from_secs(5), SpeedUnit::MetersPerSecond);
        engine.observe(&Reading::new(t0, 10.0), t0);

        engine.set_unit(SpeedUnit::KilometersPerHour);
        let snap = engine.snapshot();
        assert!(approx(snap.speed, 36.0));
        assert!(approx(snap.max, 36.0));
        assert!(approx(snap.average, 36.0));
        assert_eq!(engine.extremes().max_seen, Some(10.0));
    }

    #[test]
    fn test_unit_change_keeps_extremes() {
        let t0 = Instant::now();
        let mut engine = StatisticsEngine::default();
        engine.observe(&Reading::new(t0, 3.0), t0);
        engine.observe(&Reading::new(t0, 9.0), t0);
        engine.set_unit(SpeedUnit::MilesPerHour);
        assert_eq!(engine.extremes().min_seen, Some(3.0));
        assert_eq!(engine.extremes().max_seen, Some(9.0));
    }

    #[test]
    fn test_refresh_decays_average() {
        let t0 = Instant::now();
        let mut engine = StatisticsEngine::default();
        engine.observe(&Reading::new(t0, 6.0), t0);

        let snap = engine.refresh(t0 + Duration::from_secs(3));
        assert!(snap.average.is_some());

        let snap = engine.refresh(t0 + Duration::from_secs(6));
        assert!(snap.average.is_none());
        assert!(snap.speed.is_some());
        assert!(snap.max.is_some());
    }

    #[test]
    fn test_reset_clears_everything() {
        let t0 = Instant::now();
        let mut engine = StatisticsEngine::default();
        engine.observe(&Reading::new(t0, 6.0), t0);
        engine.reset();

        let snap = engine.snapshot();
        assert_eq!(snap, DisplaySnapshot::empty(engine.unit()));
        assert_eq!(engine.readings_observed(), 0);
    }

    proptest! {
        #[test]
        fn test_extremes_are_monotonic(speeds in prop::collection::vec(-80.0f64..80.0, 1..100)) {
            let t0 = Instant::now();
            let mut engine = StatisticsEngine::default();
            let mut prev = RunningExtremes::default();

            for (i, s) in speeds.iter().enumerate() {
                let now = t0 + Duration::from_millis(i as u64 * 100);
                engine.observe(&Reading::new(now, *s), now);
                let cur = engine.extremes();
                if let (Some(p), Some(c)) = (prev.max_seen, cur.max_seen) {
                    prop_assert!(c >= p);
                }
                if let (Some(p), Some(c)) = (prev.min_seen, cur.min_seen) {
                    prop_assert!(c <= p);
                }
                prev = cur;
            }

            let max = speeds.iter().map(|s| s.abs()).fold(f64::MIN, f64::max);
            let min = speeds.iter().map(|s| s.abs()).fold(f64::MAX, f64::min);
            prop_assert_eq!(prev.max_seen, Some(max));
            prop_assert_eq!(prev.min_seen, Some(min));
        }
    }
}
