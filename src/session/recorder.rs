//! Session recorder for capturing speed readings
//!
//! `Idle --start--> Recording --stop--> Idle`. While recording, every
//! snapshot produced by a reading appends one [`DataPoint`]. Stopping hands
//! the points to a [`RecordingSink`]; they are cleared only once the sink
//! accepts them, so a failed export can be retried.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Local};

use super::export::RecordingSink;
use super::types::{DataPoint, RecordMode, SessionExport, SessionState};
use crate::error::Result;
use crate::types::DisplaySnapshot;
use crate::units::SpeedUnit;

/// Result of stopping (or re-flushing) a recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// No points were collected; the sink was not called
    NothingRecorded,
    /// The sink accepted the points
    Exported { path: PathBuf, points: usize },
}

/// Session recorder
#[derive(Debug)]
pub struct SessionRecorder {
    /// Current recording state
    state: SessionState,
    /// Monotonic start of recording, for elapsed times
    start_time: Option<Instant>,
    /// Wall clock start of recording, for file names
    started_at: Option<DateTime<Local>>,
    mode: RecordMode,
    points: Vec<DataPoint>,
    /// Maximum number of points to record (0 = unlimited)
    max_points: usize,
}

impl Default for SessionRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRecorder {
    /// Create a new session recorder
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            start_time: None,
            started_at: None,
            mode: RecordMode::default(),
            points: Vec::new(),
            max_points: 0,
        }
    }

    /// Set maximum number of points to record (0 = unlimited)
    pub fn set_max_points(&mut self, max: usize) {
        self.max_points = max;
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if recording
    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    /// Points collected and not yet exported
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Start a new recording, discarding any points left from a failed export
    pub fn start_recording(&mut self, mode: RecordMode, now: Instant) {
        if !self.points.is_empty() {
            tracing::warn!(
                "Discarding {} unexported points from the previous recording",
                self.points.len()
            );
        }
        self.points.clear();
        self.mode = mode;
        self.start_time = Some(now);
        self.started_at = Some(Local::now());
        self.state = SessionState::Recording;
        tracing::info!("Recording started ({} mode)", mode);
    }

    /// Append a point for the snapshot produced by a reading at `now`
    ///
    /// Does nothing while idle or when the snapshot carries no speed.
    pub fn record(&mut self, snapshot: &DisplaySnapshot, now: Instant) -> Option<&DataPoint> {
        if !self.is_recording() {
            return None;
        }
        let start_time = self.start_time?;
        let speed = snapshot.speed?;

        if self.max_points > 0 && self.points.len() >= self.max_points {
            return None;
        }

        let point = DataPoint {
            elapsed_seconds: now.saturating_duration_since(start_time).as_secs_f64(),
            instantaneous: self.mode.records_instantaneous().then_some(speed),
            average: if self.mode.records_average() {
                snapshot.average
            } else {
                None
            },
            wall_clock_label: Local::now().format("%H:%M:%S%.3f").to_string(),
        };
        self.points.push(point);
        if self.points.len() == self.max_points {
            tracing::warn!(
                "Recording reached {} points; later readings are not recorded",
                self.max_points
            );
        }
        self.points.last()
    }

    /// Stop recording and hand the points to `sink`
    ///
    /// The recorder is idle afterwards whatever the outcome. On a sink error
    /// the points stay available for [`SessionRecorder::retry_export`].
    pub fn stop_recording(
        &mut self,
        sink: &mut dyn RecordingSink,
        unit: SpeedUnit,
    ) -> Result<StopOutcome> {
        if self.is_recording() {
            tracing::info!("Recording stopped with {} points", self.points.len());
        }
        self.state = SessionState::Idle;
        self.start_time = None;
        self.flush(sink, unit)
    }

    /// Re-attempt the hand-off of points left by a failed export
    pub fn retry_export(
        &mut self,
        sink: &mut dyn RecordingSink,
        unit: SpeedUnit,
    ) -> Result<StopOutcome> {
        if self.is_recording() {
            return Ok(StopOutcome::NothingRecorded);
        }
        self.flush(sink, unit)
    }

    /// Get number of recorded points
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    fn flush(&mut self, sink: &mut dyn RecordingSink, unit: SpeedUnit) -> Result<StopOutcome> {
        if self.points.is_empty() {
            return Ok(StopOutcome::NothingRecorded);
        }

        let export = SessionExport {
            mode: self.mode,
            unit,
            started_at: self.started_at.unwrap_or_else(Local::now),
            points: &self.points,
        };
        let path = sink.export(&export)?;
        let points = self.points.len();
        self.points.clear();
        self.started_at = None;
        tracing::info!("Exported {} points to {}", points, path.display());
        Ok(StopOutcome::Exported { path, points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RadarError;
    use crate::stats::StatisticsEngine;
    use crate::types::Reading;
    use std::time::Duration;

    /// Sink that keeps the exported points in memory
    #[derive(Default)]
    struct MemorySink {
        exports: Vec<Vec<DataPoint>>,
        fail: bool,
    }

    impl RecordingSink for MemorySink {
        fn export(&mut self, export: &SessionExport<'_>) -> Result<PathBuf> {
            if self.fail {
                return Err(RadarError::Export("disk full".into()));
            }
            self.exports.push(export.points.to_vec());
            Ok(PathBuf::from("memory"))
        }
    }

    #[test]
    fn test_recorder_lifecycle() {
        let mut recorder = SessionRecorder::new();
        assert_eq!(recorder.state(), SessionState::Idle);

        recorder.start_recording(RecordMode::Instantaneous, Instant::now());
        assert_eq!(recorder.state(), SessionState::Recording);

        let mut sink = MemorySink::default();
        recorder
            .stop_recording(&mut sink, SpeedUnit::default())
            .unwrap();
        assert_eq!(recorder.state(), SessionState::Idle);
    }

    #[test]
    fn test_both_mode_round_trip() {
        let t0 = Instant::now();
        let mut engine = StatisticsEngine::new(Duration::from_secs(5), SpeedUnit::MetersPerSecond);
        let mut recorder = SessionRecorder::new();
        recorder.start_recording(RecordMode::Both, t0);

        for (offset, speed) in [(0u64, 5.0), (1, 7.0)] {
            let now = t0 + Duration::from_secs(offset);
            let snapshot = engine.observe(&Reading::new(now, speed), now);
            recorder.record(&snapshot, now);
        }

        let mut sink = MemorySink::default();
        let outcome = recorder
            .stop_recording(&mut sink, SpeedUnit::MetersPerSecond)
            .unwrap();

        assert!(matches!(outcome, StopOutcome::Exported { points: 2, .. }));
        let exported = &sink.exports[0];
        assert_eq!(exported.len(), 2);
        assert_eq!(exported[0].instantaneous, Some(5.0));
        assert_eq!(exported[0].average, Some(5.0));
        assert_eq!(exported[1].instantaneous, Some(7.0));
        assert_eq!(exported[1].average, Some(6.0));
        assert_eq!(exported[0].elapsed_seconds, 0.0);
        assert_eq!(exported[1].elapsed_seconds, 1.0);

        assert_eq!(recorder.state(), SessionState::Idle);
        assert!(recorder.points().is_empty());
    }

    #[test]
    fn test_average_mode_keeps_point_without_average() {
        let now = Instant::now();
        let mut recorder = SessionRecorder::new();
        recorder.start_recording(RecordMode::Average, now);

        let mut snapshot = DisplaySnapshot::empty(SpeedUnit::MetersPerSecond);
        snapshot.speed = Some(3.0);
        recorder.record(&snapshot, now);

        let point = &recorder.points()[0];
        assert_eq!(point.instantaneous, None);
        assert_eq!(point.average, None);
    }

    #[test]
    fn test_instantaneous_mode_omits_average() {
        let now = Instant::now();
        let mut recorder = SessionRecorder::new();
        recorder.start_recording(RecordMode::Instantaneous, now);

        let mut snapshot = DisplaySnapshot::empty(SpeedUnit::MetersPerSecond);
        snapshot.speed = Some(3.0);
        snapshot.average = Some(2.0);
        let point = recorder.record(&snapshot, now).cloned().unwrap();

        assert_eq!(point.instantaneous, Some(3.0));
        assert_eq!(point.average, None);
        assert_eq!(point.wall_clock_label.len(), "00:00:00.000".len());
    }

    #[test]
    fn test_idle_readings_are_not_recorded() {
        let mut recorder = SessionRecorder::new();
        let mut snapshot = DisplaySnapshot::empty(SpeedUnit::MetersPerSecond);
        snapshot.speed = Some(3.0);
        assert!(recorder.record(&snapshot, Instant::now()).is_none());
        assert_eq!(recorder.point_count(), 0);
    }

    #[test]
    fn test_empty_stop_skips_sink() {
        let mut recorder = SessionRecorder::new();
        recorder.start_recording(RecordMode::Both, Instant::now());

        let mut sink = MemorySink {
            fail: true,
            ..Default::default()
        };
        let outcome = recorder
            .stop_recording(&mut sink, SpeedUnit::default())
            .unwrap();
        assert_eq!(outcome, StopOutcome::NothingRecorded);
        assert!(sink.exports.is_empty());
    }

    #[test]
    fn test_failed_export_keeps_points_for_retry() {
        let now = Instant::now();
        let mut recorder = SessionRecorder::new();
        recorder.start_recording(RecordMode::Instantaneous, now);
        let mut snapshot = DisplaySnapshot::empty(SpeedUnit::MetersPerSecond);
        snapshot.speed = Some(3.0);
        recorder.record(&snapshot, now);

        let mut sink = MemorySink {
            fail: true,
            ..Default::default()
        };
        let err = recorder
            .stop_recording(&mut sink, SpeedUnit::default())
            .unwrap_err();
        assert!(matches!(err, RadarError::Export(_)));
        assert_eq!(recorder.state(), SessionState::Idle);
        assert_eq!(recorder.point_count(), 1);

        sink.fail = false;
        let outcome = recorder
            .retry_export(&mut sink, SpeedUnit::default())
            .unwrap();
        assert!(matches!(outcome, StopOutcome::Exported { points: 1, .. }));
        assert_eq!(recorder.point_count(), 0);
    }

    #[test]
    fn test_max_points_limit() {
        let now = Instant::now();
        let mut recorder = SessionRecorder::new();
        recorder.set_max_points(2);
        recorder.start_recording(RecordMode::Instantaneous, now);
        let mut snapshot = DisplaySnapshot::empty(SpeedUnit::MetersPerSecond);
        snapshot.speed = Some(1.0);
        for _ in 0..5 {
            recorder.record(&snapshot, now);
        }
        assert_eq!(recorder.point_count(), 2);
    }
}
