//! Session recording module
//!
//! Recording captures one point per reading while active and hands the
//! points to a sink when it stops.
//!
//! - [`SessionRecorder`] - The `Idle`/`Recording` state machine
//! - [`FileExporter`] - CSV or JSON lines output in a timestamped file
//! - [`RecordingSink`] - Seam for alternative export targets

pub mod export;
pub mod recorder;
pub mod types;

pub use export::{csv_header, FileExporter, RecordingSink};
pub use recorder::{SessionRecorder, StopOutcome};
pub use types::{DataPoint, ExportFormat, RecordMode, SessionExport, SessionState};
