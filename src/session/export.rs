//! Recording export
//!
//! [`RecordingSink`] receives the points of a finished recording.
//! [`FileExporter`] writes them to a timestamped file as CSV or JSON lines.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::types::{DataPoint, ExportFormat, RecordMode, SessionExport};
use crate::error::{RadarError, Result};
use crate::units::SpeedUnit;

/// Destination for a finished recording
pub trait RecordingSink {
    /// Persist the recording and return where it went
    fn export(&mut self, export: &SessionExport<'_>) -> Result<PathBuf>;
}

/// Writes recordings to `<output_dir>/<prefix>_speed_data_<YYYYmmdd_HHMMSS>.<ext>`
#[derive(Debug, Clone)]
pub struct FileExporter {
    output_dir: PathBuf,
    prefix: String,
    format: ExportFormat,
}

impl FileExporter {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>, format: ExportFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
            format,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_dir = dir.into();
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    pub fn set_format(&mut self, format: ExportFormat) {
        self.format = format;
    }

    /// File name for a recording saved at `saved_at`
    pub fn file_name(&self, saved_at: DateTime<Local>) -> String {
        let stamp = saved_at.format("%Y%m%d_%H%M%S");
        let prefix = self.prefix.trim();
        if prefix.is_empty() {
            format!("speed_data_{}.{}", stamp, self.format.extension())
        } else {
            format!("{}_speed_data_{}.{}", prefix, stamp, self.format.extension())
        }
    }

    fn write_csv(writer: &mut impl Write, export: &SessionExport<'_>) -> Result<()> {
        writeln!(writer, "{}", csv_header(export.mode, export.unit)).map_err(write_failed)?;
        for point in export.points {
            let mut row = format!("{}", point.elapsed_seconds);
            if export.mode.records_instantaneous() {
                row.push(',');
                row.push_str(&optional_cell(point.instantaneous));
            }
            if export.mode.records_average() {
                row.push(',');
                row.push_str(&optional_cell(point.average));
            }
            row.push(',');
            row.push_str(&point.wall_clock_label);
            writeln!(writer, "{}", row).map_err(write_failed)?;
        }
        Ok(())
    }

    fn write_json_lines(writer: &mut impl Write, export: &SessionExport<'_>) -> Result<()> {
        #[derive(Serialize)]
        struct Line<'a> {
            unit: SpeedUnit,
            #[serde(flatten)]
            point: &'a DataPoint,
        }

        for point in export.points {
            let line = serde_json::to_string(&Line {
                unit: export.unit,
                point,
            })
            .map_err(|e| RadarError::Export(format!("Failed to encode point: {}", e)))?;
            writeln!(writer, "{}", line).map_err(write_failed)?;
        }
        Ok(())
    }
}

impl RecordingSink for FileExporter {
    fn export(&mut self, export: &SessionExport<'_>) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).map_err(|e| {
            RadarError::Export(format!(
                "Cannot create {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let path = self.output_dir.join(self.file_name(Local::now()));
        let file = File::create(&path)
            .map_err(|e| RadarError::Export(format!("Cannot create {}: {}", path.display(), e)))?;
        let mut writer = BufWriter::new(file);

        match self.format {
            ExportFormat::Csv => Self::write_csv(&mut writer, export)?,
            ExportFormat::JsonLines => Self::write_json_lines(&mut writer, export)?,
        }
        writer.flush().map_err(write_failed)?;

        tracing::debug!("Wrote {} rows to {}", export.points.len(), path.display());
        Ok(path)
    }
}

/// CSV header for the given mode, naming values in `unit`
pub fn csv_header(mode: RecordMode, unit: SpeedUnit) -> String {
    let mut header = String::from("Time (s)");
    if mode.records_instantaneous() {
        header.push_str(&format!(",Speed ({})", unit.label()));
    }
    if mode.records_average() {
        header.push_str(&format!(",Avg Speed ({})", unit.label()));
    }
    header.push_str(",Timestamp");
    header
}

fn write_failed(e: std::io::Error) -> RadarError {
    RadarError::Export(format!("Write failed: {}", e))
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
