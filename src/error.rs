//! Error handling for the OPS243 panel
//!
//! This module defines the error type shared by the transport, protocol,
//! recording and configuration layers, plus a Result alias.
//!
//! Unrecognized device lines and empty acknowledgments are deliberately not
//! represented here; they are ordinary outcomes, not failures.

use thiserror::Error;

/// Main error type for OPS243 panel operations
#[derive(Error, Debug)]
pub enum RadarError {
    /// Link-level failure while opening, writing or reading the device
    #[error("Transport error: {0}")]
    Transport(String),

    /// Errors reported by the serial port driver
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value outside the range the device accepts
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// The recording sink rejected the hand-off
    #[error("Export error: {0}")]
    Export(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<RadarError>,
    },
}

impl RadarError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        RadarError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error came from the link to the device.
    ///
    /// Transport-level errors end an ingestion session; everything else is
    /// reported and the session carries on.
    pub fn is_transport(&self) -> bool {
        match self {
            RadarError::Transport(_) | RadarError::Serial(_) | RadarError::Io(_) => true,
            RadarError::WithContext { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}

/// Result type alias for OPS243 panel operations
pub type Result<T> = std::result::Result<T, RadarError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
