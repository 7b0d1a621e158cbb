//! Line-oriented link to the radar
//!
//! The transport is the only resource shared between command dispatch and
//! reading ingestion. The worker thread owns it exclusively; command round
//! trips borrow it mutably for their whole write-then-read, so a sensor
//! reading can never be consumed as an acknowledgment or the other way round.
//!
//! # Components
//!
//! - [`Transport`] - Trait for a half-duplex, line-delimited channel
//! - [`SerialTransport`] - Real hardware via the `serialport` crate
//! - [`SimulatedRadar`] - Synthetic sensor selected with the port name `mock`
//! - [`ScriptedTransport`] - In-memory transport with scripted input, for tests
//! - [`Connector`] / [`DefaultConnector`] - Opens a transport by port name

pub mod scripted;
pub mod serial;
pub mod simulated;

pub use scripted::{ScriptedConnector, ScriptedTransport};
pub use serial::{list_ports, SerialTransport};
pub use simulated::SimulatedRadar;

use crate::error::Result;
use std::time::Duration;

/// Port name that selects the simulated radar instead of a serial device
pub const MOCK_PORT_NAME: &str = "mock";

/// Byte-oriented, line-delimited, half-duplex channel to the device
///
/// Implementations must be `Send` so the worker thread can own them.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Write a complete frame. The caller supplies the line terminator.
    fn write_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Read one line, without its terminator and surrounding whitespace.
    ///
    /// Returns an empty string if no complete line arrived within `timeout`.
    fn read_line(&mut self, timeout: Duration) -> Result<String>;

    /// Remove and return every complete line already received, without waiting.
    ///
    /// Called before a command is written so that readings which arrived
    /// earlier are not mistaken for its acknowledgment.
    fn take_buffered_lines(&mut self) -> Result<Vec<String>>;

    /// Close the link. Safe to call more than once.
    fn close(&mut self);

    /// Whether the link is open
    fn is_open(&self) -> bool;

    /// Human readable name of the link (port path)
    fn name(&self) -> String;
}

/// Opens transports by port name
pub trait Connector: Send {
    /// Open the named port at the given baud rate
    fn open(&self, port: &str, baud_rate: u32) -> Result<Box<dyn Transport>>;
}

/// Opens serial ports, or the simulated radar for [`MOCK_PORT_NAME`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConnector;

impl Connector for DefaultConnector {
    fn open(&self, port: &str, baud_rate: u32) -> Result<Box<dyn Transport>> {
        if port.eq_ignore_ascii_case(MOCK_PORT_NAME) {
            tracing::info!("Using simulated radar");
            return Ok(Box::new(SimulatedRadar::new()));
        }
        Ok(Box::new(SerialTransport::open(port, baud_rate)?))
    }
}

/// Longest unterminated line kept while waiting for a newline
pub(crate) const MAX_PENDING: usize = 4096;

/// Split complete lines out of a receive buffer.
///
/// Returns the first complete line (trimmed) and leaves any partial tail in
/// `buffer` for the next read.
pub(crate) fn take_line(buffer: &mut Vec<u8>) -> Option<String> {
    let pos = buffer.iter().position(|&b| b == b'\n')?;
    let raw: Vec<u8> = buffer.drain(..=pos).collect();
    Some(String::from_utf8_lossy(&raw).trim().to_string())
}

/// Discard `buffer` if it holds more than `limit` bytes with no newline.
///
/// Returns true when bytes were dropped.
pub(crate) fn cap_unterminated(buffer: &mut Vec<u8>, limit: usize) -> bool {
    if buffer.len() <= limit || buffer.contains(&b'\n') {
        return false;
    }
    tracing::warn!(
        "Discarding {} bytes received without a line terminator",
        buffer.len()
    );
    buffer.clear();
    true
}
