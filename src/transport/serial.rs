//! Serial port transport using the `serialport` crate

use super::{cap_unterminated, take_line, Transport, MAX_PENDING};
use crate::error::{RadarError, Result};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

/// Upper bound for a single blocking read on the port
const READ_SLICE: Duration = Duration::from_millis(20);

/// Most reads made by one call to `take_buffered_lines`
const MAX_DRAIN_READS: usize = 16;

/// Serial link to the radar
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    name: String,
    /// Bytes received but not yet terminated by a newline
    pending: Vec<u8>,
}

impl SerialTransport {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyACM0")
    /// * `baud_rate` - Baud rate (e.g., 115200)
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_SLICE)
            .open()?;

        tracing::info!("Opened serial port {} at {} baud", path, baud_rate);

        Ok(Self {
            port: Some(port),
            name: path.to_string(),
            pending: Vec::with_capacity(256),
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| RadarError::Transport(format!("{} is closed", self.name)))
    }
}

impl Transport for SerialTransport {
    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        port.write_all(frame)?;
        port.flush()?;
        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 256];

        loop {
            if let Some(line) = take_line(&mut self.pending) {
                return Ok(line);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(String::new());
            }

            let port = self.port_mut()?;
            port.set_timeout(remaining.min(READ_SLICE))?;
            match port.read(&mut buf) {
                Ok(0) => std::thread::sleep(Duration::from_millis(1)),
                Ok(n) => {
                    self.pending.extend_from_slice(&buf[..n]);
                    cap_unterminated(&mut self.pending, MAX_PENDING);
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn take_buffered_lines(&mut self) -> Result<Vec<String>> {
        let mut buf = [0u8; 256];

        for _ in 0..MAX_DRAIN_READS {
            let port = self.port_mut()?;
            let available = port.bytes_to_read()? as usize;
            if available == 0 {
                break;
            }
            let want = available.min(buf.len());
            match port.read(&mut buf[..want]) {
                Ok(0) => break,
                Ok(n) => {
                    self.pending.extend_from_slice(&buf[..n]);
                    cap_unterminated(&mut self.pending, MAX_PENDING);
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        let mut lines = Vec::new();
        while let Some(line) = take_line(&mut self.pending) {
            if !line.is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::info!("Closed serial port {}", self.name);
        }
        self.pending.clear();
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// List the serial ports present on this machine
pub fn list_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate serial ports: {}", e);
            Vec::new()
        }
    }
}
