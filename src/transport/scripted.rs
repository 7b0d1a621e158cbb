//! In-memory transport driven by a script
//!
//! Lines queued with [`ScriptedTransport::push_line`] are returned by
//! `read_line` in order. Commands written to the transport are recorded and
//! can be answered automatically with [`ScriptedTransport::respond_to`]; the
//! answer joins the back of the queue, behind anything already received.
//! Clones share state, so a test can keep one handle while the worker owns
//! another.
//!
//! # Example
//!
//! ```
//! use ops243_panel::transport::{ScriptedTransport, Transport};
//! use std::time::Duration;
//!
//! let script = ScriptedTransport::new();
//! script.respond_to("PA", "{\"Power\":\"Active\"}");
//! script.push_line("3.2");
//!
//! let mut transport = script.clone();
//! assert_eq!(transport.take_buffered_lines().unwrap(), vec!["3.2".to_string()]);
//! transport.write_frame(b"PA\n").unwrap();
//! assert_eq!(transport.read_line(Duration::ZERO).unwrap(), "{\"Power\":\"Active\"}");
//! assert_eq!(script.written(), vec!["PA".to_string()]);
//! ```

use super::{Connector, Transport, MOCK_PORT_NAME};
use crate::error::{RadarError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Longest a read on an empty script waits before reporting a timeout
const IDLE_WAIT: Duration = Duration::from_millis(2);

#[derive(Debug)]
enum ScriptedRead {
    Line(String),
    Failure(String),
}

#[derive(Debug, Default)]
struct ScriptState {
    incoming: VecDeque<ScriptedRead>,
    written: Vec<String>,
    responses: HashMap<String, String>,
    fail_writes: Option<String>,
    closed: bool,
    close_calls: usize,
}

/// Scripted transport for tests and demos
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    /// Create an empty, open transport
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a line for the reader
    pub fn push_line(&self, line: impl Into<String>) {
        self.lock().incoming.push_back(ScriptedRead::Line(line.into()));
    }

    /// Queue a read failure; the read that reaches it returns a transport error
    pub fn push_read_error(&self, message: impl Into<String>) {
        self.lock()
            .incoming
            .push_back(ScriptedRead::Failure(message.into()));
    }

    /// Make every subsequent write fail with the given message
    pub fn fail_writes(&self, message: impl Into<String>) {
        self.lock().fail_writes = Some(message.into());
    }

    /// Answer a command with an acknowledgment line, queued after earlier input
    pub fn respond_to(&self, command: impl Into<String>, ack: impl Into<String>) {
        self.lock().responses.insert(command.into(), ack.into());
    }

    /// Commands written so far, without terminators
    pub fn written(&self) -> Vec<String> {
        self.lock().written.clone()
    }

    /// Number of times `close` was called
    pub fn close_calls(&self) -> usize {
        self.lock().close_calls
    }
}

impl Transport for ScriptedTransport {
    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(RadarError::Transport("scripted transport is closed".into()));
        }
        if let Some(message) = state.fail_writes.clone() {
            return Err(RadarError::Transport(message));
        }

        let command = String::from_utf8_lossy(frame).trim().to_string();
        if let Some(ack) = state.responses.get(&command).cloned() {
            state.incoming.push_back(ScriptedRead::Line(ack));
        }
        state.written.push(command);
        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String> {
        let next = {
            let mut state = self.lock();
            if state.closed {
                return Err(RadarError::Transport("scripted transport is closed".into()));
            }
            state.incoming.pop_front()
        };

        match next {
            Some(ScriptedRead::Line(line)) => Ok(line.trim().to_string()),
            Some(ScriptedRead::Failure(message)) => Err(RadarError::Transport(message)),
            None => {
                std::thread::sleep(timeout.min(IDLE_WAIT));
                Ok(String::new())
            }
        }
    }

    fn take_buffered_lines(&mut self) -> Result<Vec<String>> {
        let mut state = self.lock();
        if state.closed {
            return Err(RadarError::Transport("scripted transport is closed".into()));
        }

        // A queued failure stays put so the next read still reports it
        let mut lines = Vec::new();
        while matches!(state.incoming.front(), Some(ScriptedRead::Line(_))) {
            if let Some(ScriptedRead::Line(line)) = state.incoming.pop_front() {
                let line = line.trim().to_string();
                if !line.is_empty() {
                    lines.push(line);
                }
            }
        }
        Ok(lines)
    }

    fn close(&mut self) {
        let mut state = self.lock();
        state.closed = true;
        state.close_calls += 1;
    }

    fn is_open(&self) -> bool {
        !self.lock().closed
    }

    fn name(&self) -> String {
        format!("{} (scripted)", MOCK_PORT_NAME)
    }
}

/// Connector that hands out clones of one [`ScriptedTransport`]
///
/// Opening reopens the shared script, so a test can disconnect and connect
/// again. Ports listed with [`ScriptedConnector::refuse`] fail to open.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    transport: ScriptedTransport,
    refused: Arc<Mutex<Vec<String>>>,
    opened: Arc<Mutex<Vec<(String, u32)>>>,
}

impl ScriptedConnector {
    pub fn new(transport: ScriptedTransport) -> Self {
        Self {
            transport,
            ..Default::default()
        }
    }

    /// Make opening `port` fail as if the device were absent
    pub fn refuse(&self, port: impl Into<String>) {
        self.refused
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(port.into());
    }

    /// Ports opened so far, with their baud rates
    pub fn opened(&self) -> Vec<(String, u32)> {
        self.opened.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Connector for ScriptedConnector {
    fn open(&self, port: &str, baud_rate: u32) -> Result<Box<dyn Transport>> {
        let refused = self.refused.lock().unwrap_or_else(|e| e.into_inner());
        if refused.iter().any(|p| p == port) {
            return Err(RadarError::Transport(format!("{}: no such device", port)));
        }
        drop(refused);

        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((port.to_string(), baud_rate));
        self.transport.lock().closed = false;
        Ok(Box::new(self.transport.clone()))
    }
}
