//! Command round trips
//!
//! A round trip writes one command line, waits a fixed settle delay so the
//! sensor has its reply queued, then reads the acknowledgment. An empty
//! acknowledgment is a valid outcome. Acknowledgment text is informational
//! only and is never checked against the command.
//!
//! The sensor keeps streaming while a command is in flight. Lines already
//! received before the write, and speed lines read while waiting, are held
//! back as deferred readings; the first non-numeric line is the
//! acknowledgment. Callers collect deferred readings with
//! [`CommandChannel::take_deferred`].
//!
//! `send` takes the transport by `&mut`, so for the duration of a round trip
//! nothing else can read from it.

use super::command::DeviceCommand;
use super::parser::parse_speed;
use crate::error::{RadarError, Result, ResultExt};
use crate::transport::Transport;
use std::time::{Duration, Instant};

/// Default pause between writing a command and reading its acknowledgment
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Default time to wait for the acknowledgment line
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_millis(100);

/// Most lines read while looking for one acknowledgment
const MAX_ACK_READS: usize = 16;

/// Timing of a command round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolTiming {
    pub settle_delay: Duration,
    pub ack_timeout: Duration,
}

impl Default for ProtocolTiming {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        }
    }
}

impl ProtocolTiming {
    /// No waiting at all; used by tests against in-memory transports
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            ack_timeout: Duration::ZERO,
        }
    }
}

/// Outcome of one command round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// Command text as written, without terminator
    pub sent: String,
    /// Acknowledgment line, empty if the sensor did not answer in time
    pub received: String,
}

impl Ack {
    /// Whether the sensor stayed silent
    pub fn is_empty(&self) -> bool {
        self.received.is_empty()
    }
}

impl std::fmt::Display for Ack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sent: {}\nReceived: {}", self.sent, self.received)
    }
}

/// Counters for command traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandStats {
    pub sent: u64,
    pub empty_acks: u64,
    pub failures: u64,
}

/// Serialises commands onto the transport, one round trip at a time
#[derive(Debug, Default)]
pub struct CommandChannel {
    timing: ProtocolTiming,
    stats: CommandStats,
    /// Readings that arrived around a round trip, oldest first
    deferred: Vec<String>,
}

impl CommandChannel {
    /// Create a channel with the given timing
    pub fn new(timing: ProtocolTiming) -> Self {
        Self {
            timing,
            stats: CommandStats::default(),
            deferred: Vec::new(),
        }
    }

    pub fn stats(&self) -> CommandStats {
        self.stats
    }

    /// Take the readings held back during round trips, oldest first
    pub fn take_deferred(&mut self) -> Vec<String> {
        std::mem::take(&mut self.deferred)
    }

    /// Perform one write-then-read round trip
    pub fn send(&mut self, transport: &mut dyn Transport, command: &DeviceCommand) -> Result<Ack> {
        let sent = command.wire();
        match self.round_trip(transport, command) {
            Ok(received) => {
                self.stats.sent += 1;
                if received.is_empty() {
                    self.stats.empty_acks += 1;
                }
                tracing::info!("Sent: {} Received: {}", sent, received);
                Ok(Ack { sent, received })
            }
            Err(e) => {
                self.stats.failures += 1;
                tracing::error!("Command {} failed: {}", sent, e);
                Err(e)
            }
        }
    }

    /// Send several commands in order, stopping at the first failure
    pub fn send_sequence(
        &mut self,
        transport: &mut dyn Transport,
        commands: &[DeviceCommand],
    ) -> (Vec<Ack>, Option<RadarError>) {
        let mut acks = Vec::with_capacity(commands.len());
        for command in commands {
            match self.send(transport, command) {
                Ok(ack) => acks.push(ack),
                Err(e) => return (acks, Some(e)),
            }
        }
        (acks, None)
    }

    fn round_trip(
        &mut self,
        transport: &mut dyn Transport,
        command: &DeviceCommand,
    ) -> Result<String> {
        command.validate()?;

        if !transport.is_open() {
            return Err(RadarError::Transport(format!(
                "{} is not open",
                transport.name()
            )));
        }

        let earlier = transport
            .take_buffered_lines()
            .with_context(|| format!("Failed to drain input before {}", command))?;
        self.deferred.extend(earlier);

        transport
            .write_frame(&command.frame())
            .with_context(|| format!("Failed to write {}", command))?;

        if !self.timing.settle_delay.is_zero() {
            std::thread::sleep(self.timing.settle_delay);
        }

        let deadline = Instant::now() + self.timing.ack_timeout;
        for _ in 0..MAX_ACK_READS {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let line = transport
                .read_line(remaining)
                .with_context(|| format!("Failed to read acknowledgment for {}", command))?;
            if parse_speed(&line).is_none() {
                return Ok(line);
            }
            self.deferred.push(line);
        }

        tracing::warn!("No acknowledgment for {} among streamed readings", command);
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PowerMode;
    use crate::transport::{MockTransport, ScriptedTransport};
    use mockall::predicate::eq;
    use mockall::Sequence;

    #[test]
    fn test_round_trip_writes_then_reads() {
        let mut seq = Sequence::new();
        let mut transport = MockTransport::new();
        transport.expect_is_open().return_const(true);
        transport
            .expect_take_buffered_lines()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Vec::new()));
        transport
            .expect_write_frame()
            .with(eq(b"T=1\n".to_vec()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        transport
            .expect_read_line()
            .with(eq(Duration::ZERO))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("{\"SamplingRate\":20000}".to_string()));

        let mut channel = CommandChannel::new(ProtocolTiming::immediate());
        let ack = channel
            .send(&mut transport, &DeviceCommand::frequency(1).unwrap())
            .unwrap();

        assert_eq!(ack.sent, "T=1");
        assert_eq!(ack.received, "{\"SamplingRate\":20000}");
        assert_eq!(channel.stats().sent, 1);
        assert!(channel.take_deferred().is_empty());
    }

    #[test]
    fn test_empty_ack_is_not_an_error() {
        let script = ScriptedTransport::new();
        let mut transport = script.clone();
        let mut channel = CommandChannel::new(ProtocolTiming::immediate());

        let ack = channel.send(&mut transport, &DeviceCommand::SaveSettings).unwrap();
        assert!(ack.is_empty());
        assert_eq!(channel.stats().empty_acks, 1);
        assert_eq!(script.written(), vec!["A!".to_string()]);
    }

    #[test]
    fn test_buffered_readings_are_not_taken_as_ack() {
        let script = ScriptedTransport::new();
        script.push_line("3.2");
        script.push_line("4.1");
        script.respond_to("PI", "{\"Power\":\"Idle\"}");

        let mut transport = script.clone();
        let mut channel = CommandChannel::new(ProtocolTiming::immediate());
        let ack = channel
            .send(&mut transport, &DeviceCommand::PowerMode(PowerMode::Idle))
            .unwrap();

        assert_eq!(ack.received, "{\"Power\":\"Idle\"}");
        assert_eq!(
            channel.take_deferred(),
            vec!["3.2".to_string(), "4.1".to_string()]
        );
        assert!(channel.take_deferred().is_empty());
    }

    #[test]
    fn test_reading_streamed_before_ack_is_deferred() {
        let mut transport = MockTransport::new();
        transport.expect_is_open().return_const(true);
        transport
            .expect_take_buffered_lines()
            .returning(|| Ok(Vec::new()));
        transport.expect_write_frame().returning(|_| Ok(()));
        let mut reads = vec!["{\"Units\":\"m/s\"}".to_string(), "4.1".to_string()];
        transport
            .expect_read_line()
            .times(2)
            .returning(move |_| Ok(reads.pop().unwrap_or_default()));

        let mut channel = CommandChannel::new(ProtocolTiming::immediate());
        let ack = channel
            .send(&mut transport, &DeviceCommand::Unit(crate::units::SpeedUnit::MetersPerSecond))
            .unwrap();

        assert_eq!(ack.received, "{\"Units\":\"m/s\"}");
        assert_eq!(channel.take_deferred(), vec!["4.1".to_string()]);
    }

    #[test]
    fn test_out_of_range_command_never_touches_transport() {
        let mut transport = MockTransport::new();
        transport.expect_is_open().never();
        transport.expect_take_buffered_lines().never();
        transport.expect_write_frame().never();
        transport.expect_read_line().never();

        let mut channel = CommandChannel::new(ProtocolTiming::immediate());
        let err = channel
            .send(&mut transport, &DeviceCommand::Frequency(3))
            .unwrap_err();

        assert!(matches!(err, RadarError::InvalidSetting(_)));
        assert_eq!(channel.stats().failures, 1);
        assert_eq!(channel.stats().sent, 0);
    }

    #[test]
    fn test_write_failure_is_transport_error() {
        let script = ScriptedTransport::new();
        script.fail_writes("broken pipe");
        let mut transport = script.clone();
        let mut channel = CommandChannel::new(ProtocolTiming::immediate());

        let err = channel
            .send(&mut transport, &DeviceCommand::PowerMode(PowerMode::Idle))
            .unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("PI"));
        assert_eq!(channel.stats().failures, 1);
    }

    #[test]
    fn test_closed_transport_is_rejected_before_write() {
        let mut transport = MockTransport::new();
        transport.expect_is_open().return_const(false);
        transport
            .expect_name()
            .return_const("/dev/ttyACM0".to_string());
        transport.expect_take_buffered_lines().never();
        transport.expect_write_frame().never();

        let mut channel = CommandChannel::new(ProtocolTiming::immediate());
        let err = channel
            .send(&mut transport, &DeviceCommand::SaveSettings)
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_sequence_stops_at_first_failure() {
        let mut transport = MockTransport::new();
        transport.expect_is_open().return_const(true);
        transport
            .expect_take_buffered_lines()
            .times(2)
            .returning(|| Ok(Vec::new()));
        let mut writes = 0;
        transport.expect_write_frame().times(2).returning(move |_| {
            writes += 1;
            if writes == 2 {
                Err(RadarError::Transport("unplugged".into()))
            } else {
                Ok(())
            }
        });
        transport
            .expect_read_line()
            .times(1)
            .returning(|_| Ok(String::new()));

        let mut channel = CommandChannel::new(ProtocolTiming::immediate());
        let commands = [
            DeviceCommand::SaveSettings,
            DeviceCommand::ResetSettings,
            DeviceCommand::ReportCount(1),
        ];
        let (acks, err) = channel.send_sequence(&mut transport, &commands);
        assert_eq!(acks.len(), 1);
        assert!(err.is_some());
    }
}
