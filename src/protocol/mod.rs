//! OPS243 serial protocol
//!
//! - [`command`] - The modeled command vocabulary and its validation
//! - [`channel`] - Write-then-acknowledge round trips over a [`Transport`](crate::transport::Transport)
//! - [`parser`] - Classification of incoming lines into readings and diagnostics

pub mod channel;
pub mod command;
pub mod parser;

pub use channel::{Ack, CommandChannel, CommandStats, ProtocolTiming};
pub use command::{DeviceCommand, DirectionFilter, OutputKind, PowerMode, FREQUENCY_RANGE};
pub use parser::{parse_line, parse_speed, ParsedLine};
