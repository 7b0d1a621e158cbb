//! OPS243 command vocabulary
//!
//! Only the subset of the device grammar the panel drives is modeled. Every
//! command is a single ASCII line; values are validated when the command is
//! built, so an out-of-range setting never reaches the transport.

use crate::error::{RadarError, Result};
use crate::units::SpeedUnit;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Accepted values for the `T=<n>` sampling frequency command
pub const FREQUENCY_RANGE: RangeInclusive<i32> = -2..=2;

/// Accepted values for the `O<n>` reports-per-line command
pub const REPORT_COUNT_RANGE: RangeInclusive<u8> = 1..=9;

/// Kind of data the sensor streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    /// Speed readings
    Speed,
    /// FFT frames
    Fft,
    /// Raw ADC samples
    Raw,
}

impl OutputKind {
    fn letter(self) -> char {
        match self {
            OutputKind::Speed => 'S',
            OutputKind::Fft => 'F',
            OutputKind::Raw => 'R',
        }
    }
}

/// Which directions the sensor reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DirectionFilter {
    #[default]
    Both,
    Approaching,
    Receding,
}

impl DirectionFilter {
    pub const ALL: [DirectionFilter; 3] = [
        DirectionFilter::Both,
        DirectionFilter::Approaching,
        DirectionFilter::Receding,
    ];
}

impl std::fmt::Display for DirectionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectionFilter::Both => write!(f, "Both"),
            DirectionFilter::Approaching => write!(f, "Approaching"),
            DirectionFilter::Receding => write!(f, "Receding"),
        }
    }
}

/// Sensor power mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerMode {
    #[default]
    Active,
    Idle,
}

impl std::fmt::Display for PowerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerMode::Active => write!(f, "Active"),
            PowerMode::Idle => write!(f, "Idle"),
        }
    }
}

/// A single command line understood by the sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// `T=<n>` sampling frequency, n in [-2, 2]
    Frequency(i32),
    /// `OS`/`Os`, `OF`/`Of`, `OR`/`Or`: upper case enables, lower case disables
    Output { kind: OutputKind, enabled: bool },
    /// `M><n>` magnitude filter threshold
    MagnitudeFilter(u32),
    /// `R|`, `R+`, `R-`
    DirectionFilter(DirectionFilter),
    /// `PA`, `PI`
    PowerMode(PowerMode),
    /// `UK`, `US`, `UM`
    Unit(SpeedUnit),
    /// `A!` persist settings on the sensor
    SaveSettings,
    /// `P!` reset sensor settings
    ResetSettings,
    /// `O<n>` number of reports per line
    ReportCount(u8),
    /// Free-form text typed by the user
    Raw(String),
}

impl DeviceCommand {
    /// Build a validated `T=<n>` command
    pub fn frequency(value: i32) -> Result<Self> {
        let command = DeviceCommand::Frequency(value);
        command.validate()?;
        Ok(command)
    }

    /// Build a validated `O<n>` command
    pub fn report_count(value: u8) -> Result<Self> {
        let command = DeviceCommand::ReportCount(value);
        command.validate()?;
        Ok(command)
    }

    /// Build a free-form command, rejecting anything that is not one ASCII line
    pub fn raw(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let command = DeviceCommand::Raw(text.trim().to_string());
        command.validate()?;
        Ok(command)
    }

    /// Check the value carried by the command.
    ///
    /// Variants can be built directly, so the command channel calls this
    /// again before anything is written.
    pub fn validate(&self) -> Result<()> {
        match self {
            DeviceCommand::Frequency(value) if !FREQUENCY_RANGE.contains(value) => {
                Err(RadarError::InvalidSetting(format!(
                    "frequency must be between {} and {}, got {}",
                    FREQUENCY_RANGE.start(),
                    FREQUENCY_RANGE.end(),
                    value
                )))
            }
            DeviceCommand::ReportCount(value) if !REPORT_COUNT_RANGE.contains(value) => {
                Err(RadarError::InvalidSetting(format!(
                    "report count must be between {} and {}, got {}",
                    REPORT_COUNT_RANGE.start(),
                    REPORT_COUNT_RANGE.end(),
                    value
                )))
            }
            DeviceCommand::Raw(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(RadarError::InvalidSetting("empty command".to_string()));
                }
                if !trimmed.is_ascii() || trimmed.contains(['\r', '\n']) {
                    return Err(RadarError::InvalidSetting(format!(
                        "command must be a single ASCII line: {:?}",
                        trimmed
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Enable one output kind
    pub fn enable(kind: OutputKind) -> Self {
        DeviceCommand::Output {
            kind,
            enabled: true,
        }
    }

    /// Disable one output kind
    pub fn disable(kind: OutputKind) -> Self {
        DeviceCommand::Output {
            kind,
            enabled: false,
        }
    }

    /// Text sent on the wire, without terminator
    pub fn wire(&self) -> String {
        match self {
            DeviceCommand::Frequency(n) => format!("T={}", n),
            DeviceCommand::Output { kind, enabled } => {
                let letter = if *enabled {
                    kind.letter()
                } else {
                    kind.letter().to_ascii_lowercase()
                };
                format!("O{}", letter)
            }
            DeviceCommand::MagnitudeFilter(n) => format!("M>{}", n),
            DeviceCommand::DirectionFilter(filter) => match filter {
                DirectionFilter::Both => "R|",
                DirectionFilter::Approaching => "R+",
                DirectionFilter::Receding => "R-",
            }
            .to_string(),
            DeviceCommand::PowerMode(mode) => match mode {
                PowerMode::Active => "PA",
                PowerMode::Idle => "PI",
            }
            .to_string(),
            DeviceCommand::Unit(unit) => match unit {
                SpeedUnit::KilometersPerHour => "UK",
                SpeedUnit::MilesPerHour => "US",
                SpeedUnit::MetersPerSecond => "UM",
            }
            .to_string(),
            DeviceCommand::SaveSettings => "A!".to_string(),
            DeviceCommand::ResetSettings => "P!".to_string(),
            DeviceCommand::ReportCount(n) => format!("O{}", n),
            DeviceCommand::Raw(text) => text.clone(),
        }
    }

    /// Wire text followed by the line terminator
    pub fn frame(&self) -> Vec<u8> {
        let mut frame = self.wire().into_bytes();
        frame.push(b'\n');
        frame
    }
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.wire())
    }
}

impl FromStr for DeviceCommand {
    type Err = RadarError;

    /// Recognise user-typed text.
    ///
    /// Known commands are validated exactly like the typed constructors, so
    /// `T=3` is rejected here. Unknown text passes through as [`DeviceCommand::Raw`].
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();

        if let Some(value) = text.strip_prefix("T=") {
            let n: i32 = value.trim().parse().map_err(|_| {
                RadarError::InvalidSetting(format!("invalid frequency {:?}", value))
            })?;
            return DeviceCommand::frequency(n);
        }

        if let Some(value) = text.strip_prefix("M>") {
            let n: u32 = value.trim().parse().map_err(|_| {
                RadarError::InvalidSetting(format!("invalid magnitude filter {:?}", value))
            })?;
            return Ok(DeviceCommand::MagnitudeFilter(n));
        }

        let command = match text {
            "OS" => DeviceCommand::enable(OutputKind::Speed),
            "Os" => DeviceCommand::disable(OutputKind::Speed),
            "OF" => DeviceCommand::enable(OutputKind::Fft),
            "Of" => DeviceCommand::disable(OutputKind::Fft),
            "OR" => DeviceCommand::enable(OutputKind::Raw),
            "Or" => DeviceCommand::disable(OutputKind::Raw),
            "R|" => DeviceCommand::DirectionFilter(DirectionFilter::Both),
            "R+" => DeviceCommand::DirectionFilter(DirectionFilter::Approaching),
            "R-" => DeviceCommand::DirectionFilter(DirectionFilter::Receding),
            "PA" => DeviceCommand::PowerMode(PowerMode::Active),
            "PI" => DeviceCommand::PowerMode(PowerMode::Idle),
            "UK" => DeviceCommand::Unit(SpeedUnit::KilometersPerHour),
            "US" => DeviceCommand::Unit(SpeedUnit::MilesPerHour),
            "UM" => DeviceCommand::Unit(SpeedUnit::MetersPerSecond),
            "A!" => DeviceCommand::SaveSettings,
            "P!" => DeviceCommand::ResetSettings,
            _ => match text.strip_prefix('O').and_then(|d| d.parse::<u8>().ok()) {
                Some(n) if REPORT_COUNT_RANGE.contains(&n) => DeviceCommand::ReportCount(n),
                _ => DeviceCommand::raw(text)?,
            },
        };
        Ok(command)
    }
}
