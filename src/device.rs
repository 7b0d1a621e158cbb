//! Mirror of the sensor's configuration
//!
//! [`DeviceConfig`] is owned by the backend worker. It only changes through
//! [`DeviceConfig::apply`], which validates a [`ConfigChange`], updates the
//! mirror and returns the commands that bring the sensor in line. The field
//! is updated when the commands are sent, not when an acknowledgment arrives.

use crate::error::Result;
use crate::protocol::{DeviceCommand, DirectionFilter, OutputKind, PowerMode};
use crate::units::SpeedUnit;
use serde::{Deserialize, Serialize};

/// Which stream the sensor is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Speed,
    Fft,
    Raw,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Speed, OutputFormat::Fft, OutputFormat::Raw];

    fn kind(self) -> OutputKind {
        match self {
            OutputFormat::Speed => OutputKind::Speed,
            OutputFormat::Fft => OutputKind::Fft,
            OutputFormat::Raw => OutputKind::Raw,
        }
    }

    /// Enable this output, then disable the other two.
    ///
    /// The sensor does not switch outputs off by itself.
    pub fn commands(self) -> Vec<DeviceCommand> {
        let mut commands = vec![DeviceCommand::enable(self.kind())];
        commands.extend(
            Self::ALL
                .iter()
                .filter(|&&other| other != self)
                .map(|other| DeviceCommand::disable(other.kind())),
        );
        commands
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Speed => write!(f, "Speed"),
            OutputFormat::Fft => write!(f, "FFT Output"),
            OutputFormat::Raw => write!(f, "Raw ADC"),
        }
    }
}

/// Sensor settings as last sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// `T=<n>`, in [-2, 2]
    pub frequency: i32,
    pub output_format: OutputFormat,
    /// `M><n>` threshold
    pub magnitude_filter: u32,
    pub direction_filter: DirectionFilter,
    pub power_mode: PowerMode,
    pub display_unit: SpeedUnit,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            frequency: 0,
            output_format: OutputFormat::Speed,
            magnitude_filter: 0,
            direction_filter: DirectionFilter::Both,
            power_mode: PowerMode::Active,
            display_unit: SpeedUnit::KilometersPerHour,
        }
    }
}

/// A single user-requested settings change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    Frequency(i32),
    OutputFormat(OutputFormat),
    MagnitudeFilter(u32),
    DirectionFilter(DirectionFilter),
    PowerMode(PowerMode),
    DisplayUnit(SpeedUnit),
}

impl ConfigChange {
    /// Commands that realise this change, or `InvalidSetting` when out of range
    pub fn commands(&self) -> Result<Vec<DeviceCommand>> {
        Ok(match *self {
            ConfigChange::Frequency(n) => vec![DeviceCommand::frequency(n)?],
            ConfigChange::OutputFormat(format) => format.commands(),
            ConfigChange::MagnitudeFilter(n) => vec![DeviceCommand::MagnitudeFilter(n)],
            ConfigChange::DirectionFilter(filter) => vec![DeviceCommand::DirectionFilter(filter)],
            ConfigChange::PowerMode(mode) => vec![DeviceCommand::PowerMode(mode)],
            ConfigChange::DisplayUnit(unit) => vec![DeviceCommand::Unit(unit)],
        })
    }
}

impl DeviceConfig {
    /// Validate `change`, record it and return the commands to send
    ///
    /// On error nothing is recorded and nothing should be sent.
    pub fn apply(&mut self, change: ConfigChange) -> Result<Vec<DeviceCommand>> {
        let commands = change.commands()?;
        match change {
            ConfigChange::Frequency(n) => self.frequency = n,
            ConfigChange::OutputFormat(format) => self.output_format = format,
            ConfigChange::MagnitudeFilter(n) => self.magnitude_filter = n,
            ConfigChange::DirectionFilter(filter) => self.direction_filter = filter,
            ConfigChange::PowerMode(mode) => self.power_mode = mode,
            ConfigChange::DisplayUnit(unit) => self.display_unit = unit,
        }
        Ok(commands)
    }

    /// Track a command typed by the user so the mirror stays in step
    ///
    /// Returns whether any field changed.
    pub fn track(&mut self, command: &DeviceCommand) -> bool {
        let before = *self;
        match *command {
            DeviceCommand::Frequency(n) => self.frequency = n,
            DeviceCommand::MagnitudeFilter(n) => self.magnitude_filter = n,
            DeviceCommand::DirectionFilter(filter) => self.direction_filter = filter,
            DeviceCommand::PowerMode(mode) => self.power_mode = mode,
            DeviceCommand::Unit(unit) => self.display_unit = unit,
            DeviceCommand::Output {
                kind,
                enabled: true,
            } => {
                self.output_format = match kind {
                    OutputKind::Speed => OutputFormat::Speed,
                    OutputKind::Fft => OutputFormat::Fft,
                    OutputKind::Raw => OutputFormat::Raw,
                }
            }
            _ => {}
        }
        *self != before
    }

    /// Check a loaded configuration before it is used
    pub fn validate(&self) -> Result<()> {
        DeviceCommand::frequency(self.frequency).map(|_| ())
    }

    /// Commands sent right after the port opens
    ///
    /// Unit, speed output on, magnitude filter, direction filter, then one
    /// report per line.
    pub fn connect_sequence(&self) -> Vec<DeviceCommand> {
        vec![
            DeviceCommand::Unit(self.display_unit),
            DeviceCommand::enable(OutputKind::Speed),
            DeviceCommand::MagnitudeFilter(self.magnitude_filter),
            DeviceCommand::DirectionFilter(self.direction_filter),
            DeviceCommand::ReportCount(1),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RadarError;

    fn wires(commands: &[DeviceCommand]) -> Vec<String> {
        commands.iter().map(DeviceCommand::wire).collect()
    }

    #[test]
    fn test_output_format_sequences() {
        assert_eq!(wires(&OutputFormat::Speed.commands()), ["OS", "Of", "Or"]);
        assert_eq!(wires(&OutputFormat::Fft.commands()), ["OF", "Os", "Or"]);
        assert_eq!(wires(&OutputFormat::Raw.commands()), ["OR", "Os", "Of"]);
    }

    #[test]
    fn test_connect_sequence() {
        let config = DeviceConfig {
            magnitude_filter: 20,
            direction_filter: DirectionFilter::Approaching,
            display_unit: SpeedUnit::MilesPerHour,
            ..Default::default()
        };
        assert_eq!(
            wires(&config.connect_sequence()),
            ["US", "OS", "M>20", "R+", "O1"]
        );
    }

    #[test]
    fn test_apply_updates_mirror() {
        let mut config = DeviceConfig::default();
        let commands = config.apply(ConfigChange::Frequency(-2)).unwrap();
        assert_eq!(wires(&commands), ["T=-2"]);
        assert_eq!(config.frequency, -2);

        let commands = config.apply(ConfigChange::PowerMode(PowerMode::Idle)).unwrap();
        assert_eq!(wires(&commands), ["PI"]);
        assert_eq!(config.power_mode, PowerMode::Idle);

        config.apply(ConfigChange::DisplayUnit(SpeedUnit::MetersPerSecond)).unwrap();
        assert_eq!(config.display_unit, SpeedUnit::MetersPerSecond);
    }

    #[test]
    fn test_rejected_change_leaves_mirror_untouched() {
        let mut config = DeviceConfig::default();
        let err = config.apply(ConfigChange::Frequency(3)).unwrap_err();
        assert!(matches!(err, RadarError::InvalidSetting(_)));
        assert_eq!(config, DeviceConfig::default());
    }

    #[test]
    fn test_track_typed_commands() {
        let mut config = DeviceConfig::default();
        assert!(config.track(&"R-".parse().unwrap()));
        assert_eq!(config.direction_filter, DirectionFilter::Receding);
        assert!(config.track(&"OF".parse().unwrap()));
        assert_eq!(config.output_format, OutputFormat::Fft);
        assert!(!config.track(&"Os".parse().unwrap()));
        assert!(!config.track(&"??".parse().unwrap()));
    }

    #[test]
    fn test_validate_loaded_config() {
        assert!(DeviceConfig::default().validate().is_ok());
        let config = DeviceConfig {
            frequency: 7,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_with_missing_fields() {
        let config: DeviceConfig = toml::from_str("magnitude_filter = 15").unwrap();
        assert_eq!(config.magnitude_filter, 15);
        assert_eq!(config.output_format, OutputFormat::Speed);
    }
}
