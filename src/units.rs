//! Speed unit conversion
//!
//! The radar reports speeds in meters per second. Conversion to the display
//! unit happens only when a value is shown or recorded; stored magnitudes are
//! always m/s.

use serde::{Deserialize, Serialize};

/// Conversion factor from m/s to km/h
pub const KMH_PER_MS: f64 = 3.6;

/// Conversion factor from m/s to mph
pub const MPH_PER_MS: f64 = 2.23694;

/// Unit used when displaying or recording speeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeedUnit {
    /// Kilometers per hour
    #[default]
    #[serde(rename = "kmh")]
    KilometersPerHour,
    /// Miles per hour
    #[serde(rename = "mph")]
    MilesPerHour,
    /// Meters per second
    #[serde(rename = "ms")]
    MetersPerSecond,
}

impl SpeedUnit {
    /// All supported units, in selector order
    pub const ALL: [SpeedUnit; 3] = [
        SpeedUnit::KilometersPerHour,
        SpeedUnit::MilesPerHour,
        SpeedUnit::MetersPerSecond,
    ];

    /// Multiplier applied to a m/s magnitude
    pub fn factor(self) -> f64 {
        match self {
            SpeedUnit::KilometersPerHour => KMH_PER_MS,
            SpeedUnit::MilesPerHour => MPH_PER_MS,
            SpeedUnit::MetersPerSecond => 1.0,
        }
    }

    /// Convert a magnitude in m/s to this unit
    pub fn convert(self, meters_per_second: f64) -> f64 {
        meters_per_second * self.factor()
    }

    /// Short label shown next to values
    pub fn label(self) -> &'static str {
        match self {
            SpeedUnit::KilometersPerHour => "km/h",
            SpeedUnit::MilesPerHour => "mph",
            SpeedUnit::MetersPerSecond => "m/s",
        }
    }
}

impl std::fmt::Display for SpeedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Convert a m/s magnitude, returning the display value and its unit label
pub fn convert_speed(meters_per_second: f64, unit: SpeedUnit) -> (f64, &'static str) {
    (unit.convert(meters_per_second), unit.label())
}
