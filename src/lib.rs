//! # OPS243 Panel: desktop control panel for the OPS243-A radar
//!
//! Connects to an OPS243-A Doppler speed sensor over a serial port, shows
//! live and windowed speed statistics, configures the sensor, records
//! sessions and exports them to CSV or JSON lines.
//!
//! ## Architecture
//!
//! - **Backend**: A worker thread owns the serial transport. It sends
//!   commands, reads speed lines and runs the statistics and recorder.
//! - **Frontend**: Renders the UI using eframe/egui with egui_plot for graphs
//! - **Communication**: Crossbeam channels for thread-safe data transfer
//!
//! ## Configuration
//!
//! Settings are stored in the platform config directory under
//! `dev.ops243.panel/config.toml`; logs go to the data directory.
//!
//! ## Example
//!
//! ```ignore
//! use ops243_panel::{backend::RadarBackend, config::AppConfig, frontend::PanelApp};
//!
//! fn main() -> eframe::Result<()> {
//!     let config = AppConfig::load_or_default();
//!     let (backend, handle) = RadarBackend::new(config.clone());
//!
//!     std::thread::spawn(move || backend.run());
//!     handle.connect(config.serial.port.clone(), config.serial.baud_rate);
//!
//!     eframe::run_native(
//!         "OPS243-A Control Panel",
//!         eframe::NativeOptions::default(),
//!         Box::new(|cc| Ok(Box::new(PanelApp::new(cc, handle, config)))),
//!     )
//! }
//! ```

pub mod backend;
pub mod config;
pub mod device;
pub mod error;
pub mod frontend;
pub mod protocol;
pub mod session;
pub mod stats;
pub mod transport;
pub mod types;
pub mod units;

// Re-export commonly used types
pub use backend::{BackendCommand, BackendMessage, RadarBackend, RadarHandle};
pub use config::AppConfig;
pub use device::{ConfigChange, DeviceConfig, OutputFormat};
pub use error::{RadarError, Result};
pub use frontend::PanelApp;
pub use units::SpeedUnit;
