//! OPS243-A Control Panel - Main Entry Point
//!
//! Usage: `ops243-panel [PORT]`. The optional port overrides the configured
//! one; `mock` connects to the simulated radar.

use anyhow::anyhow;
use ops243_panel::{backend::RadarBackend, config, config::AppConfig, frontend::PanelApp};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Log to stderr, and to a daily file when the data directory is known
    let (file_layer, _log_guard) = match config::log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ops243-panel.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ops243_panel=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    tracing::info!("Starting OPS243-A Control Panel");

    let config = AppConfig::load_or_default().with_port_override(std::env::args().nth(1));
    tracing::info!(
        "Using port {} at {} baud",
        config.serial.port,
        config.serial.baud_rate
    );

    let (backend, handle) = RadarBackend::new(config.clone());
    let backend_thread = std::thread::Builder::new()
        .name("radar-backend".to_string())
        .spawn(move || backend.run())?;

    handle.connect(config.serial.port.clone(), config.serial.baud_rate);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("OPS243-A Control Panel"),
        ..Default::default()
    };

    let ui_handle = handle.clone();
    let result = eframe::run_native(
        "OPS243-A Control Panel",
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(PanelApp::new(cc, ui_handle, config)))
        }),
    );

    // Signal backend to stop and wait for it to finish the export and close the port
    tracing::info!("Shutting down...");
    handle.shutdown();
    if backend_thread.join().is_err() {
        tracing::error!("Backend thread panicked");
    }

    result.map_err(|e| anyhow!("UI error: {}", e))
}
