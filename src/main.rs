pub mod config;
pub mod gearbox;
pub mod input;
pub mod ui;

use crate::config::Config;
use crate::gearbox::{GearboxHandle, GearboxObserver, GearboxSettings};
use crate::ui::{GearboxUI, UiNotifier};
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = Config::load_or_create().await?;
    info!("Starting gearbox simulator with {:?}", config);

    let (notification_tx, notification_rx) = mpsc::channel(100);
    let observers: Vec<Box<dyn GearboxObserver>> =
        vec![Box::new(UiNotifier::new(notification_tx))];

    let settings = GearboxSettings::from(&config.gearbox);
    let gearbox = GearboxHandle::spawn(Some(settings), observers)
        .map_err(|e| eyre!("Failed to spawn gearbox: {}", e))?;

    info!("Starting UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title("Gearbox Simulator")
        .with_inner_size([config.ui.window_width, config.ui.window_height])
        .with_fullscreen(config.ui.fullscreen);

    let ui_config = config.ui.clone();
    eframe::run_native(
        "Gearbox Simulator",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(GearboxUI::new(
                cc,
                gearbox,
                notification_rx,
                &ui_config,
            )))
        }),
    )
    .map_err(|e| eyre!("UI terminated with error: {}", e))?;

    info!("Window closed, shutting down");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
