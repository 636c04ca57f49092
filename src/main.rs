mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use app::MotoDashApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load();
    log::info!("Snapshot: {}", config.snapshot_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "113年機車事故儀表板",
        options,
        Box::new(|cc| Ok(Box::new(MotoDashApp::new(cc, config)))),
    )
}
