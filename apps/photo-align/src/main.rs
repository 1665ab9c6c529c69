use eframe::egui;
use photoalign_app::{CaptureScreen, PhotoAlignApp, ScreenSettings};
use photoalign_capture_engine::get_backend;
use photoalign_common::config::AppConfig;
use photoalign_common::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load();
    init_logging(&config.logging);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("tokio runtime failed to start: {e}"))?;

    let backend = get_backend();
    tracing::info!(
        backend = backend.name(),
        export_dir = %config.export_dir.display(),
        "Starting Photo Align"
    );

    let screen = CaptureScreen::new(
        backend,
        ScreenSettings::from_config(&config),
        runtime.handle().clone(),
    );
    let app = PhotoAlignApp::new(screen, config.overlay.opacity);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Photo Align")
            .with_inner_size([1280.0, 800.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native("Photo Align", options, Box::new(|_cc| Box::new(app)))
        .map_err(|e| anyhow::anyhow!("window launch failed: {e}"))
}
