use tracing_subscriber::EnvFilter;

mod app;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("linkdraw=info")),
        )
        .init();

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "LinkDraw",
        native_options,
        Box::new(|cc| Ok(Box::new(app::LinkDrawApp::new(cc)))),
    )
}
