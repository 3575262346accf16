use clap::Parser as _;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod gui;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.get_config()?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
    let app = app::App::new(&config)?;

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "toychain",
        native_options,
        Box::new(|cc| Box::new(gui::EguiApp::new(app, cc))),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch egui app: {err}"))?;
    Ok(())
}
