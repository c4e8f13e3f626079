mod app;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use spread_monitor::config::Args;
use spread_monitor::provider::{JsonSink, run_request};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn run_headless(args: &Args) -> Result<()> {
    let provider = args.provider();
    let settings = args.settings();
    let dataset = provider
        .snapshot()
        .with_context(|| format!("failed to load {}", provider.describe()))?;
    info!(records = dataset.len(), filter = %settings.initial_filter.label(), "headless run");

    let mut summary = JsonSink::new(std::io::stdout());
    let mut render = JsonSink::new(std::io::stdout());
    run_request(
        &dataset,
        &settings.initial_filter,
        &settings.ranking,
        &settings.scene,
        &mut render,
        &mut summary,
    )?;
    summary.finish()?;
    render.finish()?;
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.headless {
        return run_headless(&args);
    }

    let provider = args.provider();
    let settings = args.settings();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "spread-monitor",
        options,
        Box::new(move |cc| Ok(Box::new(app::MonitorApp::new(cc, provider, settings)))),
    )
    .map_err(|error| anyhow!("failed to start the monitor window: {error}"))
}
