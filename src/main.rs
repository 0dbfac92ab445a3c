mod app;
mod config;
mod data;
mod error;
mod pipeline;
mod ui;

use app::App;
use config::ConfigStore;
use data::{ExmoSource, PriceSource};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use ui::{Keyboard, TerminalSink};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let path = config::config_path();
    let (config, load_err) = match config::load_config(&path) {
        Ok(config) => (config, None),
        Err(e) => (config::AppConfig::default(), Some(e)),
    };
    // Only a file that loaded (or does not exist yet) may be written back.
    let store = ConfigStore::new(path, load_err.is_none());

    init_tracing(&config.log_file)?;
    match load_err {
        Some(e) => tracing::warn!(
            "failed to load settings from {:?}: {}. Using defaults; the file will not be overwritten.",
            store.path(),
            e
        ),
        None => tracing::info!("settings from {:?}", store.path()),
    }

    let source: Arc<dyn PriceSource> = Arc::new(ExmoSource::new(
        config.endpoint.clone(),
        config.request_timeout(),
    )?);
    let sink = TerminalSink::new()?;

    let mut app = App::new(config, store, source, sink, Keyboard);
    let result = app.run().await;
    // Leave the alternate screen before any report is printed.
    drop(app);
    result
}

fn init_tracing(log_file: &Path) -> color_eyre::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
