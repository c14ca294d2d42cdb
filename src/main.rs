pub mod api;
pub mod app;
pub mod common;
pub mod config;
pub mod event;
pub mod form;
pub mod logging;
pub mod pages;
pub mod store;
pub mod tui;
pub mod ui;

use anyhow::Result;
use api::BrokerClient;
use api::types::FormOptions;
use app::App;
use config::Config;
use event::EventHandler;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e:#}");
        std::process::exit(1);
    });

    if let Err(e) = logging::init(&config.log_path) {
        eprintln!("Warning: logging disabled: {e:#}");
    }

    let options = FormOptions::load(&config.options_path)?;
    let existing = store::load_record(&config.record_path)?;
    tracing::info!(
        hosts = options.hosts.len(),
        services = options.services.len(),
        editing = existing.is_some(),
        "form options loaded"
    );

    let client = BrokerClient::new(config.broker)?;

    let mut terminal = tui::init()?;
    tui::install_panic_hook();

    let mut app = App::new(client, options, existing, config.record_path);

    let tick_rate = Duration::from_millis(250);
    let mut events = EventHandler::new(tick_rate);

    let res = app.run(&mut terminal, &mut events).await;

    tui::restore()?;

    if let Err(err) = res {
        tracing::error!(error = %format!("{err:#}"), "application error");
        println!("{err:?}");
    }

    Ok(())
}
