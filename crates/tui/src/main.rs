mod app;
mod grid;

use std::fs::{self, OpenOptions};

use anyhow::Result;
use gamedeck_core::{
    catalog::GameCatalogClient,
    config::{self, AppConfig},
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;

    let client = match config.require_api_key() {
        Ok(key) => Some(GameCatalogClient::new(
            config.api_base_url.clone(),
            key.to_string(),
        )),
        Err(err) => {
            tracing::error!(%err, "Refusing to start network access");
            None
        }
    };

    let mut app = app::GamedeckApp::new(client);
    app.run().await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    fs::create_dir_all(&config.log_dir)?;
    let log_path = config.log_dir.join("gamedeck.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
