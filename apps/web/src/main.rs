//! # Sonho Doce Server
//!
//! Entry point: tracing, configuration, then [`sonho_web::run`].

use anyhow::Context;
use tracing::info;

use sonho_web::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sonho_web::init_tracing();

    info!("Starting Sonho Doce server...");

    let settings = Settings::load().context("failed to load configuration")?;
    info!(
        addr = %settings.server.address(),
        database = %settings.database.path,
        "Configuration loaded"
    );

    sonho_web::run(settings).await
}
