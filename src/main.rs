use std::sync::Arc;
use std::time::Duration;

use ridgeline::{
    config::AppConfig, db::Db, engine::Engine, logger::init_tracing, notify::LogNotifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqlx::any::install_default_drivers();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    tracing::info!("Starting Ridgeline booking engine...");

    let cfg = AppConfig::from_env();

    let db = Db::connect(&cfg.database_url).await?;
    db.migrate().await?;

    let engine = Engine::from_config(&cfg, db.pool.clone(), Arc::new(LogNotifier))?;
    engine.spawn_hold_reaper(Duration::from_millis(cfg.hold_reap_interval_ms));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    Ok(())
}
