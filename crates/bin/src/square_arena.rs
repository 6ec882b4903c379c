//! Square Arena - authoritative game server binary.

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Square Arena Server v{}", env!("CARGO_PKG_VERSION"));

    let config = server::Config::load()?;
    info!("Loaded configuration");
    info!("  Port: {} (public: {})", config.server.port, config.server.public);
    info!(
        "  Session: {} players, {} obstacles, ricochet {}",
        config.session.player_count,
        config.session.obstacle_level.as_str(),
        if config.session.ricochet { "on" } else { "off" }
    );
    info!("  Tick: {}ms", config.server.tick_interval_ms);

    server::run(config).await?;

    Ok(())
}
