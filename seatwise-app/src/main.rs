mod demo;

use anyhow::Context;
use seatwise_app::AppState;
use seatwise_store::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        flights = config.flights.len(),
        rows = config.seat_map.rows,
        columns = config.seat_map.columns,
        "starting seatwise"
    );

    let state = AppState::from_config(config).context("failed to build application state")?;
    demo::run(&state).await
}
