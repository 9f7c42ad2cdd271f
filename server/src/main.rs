mod api;
mod clock;
mod config;
mod data_sources;
mod error;
mod summary;

mod helpers;

use tracing_subscriber::EnvFilter;

use clock::SystemClock;
use config::Config;
use data_sources::coinbase::CoinbaseFeed;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(
        symbols = ?config.symbols,
        interval_minutes = config.interval_minutes,
        poll_interval_secs = config.poll_interval.as_secs(),
        "Starting market movers server"
    );

    let feed = CoinbaseFeed::new(&config.upstream_base_url, config.upstream_timeout)?;

    let data_rx = data_sources::get_data_rx(
        feed,
        SystemClock,
        config.symbols.clone(),
        config.poll_interval,
    );
    let snapshot_rx =
        summary::get_snapshot_rx(data_rx, config.interval_minutes, config.top_movers_limit);

    api::serve(snapshot_rx, &config).await?;

    Ok(())
}
