use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::error::SampleError;

// Unified output data format
pub mod output_data_format;
use output_data_format::{normalize_product, NormalizedProduct, Product, ProductStats, Ticker};

// Feeds
pub mod coinbase;

/// Everything the upstream reports about one instrument, still unparsed.
#[derive(Debug, Clone)]
pub struct RawInstrument {
    pub product: Product,
    pub stats: ProductStats,
    pub ticker: Ticker,
}

pub trait PriceFeed: Send + Sync + 'static {
    fn fetch(&self, symbol: &str)
        -> impl Future<Output = Result<RawInstrument, SampleError>> + Send;
}

/// Result of one poll cycle over all tracked symbols.
#[derive(Debug, Clone, Default)]
pub struct PollBatch {
    pub observed_at: u64,
    pub products: Vec<NormalizedProduct>,
    pub failed: Vec<String>,
}

pub fn get_data_rx<F, C>(
    feed: F,
    clock: C,
    symbols: Vec<String>,
    poll_interval: Duration,
) -> flume::Receiver<PollBatch>
where
    F: PriceFeed,
    C: Clock,
{
    let (tx, rx) = flume::bounded::<PollBatch>(1);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let batch = poll_once(&feed, &clock, &symbols).await;

            if tx.send_async(batch).await.is_err() {
                tracing::info!("Poll batch channel is closed. Stopping poller...");
                break;
            }
        }
    });

    rx
}

/// Samples every symbol concurrently. A failing symbol only lands in `failed`.
pub async fn poll_once<F, C>(feed: &F, clock: &C, symbols: &[String]) -> PollBatch
where
    F: PriceFeed,
    C: Clock,
{
    let results = join_all(symbols.iter().map(|symbol| sample_symbol(feed, symbol))).await;
    let observed_at = clock.now_ms();

    let mut batch = PollBatch {
        observed_at,
        ..Default::default()
    };

    for (symbol, result) in symbols.iter().zip(results) {
        match result {
            Ok(product) => batch.products.push(product),
            Err(error) => {
                tracing::warn!(
                    symbol = error.symbol(),
                    "Skipping instrument this cycle: {}",
                    error
                );
                batch.failed.push(symbol.clone());
            }
        }
    }

    tracing::debug!(
        sampled = batch.products.len(),
        failed = batch.failed.len(),
        "Poll cycle finished"
    );

    batch
}

async fn sample_symbol<F: PriceFeed>(
    feed: &F,
    symbol: &str,
) -> Result<NormalizedProduct, SampleError> {
    let raw = feed.fetch(symbol).await?;
    normalize_product(&raw.product, &raw.stats, &raw.ticker)
}
