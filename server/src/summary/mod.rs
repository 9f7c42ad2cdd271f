use std::collections::{BTreeMap, HashMap};

use serde_json::json;

use crate::data_sources::output_data_format::NormalizedProduct;
use crate::data_sources::PollBatch;

mod calculate;
pub mod format;
pub mod tracker;
mod volume;

pub use calculate::{Snapshot, VolumeBanner};
use calculate::{calculate_snapshot, volume_change};
use format::{format_banner_data, format_crypto_data, Record};
use tracker::{IntervalChange, IntervalTracker, PriceHistory, PriceSample};
use volume::VolumeHistory;

/// State carried from one poll cycle to the next. Owned by the summary task only.
pub struct SummaryState {
    tracker: IntervalTracker,
    history: PriceHistory,
    latest_changes: BTreeMap<String, IntervalChange>,
    latest_products: BTreeMap<String, NormalizedProduct>,
    /// per-symbol 1h volume change, kept for symbols that miss a cycle
    volume_changes: HashMap<String, f64>,
    symbol_volumes: HashMap<String, VolumeHistory>,
    total_volume: VolumeHistory,
    limit: usize,
}

impl SummaryState {
    pub fn new(interval_minutes: u64, limit: usize) -> Self {
        Self {
            tracker: IntervalTracker::new(interval_minutes),
            history: PriceHistory::new(),
            latest_changes: BTreeMap::new(),
            latest_products: BTreeMap::new(),
            volume_changes: HashMap::new(),
            symbol_volumes: HashMap::new(),
            total_volume: VolumeHistory::default(),
            limit,
        }
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    /// Folds one poll batch in. Symbols missing from the batch keep their previous data.
    pub fn apply(&mut self, batch: PollBatch) -> Snapshot {
        let samples: Vec<PriceSample> = batch
            .products
            .iter()
            .map(|product| {
                PriceSample::new(&product.symbol, product.current_price, batch.observed_at)
            })
            .collect();

        for change in self
            .tracker
            .calculate_interval_changes(&mut self.history, &samples)
        {
            self.latest_changes.insert(change.symbol.clone(), change);
        }

        for product in batch.products {
            let past = self
                .symbol_volumes
                .entry(product.symbol.clone())
                .or_default()
                .record(batch.observed_at, product.volume_1h);
            self.volume_changes
                .insert(product.symbol.clone(), volume_change(past, product.volume_1h));
            self.latest_products.insert(product.symbol.clone(), product);
        }

        let crypto_rows: Vec<Record> = self
            .latest_changes
            .values()
            .filter_map(|change| match format_crypto_data(&[change.to_record()]) {
                Ok(mut rows) => rows.pop(),
                Err(error) => {
                    tracing::warn!("Dropping interval row for {}: {}", change.symbol, error);
                    None
                }
            })
            .collect();

        let banner_rows: Vec<Record> = self
            .latest_products
            .values()
            .filter_map(|product| match format_banner_data(&[product.to_record()]) {
                Ok(mut rows) => rows.pop().map(|mut row| {
                    let change = self.volume_changes.get(&product.symbol).copied();
                    row.insert("volume_change_1h".into(), json!(change.unwrap_or(0.0)));
                    row
                }),
                Err(error) => {
                    tracing::warn!("Dropping banner row for {}: {}", product.symbol, error);
                    None
                }
            })
            .collect();

        let volume_1h: f64 = self
            .latest_products
            .values()
            .map(|product| product.volume_1h * product.current_price)
            .sum();
        let past_volume_1h = self.total_volume.record(batch.observed_at, volume_1h);
        let banner = VolumeBanner::new(past_volume_1h, volume_1h);

        calculate_snapshot(crypto_rows, banner_rows, banner, self.limit, batch.observed_at)
    }
}

pub fn get_snapshot_rx(
    data_rx: flume::Receiver<PollBatch>,
    interval_minutes: u64,
    limit: usize,
) -> flume::Receiver<Snapshot> {
    let (tx, rx) = flume::bounded::<Snapshot>(10);

    tokio::spawn(async move {
        let mut state = SummaryState::new(interval_minutes, limit);

        while let Ok(batch) = data_rx.recv_async().await {
            let failed = batch.failed.len();
            let snapshot = state.apply(batch);

            tracing::debug!(
                gainers = snapshot.gainers.len(),
                losers = snapshot.losers.len(),
                tracked = state.history().len(),
                failed,
                "Snapshot calculated"
            );

            if tx.send_async(snapshot).await.is_err() {
                tracing::info!("Snapshot channel is closed");
                break;
            }
        }

        tracing::info!("Summary task finished");
    });

    rx
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data_sources::output_data_format::{normalize_product, tests::raw_inputs};

    const SEC: u64 = 1000;

    fn product(symbol: &str, price: f64) -> NormalizedProduct {
        product_with_volume(symbol, price, "240")
    }

    fn product_with_volume(symbol: &str, price: f64, volume_24h: &str) -> NormalizedProduct {
        let price = price.to_string();
        let (product, stats, ticker) = raw_inputs(symbol, &price, "100", 100.0, volume_24h);
        normalize_product(&product, &stats, &ticker).unwrap()
    }

    fn volume_batch(observed_secs: u64, volumes: &[(&str, &str)]) -> PollBatch {
        PollBatch {
            observed_at: observed_secs * SEC,
            products: volumes
                .iter()
                .map(|&(s, v)| product_with_volume(s, 100.0, v))
                .collect(),
            failed: vec![],
        }
    }

    fn batch(observed_secs: u64, prices: &[(&str, f64)]) -> PollBatch {
        PollBatch {
            observed_at: observed_secs * SEC,
            products: prices.iter().map(|&(s, p)| product(s, p)).collect(),
            failed: vec![],
        }
    }

    #[test]
    fn first_cycle_has_no_movers_but_has_banner_rows() {
        let mut state = SummaryState::new(3, 10);

        let snapshot = state.apply(batch(100, &[("BTC-USD", 100.0)]));

        assert!(snapshot.gainers.is_empty());
        assert!(snapshot.losers.is_empty());
        assert_eq!(snapshot.top24h.len(), 1);
        assert_eq!(snapshot.banner.change, 0.0);
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn elapsed_interval_produces_formatted_gainer() {
        let mut state = SummaryState::new(3, 10);

        state.apply(batch(100, &[("BTC-USD", 100.0)]));
        let snapshot = state.apply(batch(280, &[("BTC-USD", 110.0)]));

        assert_eq!(snapshot.gainers.len(), 1);
        let row = &snapshot.gainers[0];
        assert_eq!(row["symbol"], json!("BTC-USD"));
        assert_eq!(row["current"], json!(110.0));
        assert_eq!(row["initial_3min"], json!(100.0));
        assert!((row["gain"].as_f64().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn movers_persist_until_next_interval() {
        let mut state = SummaryState::new(3, 10);

        state.apply(batch(0, &[("ETH-USD", 100.0)]));
        state.apply(batch(180, &[("ETH-USD", 90.0)]));
        let snapshot = state.apply(batch(210, &[("ETH-USD", 95.0)]));

        assert_eq!(snapshot.losers.len(), 1);
        assert_eq!(snapshot.losers[0]["current"], json!(90.0));
    }

    #[test]
    fn failed_symbol_keeps_prior_data_and_others_still_emit() {
        let mut state = SummaryState::new(3, 10);

        state.apply(batch(0, &[("BTC-USD", 100.0), ("ETH-USD", 100.0), ("SOL-USD", 100.0)]));
        let mut degraded = batch(180, &[("BTC-USD", 110.0), ("SOL-USD", 120.0)]);
        degraded.failed.push("ETH-USD".to_string());
        let snapshot = state.apply(degraded);

        assert_eq!(snapshot.gainers.len(), 2);
        // ETH still shows up with last cycle's numbers
        assert_eq!(snapshot.top24h.len(), 3);
    }

    #[test]
    fn volume_banner_compares_against_earliest_reading_within_first_hour() {
        let mut state = SummaryState::new(3, 10);

        // volume_1h = 240 / 24 = 10 units
        state.apply(batch(0, &[("BTC-USD", 100.0)]));
        state.apply(batch(30, &[("BTC-USD", 150.0)]));
        let snapshot = state.apply(batch(60, &[("BTC-USD", 200.0)]));

        assert_eq!(snapshot.banner.past, "1.0K");
        assert_eq!(snapshot.banner.current, "2.0K");
        assert_eq!(snapshot.banner.change, 100.0);
    }

    #[test]
    fn volume_banner_looks_back_one_hour() {
        let mut state = SummaryState::new(3, 10);

        // notional = volume_24h / 24 * 100
        state.apply(volume_batch(0, &[("BTC-USD", "240")]));
        state.apply(volume_batch(1800, &[("BTC-USD", "480")]));
        state.apply(volume_batch(3600, &[("BTC-USD", "720")]));
        let snapshot = state.apply(volume_batch(5400, &[("BTC-USD", "960")]));

        assert_eq!(snapshot.banner.past, "2.0K");
        assert_eq!(snapshot.banner.current, "4.0K");
        assert_eq!(snapshot.banner.change, 100.0);
    }

    #[test]
    fn banner_rows_carry_per_symbol_volume_change() {
        let mut state = SummaryState::new(3, 10);

        let first = state.apply(volume_batch(0, &[("BTC-USD", "240"), ("ETH-USD", "480")]));
        assert_eq!(first.banner_1h[0]["volume_change_1h"], json!(0.0));

        let mut degraded = volume_batch(30, &[("BTC-USD", "300")]);
        degraded.failed.push("ETH-USD".to_string());
        let snapshot = state.apply(degraded);

        let change_of = |symbol: &str| {
            snapshot
                .banner_1h
                .iter()
                .find(|row| row["symbol"] == json!(symbol))
                .map(|row| row["volume_change_1h"].clone())
        };
        assert_eq!(change_of("BTC-USD"), Some(json!(25.0)));
        assert_eq!(change_of("ETH-USD"), Some(json!(0.0)));
    }

    #[tokio::test]
    async fn summary_task_turns_batches_into_snapshots() {
        let (tx, rx) = flume::unbounded();
        let snapshot_rx = get_snapshot_rx(rx, 3, 10);

        tx.send(batch(100, &[("BTC-USD", 100.0)])).unwrap();
        tx.send(batch(280, &[("BTC-USD", 110.0)])).unwrap();

        let first = snapshot_rx.recv_async().await.unwrap();
        let second = snapshot_rx.recv_async().await.unwrap();

        assert!(first.gainers.is_empty());
        assert_eq!(second.gainers.len(), 1);
        assert_eq!(second.updated_at, Some(280 * SEC));
    }
}
