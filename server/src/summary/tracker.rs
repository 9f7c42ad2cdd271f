use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::error::TrackerError;

const MS_PER_MINUTE: u64 = 60_000;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSample {
    pub symbol: String,
    pub price: f64,
    /// ms since unix epoch
    pub observed_at: u64,
}

impl PriceSample {
    pub fn new(symbol: impl Into<String>, price: f64, observed_at: u64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            observed_at,
        }
    }
}

/// Start of the current measurement interval for one symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub first_price: f64,
    pub first_observed_at: u64,
}

/// One baseline per symbol. Owned by whoever drives the tracker.
#[derive(Debug, Default, Clone)]
pub struct PriceHistory {
    baselines: HashMap<String, Baseline>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline(&self, symbol: &str) -> Option<&Baseline> {
        self.baselines.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    fn reset(&mut self, sample: &PriceSample) {
        self.baselines.insert(
            sample.symbol.clone(),
            Baseline {
                first_price: sample.price,
                first_observed_at: sample.observed_at,
            },
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalChange {
    pub symbol: String,
    pub current_price: f64,
    pub initial_price: f64,
    pub percent_change: f64,
    pub actual_interval_minutes: f64,
    /// configured length; names the `_<N>min` keys of the record
    pub interval_minutes: u64,
}

impl IntervalChange {
    /// Flat record as handed to the formatter, e.g. `initial_price_3min`.
    pub fn to_record(&self) -> Map<String, Value> {
        let n = self.interval_minutes;
        let mut record = Map::new();
        record.insert("symbol".into(), json!(self.symbol));
        record.insert("current_price".into(), json!(self.current_price));
        record.insert(format!("initial_price_{n}min"), json!(self.initial_price));
        record.insert(
            format!("price_change_percentage_{n}min"),
            json!(self.percent_change),
        );
        record.insert(
            "actual_interval_minutes".into(),
            json!(self.actual_interval_minutes),
        );
        record
    }
}

pub struct IntervalTracker {
    pub interval_minutes: u64,
}

impl IntervalTracker {
    pub fn new(interval_minutes: u64) -> Self {
        Self { interval_minutes }
    }

    /// Feeds one sample. Emits a change only when a full interval has passed
    /// since the baseline, and then restarts the interval at this sample.
    pub fn observe(
        &self,
        history: &mut PriceHistory,
        sample: &PriceSample,
    ) -> Result<Option<IntervalChange>, TrackerError> {
        let Some(baseline) = history.baseline(&sample.symbol).copied() else {
            history.reset(sample);
            return Ok(None);
        };

        let elapsed_ms = sample.observed_at.saturating_sub(baseline.first_observed_at);
        if elapsed_ms < self.interval_minutes.saturating_mul(MS_PER_MINUTE) {
            return Ok(None);
        }

        if baseline.first_price <= 0.0 {
            return Err(TrackerError::InvalidBaseline {
                symbol: sample.symbol.clone(),
                price: baseline.first_price,
            });
        }

        let change = IntervalChange {
            symbol: sample.symbol.clone(),
            current_price: sample.price,
            initial_price: baseline.first_price,
            percent_change: (sample.price - baseline.first_price) / baseline.first_price * 100.0,
            actual_interval_minutes: elapsed_ms as f64 / MS_PER_MINUTE as f64,
            interval_minutes: self.interval_minutes,
        };
        history.reset(sample);

        Ok(Some(change))
    }

    /// Runs every sample through `observe`, in order. Invalid baselines are
    /// logged and skipped so the remaining symbols still get processed.
    pub fn calculate_interval_changes(
        &self,
        history: &mut PriceHistory,
        samples: &[PriceSample],
    ) -> Vec<IntervalChange> {
        samples
            .iter()
            .filter_map(|sample| match self.observe(history, sample) {
                Ok(change) => change,
                Err(error) => {
                    tracing::warn!("No interval change for {}: {}", sample.symbol, error);
                    None
                }
            })
            .collect()
    }
}
