use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use super::output_data_format::{Product, ProductStats, Ticker};
use super::{PriceFeed, RawInstrument};
use crate::error::SampleError;

const COINBASE_USER_AGENT: &str = "market-movers/0.1";
const HOURLY_CANDLE_GRANULARITY_SECONDS: u32 = 3600;

/// `[time, low, high, open, close, volume]`, newest candle first
type Candle = (f64, f64, f64, f64, f64, f64);

/// Coinbase Exchange public REST API. No auth needed for market data.
pub struct CoinbaseFeed {
    http: reqwest::Client,
    base_url: Url,
}

impl CoinbaseFeed {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Box<dyn std::error::Error>> {
        let mut base_url = Url::parse(base_url)?;
        // `Url::join` replaces the last segment unless the base path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(COINBASE_USER_AGENT)
            .build()?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, symbol: &str, path: &str) -> Result<Url, SampleError> {
        self.base_url
            .join(&format!("products/{}{}", symbol, path))
            .map_err(|error| unavailable(symbol, error))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        symbol: &str,
        url: Url,
    ) -> Result<T, SampleError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| unavailable(symbol, error))?;

        response
            .json::<T>()
            .await
            .map_err(|error| unavailable(symbol, error))
    }

    async fn hourly_open(&self, symbol: &str) -> Result<Option<f64>, SampleError> {
        let mut url = self.endpoint(symbol, "/candles")?;
        url.query_pairs_mut().append_pair(
            "granularity",
            &HOURLY_CANDLE_GRANULARITY_SECONDS.to_string(),
        );

        let candles: Vec<Candle> = self.get_json(symbol, url).await?;

        Ok(candles.first().map(|&(_, _, _, open, _, _)| open))
    }
}

impl PriceFeed for CoinbaseFeed {
    async fn fetch(&self, symbol: &str) -> Result<RawInstrument, SampleError> {
        let product_url = self.endpoint(symbol, "")?;
        let stats_url = self.endpoint(symbol, "/stats")?;
        let ticker_url = self.endpoint(symbol, "/ticker")?;

        let (mut product, mut stats, ticker, open_1h) = futures::try_join!(
            self.get_json::<Product>(symbol, product_url),
            self.get_json::<ProductStats>(symbol, stats_url),
            self.get_json::<Ticker>(symbol, ticker_url),
            self.hourly_open(symbol),
        )?;

        if product.id.is_empty() {
            product.id = symbol.to_string();
        }
        stats.open_1h = open_1h;

        Ok(RawInstrument {
            product,
            stats,
            ticker,
        })
    }
}

fn unavailable(symbol: &str, error: impl std::fmt::Display) -> SampleError {
    SampleError::UpstreamUnavailable {
        symbol: symbol.to_string(),
        message: error.to_string(),
    }
}
