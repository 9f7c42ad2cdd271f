use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SampleError;

/// Product metadata as returned by `GET /products/{id}`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Product {
    pub id: String,
    // Coinbase doesn't report supply, other feeds sharing this shape do
    #[serde(default)]
    pub circulating_supply: Option<String>,
}

/// 24h stats (`GET /products/{id}/stats`) plus the open of the latest hourly candle.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProductStats {
    pub open: String,
    pub volume: String,
    /// Filled in from `GET /products/{id}/candles?granularity=3600`
    #[serde(skip)]
    pub open_1h: Option<f64>,
}

/// Latest trade (`GET /products/{id}/ticker`).
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Ticker {
    pub price: String,
}

/// Unified per-instrument record, one per symbol and poll cycle.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NormalizedProduct {
    pub symbol: String,
    pub current_price: f64,
    pub initial_price_24h: f64,
    pub initial_price_1h: f64,
    pub price_change_24h: f64,
    #[serde(rename = "price_change_1h")]
    pub price_change_percentage_1h: f64,
    pub volume_24h: f64,
    /// `volume_24h / 24`, a linear approximation
    pub volume_1h: f64,
    pub market_cap: Option<f64>,
}

impl NormalizedProduct {
    pub fn to_record(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(record)) => record,
            // a struct of plain numbers and strings always serializes to an object
            _ => Map::new(),
        }
    }
}

pub fn normalize_product(
    product: &Product,
    stats: &ProductStats,
    ticker: &Ticker,
) -> Result<NormalizedProduct, SampleError> {
    let symbol = product.id.as_str();

    let current_price = parse_number(symbol, "price", &ticker.price)?;
    let initial_price_24h = parse_number(symbol, "open", &stats.open)?;
    let volume_24h = parse_number(symbol, "volume", &stats.volume)?;
    let initial_price_1h = match stats.open_1h {
        Some(open) if open.is_finite() => open,
        Some(open) => return Err(parse_error(symbol, "open_1h", open.to_string())),
        None => return Err(parse_error(symbol, "open_1h", String::new())),
    };
    let market_cap = product
        .circulating_supply
        .as_deref()
        .map(|supply| parse_number(symbol, "circulating_supply", supply))
        .transpose()?
        .map(|supply| supply * current_price);

    Ok(NormalizedProduct {
        symbol: symbol.to_string(),
        current_price,
        initial_price_24h,
        initial_price_1h,
        price_change_24h: relative_change(initial_price_24h, current_price),
        price_change_percentage_1h: relative_change(initial_price_1h, current_price),
        volume_24h,
        volume_1h: hourly_volume(volume_24h),
        market_cap,
    })
}

pub fn hourly_volume(volume_24h: f64) -> f64 {
    volume_24h / 24.0
}

/// Percent change from `initial` to `current`, 0 when there is nothing to compare against.
fn relative_change(initial: f64, current: f64) -> f64 {
    if initial > 0.0 {
        (current - initial) / initial * 100.0
    } else {
        0.0
    }
}

fn parse_number(symbol: &str, field: &'static str, raw: &str) -> Result<f64, SampleError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(parse_error(symbol, field, raw.to_string())),
    }
}

fn parse_error(symbol: &str, field: &'static str, value: String) -> SampleError {
    SampleError::Parse {
        symbol: symbol.to_string(),
        field,
        value,
    }
}
