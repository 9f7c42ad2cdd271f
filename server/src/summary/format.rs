use serde_json::{Map, Value};

use crate::error::FormatError;

/// Flat JSON object, as served to the dashboard.
pub type Record = Map<String, Value>;

const INITIAL_PRICE_PREFIX: &str = "initial_price_";
const PRICE_CHANGE_PREFIX: &str = "price_change_percentage_";

pub const BANNER_FIELDS: [&str; 8] = [
    "symbol",
    "current_price",
    "initial_price_24h",
    "initial_price_1h",
    "price_change_24h",
    "price_change_1h",
    "volume_24h",
    "market_cap",
];

pub fn format_crypto_data(records: &[Record]) -> Result<Vec<Record>, FormatError> {
    records.iter().map(format_crypto_record).collect()
}

/// `{symbol, current_price, initial_price_<N>min, price_change_percentage_<N>min, actual_interval_minutes}`
/// becomes `{symbol, current, initial_<N>min, gain, interval_minutes}`.
fn format_crypto_record(record: &Record) -> Result<Record, FormatError> {
    let window = interval_suffix(record)?;
    let initial_key = format!("{INITIAL_PRICE_PREFIX}{window}");
    let change_key = format!("{PRICE_CHANGE_PREFIX}{window}");

    let mut formatted = Map::new();
    formatted.insert("symbol".into(), field(record, "symbol")?);
    formatted.insert("current".into(), field(record, "current_price")?);
    formatted.insert(format!("initial_{window}"), field(record, &initial_key)?);
    formatted.insert("gain".into(), field(record, &change_key)?);
    formatted.insert(
        "interval_minutes".into(),
        field(record, "actual_interval_minutes")?,
    );

    Ok(formatted)
}

pub fn format_banner_data(records: &[Record]) -> Result<Vec<Record>, FormatError> {
    records
        .iter()
        .map(|record| {
            BANNER_FIELDS
                .iter()
                .map(|&key| field(record, key).map(|value| (key.to_string(), value)))
                .collect::<Result<Record, FormatError>>()
        })
        .collect()
}

/// The `<N>min` part shared by the initial price and change keys.
fn interval_suffix(record: &Record) -> Result<&str, FormatError> {
    record
        .keys()
        .filter_map(|key| key.strip_prefix(PRICE_CHANGE_PREFIX))
        .find(|suffix| suffix.ends_with("min"))
        .ok_or_else(|| FormatError::missing(format!("{PRICE_CHANGE_PREFIX}<N>min")))
}

fn field(record: &Record, key: &str) -> Result<Value, FormatError> {
    record
        .get(key)
        .cloned()
        .ok_or_else(|| FormatError::missing(key))
}
