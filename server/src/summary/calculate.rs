use std::cmp::Ordering;

use serde::Serialize;

use super::format::Record;

/// What `/data` serves and the push channel broadcasts.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub gainers: Vec<Record>,
    pub losers: Vec<Record>,
    pub top24h: Vec<Record>,
    pub banner: VolumeBanner,
    /// per-coin rows for the scrolling 1h banner, served separately
    #[serde(skip)]
    pub banner_1h: Vec<Record>,
    #[serde(skip)]
    pub updated_at: Option<u64>,
}

/// Aggregate 1h notional volume, about an hour ago vs. now.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct VolumeBanner {
    pub past: String,
    pub current: String,
    pub change: f64,
}

impl VolumeBanner {
    pub fn new(past_volume: f64, current_volume: f64) -> Self {
        Self {
            past: compact_number(past_volume),
            current: compact_number(current_volume),
            change: volume_change(past_volume, current_volume),
        }
    }
}

/// Percent change rounded to 2 decimals; 0 when there is nothing to compare against.
pub fn volume_change(past: f64, current: f64) -> f64 {
    if past > 0.0 {
        round_2((current - past) / past * 100.0)
    } else {
        0.0
    }
}

pub fn calculate_snapshot(
    crypto_rows: Vec<Record>,
    banner_rows: Vec<Record>,
    banner: VolumeBanner,
    limit: usize,
    updated_at: u64,
) -> Snapshot {
    let (mut gainers, mut losers): (Vec<Record>, Vec<Record>) = crypto_rows
        .into_iter()
        .filter(|row| number(row, "gain") != 0.0)
        .partition(|row| number(row, "gain") > 0.0);

    // biggest moves first on both sides
    gainers.sort_by(|a, b| descending(a, b, "gain"));
    losers.sort_by(|a, b| descending(b, a, "gain"));
    gainers.truncate(limit);
    losers.truncate(limit);

    let mut top24h = banner_rows.clone();
    top24h.sort_by(|a, b| descending(a, b, "price_change_24h"));
    top24h.truncate(limit);

    let mut banner_1h = banner_rows;
    banner_1h.sort_by(|a, b| descending(a, b, "volume_24h"));

    Snapshot {
        gainers,
        losers,
        top24h,
        banner,
        banner_1h,
        updated_at: Some(updated_at),
    }
}

/// `137_900_000.0` becomes `"137.9M"`.
pub fn compact_number(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    for (scale, suffix) in UNITS {
        if value.abs() >= scale {
            return format!("{:.1}{}", value / scale, suffix);
        }
    }

    format!("{:.1}", value)
}

fn round_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn number(row: &Record, key: &str) -> f64 {
    row.get(key).and_then(|value| value.as_f64()).unwrap_or(0.0)
}

fn descending(a: &Record, b: &Record, key: &str) -> Ordering {
    number(b, key)
        .partial_cmp(&number(a, key))
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn row(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn gain_row(symbol: &str, gain: f64) -> Record {
        row(json!({ "symbol": symbol, "gain": gain }))
    }

    fn symbols(rows: &[Record]) -> Vec<&str> {
        rows.iter()
            .map(|row| row["symbol"].as_str().unwrap_or_default())
            .collect()
    }

    #[test]
    fn splits_and_orders_movers() {
        let rows = vec![
            gain_row("A", 1.0),
            gain_row("B", -3.0),
            gain_row("C", 5.0),
            gain_row("D", 0.0),
            gain_row("E", -0.5),
        ];

        let snapshot = calculate_snapshot(rows, vec![], VolumeBanner::default(), 10, 1);

        assert_eq!(symbols(&snapshot.gainers), vec!["C", "A"]);
        assert_eq!(symbols(&snapshot.losers), vec!["B", "E"]);
        assert_eq!(snapshot.updated_at, Some(1));
    }

    #[test]
    fn lists_are_capped() {
        let rows = (0..5).map(|i| gain_row(&i.to_string(), i as f64 + 1.0)).collect();
        let banner_rows = (0..5)
            .map(|i| row(json!({ "symbol": i.to_string(), "price_change_24h": i, "volume_24h": 1 })))
            .collect();

        let snapshot = calculate_snapshot(rows, banner_rows, VolumeBanner::default(), 2, 1);

        assert_eq!(symbols(&snapshot.gainers), vec!["4", "3"]);
        assert_eq!(symbols(&snapshot.top24h), vec!["4", "3"]);
        assert_eq!(snapshot.banner_1h.len(), 5);
    }

    #[test]
    fn volume_banner_compares_cycles() {
        let banner = VolumeBanner::new(105_300_000.0, 137_900_000.0);
        assert_eq!(banner.past, "105.3M");
        assert_eq!(banner.current, "137.9M");
        assert_eq!(banner.change, 30.96);

        assert_eq!(VolumeBanner::new(0.0, 10.0).change, 0.0);
        assert_eq!(volume_change(200.0, 150.0), -25.0);
    }

    #[test]
    fn compact_numbers() {
        assert_eq!(compact_number(950.0), "950.0");
        assert_eq!(compact_number(1_500.0), "1.5K");
        assert_eq!(compact_number(2_260_000_000.0), "2.3B");
        assert_eq!(compact_number(-4_000_000.0), "-4.0M");
    }

    #[test]
    fn serialized_snapshot_has_dashboard_shape() {
        let snapshot = calculate_snapshot(vec![], vec![], VolumeBanner::new(1.0, 1.0), 10, 1);
        let value = serde_json::to_value(&snapshot).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();

        assert_eq!(keys.len(), 4);
        for key in ["gainers", "losers", "top24h", "banner"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["banner"]["change"], json!(0.0));
    }
}
