use std::{
    env,
    fmt::{Debug, Display},
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

pub fn get_env_var_or_default<T>(var_name: &str, default: T) -> T
where
    T: Display + Debug + FromStr,
    <T as FromStr>::Err: Display,
{
    match env::var(var_name) {
        Ok(val) => parse_or_default(var_name, &val, default),
        Err(error) => {
            tracing::info!(
                "\"{}\" env var is not available ({}). Defaulting to \"{}\"",
                var_name,
                error,
                default
            );
            default
        }
    }
}

fn parse_or_default<T>(var_name: &str, raw: &str, default: T) -> T
where
    T: Display + FromStr,
    <T as FromStr>::Err: Display,
{
    match T::from_str(raw.trim()) {
        Ok(val) => val,
        Err(error) => {
            tracing::warn!(
                "Can't parse \"{}\" env var value {:?}: {}. Defaulting to \"{}\"",
                var_name,
                raw,
                error,
                default
            );
            default
        }
    }
}

/// Splits a comma separated list, dropping blanks. `"btc-usd, ,ETH-USD"` gives `["BTC-USD", "ETH-USD"]`.
pub fn split_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|symbol| symbol.trim().to_uppercase())
        .filter(|symbol| !symbol.is_empty())
        .collect()
}

pub fn unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_falls_back_to_default_on_garbage() {
        assert_eq!(parse_or_default("PORT", "not-a-port", 5001u16), 5001);
        assert_eq!(parse_or_default("PORT", " 8080 ", 5001u16), 8080);
    }

    #[test]
    fn missing_env_var_yields_default() {
        let value: u64 = get_env_var_or_default("MARKET_MOVERS_SURELY_UNSET_VAR", 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn symbol_list_is_normalized() {
        assert_eq!(
            split_symbol_list("btc-usd, ,ETH-USD,"),
            vec!["BTC-USD".to_string(), "ETH-USD".to_string()]
        );
        assert!(split_symbol_list("").is_empty());
    }
}
