use std::time::Duration;

use crate::helpers::{get_env_var_or_default, split_symbol_list};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5001;
const DEFAULT_INTERVAL_MINUTES: u64 = 3;
const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 30;
const DEFAULT_SYMBOLS: &str = "BTC-USD,ETH-USD,SOL-USD,AVAX-USD,LINK-USD,DOGE-USD";
const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.exchange.coinbase.com";
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 5000;
const DEFAULT_TOP_MOVERS_LIMIT: usize = 10;

/// Process wide settings. Read once at startup, never reloaded.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub interval_minutes: u64,
    pub poll_interval: Duration,
    pub symbols: Vec<String>,
    pub upstream_base_url: String,
    pub upstream_timeout: Duration,
    pub top_movers_limit: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let symbols = split_symbol_list(&get_env_var_or_default(
            "SYMBOLS",
            DEFAULT_SYMBOLS.to_string(),
        ));

        // Zero would make every poll close an interval (or spin the poller).
        let interval_minutes =
            get_env_var_or_default("INTERVAL_MINUTES", DEFAULT_INTERVAL_MINUTES).max(1);
        let poll_interval_seconds =
            get_env_var_or_default("POLL_INTERVAL_SECONDS", DEFAULT_POLL_INTERVAL_SECONDS).max(1);

        Self {
            host: get_env_var_or_default("HOST", DEFAULT_HOST.to_string()),
            port: get_env_var_or_default("PORT", DEFAULT_PORT),
            interval_minutes,
            poll_interval: Duration::from_secs(poll_interval_seconds),
            symbols,
            upstream_base_url: get_env_var_or_default(
                "UPSTREAM_BASE_URL",
                DEFAULT_UPSTREAM_BASE_URL.to_string(),
            ),
            upstream_timeout: Duration::from_millis(get_env_var_or_default(
                "UPSTREAM_TIMEOUT_MS",
                DEFAULT_UPSTREAM_TIMEOUT_MS,
            )),
            top_movers_limit: get_env_var_or_default("TOP_MOVERS_LIMIT", DEFAULT_TOP_MOVERS_LIMIT),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
