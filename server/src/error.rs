/// Per-instrument failures while sampling the upstream feed.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SampleError {
    #[error("upstream unavailable for {symbol}: {message}")]
    UpstreamUnavailable { symbol: String, message: String },

    #[error("can't parse {field} for {symbol}: {value:?}")]
    Parse {
        symbol: String,
        field: &'static str,
        value: String,
    },
}

impl SampleError {
    pub fn symbol(&self) -> &str {
        match self {
            Self::UpstreamUnavailable { symbol, .. } | Self::Parse { symbol, .. } => symbol,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TrackerError {
    #[error("invalid baseline price {price} for {symbol}")]
    InvalidBaseline { symbol: String, price: f64 },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FormatError {
    #[error("record is missing field \"{field}\"")]
    MissingField { field: String },
}

impl FormatError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}
