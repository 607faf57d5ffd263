// =============================================================================
// Shared types used across the Bitfinex rate client
// =============================================================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Quote currency every listed symbol and fetched candle is priced against.
pub const REFERENCE_CURRENCY: &str = "USD";

/// Base-currency code of a USD trading pair (e.g. `BTC`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bitfinex trading-pair key for this symbol against USD, e.g. `tBTCUSD`.
    pub fn trading_pair(&self) -> String {
        format!("t{}{}", self.0, REFERENCE_CURRENCY)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One daily candle reduced to the fields the summary needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket start, in local time.
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub volume: f64,
}

/// Candles in upstream order (newest first), plus the number of raw records
/// that failed validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    pub candles: Vec<Candle>,
    pub dropped: usize,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>, dropped: usize) -> Self {
        Self { candles, dropped }
    }

    /// Most recent candle, if any survived validation.
    pub fn latest(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

/// Outcome of a single candle request.
#[derive(Debug, Clone, PartialEq)]
pub enum CandleFetch {
    /// The response could not be interpreted; the caller may retry.
    Unusable(String),
    /// Upstream answered with an explicit empty list.
    Empty,
    /// A list of raw records, validated into candles.
    Series(CandleSeries),
}

/// Per-symbol result: latest close and average volume over a trailing window.
///
/// A summary with only `symbol` set means upstream had no candles for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSummary {
    pub symbol: Symbol,
    pub last_timestamp: Option<NaiveDateTime>,
    pub last_close: Option<f64>,
    pub avg_volume: Option<f64>,
}

impl RateSummary {
    pub fn new(symbol: Symbol, last_timestamp: NaiveDateTime, last_close: f64, avg_volume: f64) -> Self {
        Self {
            symbol,
            last_timestamp: Some(last_timestamp),
            last_close: Some(last_close),
            avg_volume: Some(avg_volume),
        }
    }

    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            last_timestamp: None,
            last_close: None,
            avg_volume: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_timestamp.is_none() && self.last_close.is_none() && self.avg_volume.is_none()
    }
}

impl std::fmt::Display for RateSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn field<T: std::fmt::Display>(value: &Option<T>) -> String {
            match value {
                Some(v) => v.to_string(),
                None => "None".to_string(),
            }
        }

        write!(
            f,
            "({}, {}, {}, {})",
            self.symbol,
            field(&self.last_timestamp),
            field(&self.last_close),
            field(&self.avg_volume)
        )
    }
}
