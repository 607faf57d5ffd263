// =============================================================================
// Bitfinex REST API Client — public endpoints only
// =============================================================================
//
// Two requests are used:
//   GET {base}tickers?symbols=ALL                          ticker snapshot
//   GET {base}candles/trade:1D:t{SYMBOL}USD/hist?limit=N   daily candles
//
// Bitfinex answers rate-limited requests with a JSON error object (or an
// error list) instead of data. Those responses are reported as unusable so
// the collector can back off and ask again.
// =============================================================================

use std::sync::Arc;

use chrono::Local;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::bitfinex::parse::{parse_candles, ticker_base_currency};
use crate::bitfinex::transport::{ReqwestTransport, Transport};
use crate::collector::{RateCollector, RateSource};
use crate::config::ClientConfig;
use crate::error::{BitfxError, Result};
use crate::retry::{Sleeper, TokioSleeper};
use crate::sink::{EventSink, TracingSink};
use crate::summary::summarize;
use crate::types::{CandleFetch, RateSummary, Symbol};

/// Client for the public Bitfinex v2 REST API.
pub struct BitfinexClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn EventSink>,
    sleeper: Arc<dyn Sleeper>,
}

impl BitfinexClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Client on a real HTTP transport built from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.request_timeout(), &config.user_agent)?;
        debug!(base_url = %config.base_url, "BitfinexClient initialised");
        Ok(Self::with_transport(&config.base_url, Arc::new(transport)))
    }

    /// Client on an arbitrary transport, with `tracing` warnings and real
    /// sleeps.
    pub fn with_transport(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            base_url,
            transport,
            sink: Arc::new(TracingSink),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Route summariser and collector warnings to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Pause between collector retries through `sleeper`.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -------------------------------------------------------------------------
    // Symbols
    // -------------------------------------------------------------------------

    /// GET tickers?symbols=ALL, reduced to base-currency codes.
    ///
    /// With `usd_only`, only pairs quoted in USD are kept. Upstream order is
    /// preserved and nothing is de-duplicated.
    #[instrument(skip(self), name = "bitfinex::get_symbols")]
    pub async fn get_symbols(&self, usd_only: bool) -> Result<Vec<Symbol>> {
        let url = format!("{}tickers?symbols=ALL", self.base_url);
        let resp = self.transport.get(&url).await?;

        if !resp.is_json() {
            return Err(BitfxError::protocol(format!(
                "tickers response has content type {:?}, expected application/json",
                resp.content_type
            )));
        }

        let body: Value = serde_json::from_str(&resp.body)
            .map_err(|e| BitfxError::protocol(format!("tickers response is not valid JSON: {e}")))?;
        let records = body
            .as_array()
            .ok_or_else(|| BitfxError::protocol("tickers response is not a list"))?;

        let symbols: Vec<Symbol> = records
            .iter()
            .filter_map(|record| ticker_base_currency(record, usd_only))
            .collect();

        debug!(tickers = records.len(), symbols = symbols.len(), "tickers filtered");
        Ok(symbols)
    }

    // -------------------------------------------------------------------------
    // Candles
    // -------------------------------------------------------------------------

    /// GET the most recent `limit` daily trade candles for `symbol` vs USD.
    #[instrument(skip(self, symbol), fields(symbol = %symbol), name = "bitfinex::get_candles")]
    pub async fn get_candles(&self, symbol: &Symbol, limit: u32) -> CandleFetch {
        let url = format!(
            "{}candles/trade:1D:{}/hist?limit={}",
            self.base_url,
            symbol.trading_pair(),
            limit
        );

        let resp = match self.transport.get(&url).await {
            Ok(resp) => resp,
            Err(e) => return CandleFetch::Unusable(e.to_string()),
        };

        if !resp.is_json() {
            return CandleFetch::Unusable(format!(
                "status {} with content type {:?}",
                resp.status, resp.content_type
            ));
        }

        let body: Value = match serde_json::from_str(&resp.body) {
            Ok(body) => body,
            Err(e) => return CandleFetch::Unusable(format!("invalid JSON: {e}")),
        };

        match &body {
            Value::Array(records) if records.is_empty() => CandleFetch::Empty,
            Value::Array(records) => {
                let series = parse_candles(records, limit as usize);
                if series.dropped > 0 {
                    debug!(kept = series.len(), dropped = series.dropped, "malformed candle records dropped");
                }
                CandleFetch::Series(series)
            }
            Value::Object(_) => CandleFetch::Unusable(body.to_string()),
            other => CandleFetch::Unusable(format!("unexpected body: {other}")),
        }
    }

    // -------------------------------------------------------------------------
    // Rates
    // -------------------------------------------------------------------------

    /// Latest close and average volume over the last `limit` days.
    ///
    /// `None` means the candle response was unusable and worth re-requesting.
    pub async fn get_rate(&self, symbol: &Symbol, limit: u32) -> Option<RateSummary> {
        let fetch = self.get_candles(symbol, limit).await;
        let today = Local::now().date_naive();
        summarize(symbol, fetch, today, limit, self.sink.as_ref())
    }

    /// Collector over this client that shares its sink and sleeper.
    pub fn collector(&self) -> RateCollector<'_> {
        RateCollector::new(self)
            .with_sink(self.sink.clone())
            .with_sleeper(self.sleeper.clone())
    }

    /// List symbols, then lazily yield one rate per symbol with retries.
    ///
    /// Listing failures are returned immediately; per-symbol failures become
    /// `None` items in the stream.
    pub async fn get_rates(
        &self,
        config: &ClientConfig,
    ) -> Result<BoxStream<'_, Option<RateSummary>>> {
        let symbols = self.get_symbols(config.usd_only).await?;
        info!(count = symbols.len(), "collecting rates");

        Ok(self
            .collector()
            .with_policy(config.retry)
            .with_limit(config.candle_limit)
            .into_stream(symbols))
    }
}

impl RateSource for BitfinexClient {
    fn rate<'a>(&'a self, symbol: &'a Symbol, limit: u32) -> BoxFuture<'a, Option<RateSummary>> {
        Box::pin(self.get_rate(symbol, limit))
    }
}

impl std::fmt::Debug for BitfinexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitfinexClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
