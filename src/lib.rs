//! # bitfx-request
//!
//! Client for the public Bitfinex REST API
//! (`https://api-pub.bitfinex.com/v2/`).
//!
//! - [`BitfinexClient::get_symbols`] lists base currencies traded against USD.
//! - [`BitfinexClient::get_candles`] fetches recent daily candles for a symbol.
//! - [`BitfinexClient::get_rate`] summarises them into the latest close and
//!   the average volume over the last `limit` days.
//! - [`BitfinexClient::get_rates`] does that for every listed symbol, backing
//!   off exponentially while Bitfinex rate-limits the requests.
//!
//! ```rust,ignore
//! use bitfx_request::{BitfinexClient, ClientConfig};
//! use futures_util::StreamExt;
//!
//! let config = ClientConfig::default();
//! let client = BitfinexClient::new(&config)?;
//! let mut rates = client.get_rates(&config).await?;
//! while let Some(rate) = rates.next().await {
//!     println!("{rate:?}");
//! }
//! ```

pub mod bitfinex;
pub mod collector;
pub mod config;
pub mod error;
pub mod retry;
pub mod sink;
pub mod summary;
pub mod types;

pub use bitfinex::{BitfinexClient, HttpResponse, ReqwestTransport, StaticTransport, Transport};
pub use collector::{RateCollector, RateSource};
pub use config::ClientConfig;
pub use error::{BitfxError, Result};
pub use retry::{RecordingSleeper, RetryPolicy, Sleeper, TokioSleeper};
pub use sink::{EventSink, MemorySink, SinkEvent, TracingSink};
pub use types::{Candle, CandleFetch, CandleSeries, RateSummary, Symbol, REFERENCE_CURRENCY};
