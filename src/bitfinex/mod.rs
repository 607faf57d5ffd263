// =============================================================================
// Bitfinex public REST API
// =============================================================================

pub mod client;
pub mod parse;
pub mod transport;

pub use client::BitfinexClient;
pub use parse::{local_timestamp, parse_candle, parse_candles, ticker_base_currency, RecordRejection};
pub use transport::{HttpResponse, ReqwestTransport, StaticTransport, Transport};
