// =============================================================================
// Rate Collector — one summary per symbol, with exponential backoff
// =============================================================================
//
// Symbols are processed strictly one after another. A symbol whose rate
// request keeps failing is retried with growing pauses until the attempt
// budget runs out, at which point the collector yields `None` for it and
// moves on. The output is a lazy stream: nothing is requested until the
// consumer polls, and dropping the stream stops all work.
// =============================================================================

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream, StreamExt};
use tracing::debug;

use crate::config::DEFAULT_CANDLE_LIMIT;
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::sink::{EventSink, SinkEvent, TracingSink};
use crate::types::{RateSummary, Symbol};

/// Anything that can produce a rate summary for one symbol.
///
/// `None` means the attempt was unusable and is worth repeating.
pub trait RateSource: Send + Sync {
    fn rate<'a>(&'a self, symbol: &'a Symbol, limit: u32) -> BoxFuture<'a, Option<RateSummary>>;
}

/// Drives a [`RateSource`] over a list of symbols.
pub struct RateCollector<'a> {
    source: &'a dyn RateSource,
    policy: RetryPolicy,
    limit: u32,
    sleeper: Arc<dyn Sleeper>,
    sink: Arc<dyn EventSink>,
}

impl<'a> RateCollector<'a> {
    /// Collector with the default policy (10 attempts, 30 s doubling), real
    /// sleeps and `tracing` warnings.
    pub fn new(source: &'a dyn RateSource) -> Self {
        Self {
            source,
            policy: RetryPolicy::default(),
            limit: DEFAULT_CANDLE_LIMIT,
            sleeper: Arc::new(TokioSleeper),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Candle count requested per symbol (also the averaging window in days).
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Ask for `symbol`'s rate until it comes back or the budget is spent.
    ///
    /// Every failed attempt is announced on the sink and followed by a pause,
    /// including the last one.
    pub async fn rate_with_retry(&self, symbol: &Symbol) -> Option<RateSummary> {
        for attempt in 0..self.policy.max_attempts {
            if let Some(rate) = self.source.rate(symbol, self.limit).await {
                return Some(rate);
            }

            let pause = self.policy.delay_for_attempt(attempt);
            self.sink.record(SinkEvent::RetryScheduled {
                symbol: symbol.clone(),
                pause,
            });
            self.sleeper.sleep(pause).await;
        }

        debug!(symbol = %symbol, attempts = self.policy.max_attempts, "retry budget exhausted");
        None
    }

    /// Lazily yield one result per symbol, in order.
    pub fn into_stream(self, symbols: Vec<Symbol>) -> BoxStream<'a, Option<RateSummary>> {
        stream::unfold(
            (self, symbols.into_iter()),
            |(collector, mut pending)| async move {
                let symbol = pending.next()?;
                let rate = collector.rate_with_retry(&symbol).await;
                Some((rate, (collector, pending)))
            },
        )
        .boxed()
    }
}
