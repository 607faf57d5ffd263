// =============================================================================
// Event Sink — warnings raised while summarising and retrying
// =============================================================================
//
// The summariser and the batch collector never talk to a global logger
// directly. They hand events to an `EventSink`; the binary uses
// `TracingSink`, which turns every event into a `warn!`. `MemorySink` keeps
// the events for callers that want to inspect them afterwards.
// =============================================================================

use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

use crate::types::Symbol;

/// Something worth warning about on the way to a rate summary.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// Upstream returned an empty candle list for `symbol`.
    EmptyCandles { symbol: Symbol },
    /// The candle response for `symbol` was unusable.
    RerequestRequired { symbol: Symbol, reason: String },
    /// A rate request failed and the collector is about to pause.
    RetryScheduled { symbol: Symbol, pause: Duration },
}

pub trait EventSink: Send + Sync {
    fn record(&self, event: SinkEvent);
}

/// Forwards every event to `tracing` at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: SinkEvent) {
        match event {
            SinkEvent::EmptyCandles { symbol } => {
                warn!(symbol = %symbol, "empty candles list");
            }
            SinkEvent::RerequestRequired { symbol, reason } => {
                warn!(symbol = %symbol, "re-request required: {reason}");
            }
            SinkEvent::RetryScheduled { symbol, pause } => {
                warn!(
                    symbol = %symbol,
                    pause_secs = pause.as_secs_f64(),
                    "unsuccessful rate request for {symbol}. sleeping: {} sec",
                    pause.as_secs_f64()
                );
            }
        }
    }
}

/// In-memory sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SinkEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far, oldest first.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Pauses of every `RetryScheduled` event, in order.
    pub fn retry_pauses(&self) -> Vec<Duration> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SinkEvent::RetryScheduled { pause, .. } => Some(*pause),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: SinkEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_events_in_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.record(SinkEvent::EmptyCandles {
            symbol: Symbol::from("XRP"),
        });
        sink.record(SinkEvent::RetryScheduled {
            symbol: Symbol::from("BTC"),
            pause: Duration::from_secs(30),
        });
        sink.record(SinkEvent::RetryScheduled {
            symbol: Symbol::from("BTC"),
            pause: Duration::from_secs(60),
        });

        assert_eq!(sink.len(), 3);
        assert_eq!(
            sink.events()[0],
            SinkEvent::EmptyCandles {
                symbol: Symbol::from("XRP")
            }
        );
        assert_eq!(
            sink.retry_pauses(),
            vec![Duration::from_secs(30), Duration::from_secs(60)]
        );
    }

    #[test]
    fn tracing_sink_accepts_every_event_kind() {
        let sink = TracingSink;
        sink.record(SinkEvent::EmptyCandles {
            symbol: Symbol::from("XRP"),
        });
        sink.record(SinkEvent::RerequestRequired {
            symbol: Symbol::from("BTC"),
            reason: "[\"error\",11010,\"ratelimit: error\"]".to_string(),
        });
        sink.record(SinkEvent::RetryScheduled {
            symbol: Symbol::from("BTC"),
            pause: Duration::from_secs(30),
        });
    }
}
