//! Rate summary: latest close plus average volume over a trailing window.
//!
//! The window is anchored to the caller's `today`, not to the newest candle.
//! When upstream data lags, fewer candles fall inside the window and the
//! average is taken over what is left (or is `0.0` if nothing is).

use chrono::{Days, NaiveDate};

use crate::sink::{EventSink, SinkEvent};
use crate::types::{Candle, CandleFetch, RateSummary, Symbol};

/// Last date excluded from a `days`-long window ending on `today`.
pub fn window_start(today: NaiveDate, days: u32) -> Option<NaiveDate> {
    today.checked_sub_days(Days::new(u64::from(days)))
}

/// Mean volume of candles dated strictly after `today - days`; `0.0` when no
/// candle qualifies.
pub fn average_volume(candles: &[Candle], today: NaiveDate, days: u32) -> f64 {
    let exclude_date = window_start(today, days);
    let volumes: Vec<f64> = candles
        .iter()
        .filter(|c| exclude_date.map_or(true, |d| c.timestamp.date() > d))
        .map(|c| c.volume)
        .collect();

    if volumes.is_empty() {
        0.0
    } else {
        volumes.iter().sum::<f64>() / volumes.len() as f64
    }
}

/// Turn a candle fetch into a summary.
///
/// * `Empty` yields the empty summary and warns.
/// * `Unusable` warns and yields `None` so the caller can re-request.
/// * `Series` yields `None` when no candle survived validation, otherwise the
///   full summary.
pub fn summarize(
    symbol: &Symbol,
    fetch: CandleFetch,
    today: NaiveDate,
    limit: u32,
    sink: &dyn EventSink,
) -> Option<RateSummary> {
    match fetch {
        CandleFetch::Empty => {
            sink.record(SinkEvent::EmptyCandles {
                symbol: symbol.clone(),
            });
            Some(RateSummary::empty(symbol.clone()))
        }
        CandleFetch::Unusable(reason) => {
            sink.record(SinkEvent::RerequestRequired {
                symbol: symbol.clone(),
                reason,
            });
            None
        }
        CandleFetch::Series(series) => {
            let latest = series.latest()?;
            let avg_volume = average_volume(&series.candles, today, limit);
            Some(RateSummary::new(
                symbol.clone(),
                latest.timestamp,
                latest.close,
                avg_volume,
            ))
        }
    }
}
