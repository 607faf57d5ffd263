// =============================================================================
// Bitfinex payload shaping — ticker identifiers and candle records
// =============================================================================
//
// Ticker identifier layout:
//   [0]    type tag ('t' trading pair, 'f' funding)
//   [1..4] base currency
//   [4..]  quote currency; pairs are at least 7 characters long
//
// Candle record layout:
//   [0] MTS (ms since epoch), [1] OPEN, [2] CLOSE, [3] HIGH, [4] LOW, [5] VOLUME
// =============================================================================

use chrono::{Local, NaiveDateTime, TimeZone};
use serde_json::Value;
use thiserror::Error;

use crate::types::{Candle, CandleSeries, Symbol, REFERENCE_CURRENCY};

/// Shortest identifier that is a currency pair rather than a funding symbol.
const MIN_PAIR_ID_LEN: usize = 7;

const CANDLE_FIELDS: usize = 6;
const CANDLE_MTS: usize = 0;
const CANDLE_CLOSE: usize = 2;
const CANDLE_VOLUME: usize = 5;

/// Base currency of a ticker record, or `None` when the record is skipped.
pub fn ticker_base_currency(record: &Value, usd_only: bool) -> Option<Symbol> {
    let id = record.as_array()?.first()?.as_str()?;

    let chars: Vec<char> = id.chars().collect();
    if chars.len() < MIN_PAIR_ID_LEN {
        return None;
    }
    if usd_only && !id.ends_with(REFERENCE_CURRENCY) {
        return None;
    }

    Some(Symbol::new(chars[1..4].iter().collect::<String>()))
}

/// Why a raw candle record was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordRejection {
    #[error("candle record is not an array")]
    NotAnArray,
    #[error("candle record has {found} fields, expected 6")]
    FieldCount { found: usize },
    #[error("candle timestamp is not an integer")]
    NonIntegerTimestamp,
    #[error("candle timestamp {0} ms is out of range")]
    TimestampOutOfRange(i64),
    #[error("candle field {index} is not a number")]
    NonNumericField { index: usize },
}

/// Local wall-clock time of a millisecond epoch timestamp, floored to the
/// second.
pub fn local_timestamp(millis: i64) -> Option<NaiveDateTime> {
    Local
        .timestamp_opt(millis.div_euclid(1000), 0)
        .single()
        .map(|dt| dt.naive_local())
}

/// Validate one raw candle record.
pub fn parse_candle(record: &Value) -> Result<Candle, RecordRejection> {
    let fields = record.as_array().ok_or(RecordRejection::NotAnArray)?;
    if fields.len() != CANDLE_FIELDS {
        return Err(RecordRejection::FieldCount {
            found: fields.len(),
        });
    }

    let millis = fields[CANDLE_MTS]
        .as_i64()
        .ok_or(RecordRejection::NonIntegerTimestamp)?;
    let timestamp =
        local_timestamp(millis).ok_or(RecordRejection::TimestampOutOfRange(millis))?;

    let number = |index: usize| {
        fields[index]
            .as_f64()
            .ok_or(RecordRejection::NonNumericField { index })
    };

    Ok(Candle {
        timestamp,
        close: number(CANDLE_CLOSE)?,
        volume: number(CANDLE_VOLUME)?,
    })
}

/// Validate every record, keeping at most `limit` candles in upstream order.
pub fn parse_candles(records: &[Value], limit: usize) -> CandleSeries {
    let mut candles = Vec::with_capacity(records.len().min(limit));
    let mut dropped = 0;

    for record in records {
        if candles.len() == limit {
            break;
        }
        match parse_candle(record) {
            Ok(candle) => candles.push(candle),
            Err(_) => dropped += 1,
        }
    }

    CandleSeries::new(candles, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ticker_yields_base_currency_of_usd_pairs() {
        let record = json!(["tBTCUSD", 8000.0, 1.0, 8001.0, 2.0]);
        assert_eq!(
            ticker_base_currency(&record, true),
            Some(Symbol::from("BTC"))
        );
    }

    #[test]
    fn ticker_skips_funding_symbols() {
        let record = json!(["fUSD", 0.0001, 0.0002]);
        assert_eq!(ticker_base_currency(&record, true), None);
        assert_eq!(ticker_base_currency(&record, false), None);
    }

    #[test]
    fn ticker_non_usd_pairs_depend_on_filter() {
        let record = json!(["tETHBTC", 0.02]);
        assert_eq!(ticker_base_currency(&record, true), None);
        assert_eq!(
            ticker_base_currency(&record, false),
            Some(Symbol::from("ETH"))
        );
    }

    #[test]
    fn ticker_uses_fixed_offset_for_long_identifiers() {
        let record = json!(["tTESTBTC:TESTUSD", 1.0]);
        assert_eq!(
            ticker_base_currency(&record, true),
            Some(Symbol::from("TES"))
        );
    }

    #[test]
    fn ticker_skips_records_without_string_identifier() {
        assert_eq!(ticker_base_currency(&json!([42, 1.0]), true), None);
        assert_eq!(ticker_base_currency(&json!({"id": "tBTCUSD"}), true), None);
        assert_eq!(ticker_base_currency(&json!([]), true), None);
    }

    #[test]
    fn candle_takes_close_and_volume_fields() {
        let record = json!([1_570_334_400_000_i64, 8100.0, 8038.2, 8200.0, 7950.0, 3629.81546451]);
        let candle = parse_candle(&record).unwrap();

        assert_eq!(candle.timestamp, local_timestamp(1_570_334_400_000).unwrap());
        assert!((candle.close - 8038.2).abs() < 1e-9);
        assert!((candle.volume - 3629.81546451).abs() < 1e-9);
    }

    #[test]
    fn candle_timestamp_is_floored_to_the_second() {
        let record = json!([1_570_334_400_999_i64, 1.0, 2.0, 3.0, 0.5, 4.0]);
        let candle = parse_candle(&record).unwrap();
        let expected = Local
            .timestamp_opt(1_570_334_400, 0)
            .unwrap()
            .naive_local();
        assert_eq!(candle.timestamp, expected);
    }

    #[test]
    fn candle_rejects_wrong_field_count() {
        let short = json!([1_570_334_400_000_i64, 1.0, 2.0, 3.0, 4.0]);
        let long = json!([1_570_334_400_000_i64, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert_eq!(
            parse_candle(&short),
            Err(RecordRejection::FieldCount { found: 5 })
        );
        assert_eq!(
            parse_candle(&long),
            Err(RecordRejection::FieldCount { found: 7 })
        );
    }

    #[test]
    fn candle_rejects_non_integer_timestamp() {
        let float_ts = json!([1_570_334_400_000.5, 1.0, 2.0, 3.0, 0.5, 4.0]);
        let string_ts = json!(["1570334400000", 1.0, 2.0, 3.0, 0.5, 4.0]);

        assert_eq!(parse_candle(&float_ts), Err(RecordRejection::NonIntegerTimestamp));
        assert_eq!(parse_candle(&string_ts), Err(RecordRejection::NonIntegerTimestamp));
    }

    #[test]
    fn candle_rejects_non_numeric_volume() {
        let record = json!([1_570_334_400_000_i64, 1.0, 2.0, 3.0, 0.5, "lots"]);
        assert_eq!(
            parse_candle(&record),
            Err(RecordRejection::NonNumericField { index: 5 })
        );
    }

    #[test]
    fn candles_drop_malformed_records_and_keep_order() {
        let records = vec![
            json!([1_570_334_400_000_i64, 1.0, 30.0, 3.0, 0.5, 300.0]),
            json!(["error", 10020, "limit: invalid"]),
            json!([1_570_248_000_000_i64, 1.0, 20.0, 3.0, 0.5, 200.0]),
            json!([1_570_161_600_000.0, 1.0, 10.0, 3.0, 0.5, 100.0]),
        ];

        let series = parse_candles(&records, 10);

        assert_eq!(series.len(), 2);
        assert_eq!(series.dropped, 2);
        assert!((series.candles[0].close - 30.0).abs() < f64::EPSILON);
        assert!((series.candles[1].close - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn candles_never_exceed_limit() {
        let records: Vec<Value> = (0..15_i64)
            .map(|i| json!([1_570_334_400_000 - i * 86_400_000, 1.0, 2.0, 3.0, 0.5, 4.0]))
            .collect();

        let series = parse_candles(&records, 10);

        assert_eq!(series.len(), 10);
        assert_eq!(series.dropped, 0);
        assert_eq!(
            series.latest().map(|c| c.timestamp),
            local_timestamp(1_570_334_400_000)
        );
    }
}
