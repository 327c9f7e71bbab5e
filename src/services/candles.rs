//! Candle intake: turns loosely-typed client candles into [`Candle`]s.
//!
//! OHLC fields may arrive as numbers, numeric strings or null. Timestamps
//! may be unix seconds, unix milliseconds, numeric strings or ISO-8601
//! strings; everything is converted to milliseconds. The box engine never
//! sees a candle that failed here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::{services::boxes::Candle, utils::errors::CandleError};

/// Epoch numbers below this are taken to be seconds (1e11 s is year 5138).
const SECONDS_CUTOFF: f64 = 1e11;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCandle {
    #[serde(default, alias = "time", alias = "t")]
    pub timestamp: Option<RawValue>,
    #[serde(default)]
    pub open: Option<RawValue>,
    #[serde(default)]
    pub high: Option<RawValue>,
    #[serde(default)]
    pub low: Option<RawValue>,
    #[serde(default)]
    pub close: Option<RawValue>,
}

impl RawCandle {
    pub fn normalize(&self) -> Result<Candle, CandleError> {
        let raw_ts = self
            .timestamp
            .as_ref()
            .ok_or(CandleError::MissingField("timestamp"))?;
        let timestamp = parse_timestamp(raw_ts)
            .ok_or_else(|| CandleError::BadTimestamp(display(raw_ts)))?;

        Ok(Candle {
            timestamp,
            open: price("open", &self.open)?,
            high: price("high", &self.high)?,
            low: price("low", &self.low)?,
            close: price("close", &self.close)?,
        })
    }
}

fn display(v: &RawValue) -> String {
    match v {
        RawValue::Number(n) => n.to_string(),
        RawValue::Text(s) => s.clone(),
    }
}

fn price(field: &'static str, v: &Option<RawValue>) -> Result<f64, CandleError> {
    let n = match v {
        None => return Err(CandleError::MissingField(field)),
        Some(RawValue::Number(n)) => *n,
        Some(RawValue::Text(s)) => s.trim().parse::<f64>().map_err(|_| CandleError::BadNumber {
            field,
            raw: s.clone(),
        })?,
    };
    if n.is_finite() {
        Ok(n)
    } else {
        Err(CandleError::NotFinite(field))
    }
}

/// `None` for epochs chrono cannot represent as a UTC datetime.
fn from_epoch(n: f64) -> Option<i64> {
    if !n.is_finite() {
        return None;
    }
    let ms = if n.abs() < SECONDS_CUTOFF { n * 1000.0 } else { n };
    let ms = ms.round();
    if ms.abs() >= i64::MAX as f64 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(ms as i64).map(|dt| dt.timestamp_millis())
}

/// Unix seconds / millis (number or string) or ISO-8601 → unix millis.
pub fn parse_timestamp(v: &RawValue) -> Option<i64> {
    let s = match v {
        RawValue::Number(n) => return from_epoch(*n),
        RawValue::Text(s) => s.trim(),
    };

    if let Ok(n) = s.parse::<f64>() {
        return from_epoch(n);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    // zone-less forms are read as UTC
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Result of normalizing a batch.
#[derive(Debug, Default)]
pub struct Intake {
    /// Valid candles, stably sorted by timestamp.
    pub candles: Vec<Candle>,
    /// Input index and reason for every dropped candle.
    pub rejected: Vec<(usize, CandleError)>,
}

pub fn normalize_candles(raw: &[RawCandle]) -> Intake {
    let mut intake = Intake::default();
    for (i, rc) in raw.iter().enumerate() {
        match rc.normalize() {
            Ok(c) => intake.candles.push(c),
            Err(e) => intake.rejected.push((i, e)),
        }
    }

    if !intake.rejected.is_empty() {
        log::warn!(
            "candle intake: dropped {} of {} candles (first: #{} {})",
            intake.rejected.len(),
            raw.len(),
            intake.rejected[0].0,
            intake.rejected[0].1
        );
    }

    intake.candles.sort_by_key(|c| c.timestamp);
    intake
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawCandle {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn seconds_and_millis_agree() {
        let a = parse_timestamp(&RawValue::Number(1_700_000_000.0));
        let b = parse_timestamp(&RawValue::Number(1_700_000_000_000.0));
        let c = parse_timestamp(&RawValue::Text("1700000000".into()));
        assert_eq!(a, Some(1_700_000_000_000));
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn iso_strings_parse() {
        let expected = Some(1_700_000_000_000);
        for s in [
            "2023-11-14T22:13:20Z",
            "2023-11-14T22:13:20.000Z",
            "2023-11-14T23:13:20+01:00",
            "2023-11-14T22:13:20",
            "2023-11-14 22:13:20",
        ] {
            assert_eq!(parse_timestamp(&RawValue::Text(s.into())), expected, "{s}");
        }
        assert_eq!(
            parse_timestamp(&RawValue::Text("2023-11-14".into())),
            Some(1_699_920_000_000)
        );
    }

    #[test]
    fn garbage_timestamp_is_none() {
        assert_eq!(parse_timestamp(&RawValue::Text("yesterday".into())), None);
        assert_eq!(parse_timestamp(&RawValue::Number(f64::NAN)), None);
    }

    #[test]
    fn out_of_range_epoch_is_none() {
        for n in [1e300, -1e300, 9.3e18, 1e17] {
            assert_eq!(parse_timestamp(&RawValue::Number(n)), None, "{n}");
        }
        assert_eq!(parse_timestamp(&RawValue::Text("1e300".into())), None);

        let e = raw(json!({"t": -1e300, "open": 1, "high": 1, "low": 1, "close": 1}))
            .normalize()
            .unwrap_err();
        assert!(matches!(e, CandleError::BadTimestamp(_)));
    }

    #[test]
    fn string_prices_and_aliases() {
        let c = raw(json!({"time": 1_700_000_000, "open": "1.1", "high": 1.2, "low": "1.0", "close": 1.15}))
            .normalize()
            .unwrap();
        assert_eq!(c.timestamp, 1_700_000_000_000);
        assert_eq!(c.open, 1.1);
        assert_eq!(c.low, 1.0);
    }

    #[test]
    fn null_field_is_rejected() {
        let e = raw(json!({"timestamp": 1, "open": 1.0, "high": null, "low": 1.0, "close": 1.0}))
            .normalize()
            .unwrap_err();
        assert_eq!(e, CandleError::MissingField("high"));
    }

    #[test]
    fn bad_number_is_rejected() {
        let e = raw(json!({"timestamp": 1, "open": "abc", "high": 1, "low": 1, "close": 1}))
            .normalize()
            .unwrap_err();
        assert!(matches!(e, CandleError::BadNumber { field: "open", .. }));
    }

    #[test]
    fn batch_drops_invalid_and_sorts() {
        let input = vec![
            raw(json!({"t": 3_000_000_000_000i64, "open": 1, "high": 1, "low": 1, "close": 1})),
            raw(json!({"t": "nope", "open": 1, "high": 1, "low": 1, "close": 1})),
            raw(json!({"t": 1_000_000_000_000i64, "open": 2, "high": 2, "low": 2, "close": 2})),
            raw(json!({"open": 1, "high": 1, "low": 1, "close": 1})),
        ];
        let intake = normalize_candles(&input);
        assert_eq!(intake.candles.len(), 2);
        assert_eq!(intake.candles[0].close, 2.0);
        assert_eq!(intake.rejected.len(), 2);
        assert_eq!(intake.rejected[0].0, 1);
        assert_eq!(intake.rejected[1].1, CandleError::MissingField("timestamp"));
    }
}
