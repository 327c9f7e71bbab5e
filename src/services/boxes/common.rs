// src/services/boxes/common.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A normalized candle. `timestamp` is unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn ohlc(&self) -> Ohlc {
        Ohlc {
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// One bucket as seen from outside the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxState {
    pub high: f64,
    pub low: f64,
    pub value: i64,
}

/// Multiplier → bucket state. Serializes as a JSON object with stringified
/// integer keys, e.g. `{"2": {...}, "1": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxSnapshot(BTreeMap<i64, BoxState>);

impl BoxSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, multiplier: i64, state: BoxState) {
        self.0.insert(multiplier, state);
    }

    pub fn get(&self, multiplier: i64) -> Option<&BoxState> {
        self.0.get(&multiplier)
    }

    /// Overwrite only the signed value of an existing bucket.
    pub fn set_value(&mut self, multiplier: i64, value: i64) {
        if let Some(b) = self.0.get_mut(&multiplier) {
            b.value = value;
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ascending by multiplier.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (i64, &BoxState)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    /// Largest box first. This is the order the transition processor slices.
    pub fn iter_desc(&self) -> impl Iterator<Item = (i64, &BoxState)> {
        self.iter().rev()
    }
}

impl FromIterator<(i64, BoxState)> for BoxSnapshot {
    fn from_iter<I: IntoIterator<Item = (i64, BoxState)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One snapshot per input candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesEntry {
    pub timestamp: i64,
    pub boxes: BoxSnapshot,
    #[serde(rename = "currentOHLC")]
    pub current_ohlc: Ohlc,
}

/// A display frame: either a real timeseries entry or one synthesized while
/// the dominant box flips sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub timestamp: i64,
    pub boxes: BoxSnapshot,
    #[serde(rename = "currentOHLC")]
    pub current_ohlc: Ohlc,
    #[serde(default)]
    pub synthetic: bool,
}

impl Frame {
    pub fn real(entry: TimeseriesEntry) -> Self {
        Self {
            timestamp: entry.timestamp,
            boxes: entry.boxes,
            current_ohlc: entry.current_ohlc,
            synthetic: false,
        }
    }
}

impl From<TimeseriesEntry> for Frame {
    fn from(entry: TimeseriesEntry) -> Self {
        Frame::real(entry)
    }
}
