// src/services/boxes/timeseries.rs
use serde::Deserialize;

use crate::services::boxes::{
    calculator::BoxCalculator,
    common::{Candle, TimeseriesEntry},
};

/// How a series of snapshots is anchored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPolicy {
    /// Every prefix is recomputed from scratch and anchored on its own last
    /// close. Matches `calculate_box_arrays` exactly.
    #[default]
    PerPrefix,
    /// Anchor once on the first close and keep folding ([`LiveBoxes`]).
    Fixed,
}

/// One entry per candle; entry `i` is `calculate_box_arrays(&candles[..=i])`.
///
/// Quadratic in the number of candles, kept that way so each entry matches
/// what a fresh calculation over the same prefix returns.
pub fn build_timeseries(calc: &mut BoxCalculator, candles: &[Candle]) -> Vec<TimeseriesEntry> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| TimeseriesEntry {
            timestamp: c.timestamp,
            boxes: calc.calculate_box_arrays(&candles[..=i]),
            current_ohlc: c.ohlc(),
        })
        .collect()
}

pub fn build_with_policy(
    calc: BoxCalculator,
    candles: &[Candle],
    policy: AnchorPolicy,
) -> Vec<TimeseriesEntry> {
    match policy {
        AnchorPolicy::PerPrefix => {
            let mut calc = calc;
            build_timeseries(&mut calc, candles)
        }
        AnchorPolicy::Fixed => {
            let mut live = LiveBoxes::new(calc);
            candles.iter().map(|c| live.push(c)).collect()
        }
    }
}

/// Streaming boxes: anchored on the first candle's close, then each candle is
/// folded into the same state in O(buckets).
///
/// Only the first entry agrees with [`build_timeseries`]; afterwards the
/// values differ because the batch form re-anchors on every prefix.
#[derive(Debug, Clone)]
pub struct LiveBoxes {
    calc: BoxCalculator,
    anchored: bool,
}

impl LiveBoxes {
    pub fn new(calc: BoxCalculator) -> Self {
        Self { calc, anchored: false }
    }

    pub fn push(&mut self, candle: &Candle) -> TimeseriesEntry {
        if !self.anchored {
            self.calc.reset(candle.close);
            self.anchored = true;
        }
        self.calc.fold(candle.high, candle.low);

        TimeseriesEntry {
            timestamp: candle.timestamp,
            boxes: self.calc.snapshot(),
            current_ohlc: candle.ohlc(),
        }
    }

    /// Forget the anchor; the next pushed candle re-anchors.
    pub fn reset(&mut self) {
        self.anchored = false;
    }

    pub fn calculator(&self) -> &BoxCalculator {
        &self.calc
    }
}
