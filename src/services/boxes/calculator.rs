//! Multi-resolution box calculator.
//!
//! Holds one price window ("box") per multiplier of a [`BoxSizeTable`].
//! Each box has a fixed width `size = round(multiplier * point, digits)` and
//! slides up or down whenever a candle pushes through its edge. The sign of
//! the bucket's value records which edge was pushed last: positive after a
//! new high, negative after a new low. Its magnitude is always the
//! multiplier.
//!
//! State is kept as parallel arrays and mutated in place; the calculator
//! does no input validation, so NaN prices propagate.

use crate::services::{
    boxes::{
        common::{BoxSnapshot, BoxState, Candle},
        table::BoxSizeTable,
    },
    instruments::{self, InstrumentMeta},
};

/// `round(value * 10^digits) / 10^digits`
#[inline]
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

#[derive(Debug, Clone)]
pub struct BoxCalculator {
    meta: InstrumentMeta,
    table: BoxSizeTable,
    sizes: Vec<f64>,
    values: Vec<i64>,
    highs: Vec<f64>,
    lows: Vec<f64>,
}

impl BoxCalculator {
    pub fn new(symbol: &str, table: BoxSizeTable) -> Self {
        Self::with_meta(instruments::resolve(symbol), table)
    }

    pub fn with_meta(meta: InstrumentMeta, table: BoxSizeTable) -> Self {
        let sizes: Vec<f64> = table
            .iter()
            .map(|&m| round_to(m as f64 * meta.point, meta.digits))
            .collect();
        let n = sizes.len();

        Self {
            meta,
            table,
            sizes,
            values: vec![0; n],
            highs: vec![0.0; n],
            lows: vec![0.0; n],
        }
    }

    /// Anchor every box's top edge at `anchor` and restore positive values.
    pub fn reset(&mut self, anchor: f64) {
        for i in 0..self.sizes.len() {
            self.highs[i] = anchor;
            self.lows[i] = anchor - self.sizes[i];
            self.values[i] = self.table[i];
        }
    }

    /// Fold one candle's range into every box.
    pub fn fold(&mut self, high: f64, low: f64) {
        for i in 0..self.sizes.len() {
            if high > self.highs[i] {
                self.highs[i] = high;
                self.lows[i] = high - self.sizes[i];
                if self.values[i] < 0 {
                    self.values[i] = self.values[i].abs();
                }
            }

            if low < self.lows[i] {
                self.lows[i] = low;
                self.highs[i] = low + self.sizes[i];
                if self.values[i] > 0 {
                    self.values[i] = -self.values[i].abs();
                }
            }
        }
    }

    pub fn snapshot(&self) -> BoxSnapshot {
        self.table
            .iter()
            .enumerate()
            .map(|(i, &m)| {
                (
                    m,
                    BoxState {
                        high: self.highs[i],
                        low: self.lows[i],
                        value: self.values[i],
                    },
                )
            })
            .collect()
    }

    /// Reset on the last candle's close, then fold all candles in order.
    ///
    /// The anchor comes from the end of the window, so early candles are
    /// folded against a level they could not have known about. Batch callers
    /// rely on this; see [`LiveBoxes`](super::timeseries::LiveBoxes) for the
    /// streaming alternative.
    pub fn calculate_box_arrays(&mut self, candles: &[Candle]) -> BoxSnapshot {
        let Some(last) = candles.last() else {
            return BoxSnapshot::new();
        };

        self.reset(last.close);
        for c in candles {
            self.fold(c.high, c.low);
        }
        log::trace!(
            "boxes: folded {} candles into {} buckets",
            candles.len(),
            self.sizes.len()
        );
        self.snapshot()
    }

    pub fn meta(&self) -> InstrumentMeta {
        self.meta
    }

    pub fn table(&self) -> &BoxSizeTable {
        &self.table
    }

    pub fn sizes(&self) -> &[f64] {
        &self.sizes
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn highs(&self) -> &[f64] {
        &self.highs
    }

    pub fn lows(&self) -> &[f64] {
        &self.lows
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}
