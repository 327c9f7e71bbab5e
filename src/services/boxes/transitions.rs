//! Trend/frame transitions for display.
//!
//! Walks a box timeseries and produces the frames a renderer draws. When the
//! dominant visible box (largest `|value|`) changes sign between two real
//! entries, a handful of synthetic frames are inserted in between that flip
//! the visible boxes over progressively, smallest first. Entries whose
//! visible values did not move are dropped.
//!
//! Pure list-in/list-out: no clocks, no rendering.

use std::collections::VecDeque;

use crate::services::boxes::common::{BoxSnapshot, Frame, TimeseriesEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionConfig {
    /// Synthetic frames per sign flip.
    pub steps: usize,
    /// Minimum value change that makes a same-sign entry worth emitting.
    /// Box values are whole multipliers, so the default only filters exact
    /// repeats.
    pub epsilon: f64,
    /// Display buffer cap; oldest frames are dropped.
    pub max_frames: usize,
    /// Visible slice over the boxes, largest box first.
    pub visible_offset: usize,
    pub visible_count: Option<usize>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            steps: 4,
            epsilon: 1e-6,
            max_frames: 1000,
            visible_offset: 0,
            visible_count: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransitionProcessor {
    cfg: TransitionConfig,
    frames: VecDeque<Frame>,
    prev: Option<TimeseriesEntry>,
}

impl TransitionProcessor {
    pub fn new(cfg: TransitionConfig) -> Self {
        Self {
            cfg,
            frames: VecDeque::new(),
            prev: None,
        }
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.cfg
    }

    pub fn frames(&self) -> &VecDeque<Frame> {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames.into()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// `(multiplier, value)` pairs of the visible slice.
    pub fn visible_values(&self, boxes: &BoxSnapshot) -> Vec<(i64, i64)> {
        let take = self.cfg.visible_count.unwrap_or(usize::MAX);
        boxes
            .iter_desc()
            .skip(self.cfg.visible_offset)
            .take(take)
            .map(|(k, b)| (k, b.value))
            .collect()
    }

    /// Exact comparison of the visible values.
    pub fn is_frame_duplicate(&self, a: &BoxSnapshot, b: &BoxSnapshot) -> bool {
        let (a, b) = (self.visible_values(a), self.visible_values(b));
        a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.1 == y.1)
    }

    /// Feed the next real entry. Returns how many frames were appended.
    pub fn push(&mut self, next: TimeseriesEntry) -> usize {
        let Some(prev) = self.prev.take() else {
            let n = self.add_direct(&next);
            self.prev = Some(next);
            return n;
        };

        let prev_slice = self.visible_values(&prev.boxes);
        let next_slice = self.visible_values(&next.boxes);

        let appended = match (dominant(&prev_slice), dominant(&next_slice)) {
            (Some(pd), Some(nd)) if (pd >= 0) != (nd >= 0) => {
                let old_sign = if pd >= 0 { 1 } else { -1 };
                self.interpolate(&prev, &next, &prev_slice, old_sign, -old_sign);
                self.append(Frame::real(next.clone()));
                self.cfg.steps + 1
            }
            (Some(_), Some(_)) => {
                if values_changed(&prev_slice, &next_slice, self.cfg.epsilon) {
                    self.add_direct(&next)
                } else {
                    log::trace!("transitions: unchanged entry at {} skipped", next.timestamp);
                    0
                }
            }
            // nothing visible on one side: treat as a discontinuity
            _ => self.add_direct(&next),
        };

        self.prev = Some(next);
        appended
    }

    fn add_direct(&mut self, entry: &TimeseriesEntry) -> usize {
        if let Some(last) = self.frames.back() {
            if self.is_frame_duplicate(&last.boxes, &entry.boxes) {
                return 0;
            }
        }
        self.append(Frame::real(entry.clone()));
        1
    }

    fn interpolate(
        &mut self,
        prev: &TimeseriesEntry,
        next: &TimeseriesEntry,
        prev_slice: &[(i64, i64)],
        old_sign: i64,
        new_sign: i64,
    ) {
        let steps = self.cfg.steps;
        let n = prev_slice.len();

        // flip order: smallest |value| first, stable on ties
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| prev_slice[i].1.abs());

        // i128 so extreme timestamps can't overflow; results lie in [prev, next]
        let (from, to) = (prev.timestamp as i128, next.timestamp as i128);
        let span = (to - from).max(0);
        log::debug!(
            "transitions: dominant sign flip at {}, inserting {steps} frames",
            next.timestamp
        );

        for k in 1..=steps {
            let due = (n * k).div_ceil(steps);
            let mut boxes = prev.boxes.clone();
            for (rank, &i) in order.iter().enumerate() {
                let (key, value) = prev_slice[i];
                let sign = if rank < due { new_sign } else { old_sign };
                boxes.set_value(key, value.abs() * sign);
            }

            self.append(Frame {
                timestamp: (from + span * k as i128 / (steps as i128 + 1)) as i64,
                boxes,
                current_ohlc: prev.current_ohlc,
                synthetic: true,
            });
        }
    }

    fn append(&mut self, frame: Frame) {
        self.frames.push_back(frame);
        while self.frames.len() > self.cfg.max_frames.max(1) {
            self.frames.pop_front();
        }
    }
}

/// Value with the greatest magnitude; the first one wins ties.
fn dominant(slice: &[(i64, i64)]) -> Option<i64> {
    let mut best: Option<i64> = None;
    for &(_, v) in slice {
        match best {
            Some(b) if b.abs() >= v.abs() => {}
            _ => best = Some(v),
        }
    }
    best
}

/// Values are integers, so any `epsilon` below 1 reduces this to an
/// inequality test.
fn values_changed(prev: &[(i64, i64)], next: &[(i64, i64)], epsilon: f64) -> bool {
    prev.len() != next.len()
        || prev
            .iter()
            .zip(next)
            .any(|(a, b)| a.1.abs_diff(b.1) as f64 > epsilon)
}

/// Run a whole timeseries through a fresh processor.
pub fn process_frames<I>(entries: I, cfg: TransitionConfig) -> Vec<Frame>
where
    I: IntoIterator<Item = TimeseriesEntry>,
{
    let mut proc = TransitionProcessor::new(cfg);
    for e in entries {
        proc.push(e);
    }
    proc.into_frames()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::boxes::common::{BoxState, Ohlc};

    const OHLC: Ohlc = Ohlc { open: 1.0, high: 1.0, low: 1.0, close: 1.0 };

    fn entry(ts: i64, values: &[(i64, i64)]) -> TimeseriesEntry {
        TimeseriesEntry {
            timestamp: ts,
            boxes: values
                .iter()
                .map(|&(k, v)| (k, BoxState { high: 2.0, low: 1.0, value: v }))
                .collect(),
            current_ohlc: OHLC,
        }
    }

    fn values_of(f: &Frame) -> Vec<i64> {
        f.boxes.iter_desc().map(|(_, b)| b.value).collect()
    }

    #[test]
    fn first_entry_is_added() {
        let mut p = TransitionProcessor::new(TransitionConfig::default());
        assert_eq!(p.push(entry(0, &[(5, 5)])), 1);
        assert!(!p.frames()[0].synthetic);
    }

    #[test]
    fn dominant_flip_inserts_four_frames() {
        let mut p = TransitionProcessor::new(TransitionConfig::default());
        p.push(entry(1_000, &[(5, 5), (3, 3), (2, -2)]));
        let added = p.push(entry(6_000, &[(5, -5), (3, -3), (2, -2)]));
        assert_eq!(added, 5);
        assert_eq!(p.len(), 6);

        let ts: Vec<i64> = p.frames().iter().map(|f| f.timestamp).collect();
        assert_eq!(ts, vec![1_000, 2_000, 3_000, 4_000, 5_000, 6_000]);
        assert!(p.frames().iter().skip(1).take(4).all(|f| f.synthetic));
        assert!(!p.frames()[5].synthetic);
    }

    #[test]
    fn flip_progresses_smallest_boxes_first() {
        let mut p = TransitionProcessor::new(TransitionConfig::default());
        p.push(entry(0, &[(5, 5), (3, 3), (2, -2), (1, 1)]));
        p.push(entry(500, &[(5, -5), (3, -3), (2, -2), (1, -1)]));

        let steps: Vec<Vec<i64>> = p.frames().iter().skip(1).take(4).map(values_of).collect();
        // ascending |value|: 1, 2, 3, 5 → one more flips per step
        assert_eq!(steps[0], vec![5, 3, 2, -1]);
        assert_eq!(steps[1], vec![5, 3, -2, -1]);
        assert_eq!(steps[2], vec![5, -3, -2, -1]);
        assert_eq!(steps[3], vec![-5, -3, -2, -1]);
    }

    #[test]
    fn synthetic_frames_keep_prev_ranges() {
        let mut p = TransitionProcessor::new(TransitionConfig::default());
        p.push(entry(0, &[(2, 2)]));
        let mut next = entry(10, &[(2, -2)]);
        next.boxes.insert(2, BoxState { high: 0.5, low: 0.4, value: -2 });
        p.push(next);
        let f = &p.frames()[1];
        assert_eq!(f.boxes.get(2).unwrap().high, 2.0);
        assert_eq!(f.current_ohlc, OHLC);
    }

    #[test]
    fn unchanged_entry_is_skipped() {
        let mut p = TransitionProcessor::new(TransitionConfig::default());
        p.push(entry(0, &[(5, 5), (1, -1)]));
        assert_eq!(p.push(entry(1, &[(5, 5), (1, -1)])), 0);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn same_sign_change_is_emitted() {
        let mut p = TransitionProcessor::new(TransitionConfig::default());
        p.push(entry(0, &[(5, 5), (1, -1)]));
        assert_eq!(p.push(entry(1, &[(5, 5), (1, 1)])), 1);
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn empty_visible_slice_is_a_discontinuity() {
        let cfg = TransitionConfig { visible_offset: 3, ..Default::default() };
        let mut p = TransitionProcessor::new(cfg);
        p.push(entry(0, &[(5, 5), (1, 1)]));
        // nothing visible, so both entries look identical and only one is kept
        assert_eq!(p.push(entry(1, &[(5, -5), (1, -1)])), 0);
        assert_eq!(p.len(), 1);

        let mut p = TransitionProcessor::new(TransitionConfig::default());
        p.push(entry(0, &[]));
        assert_eq!(p.push(entry(1, &[(5, -5)])), 1);
    }

    #[test]
    fn visible_slice_limits_dominant() {
        // the 9-box is hidden, so the 4-box decides the sign
        let cfg = TransitionConfig { visible_offset: 1, ..Default::default() };
        let mut p = TransitionProcessor::new(cfg);
        p.push(entry(0, &[(9, 9), (4, 4), (1, 1)]));
        assert_eq!(p.push(entry(10, &[(9, 9), (4, -4), (1, -1)])), 5);
    }

    #[test]
    fn buffer_is_capped() {
        let cfg = TransitionConfig { max_frames: 3, ..Default::default() };
        let entries: Vec<_> = (0..10)
            .map(|i| entry(i, &[(5, 5), (1, if i % 2 == 0 { 1 } else { -1 })]))
            .collect();
        let frames = process_frames(entries, cfg);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames.last().unwrap().timestamp, 9);
    }

    #[test]
    fn zero_span_interpolates_to_prev_time() {
        let mut p = TransitionProcessor::new(TransitionConfig::default());
        p.push(entry(100, &[(1, 1)]));
        p.push(entry(90, &[(1, -1)]));
        assert!(p.frames().iter().skip(1).take(4).all(|f| f.timestamp == 100));
    }

    #[test]
    fn extreme_timestamps_interpolate_without_overflow() {
        let mut p = TransitionProcessor::new(TransitionConfig::default());
        p.push(entry(i64::MIN, &[(5, 5)]));
        assert_eq!(p.push(entry(i64::MAX, &[(5, -5)])), 5);
        let ts: Vec<i64> = p.frames().iter().map(|f| f.timestamp).collect();
        assert!(ts.windows(2).all(|w| w[0] < w[1]));

        let mut p = TransitionProcessor::new(TransitionConfig::default());
        p.push(entry(0, &[(5, 5)]));
        p.push(entry(4_000_000_000_000_000_000, &[(5, -5)]));
        assert_eq!(p.frames()[1].timestamp, 800_000_000_000_000_000);
        assert_eq!(p.frames()[4].timestamp, 3_200_000_000_000_000_000);
    }

    #[test]
    fn epsilon_below_one_detects_any_change() {
        let cfg = TransitionConfig { epsilon: 0.5, ..Default::default() };
        let mut p = TransitionProcessor::new(cfg);
        p.push(entry(0, &[(5, 5), (1, 1)]));
        assert_eq!(p.push(entry(1, &[(5, 5), (1, 1)])), 0);
        assert_eq!(p.push(entry(2, &[(5, 5), (1, -1)])), 1);
    }

    #[test]
    fn duplicate_check_is_exact() {
        let p = TransitionProcessor::new(TransitionConfig::default());
        let a = entry(0, &[(2, 2), (1, 1)]).boxes;
        let b = entry(9, &[(2, 2), (1, 1)]).boxes;
        let c = entry(0, &[(2, 2), (1, -1)]).boxes;
        let d = entry(0, &[(2, 2)]).boxes;
        assert!(p.is_frame_duplicate(&a, &b));
        assert!(!p.is_frame_duplicate(&a, &c));
        assert!(!p.is_frame_duplicate(&a, &d));
    }

    #[test]
    fn dominant_prefers_first_on_ties() {
        assert_eq!(dominant(&[(3, -3), (2, 3)]), Some(-3));
        assert_eq!(dominant(&[]), None);
    }
}
