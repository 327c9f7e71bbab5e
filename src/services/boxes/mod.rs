pub mod calculator;
pub mod common;
pub mod table;
pub mod timeseries;
pub mod transitions;

pub use calculator::BoxCalculator;
pub use common::{BoxSnapshot, BoxState, Candle, Frame, Ohlc, TimeseriesEntry};
pub use table::{BoxSizeTable, DEFAULT_BOX_SIZES};
pub use timeseries::{build_timeseries, build_with_policy, AnchorPolicy, LiveBoxes};
pub use transitions::{process_frames, TransitionConfig, TransitionProcessor};
