//! Instrument price resolution.
//!
//! Every symbol maps to a `point` (smallest price step) and the number of
//! display `digits`. The table is built once and never mutated; anything
//! not in it resolves to [`DEFAULT_META`].

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InstrumentMeta {
    pub point: f64,
    pub digits: u32,
}

/// Fallback for unknown symbols (5-digit FX quote).
pub const DEFAULT_META: InstrumentMeta = InstrumentMeta {
    point: 0.00001,
    digits: 5,
};

const FX5: InstrumentMeta = DEFAULT_META;
const FX3: InstrumentMeta = InstrumentMeta { point: 0.001, digits: 3 };
const CENTS: InstrumentMeta = InstrumentMeta { point: 0.01, digits: 2 };
const MILLS: InstrumentMeta = InstrumentMeta { point: 0.001, digits: 3 };
const TENTHS: InstrumentMeta = InstrumentMeta { point: 0.1, digits: 1 };

static INSTRUMENTS: Lazy<HashMap<&'static str, InstrumentMeta>> = Lazy::new(|| {
    let groups: &[(&[&'static str], InstrumentMeta)] = &[
        (
            &[
                "EURUSD", "GBPUSD", "AUDUSD", "NZDUSD", "USDCAD", "USDCHF", "EURGBP",
                "EURAUD", "EURCAD", "EURCHF", "EURNZD", "GBPAUD", "GBPCAD", "GBPCHF",
                "GBPNZD", "AUDCAD", "AUDCHF", "AUDNZD", "NZDCAD", "NZDCHF", "CADCHF",
                "XRPUSD", "ADAUSD", "DOGEUSD",
            ],
            FX5,
        ),
        (
            &[
                "USDJPY", "EURJPY", "GBPJPY", "AUDJPY", "NZDJPY", "CADJPY", "CHFJPY",
            ],
            FX3,
        ),
        (&["BTCUSD", "ETHUSD", "XAUUSD", "BNBUSD"], CENTS),
        (&["SOLUSD", "LTCUSD", "XAGUSD"], MILLS),
        (&["US30", "NAS100", "SPX500", "GER40"], TENTHS),
    ];

    let mut table = HashMap::new();
    for (symbols, meta) in groups {
        for s in symbols.iter() {
            table.insert(*s, *meta);
        }
    }
    table
});

/// `eur/usd`, `EUR_USD` and ` eurusd ` all become `EURUSD`.
fn canonical(symbol: &str) -> String {
    symbol
        .trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '_' | '-'))
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Total lookup: unknown symbols get [`DEFAULT_META`].
pub fn resolve(symbol: &str) -> InstrumentMeta {
    match INSTRUMENTS.get(canonical(symbol).as_str()) {
        Some(meta) => *meta,
        None => {
            log::debug!("instruments: '{symbol}' unknown, using default point/digits");
            DEFAULT_META
        }
    }
}

pub fn is_known(symbol: &str) -> bool {
    INSTRUMENTS.contains_key(canonical(symbol).as_str())
}
