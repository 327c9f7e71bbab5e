// src/services/boxes/table.rs
use serde::{Serialize, Serializer};
use std::{ops::Deref, sync::Arc};

/// Default multipliers, largest box first.
pub const DEFAULT_BOX_SIZES: [i64; 38] = [
    2000, 1732, 1500, 1299, 1125, 974, 843, 730, 632, 548, 474, 411, 356, 308, 267, 231, 200,
    173, 150, 130, 112, 97, 84, 73, 63, 55, 47, 41, 36, 31, 27, 23, 20, 17, 15, 13, 11, 10,
];

/// Ordered, read-only box size multipliers. Cloning shares the backing slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxSizeTable(Arc<[i64]>);

impl BoxSizeTable {
    /// Multipliers must be positive; untrusted input goes through
    /// [`BoxSizeTable::try_new`] or [`BoxSizeTable::parse`].
    pub fn new(sizes: impl Into<Vec<i64>>) -> Self {
        let sizes: Vec<i64> = sizes.into();
        Self(Arc::from(sizes))
    }

    /// Parse a comma-separated override such as `"100, 50,25"`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let sizes = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| format!("box size '{s}' is not an integer"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::try_new(sizes)
    }

    /// Like [`BoxSizeTable::new`], but rejects an empty table and any
    /// multiplier that is not strictly positive.
    pub fn try_new(sizes: Vec<i64>) -> Result<Self, String> {
        if sizes.is_empty() {
            return Err("box size table is empty".into());
        }
        if let Some(bad) = sizes.iter().find(|&&m| m <= 0) {
            return Err(format!("box size multipliers must be positive, got {bad}"));
        }
        Ok(Self::new(sizes))
    }
}

impl Default for BoxSizeTable {
    fn default() -> Self {
        Self::new(DEFAULT_BOX_SIZES.to_vec())
    }
}

impl Deref for BoxSizeTable {
    type Target = [i64];

    fn deref(&self) -> &[i64] {
        &self.0
    }
}

impl Serialize for BoxSizeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}
