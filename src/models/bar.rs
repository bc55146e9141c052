use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One normalized price observation: a reference-zone timestamp plus a
/// mapping from lower-cased field name ("open", "close", "volume", ...) to
/// its value. Fields a feed did not deliver are simply absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub fields: BTreeMap<String, f64>,
}

impl PriceBar {
    pub fn new(timestamp: NaiveDateTime, fields: BTreeMap<String, f64>) -> Self {
        PriceBar { timestamp, fields }
    }

    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }
}

/// An ordered, deduplicated price series. Timestamps are strictly increasing;
/// after reconciliation a "close" field is guaranteed to be resolvable.
/// Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    bars: Vec<PriceBar>,
}

impl Series {
    /// Wrap externally supplied bars. No reconciliation guarantees apply;
    /// consumers must defend against missing fields themselves.
    pub fn from_bars(bars: Vec<PriceBar>) -> Self {
        Series { bars }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Union of field names across all bars.
    pub fn field_names(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for bar in &self.bars {
            for key in bar.fields.keys() {
                names.insert(key.clone());
            }
        }
        names.into_iter().collect()
    }

    /// Value of `field` on the bar `offset` positions from the end
    /// (0 = latest bar, 1 = previous bar).
    pub fn field_from_end(&self, field: &str, offset: usize) -> Option<f64> {
        if offset >= self.bars.len() {
            return None;
        }
        self.bars[self.bars.len() - 1 - offset].field(field)
    }
}
