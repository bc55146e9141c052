use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw column header as delivered by a price feed.
///
/// Feeds sometimes return composite (multi-level) headers like
/// `("Close", "SPX")` instead of a plain name. Both shapes normalize to one
/// canonical lower-cased key via [`ColumnHeader::normalize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnHeader {
    Simple(String),
    Composite(Vec<String>),
}

impl ColumnHeader {
    /// Canonical column key: first non-empty component (fallback: first
    /// component), trimmed and lower-cased.
    pub fn normalize(&self) -> String {
        match self {
            ColumnHeader::Simple(name) => name.trim().to_lowercase(),
            ColumnHeader::Composite(parts) => {
                let part = parts
                    .iter()
                    .find(|p| !p.trim().is_empty())
                    .or_else(|| parts.first());
                match part {
                    Some(p) => p.trim().to_lowercase(),
                    None => String::new(),
                }
            }
        }
    }
}

/// A raw row timestamp, which may or may not carry a timezone.
///
/// Daily feeds tend to deliver naive dates while intraday feeds deliver
/// offset-aware datetimes. The two must never be compared directly;
/// [`RawTimestamp::normalize`] brings both into the reference zone (UTC)
/// and drops the offset.
#[derive(Debug, Clone, Copy)]
pub enum RawTimestamp {
    /// Already in the reference zone, no offset attached.
    Naive(NaiveDateTime),
    /// Carries an explicit UTC offset.
    Aware(DateTime<FixedOffset>),
}

impl RawTimestamp {
    /// Uniform instant for merging and ordering: aware values are converted
    /// to UTC and stripped of their offset, naive values pass through.
    pub fn normalize(&self) -> NaiveDateTime {
        match self {
            RawTimestamp::Naive(dt) => *dt,
            RawTimestamp::Aware(dt) => dt.with_timezone(&Utc).naive_utc(),
        }
    }
}

/// One raw observation: a timestamp plus one cell per column.
/// A `None` cell means the feed had no value there (kept absent, not an error).
#[derive(Debug, Clone)]
pub struct RawRow {
    pub timestamp: RawTimestamp,
    pub values: Vec<Option<f64>>,
}

/// A raw tabular price series exactly as fetched, before any normalization.
#[derive(Debug, Clone, Default)]
pub struct RawFrame {
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<RawRow>,
}

impl RawFrame {
    pub fn new(columns: Vec<ColumnHeader>, rows: Vec<RawRow>) -> Self {
        RawFrame { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
