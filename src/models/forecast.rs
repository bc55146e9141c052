use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ForecastError;

/// Directional trading decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Long,
    Short,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Long => "LONG",
            Signal::Short => "SHORT",
            Signal::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the external model scorer. Only `score` is contractual;
/// everything else the model produces stays on the collaborator side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOutput {
    pub score: f64,
}

/// Output of the external decision generator (and trade filter, which may
/// rewrite it). Every field is optional; the assembler substitutes defaults
/// for whatever the collaborator omits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionOutput {
    pub signal: Option<Signal>,
    pub confidence: Option<f64>,
    pub prob_up: Option<f64>,
    pub rule: Option<String>,
}

/// One asset's forecast. Built once by the assembler; prob_up and prob_down
/// are complementary by construction; numeric fields are pre-rounded for
/// display stability (4 decimals for probabilities, 2 for prices/returns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub asset: String,
    pub timestamp_utc: String,
    pub signal: Signal,
    pub confidence: f64,
    pub prob_up: f64,
    pub prob_down: f64,
    pub regime: String,
    pub close: f64,
    pub prev_close: f64,
    pub daily_return: f64,
    pub rule: String,
}

/// One row of a forecast batch: column name → value, in column order.
pub type Row = Map<String, Value>;

/// An ordered collection of forecast rows, one per asset.
///
/// Rows are kept as JSON maps rather than typed structs so the validator can
/// detect missing columns, reorder into the canonical sequence, and pass
/// through extended columns the core record does not know about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastBatch {
    rows: Vec<Row>,
}

impl ForecastBatch {
    pub fn new() -> Self {
        ForecastBatch { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        ForecastBatch { rows }
    }

    /// Build a batch from core forecast records.
    pub fn from_records(records: &[ForecastRecord]) -> Result<Self, ForecastError> {
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::to_value(record)? {
                Value::Object(map) => rows.push(map),
                other => {
                    return Err(ForecastError::Serialization(format!(
                        "forecast record serialized to non-object value: {other}"
                    )))
                }
            }
        }
        Ok(ForecastBatch { rows })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names of the first row, in order. Empty for an empty batch.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(asset: &str) -> ForecastRecord {
        ForecastRecord {
            asset: asset.to_string(),
            timestamp_utc: "2024-01-02 15:00 UTC".to_string(),
            signal: Signal::Long,
            confidence: 0.75,
            prob_up: 0.65,
            prob_down: 0.35,
            regime: "trending".to_string(),
            close: 101.0,
            prev_close: 100.0,
            daily_return: 1.0,
            rule: "momentum".to_string(),
        }
    }

    #[test]
    fn test_signal_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Signal::Long).unwrap(), "LONG");
        assert_eq!(serde_json::to_value(Signal::Hold).unwrap(), "HOLD");
        assert_eq!(Signal::Short.to_string(), "SHORT");
    }

    #[test]
    fn test_batch_from_records_keeps_field_order() {
        let batch = ForecastBatch::from_records(&[sample_record("SPX")]).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.columns(),
            vec![
                "asset",
                "timestamp_utc",
                "signal",
                "confidence",
                "prob_up",
                "prob_down",
                "regime",
                "close",
                "prev_close",
                "daily_return",
                "rule",
            ]
        );
        assert_eq!(batch.rows()[0]["signal"], "LONG");
    }

    #[test]
    fn test_empty_batch() {
        let batch = ForecastBatch::new();
        assert!(batch.is_empty());
        assert!(batch.columns().is_empty());
    }
}
