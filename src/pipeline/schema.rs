use serde_json::{json, Map, Value};

use crate::errors::ForecastError;
use crate::models::forecast::{ForecastBatch, ForecastRecord, Row, Signal};
use crate::models::rules::RuleThresholds;

/// Canonical column order for the strict (reporting-path) profile.
pub const STRICT_COLUMNS: [&str; 17] = [
    "timestamp_utc",
    "asset",
    "ticker",
    "price_current",
    "price_prev_close",
    "return_daily_pct",
    "score",
    "prob_up",
    "prob_down",
    "confidence",
    "regime",
    "rule_long_min",
    "rule_short_max",
    "signal_raw",
    "signal_final",
    "rule_label",
    "data_status",
];

/// Strict-profile columns that must hold a non-null number in every row.
const STRICT_NUMERIC_COLUMNS: [&str; 9] = [
    "price_current",
    "price_prev_close",
    "return_daily_pct",
    "score",
    "prob_up",
    "prob_down",
    "confidence",
    "rule_long_min",
    "rule_short_max",
];

/// Minimal core columns for the lenient (best-effort) profile.
pub const LENIENT_COLUMNS: [&str; 11] = [
    "asset",
    "signal",
    "confidence",
    "prob_up",
    "prob_down",
    "regime",
    "close",
    "prev_close",
    "daily_return",
    "rule",
    "timestamp_utc",
];

/// Strict profile: every row must carry the full extended column set with a
/// non-null number in every numeric column. An empty batch is an error here;
/// this path feeds an always-populated report.
///
/// On success the rows come back subset to and reordered into
/// [`STRICT_COLUMNS`]; values themselves are never touched.
pub fn validate_strict(batch: ForecastBatch) -> Result<ForecastBatch, ForecastError> {
    let missing = missing_columns(&batch, &STRICT_COLUMNS);
    if !missing.is_empty() {
        return Err(ForecastError::Schema(missing));
    }

    if batch.is_empty() {
        return Err(ForecastError::EmptyBatch);
    }

    for column in STRICT_NUMERIC_COLUMNS {
        let has_null = batch
            .rows()
            .iter()
            .any(|row| as_number(row.get(column)).is_none());
        if has_null {
            return Err(ForecastError::DataIntegrity(column.to_string()));
        }
    }

    // Reorder into the canonical sequence, dropping extra columns.
    let rows = batch
        .rows()
        .iter()
        .map(|row| {
            let mut ordered = Map::new();
            for column in STRICT_COLUMNS {
                if let Some(value) = row.get(column) {
                    ordered.insert(column.to_string(), value.clone());
                }
            }
            ordered
        })
        .collect();

    Ok(ForecastBatch::from_rows(rows))
}

/// Lenient profile: only the minimal core columns are required and an empty
/// batch passes through unchanged. This path must survive total upstream
/// failure. Rows are not reordered and numeric nulls are tolerated.
pub fn validate_lenient(batch: ForecastBatch) -> Result<ForecastBatch, ForecastError> {
    if batch.is_empty() {
        return Ok(batch);
    }

    let missing = missing_columns(&batch, &LENIENT_COLUMNS);
    if !missing.is_empty() {
        return Err(ForecastError::Schema(missing));
    }

    Ok(batch)
}

/// Build a strict-profile row from a core record plus the orchestration
/// facts the record itself does not carry (ticker, raw model score, the
/// thresholds in force, the pre-filter signal, and the data status).
pub fn extended_row(
    record: &ForecastRecord,
    ticker: &str,
    score: f64,
    thresholds: &RuleThresholds,
    signal_raw: Signal,
    data_status: &str,
) -> Row {
    let mut row = Map::new();
    row.insert("timestamp_utc".into(), json!(record.timestamp_utc));
    row.insert("asset".into(), json!(record.asset));
    row.insert("ticker".into(), json!(ticker));
    row.insert("price_current".into(), json!(record.close));
    row.insert("price_prev_close".into(), json!(record.prev_close));
    row.insert("return_daily_pct".into(), json!(record.daily_return));
    row.insert("score".into(), json!(score));
    row.insert("prob_up".into(), json!(record.prob_up));
    row.insert("prob_down".into(), json!(record.prob_down));
    row.insert("confidence".into(), json!(record.confidence));
    row.insert("regime".into(), json!(record.regime));
    row.insert("rule_long_min".into(), json!(thresholds.long_entry));
    row.insert("rule_short_max".into(), json!(thresholds.short_entry));
    row.insert("signal_raw".into(), json!(signal_raw.as_str()));
    row.insert("signal_final".into(), json!(record.signal.as_str()));
    row.insert("rule_label".into(), json!(record.rule));
    row.insert("data_status".into(), json!(data_status));
    row
}

/// Columns from `required` absent from at least one row. All names are
/// reported, not just the first.
fn missing_columns(batch: &ForecastBatch, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|&&column| batch.rows().iter().any(|row| !row.contains_key(column)))
        .map(|&column| column.to_string())
        .collect()
}

/// Numeric view of a cell. `None` for absent, null, NaN, or non-numeric
/// values.
pub(crate) fn as_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| v.is_finite())
}
