use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use crate::errors::ForecastError;
use crate::models::forecast::{ForecastBatch, ForecastRecord, Row};
use crate::models::rules::RuleThresholds;
use crate::pipeline::schema::as_number;

/// Default output directory for the CSV artifact.
pub const DEFAULT_OUT_DIR: &str = "forecasts";
/// Default CSV artifact name inside the output directory.
pub const DEFAULT_CSV_NAME: &str = "daily_index_forecast.csv";
/// Default text report path.
pub const DEFAULT_REPORT_PATH: &str = "index_forecast.txt";

const RULE_WIDTH: usize = 110;

/// Render the human-readable forecast report: a fixed-width table with one
/// row per record, then the trading-rules appendix.
///
/// Rows may come from either validation profile; each display field is read
/// under its strict name first, then its core name. A field that is missing
/// or not a number renders as "n/a" instead of failing.
pub fn render_report(
    batch: &ForecastBatch,
    rules: &BTreeMap<String, RuleThresholds>,
) -> String {
    let runtime = Utc::now().format("%Y-%m-%d %H:%M UTC");
    let mut out = String::with_capacity(4 * 1024);

    writeln!(out, "Index Forecasts - {}", runtime).ok();
    writeln!(out, "{}", "=".repeat(RULE_WIDTH)).ok();
    out.push('\n');
    writeln!(
        out,
        "Index    | Prev Close | Current | Δ %    | Signal | Conf | Regime   | ProbUp | Rule"
    )
    .ok();
    writeln!(out, "{}", "-".repeat(RULE_WIDTH)).ok();

    if batch.is_empty() {
        writeln!(out, "No forecasts available.").ok();
    } else {
        for row in batch.rows() {
            writeln!(out, "{}", render_row(row, rules)).ok();
        }
    }

    // ── Rules appendix ──
    out.push_str("\n\nTRADING RULES (Thresholds)\n\n");
    for (asset, rule) in rules {
        writeln!(out, "{}", asset).ok();
        writeln!(out, "- LONG  if prob_up >= {:.2}", rule.long_entry).ok();
        writeln!(out, "- SHORT if prob_up <= {:.2}", rule.short_entry).ok();
        writeln!(out, "- Otherwise: HOLD").ok();
        if let Some(note) = rule.note.as_deref().filter(|n| !n.is_empty()) {
            writeln!(out, "- Note: {}", note).ok();
        }
        out.push('\n');
    }

    out
}

fn render_row(row: &Row, rules: &BTreeMap<String, RuleThresholds>) -> String {
    let asset = text_cell(row, &["asset"]);
    let prev_close = num_cell(row, &["price_prev_close", "prev_close"], 10, 2);
    let close = num_cell(row, &["price_current", "close"], 7, 2);
    let daily_return = num_cell(row, &["return_daily_pct", "daily_return"], 6, 2);
    let signal = text_cell(row, &["signal_final", "signal"]);
    let conf = num_cell(row, &["confidence"], 4, 2);
    let regime = text_cell(row, &["regime"]);
    let prob_up = num_cell(row, &["prob_up"], 5, 2);
    let rule = rule_cell(row, &asset, rules);

    format!(
        "{:<8} | {} | {} | {}% | {:<6} | {} | {:<8} | {} | {}",
        asset, prev_close, close, daily_return, signal, conf, regime, prob_up, rule
    )
}

/// String field under the first matching key; "n/a" when absent.
fn text_cell(row: &Row, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| row.get(*k))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("n/a")
        .to_string()
}

/// Right-aligned fixed-precision numeric field; "n/a" when the value is
/// missing or not a number.
fn num_cell(row: &Row, keys: &[&str], width: usize, precision: usize) -> String {
    match keys.iter().find_map(|k| as_number(row.get(*k))) {
        Some(v) => format!("{:>width$.precision$}", v),
        None => format!("{:>width$}", "n/a"),
    }
}

/// Rule label for a row. A blank label falls back to a summary derived from
/// the threshold metadata for that asset, then to "n/a".
fn rule_cell(row: &Row, asset: &str, rules: &BTreeMap<String, RuleThresholds>) -> String {
    let label = row
        .get("rule_label")
        .or_else(|| row.get("rule"))
        .and_then(Value::as_str)
        .unwrap_or("");
    if !label.is_empty() {
        return label.to_string();
    }
    match rules.get(asset) {
        Some(rule) => format!(
            "LONG if prob_up >= {:.2} / SHORT if prob_up <= {:.2}",
            rule.long_entry, rule.short_entry
        ),
        None => "n/a".to_string(),
    }
}

/// Render the report and write it to `path`, creating parent directories.
/// Open-truncate-write-close; returns the path on success.
pub fn write_report(
    batch: &ForecastBatch,
    rules: &BTreeMap<String, RuleThresholds>,
    path: &Path,
) -> Result<PathBuf, ForecastError> {
    let text = render_report(batch, rules);
    ensure_parent_dir(path)?;
    fs::write(path, text)?;
    info!("Wrote forecast report to {}", path.display());
    Ok(path.to_path_buf())
}

/// Write the batch as a CSV artifact, one row per record, columns in row
/// order (canonical after strict validation).
pub fn write_forecast_csv(batch: &ForecastBatch, path: &Path) -> Result<PathBuf, ForecastError> {
    ensure_parent_dir(path)?;
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| ForecastError::FileWrite(format!("Cannot create CSV: {}", e)))?;

    let columns = batch.columns();
    if !columns.is_empty() {
        wtr.write_record(&columns)?;
        for row in batch.rows() {
            let record: Vec<String> = columns
                .iter()
                .map(|c| csv_cell(row.get(c)))
                .collect();
            wtr.write_record(&record)?;
        }
    }

    wtr.flush().map_err(|e| ForecastError::FileWrite(e.to_string()))?;
    info!("Wrote {} forecast rows to {}", batch.len(), path.display());
    Ok(path.to_path_buf())
}

/// Write both artifacts for a set of core records: the CSV under `out_dir`
/// and the text report at its default path. Returns (csv_path, report_path).
pub fn write_forecasts(
    records: &[ForecastRecord],
    rules: &BTreeMap<String, RuleThresholds>,
    out_dir: &Path,
) -> Result<(PathBuf, PathBuf), ForecastError> {
    let batch = ForecastBatch::from_records(records)?;
    let csv_path = write_forecast_csv(&batch, &out_dir.join(DEFAULT_CSV_NAME))?;
    let report_path = write_report(&batch, rules, Path::new(DEFAULT_REPORT_PATH))?;
    Ok((csv_path, report_path))
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), ForecastError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forecast::Signal;
    use crate::pipeline::schema::{extended_row, validate_strict};
    use serde_json::json;

    fn record(asset: &str, rule: &str) -> ForecastRecord {
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
            rule: rule.to_string(),
        }
    }

    fn spx_rules() -> BTreeMap<String, RuleThresholds> {
        let mut rules = BTreeMap::new();
        rules.insert("SPX".to_string(), RuleThresholds::new(0.60, 0.40));
        rules
    }

    #[test]
    fn test_empty_batch_renders_fallback_line() {
        let text = render_report(&ForecastBatch::new(), &spx_rules());
        assert!(text.contains("No forecasts available."));
    }

    #[test]
    fn test_appendix_lines() {
        let text = render_report(&ForecastBatch::new(), &spx_rules());
        assert!(text.contains("SPX\n"));
        assert!(text.contains("- LONG  if prob_up >= 0.60"));
        assert!(text.contains("- SHORT if prob_up <= 0.40"));
        assert!(text.contains("- Otherwise: HOLD"));
    }

    #[test]
    fn test_appendix_note_included_when_present() {
        let mut rules = spx_rules();
        rules.get_mut("SPX").unwrap().note = Some("cash index".to_string());
        let text = render_report(&ForecastBatch::new(), &rules);
        assert!(text.contains("- Note: cash index"));
    }

    #[test]
    fn test_core_row_rendered_with_fixed_widths() {
        let batch = ForecastBatch::from_records(&[record("SPX", "momentum")]).unwrap();
        let text = render_report(&batch, &spx_rules());
        assert!(text.contains("SPX      |     100.00 |  101.00 |   1.00% | LONG   | 0.75 | trending |  0.65 | momentum"));
    }

    #[test]
    fn test_strict_row_rendered_with_extended_names() {
        let row = extended_row(
            &record("SPX", "momentum"),
            "^GSPC",
            0.42,
            &RuleThresholds::new(0.60, 0.40),
            Signal::Long,
            "ok",
        );
        let batch = validate_strict(ForecastBatch::from_rows(vec![row])).unwrap();
        let text = render_report(&batch, &spx_rules());
        assert!(text.contains("SPX      |     100.00 |  101.00 |"));
        assert!(text.contains("momentum"));
    }

    #[test]
    fn test_blank_rule_falls_back_to_threshold_summary() {
        let batch = ForecastBatch::from_records(&[record("SPX", "")]).unwrap();
        let text = render_report(&batch, &spx_rules());
        assert!(text.contains("LONG if prob_up >= 0.60 / SHORT if prob_up <= 0.40"));
    }

    #[test]
    fn test_blank_rule_without_metadata_renders_na() {
        let batch = ForecastBatch::from_records(&[record("NDX", "")]).unwrap();
        let text = render_report(&batch, &spx_rules());
        let row_line = text.lines().find(|l| l.starts_with("NDX")).unwrap();
        assert!(row_line.ends_with("n/a"));
    }

    #[test]
    fn test_missing_numeric_field_renders_na() {
        let batch = ForecastBatch::from_records(&[record("SPX", "momentum")]).unwrap();
        let mut row = batch.rows()[0].clone();
        row.remove("prev_close");
        row.insert("confidence".into(), json!("not a number"));
        let text = render_report(&ForecastBatch::from_rows(vec![row]), &spx_rules());
        let row_line = text.lines().find(|l| l.starts_with("SPX")).unwrap();
        assert!(row_line.contains("n/a"));
    }

    #[test]
    fn test_write_report_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("index_forecast.txt");
        let batch = ForecastBatch::from_records(&[record("SPX", "momentum")]).unwrap();
        let written = write_report(&batch, &spx_rules(), &path).unwrap();
        assert_eq!(written, path);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Index Forecasts"));
    }

    #[test]
    fn test_csv_artifact_has_canonical_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecasts").join(DEFAULT_CSV_NAME);
        let row = extended_row(
            &record("SPX", "momentum"),
            "^GSPC",
            0.42,
            &RuleThresholds::new(0.60, 0.40),
            Signal::Long,
            "ok",
        );
        let batch = validate_strict(ForecastBatch::from_rows(vec![row])).unwrap();
        write_forecast_csv(&batch, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(
            header,
            "timestamp_utc,asset,ticker,price_current,price_prev_close,return_daily_pct,\
             score,prob_up,prob_down,confidence,regime,rule_long_min,rule_short_max,\
             signal_raw,signal_final,rule_label,data_status"
        );
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_empty_batch_csv_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_forecast_csv(&ForecastBatch::new(), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}
