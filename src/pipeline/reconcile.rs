use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::info;

use crate::errors::ForecastError;
use crate::models::bar::{PriceBar, Series};
use crate::models::raw::RawFrame;

/// Field names accepted as a close-equivalent, in resolution order.
const CLOSE_FALLBACKS: [&str; 2] = ["adj close", "price"];

/// Merge a daily and an intraday raw frame into one clean series.
///
/// Steps, in order: normalize column headers per frame, normalize every
/// timestamp into the reference zone, concatenate row-wise (union of
/// columns), drop duplicate timestamps keeping the later-appearing row
/// (intraday supersedes stale daily), sort ascending, and guarantee a
/// "close" field (derived from "adj close" or "price" when absent).
///
/// `instrument` is only used for the progress notice.
pub fn reconcile(
    instrument: &str,
    daily: &RawFrame,
    intraday: &RawFrame,
) -> Result<Series, ForecastError> {
    info!(
        "Reconciling price history for {}: {} daily + {} intraday rows",
        instrument,
        daily.rows.len(),
        intraday.rows.len()
    );

    if daily.is_empty() && intraday.is_empty() {
        return Err(ForecastError::EmptyInput(instrument.to_string()));
    }

    // Later inserts overwrite earlier ones at the same timestamp, so feeding
    // daily first and intraday second gives keep-last semantics; the BTreeMap
    // handles the ascending sort.
    let mut merged: BTreeMap<NaiveDateTime, BTreeMap<String, f64>> = BTreeMap::new();
    collect_rows(daily, &mut merged);
    collect_rows(intraday, &mut merged);

    let mut bars: Vec<PriceBar> = merged
        .into_iter()
        .map(|(ts, fields)| PriceBar::new(ts, fields))
        .collect();

    derive_close(&mut bars)?;

    Ok(Series::from_bars(bars))
}

/// Normalize one frame's headers and timestamps and fold its rows into the
/// merge map. Cells without a value stay absent.
fn collect_rows(frame: &RawFrame, merged: &mut BTreeMap<NaiveDateTime, BTreeMap<String, f64>>) {
    let keys: Vec<String> = frame.columns.iter().map(|c| c.normalize()).collect();

    for row in &frame.rows {
        let mut fields = BTreeMap::new();
        for (key, value) in keys.iter().zip(&row.values) {
            if let Some(v) = *value {
                fields.insert(key.clone(), v);
            }
        }
        merged.insert(row.timestamp.normalize(), fields);
    }
}

/// Ensure every bar that has a close-equivalent exposes it as "close".
/// Fails when no close-equivalent column exists anywhere in the series.
fn derive_close(bars: &mut [PriceBar]) -> Result<(), ForecastError> {
    let has_close = bars.iter().any(|b| b.fields.contains_key("close"));
    if has_close {
        return Ok(());
    }

    for source in CLOSE_FALLBACKS {
        if bars.iter().any(|b| b.fields.contains_key(source)) {
            for bar in bars.iter_mut() {
                if let Some(v) = bar.field(source) {
                    bar.fields.insert("close".to_string(), v);
                }
            }
            return Ok(());
        }
    }

    let mut available: Vec<String> = bars
        .iter()
        .flat_map(|b| b.fields.keys().cloned())
        .collect();
    available.sort();
    available.dedup();
    Err(ForecastError::MissingField {
        field: "close".to_string(),
        available,
    })
}
