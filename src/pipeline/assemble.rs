use chrono::Utc;
use tracing::info;

use crate::errors::ForecastError;
use crate::models::bar::Series;
use crate::models::forecast::{DecisionOutput, ForecastRecord, ModelOutput, Signal};

/// Default rule label when the decision output carries none.
const NO_RULE: &str = "no_rule";

/// Round to `places` decimal places. Applied only when the record is built,
/// never to intermediate values.
fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Build one asset's forecast record from a reconciled series and the four
/// external collaborators.
///
/// The series must expose "close" on at least the last two bars. Although the
/// reconciler guarantees that, `assemble` defends independently because it
/// may also be handed an externally built series.
pub fn assemble<M, R, D, F>(
    asset_name: &str,
    series: &Series,
    model_fn: M,
    regime_fn: R,
    decision_fn: D,
    filter_fn: F,
) -> Result<ForecastRecord, ForecastError>
where
    M: Fn(&Series) -> ModelOutput,
    R: Fn(&Series) -> String,
    D: Fn(&ModelOutput, &str) -> DecisionOutput,
    F: Fn(&str, DecisionOutput, &Series, f64) -> DecisionOutput,
{
    if series.len() < 2 {
        return Err(ForecastError::InsufficientData {
            needed: 2,
            available: series.len(),
        });
    }

    let latest_close = require_close(series, 0)?;
    let prev_close = require_close(series, 1)?;
    let daily_return_pct = (latest_close / prev_close - 1.0) * 100.0;

    let model_output = model_fn(series);
    let regime = regime_fn(series);
    let decision = decision_fn(&model_output, &regime);

    // prob_down is never fetched from the collaborator; deriving it here is
    // what keeps the complementary invariant unconditional.
    let prob_up = decision.prob_up.unwrap_or(0.5);
    let prob_down = 1.0 - prob_up;

    // The trade filter may override signal/confidence/rule (e.g. suppress a
    // signal on an outsized daily move).
    let decision = filter_fn(asset_name, decision, series, daily_return_pct);

    let record = ForecastRecord {
        asset: asset_name.to_string(),
        timestamp_utc: Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
        signal: decision.signal.unwrap_or(Signal::Hold),
        confidence: decision.confidence.unwrap_or(0.0),
        prob_up: round_to(prob_up, 4),
        prob_down: round_to(prob_down, 4),
        regime,
        close: round_to(latest_close, 2),
        prev_close: round_to(prev_close, 2),
        daily_return: round_to(daily_return_pct, 2),
        rule: decision.rule.unwrap_or_else(|| NO_RULE.to_string()),
    };

    info!(
        "Assembled forecast for {}: {} (prob_up={:.4})",
        record.asset, record.signal, record.prob_up
    );

    Ok(record)
}

fn require_close(series: &Series, offset: usize) -> Result<f64, ForecastError> {
    series
        .field_from_end("close", offset)
        .ok_or_else(|| ForecastError::MissingField {
            field: "close".to_string(),
            available: series.field_names(),
        })
}
