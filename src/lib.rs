pub mod errors;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use errors::ForecastError;
pub use models::bar::{PriceBar, Series};
pub use models::forecast::{DecisionOutput, ForecastBatch, ForecastRecord, ModelOutput, Signal};
pub use models::raw::{ColumnHeader, RawFrame, RawRow, RawTimestamp};
pub use models::rules::RuleThresholds;
pub use pipeline::assemble::assemble;
pub use pipeline::reconcile::reconcile;
pub use pipeline::schema::{validate_lenient, validate_strict};
pub use utils::report::{render_report, write_forecast_csv, write_forecasts, write_report};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries and harnesses embedding this crate.
/// Respects `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
