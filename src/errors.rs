/// All pipeline errors, categorized by stage.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    // ── Reconciliation ──
    #[error("No price data returned for {0}")]
    EmptyInput(String),

    #[error("Column '{field}' not found; available: {available:?}")]
    MissingField {
        field: String,
        available: Vec<String>,
    },

    // ── Assembly ──
    #[error("Insufficient data: need {needed} bars, got {available}")]
    InsufficientData { needed: usize, available: usize },

    // ── Validation ──
    #[error("Missing forecast columns: {0:?}")]
    Schema(Vec<String>),

    #[error("Null values detected in column: {0}")]
    DataIntegrity(String),

    #[error("Forecast batch is empty")]
    EmptyBatch,

    // ── Artifacts ──
    #[error("Failed to write file: {0}")]
    FileWrite(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ── Conversions from external errors ──

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::FileWrite(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::FileWrite(err.to_string())
    }
}
