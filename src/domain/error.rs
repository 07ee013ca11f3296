//! Domain error types.
//!
//! Per-symbol problems (missing price, short history) are not errors; they
//! are skip conditions collected alongside the scores. Only cycle-level
//! gating conditions and genuinely unexpected failures surface here.

/// Top-level error type for rebalancer.
#[derive(Debug, thiserror::Error)]
pub enum RebalancerError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("price feed error: {reason}")]
    PriceFeed { reason: String },

    #[error("state store error: {reason}")]
    State { reason: String },

    #[error("insufficient history for {symbol}: have {rows} rows, need {minimum}")]
    InsufficientHistory {
        symbol: String,
        rows: usize,
        minimum: usize,
    },

    #[error(
        "coverage shortfall: {usable} of {total} universe symbols usable, minimum ratio {minimum}"
    )]
    CoverageShortfall {
        usable: usize,
        total: usize,
        minimum: f64,
    },

    #[error("notification error: {reason}")]
    Notify { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RebalancerError> for std::process::ExitCode {
    fn from(err: &RebalancerError) -> Self {
        let code: u8 = match err {
            RebalancerError::Io(_) => 1,
            RebalancerError::ConfigParse { .. }
            | RebalancerError::ConfigMissing { .. }
            | RebalancerError::ConfigInvalid { .. } => 2,
            RebalancerError::State { .. } => 3,
            RebalancerError::PriceFeed { .. } | RebalancerError::InsufficientHistory { .. } => 4,
            RebalancerError::CoverageShortfall { .. } => 5,
            RebalancerError::Notify { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
