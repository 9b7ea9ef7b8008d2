use thiserror::Error;

/// Validation and contract errors exposed by `intrinsic-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("ticker list must be a JSON array of strings: {reason}")]
    InvalidTickerList { reason: String },
    #[error("ticker list must include at least one symbol")]
    EmptyTickerList,

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("discount rate must be within (0, 1), got {value}")]
    DiscountRateOutOfRange { value: f64 },
    #[error("growth rate must be non-negative, got {value}")]
    NegativeGrowthRate { value: f64 },
    #[error("discount rate {discount_rate} must exceed growth rate {growth_rate}")]
    DiscountNotAboveGrowth {
        discount_rate: f64,
        growth_rate: f64,
    },
    #[error("horizon must be at least one year")]
    ZeroHorizon,
    #[error("horizon of {value} years exceeds max {max}")]
    HorizonTooLong { value: u32, max: u32 },
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("request timeout must be at least 1 ms")]
    ZeroTimeout,
}

/// Failures of the DCF arithmetic itself.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValuationError {
    #[error("invalid valuation parameters: {0}")]
    InvalidParameters(#[from] ValidationError),
    #[error("shares outstanding must be positive, got {shares}")]
    NonPositiveShares { shares: f64 },
    #[error("valuation produced a non-finite {stage}")]
    NonFinite { stage: &'static str },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
