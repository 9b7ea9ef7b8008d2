//! Evaluation settings loaded from JSON.
//!
//! ```json
//! {
//!   "tickers": ["AAPL", "KO"],
//!   "parameters": { "discount_rate": 0.05, "growth_rate": 0.02, "horizon_years": 5 },
//!   "concurrency": 4,
//!   "request_timeout_ms": 10000
//! }
//! ```
//!
//! Every field is optional and falls back to [`EvaluationConfig::default`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::evaluator::PortfolioEvaluator;
use crate::{CoreError, Symbol, ValidationError, ValuationParameters};

/// Tickers evaluated when none are supplied.
pub const DEFAULT_TICKERS: [&str; 9] = ["AAPL", "AXP", "KO", "BAC", "CVX", "OXY", "MCO", "KHC", "CB"];

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationConfig {
    pub tickers: Vec<Symbol>,
    pub parameters: ValuationParameters,
    pub concurrency: usize,
    pub request_timeout_ms: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            tickers: default_tickers(),
            parameters: ValuationParameters::default(),
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl EvaluationConfig {
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tickers.is_empty() {
            return Err(ValidationError::EmptyTickerList);
        }
        if self.concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        if self.request_timeout_ms == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        self.parameters.validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Evaluator configured with this concurrency and timeout.
    pub fn evaluator(&self) -> Result<PortfolioEvaluator, ValidationError> {
        Ok(PortfolioEvaluator::new(self.concurrency)?.with_request_timeout(self.request_timeout()))
    }
}

pub fn default_tickers() -> Vec<Symbol> {
    DEFAULT_TICKERS
        .iter()
        .filter_map(|ticker| Symbol::parse(ticker).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_uses_defaults() {
        let config = EvaluationConfig::from_json("{}").expect("config should parse");
        assert_eq!(config, EvaluationConfig::default());
        assert_eq!(config.tickers.len(), DEFAULT_TICKERS.len());
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_parameters_keep_remaining_defaults() {
        let config = EvaluationConfig::from_json(
            r#"{"tickers": ["ko"], "parameters": {"horizon_years": 5}, "concurrency": 1}"#,
        )
        .expect("config should parse");

        assert_eq!(config.tickers[0].as_str(), "KO");
        assert_eq!(config.parameters.horizon_years, 5);
        assert_eq!(config.parameters.discount_rate, 0.044);
        assert_eq!(config.evaluator().map(|e| e.concurrency()), Ok(1));
    }

    #[test]
    fn rejects_growth_at_discount_rate() {
        let err = EvaluationConfig::from_json(
            r#"{"parameters": {"discount_rate": 0.05, "growth_rate": 0.05}}"#,
        )
        .expect_err("must fail");
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DiscountNotAboveGrowth { .. })
        ));
    }

    #[test]
    fn rejects_unknown_fields_and_empty_lists() {
        assert!(matches!(
            EvaluationConfig::from_json(r#"{"ticker": ["KO"]}"#),
            Err(CoreError::Serialization(_))
        ));
        assert!(matches!(
            EvaluationConfig::from_json(r#"{"tickers": []}"#),
            Err(CoreError::Validation(ValidationError::EmptyTickerList))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"tickers": ["AAPL", "CB"], "request_timeout_ms": 2500}}"#)
            .expect("write config");

        let config = EvaluationConfig::from_path(file.path()).expect("config should load");
        assert_eq!(config.tickers.len(), 2);
        assert_eq!(config.request_timeout(), Duration::from_millis(2_500));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = EvaluationConfig::from_path(&dir.path().join("absent.json")).expect_err("must fail");
        assert!(matches!(err, CoreError::Io { .. }));
    }
}
