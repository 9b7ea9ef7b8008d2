//! In-memory provider for offline runs and tests.
//!
//! Fixture files are JSON objects keyed by ticker:
//!
//! ```json
//! {
//!   "AAPL": {
//!     "cash_flow": { "operating_cash_flow": 118254000000, "capital_expenditure": -9447000000 },
//!     "shares_outstanding": 15204100000,
//!     "latest_close": 189.84
//!   },
//!   "XYZ": { "error": "upstream exploded" }
//! }
//! ```
//!
//! A missing section maps to the matching "no data" error; `error` makes every
//! query fail as an unexpected transport error.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::provider::{MarketDataProvider, ProviderError, ProviderFuture};
use crate::{CashFlowStatement, CoreError, Symbol};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FixtureEntry {
    #[serde(default)]
    pub cash_flow: Option<CashFlowStatement>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
    #[serde(default)]
    pub latest_close: Option<f64>,
    /// Forces every query for this ticker to fail with a transport error.
    #[serde(default)]
    pub error: Option<String>,
}

impl FixtureEntry {
    pub fn complete(
        operating_cash_flow: f64,
        capital_expenditure: f64,
        shares_outstanding: f64,
        latest_close: f64,
    ) -> Self {
        Self {
            cash_flow: Some(CashFlowStatement::new(
                Some(operating_cash_flow),
                Some(capital_expenditure),
            )),
            shares_outstanding: Some(shares_outstanding),
            latest_close: Some(latest_close),
            error: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Provider backed by a ticker -> [`FixtureEntry`] table.
#[derive(Debug, Clone, Default)]
pub struct FixtureProvider {
    entries: BTreeMap<Symbol, FixtureEntry>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, symbol: Symbol, entry: FixtureEntry) -> Self {
        self.entries.insert(symbol, entry);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let entries: BTreeMap<Symbol, FixtureEntry> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unknown tickers behave like an entry with no data at all.
    fn entry(&self, symbol: &Symbol) -> Result<Option<&FixtureEntry>, ProviderError> {
        match self.entries.get(symbol) {
            Some(FixtureEntry {
                error: Some(message),
                ..
            }) => Err(ProviderError::unavailable(message.clone())),
            entry => Ok(entry),
        }
    }
}

impl MarketDataProvider for FixtureProvider {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn cash_flow<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, CashFlowStatement> {
        Box::pin(async move {
            self.entry(symbol)?
                .and_then(|entry| entry.cash_flow.clone())
                .filter(|statement| !statement.is_empty())
                .ok_or_else(ProviderError::no_cash_flow_data)
        })
    }

    fn shares_outstanding<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, f64> {
        Box::pin(async move {
            self.entry(symbol)?
                .and_then(|entry| entry.shares_outstanding)
                .ok_or_else(ProviderError::no_shares_data)
        })
    }

    fn latest_close<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, f64> {
        Box::pin(async move {
            self.entry(symbol)?
                .and_then(|entry| entry.latest_close)
                .ok_or_else(ProviderError::no_price_data)
        })
    }
}
