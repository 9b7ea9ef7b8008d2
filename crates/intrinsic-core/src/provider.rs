//! Market data contract consumed by the evaluator.
//!
//! A provider answers three independent queries per ticker. Each query can
//! fail with its own "no data" condition, which the evaluator surfaces
//! verbatim, or with a transport/payload problem, which it does not.
//!
//! | Query | Output | "No data" kind |
//! |-------|--------|----------------|
//! | [`cash_flow`](MarketDataProvider::cash_flow) | [`CashFlowStatement`] | [`ProviderErrorKind::NoCashFlowData`] |
//! | [`shares_outstanding`](MarketDataProvider::shares_outstanding) | `f64` | [`ProviderErrorKind::NoSharesData`] |
//! | [`latest_close`](MarketDataProvider::latest_close) | `f64` | [`ProviderErrorKind::NoPriceData`] |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{CashFlowStatement, Symbol};

/// Boxed future returned by provider queries.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    NoCashFlowData,
    NoSharesData,
    NoPriceData,
    Unavailable,
    RateLimited,
    Timeout,
    Malformed,
    Internal,
}

/// Structured provider error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    retryable: bool,
}

impl ProviderError {
    pub fn no_cash_flow_data() -> Self {
        Self {
            kind: ProviderErrorKind::NoCashFlowData,
            message: String::from("No cash flow data available"),
            retryable: false,
        }
    }

    pub fn no_shares_data() -> Self {
        Self {
            kind: ProviderErrorKind::NoSharesData,
            message: String::from("No shares outstanding data available"),
            retryable: false,
        }
    }

    pub fn no_price_data() -> Self {
        Self {
            kind: ProviderErrorKind::NoPriceData,
            message: String::from("No current price data available"),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Malformed,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    /// True for the three expected "no data" conditions.
    pub const fn is_data_unavailable(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::NoCashFlowData
                | ProviderErrorKind::NoSharesData
                | ProviderErrorKind::NoPriceData
        )
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::NoCashFlowData => "provider.no_cash_flow_data",
            ProviderErrorKind::NoSharesData => "provider.no_shares_data",
            ProviderErrorKind::NoPriceData => "provider.no_price_data",
            ProviderErrorKind::Unavailable => "provider.unavailable",
            ProviderErrorKind::RateLimited => "provider.rate_limited",
            ProviderErrorKind::Timeout => "provider.timeout",
            ProviderErrorKind::Malformed => "provider.malformed",
            ProviderErrorKind::Internal => "provider.internal",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

/// Market data source contract.
///
/// Implementations must be `Send + Sync`; the evaluator shares one provider
/// across concurrent per-ticker tasks.
pub trait MarketDataProvider: Send + Sync {
    /// Short provider name used in logs and report metadata.
    fn name(&self) -> &'static str;

    /// Most recent reported cash-flow period.
    ///
    /// # Errors
    ///
    /// [`ProviderErrorKind::NoCashFlowData`] when the provider has no
    /// statement for `symbol`.
    fn cash_flow<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, CashFlowStatement>;

    /// Shares outstanding.
    ///
    /// # Errors
    ///
    /// [`ProviderErrorKind::NoSharesData`] when the count is not reported.
    fn shares_outstanding<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, f64>;

    /// Latest daily closing price.
    ///
    /// # Errors
    ///
    /// [`ProviderErrorKind::NoPriceData`] when there is no recent close.
    fn latest_close<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, f64>;
}
