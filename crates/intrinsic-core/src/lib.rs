//! # Intrinsic Core
//!
//! Discounted cash flow valuation of listed companies, compared against the
//! current market price.
//!
//! ## Overview
//!
//! - **Valuation engine**: constant-growth DCF with a Gordon Growth terminal value
//! - **Market data contract** with Yahoo Finance and fixture implementations
//! - **Batch evaluator** with per-ticker failure isolation, sequential or concurrent
//! - **Request policy**: timeouts, bounded retry with backoff, rate quota
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Market data providers (Yahoo, fixture) |
//! | [`cash_flow`] | Free cash flow derivation |
//! | [`config`] | JSON evaluation settings |
//! | [`domain`] | Symbols, statements, parameters, outcomes |
//! | [`error`] | Core error types |
//! | [`evaluator`] | Batch evaluation over a ticker list |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`policy`] | Retry backoff and request throttling |
//! | [`provider`] | Market data trait and error taxonomy |
//! | [`valuation`] | DCF arithmetic |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use intrinsic_core::{PortfolioEvaluator, Symbol, ValuationParameters, YahooProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tickers = vec![Symbol::parse("KO")?, Symbol::parse("AAPL")?];
//!     let valuation = PortfolioEvaluator::new(4)?
//!         .evaluate(&tickers, Arc::new(YahooProvider::default()), &ValuationParameters::default())
//!         .await;
//!
//!     for (symbol, outcome) in valuation.iter() {
//!         println!("{symbol}: {outcome:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │ PortfolioEvaluator │──── one TickerOutcome per ticker
//! └─────────┬──────────┘
//!           │
//!           ▼
//! ┌────────────────────┐     ┌──────────────────┐
//! │ MarketDataProvider │────▶│ HttpClient       │
//! │ (Yahoo / fixture)  │     │ + RequestPolicy  │
//! └─────────┬──────────┘     └──────────────────┘
//!           │ CashFlowStatement, shares, close
//!           ▼
//! ┌────────────────────┐
//! │ free_cash_flow     │
//! │ valuation (DCF)    │
//! └────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Library calls return `Result`; the evaluator folds every per-ticker error
//! into a [`TickerOutcome::Failure`]:
//!
//! ```rust
//! use intrinsic_core::{FailureKind, TickerOutcome};
//!
//! fn describe(outcome: &TickerOutcome) -> &str {
//!     match outcome {
//!         TickerOutcome::Success(_) => "valued",
//!         TickerOutcome::Failure(failure) => match failure.kind {
//!             FailureKind::DataUnavailable => "provider had no data",
//!             FailureKind::InvalidParameters => "inputs rejected",
//!             FailureKind::Unexpected => "retrieval failed",
//!         },
//!     }
//! }
//! ```

pub mod adapters;
pub mod cash_flow;
pub mod config;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod http_client;
pub mod policy;
pub mod provider;
pub mod valuation;

// Adapter implementations
pub use adapters::{FixtureEntry, FixtureProvider, YahooProvider};

pub use cash_flow::free_cash_flow;

pub use config::{default_tickers, EvaluationConfig, DEFAULT_TICKERS};

// Domain models
pub use domain::{
    parse_ticker_list, round_to_cents, CashFlowStatement, FailureKind, FinancialSnapshot,
    MissingCapex, Ratio, RoundedValuation, Symbol, TickerFailure, TickerOutcome,
    ValuationParameters, ValuationResult, DATA_RETRIEVAL_FAILED, MAX_HORIZON_YEARS,
};

// Error types
pub use error::{CoreError, ValidationError, ValuationError};

pub use evaluator::{PortfolioEvaluator, PortfolioValuation};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

pub use policy::{Backoff, RequestPolicy, RequestThrottle};

// Market data contract
pub use provider::{MarketDataProvider, ProviderError, ProviderErrorKind, ProviderFuture};

pub use valuation::{dcf_breakdown, intrinsic_value_per_share, DcfBreakdown};
