//! Batch valuation over a ticker list.
//!
//! Every ticker is evaluated independently and always yields a
//! [`TickerOutcome`]; a failure for one ticker never aborts the batch.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::provider::{MarketDataProvider, ProviderError, ProviderFuture};
use crate::valuation::intrinsic_value_per_share;
use crate::{
    FailureKind, FinancialSnapshot, MissingCapex, Symbol, TickerOutcome, ValidationError,
    ValuationError, ValuationParameters, ValuationResult,
};

/// Ordered ticker -> outcome mapping produced by one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioValuation {
    entries: Vec<(Symbol, TickerOutcome)>,
}

impl PortfolioValuation {
    pub fn get(&self, symbol: &Symbol) -> Option<&TickerOutcome> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == symbol)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &TickerOutcome)> {
        self.entries.iter().map(|(symbol, outcome)| (symbol, outcome))
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter().map(|(symbol, _)| symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }
}

/// Per-ticker pipeline failure before it is folded into a [`TickerOutcome`].
#[derive(Debug)]
enum TickerError {
    Provider(ProviderError),
    Valuation(ValuationError),
}

impl From<ProviderError> for TickerError {
    fn from(value: ProviderError) -> Self {
        Self::Provider(value)
    }
}

impl From<ValuationError> for TickerError {
    fn from(value: ValuationError) -> Self {
        Self::Valuation(value)
    }
}

impl TickerError {
    fn into_outcome(self, symbol: &Symbol) -> TickerOutcome {
        match self {
            Self::Provider(error) if error.is_data_unavailable() => {
                tracing::debug!(%symbol, code = error.code(), "market data unavailable");
                TickerOutcome::failure(FailureKind::DataUnavailable, error.message())
            }
            Self::Provider(error) => {
                tracing::warn!(%symbol, error = %error, "data retrieval failed");
                TickerOutcome::unexpected()
            }
            Self::Valuation(
                error @ (ValuationError::InvalidParameters(_)
                | ValuationError::NonPositiveShares { .. }),
            ) => {
                tracing::debug!(%symbol, error = %error, "valuation rejected inputs");
                TickerOutcome::failure(FailureKind::InvalidParameters, error.to_string())
            }
            Self::Valuation(error) => {
                tracing::warn!(%symbol, error = %error, "valuation failed");
                TickerOutcome::unexpected()
            }
        }
    }
}

/// Runs the fetch -> free cash flow -> DCF pipeline for a list of tickers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioEvaluator {
    concurrency: usize,
    request_timeout: Duration,
    missing_capex: MissingCapex,
}

impl Default for PortfolioEvaluator {
    fn default() -> Self {
        Self {
            concurrency: 1,
            request_timeout: Duration::from_secs(10),
            missing_capex: MissingCapex::AssumeZero,
        }
    }
}

impl PortfolioEvaluator {
    /// `concurrency == 1` evaluates strictly one ticker after another.
    pub fn new(concurrency: usize) -> Result<Self, ValidationError> {
        if concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        Ok(Self {
            concurrency,
            ..Self::default()
        })
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_missing_capex(mut self, missing_capex: MissingCapex) -> Self {
        self.missing_capex = missing_capex;
        self
    }

    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Evaluates `tickers` in input order. Duplicates are evaluated once, at
    /// the position of their first occurrence.
    pub async fn evaluate(
        &self,
        tickers: &[Symbol],
        provider: Arc<dyn MarketDataProvider>,
        params: &ValuationParameters,
    ) -> PortfolioValuation {
        let mut seen = HashSet::new();
        let tickers = tickers
            .iter()
            .filter(|symbol| seen.insert(symbol.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        tracing::info!(
            provider = provider.name(),
            tickers = tickers.len(),
            concurrency = self.concurrency,
            discount_rate = params.discount_rate,
            growth_rate = params.growth_rate,
            horizon_years = params.horizon_years,
            "starting evaluation"
        );

        let valuation = if self.concurrency == 1 || tickers.len() <= 1 {
            self.evaluate_sequential(tickers, provider, params).await
        } else {
            self.evaluate_concurrent(tickers, provider, params).await
        };

        tracing::info!(
            succeeded = valuation.success_count(),
            failed = valuation.failure_count(),
            "evaluation finished"
        );
        valuation
    }

    async fn evaluate_sequential(
        &self,
        tickers: Vec<Symbol>,
        provider: Arc<dyn MarketDataProvider>,
        params: &ValuationParameters,
    ) -> PortfolioValuation {
        let mut entries = Vec::with_capacity(tickers.len());
        for symbol in tickers {
            let task = tokio::spawn(self.evaluate_owned(
                Arc::clone(&provider),
                symbol.clone(),
                *params,
            ));
            let outcome = task.await.unwrap_or_else(|error| {
                tracing::warn!(%symbol, error = %error, "ticker task aborted");
                TickerOutcome::unexpected()
            });
            entries.push((symbol, outcome));
        }
        PortfolioValuation { entries }
    }

    async fn evaluate_concurrent(
        &self,
        tickers: Vec<Symbol>,
        provider: Arc<dyn MarketDataProvider>,
        params: &ValuationParameters,
    ) -> PortfolioValuation {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, symbol) in tickers.iter().cloned().enumerate() {
            let ticker = self.evaluate_owned(Arc::clone(&provider), symbol, *params);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, TickerOutcome::unexpected());
                };
                (index, ticker.await)
            });
        }

        let mut outcomes: Vec<Option<TickerOutcome>> = vec![None; tickers.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                // The slot stays empty and is reported as unexpected below.
                Err(error) => tracing::warn!(error = %error, "ticker task aborted"),
            }
        }

        let entries = tickers
            .into_iter()
            .zip(outcomes)
            .map(|(symbol, outcome)| (symbol, outcome.unwrap_or_else(TickerOutcome::unexpected)))
            .collect();
        PortfolioValuation { entries }
    }

    /// Owned form of [`Self::evaluate_ticker`] for spawned tasks. Both batch
    /// modes run each ticker in its own task so a provider panic is reported
    /// as [`TickerOutcome::unexpected`] instead of unwinding out of `evaluate`.
    fn evaluate_owned(
        self,
        provider: Arc<dyn MarketDataProvider>,
        symbol: Symbol,
        params: ValuationParameters,
    ) -> impl std::future::Future<Output = TickerOutcome> + Send + 'static {
        async move {
            self.evaluate_ticker(provider.as_ref(), &symbol, &params)
                .await
        }
    }

    /// Evaluates a single ticker. Never fails; every error becomes a
    /// [`TickerOutcome::Failure`]. A panicking provider unwinds through this
    /// call; [`Self::evaluate`] contains it.
    pub async fn evaluate_ticker(
        &self,
        provider: &dyn MarketDataProvider,
        symbol: &Symbol,
        params: &ValuationParameters,
    ) -> TickerOutcome {
        match self.try_evaluate(provider, symbol, params).await {
            Ok(result) => TickerOutcome::Success(result),
            Err(error) => error.into_outcome(symbol),
        }
    }

    async fn try_evaluate(
        &self,
        provider: &dyn MarketDataProvider,
        symbol: &Symbol,
        params: &ValuationParameters,
    ) -> Result<ValuationResult, TickerError> {
        let statement = self
            .bounded("cash_flow", provider.cash_flow(symbol))
            .await?;
        let Some((operating_cash_flow, capital_expenditure)) =
            statement.resolve(self.missing_capex)
        else {
            return Err(ProviderError::no_cash_flow_data().into());
        };
        if statement.capital_expenditure.is_none() {
            tracing::warn!(%symbol, "capital expenditure not reported, assuming 0");
        }

        let shares_outstanding = self
            .bounded("shares_outstanding", provider.shares_outstanding(symbol))
            .await?;
        let current_price = self
            .bounded("latest_close", provider.latest_close(symbol))
            .await?;

        let snapshot = FinancialSnapshot {
            operating_cash_flow,
            capital_expenditure,
            shares_outstanding,
            current_price,
        };
        tracing::debug!(%symbol, ?snapshot, period_end = ?statement.period_end, "fetched inputs");

        let fcf = crate::free_cash_flow(snapshot.operating_cash_flow, snapshot.capital_expenditure);
        let intrinsic_value = intrinsic_value_per_share(fcf, params, snapshot.shares_outstanding)?;
        let result = ValuationResult::new(intrinsic_value, snapshot.current_price);
        tracing::debug!(%symbol, fcf, intrinsic_value, "valued ticker");
        Ok(result)
    }

    async fn bounded<T>(
        &self,
        query: &'static str,
        call: ProviderFuture<'_, T>,
    ) -> Result<T, ProviderError> {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(ProviderError::timeout(format!(
                    "{query} exceeded {:?}",
                    self.request_timeout
                )))
            })
    }
}
