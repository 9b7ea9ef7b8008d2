//! Behavior-driven tests for batch evaluation.
//!
//! These tests verify HOW one bad ticker is contained while the rest of the
//! batch is valued, in both sequential and concurrent modes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use intrinsic_core::{
    CashFlowStatement, FailureKind, FixtureEntry, FixtureProvider, MarketDataProvider,
    PortfolioEvaluator, PortfolioValuation, ProviderError, ProviderFuture, Ratio, Symbol,
    TickerOutcome, ValuationParameters, DATA_RETRIEVAL_FAILED,
};

/// How a [`ScriptedProvider`] misbehaves for one ticker.
#[derive(Clone, Copy)]
enum Fault {
    TransportError,
    Malformed,
    Hang,
    Panic,
}

/// Serves fixture data, except for tickers with a scripted fault.
struct ScriptedProvider {
    fixtures: FixtureProvider,
    faults: BTreeMap<Symbol, Fault>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(fixtures: FixtureProvider) -> Self {
        Self {
            fixtures,
            faults: BTreeMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn with_fault(mut self, raw: &str, fault: Fault) -> Self {
        self.faults.insert(symbol(raw), fault);
        self
    }

    async fn apply_fault(&self, symbol: &Symbol) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.faults.get(symbol) {
            None => Ok(()),
            Some(Fault::TransportError) => Err(ProviderError::unavailable("connection reset")),
            Some(Fault::Malformed) => Err(ProviderError::malformed("unexpected payload")),
            Some(Fault::Hang) => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Ok(())
            }
            Some(Fault::Panic) => panic!("provider bug for {symbol}"),
        }
    }
}

impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn cash_flow<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, CashFlowStatement> {
        Box::pin(async move {
            self.apply_fault(symbol).await?;
            self.fixtures.cash_flow(symbol).await
        })
    }

    fn shares_outstanding<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, f64> {
        Box::pin(async move {
            self.apply_fault(symbol).await?;
            self.fixtures.shares_outstanding(symbol).await
        })
    }

    fn latest_close<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, f64> {
        Box::pin(async move {
            self.apply_fault(symbol).await?;
            self.fixtures.latest_close(symbol).await
        })
    }
}

fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

fn symbols(raw: &[&str]) -> Vec<Symbol> {
    raw.iter().map(|ticker| symbol(ticker)).collect()
}

fn reference_fixtures() -> FixtureProvider {
    FixtureProvider::new()
        .with_entry(symbol("AAPL"), FixtureEntry::complete(1_000.0, 0.0, 100.0, 500.0))
        .with_entry(symbol("KO"), FixtureEntry::complete(80.0, -0.0, 10.0, 50.0))
        .with_entry(symbol("CB"), FixtureEntry::complete(1_200.0, -200.0, 100.0, 700.0))
        .with_entry(symbol("BAC"), FixtureEntry::complete(1_000.0, 0.0, 100.0, 1.0))
}

fn order(valuation: &PortfolioValuation) -> Vec<&str> {
    valuation.tickers().map(Symbol::as_str).collect()
}

fn evaluators() -> [PortfolioEvaluator; 2] {
    [
        PortfolioEvaluator::new(1).expect("sequential evaluator"),
        PortfolioEvaluator::new(4).expect("concurrent evaluator"),
    ]
}

// =============================================================================
// Failure isolation
// =============================================================================

#[tokio::test]
async fn when_one_ticker_fails_unexpectedly_the_rest_are_still_valued() {
    for evaluator in evaluators() {
        // Given: a provider whose transport fails for KO only
        let provider: Arc<dyn MarketDataProvider> = Arc::new(
            ScriptedProvider::new(reference_fixtures()).with_fault("KO", Fault::TransportError),
        );
        let tickers = symbols(&["AAPL", "KO", "CB"]);

        // When: the batch is evaluated
        let valuation = evaluator
            .evaluate(&tickers, provider, &ValuationParameters::default())
            .await;

        // Then: KO carries the generic reason and the others succeed, in order
        assert_eq!(order(&valuation), ["AAPL", "KO", "CB"]);
        assert_eq!(
            valuation.get(&symbol("KO")),
            Some(&TickerOutcome::unexpected()),
            "concurrency={}",
            evaluator.concurrency()
        );
        assert!(valuation.get(&symbol("AAPL")).is_some_and(TickerOutcome::is_success));
        assert!(valuation.get(&symbol("CB")).is_some_and(TickerOutcome::is_success));
        assert_eq!(valuation.failure_count(), 1);
    }
}

#[tokio::test]
async fn when_payload_is_malformed_the_reason_stays_generic() {
    for evaluator in evaluators() {
        let provider: Arc<dyn MarketDataProvider> = Arc::new(
            ScriptedProvider::new(reference_fixtures()).with_fault("CB", Fault::Malformed),
        );
        let valuation = evaluator
            .evaluate(&symbols(&["CB", "AAPL"]), provider, &ValuationParameters::default())
            .await;

        assert_eq!(
            valuation.get(&symbol("CB")).and_then(TickerOutcome::failure_reason),
            Some(DATA_RETRIEVAL_FAILED)
        );
        assert!(valuation.get(&symbol("AAPL")).is_some_and(TickerOutcome::is_success));
    }
}

#[tokio::test]
async fn when_a_provider_panics_only_that_ticker_fails() {
    for evaluator in [
        PortfolioEvaluator::new(1).expect("sequential evaluator"),
        PortfolioEvaluator::new(3).expect("concurrent evaluator"),
    ] {
        // Given: a provider that panics while serving BAC
        let provider: Arc<dyn MarketDataProvider> = Arc::new(
            ScriptedProvider::new(reference_fixtures()).with_fault("BAC", Fault::Panic),
        );
        let tickers = symbols(&["AAPL", "BAC", "KO", "CB"]);

        // When: the batch is evaluated
        let valuation = evaluator
            .evaluate(&tickers, provider, &ValuationParameters::default())
            .await;

        // Then: the panic is contained and input order is kept
        assert_eq!(order(&valuation), ["AAPL", "BAC", "KO", "CB"]);
        assert_eq!(
            valuation.get(&symbol("BAC")),
            Some(&TickerOutcome::unexpected()),
            "concurrency={}",
            evaluator.concurrency()
        );
        assert_eq!(valuation.success_count(), 3);
    }
}

#[tokio::test]
async fn when_the_only_ticker_panics_the_batch_still_reports_it() {
    for evaluator in evaluators() {
        let provider: Arc<dyn MarketDataProvider> = Arc::new(
            ScriptedProvider::new(reference_fixtures()).with_fault("BAC", Fault::Panic),
        );

        let valuation = evaluator
            .evaluate(&symbols(&["BAC"]), provider, &ValuationParameters::default())
            .await;

        assert_eq!(order(&valuation), ["BAC"]);
        assert_eq!(
            valuation.get(&symbol("BAC")),
            Some(&TickerOutcome::unexpected()),
            "concurrency={}",
            evaluator.concurrency()
        );
    }
}

#[tokio::test]
async fn when_a_provider_call_hangs_it_times_out_as_data_retrieval_failed() {
    for evaluator in evaluators() {
        let provider: Arc<dyn MarketDataProvider> = Arc::new(
            ScriptedProvider::new(reference_fixtures()).with_fault("AAPL", Fault::Hang),
        );
        let valuation = evaluator
            .with_request_timeout(Duration::from_millis(50))
            .evaluate(&symbols(&["AAPL", "KO"]), provider, &ValuationParameters::default())
            .await;

        assert_eq!(valuation.get(&symbol("AAPL")), Some(&TickerOutcome::unexpected()));
        assert!(valuation.get(&symbol("KO")).is_some_and(TickerOutcome::is_success));
    }
}

// =============================================================================
// Expected "no data" conditions
// =============================================================================

#[tokio::test]
async fn when_data_is_missing_the_reason_names_the_missing_input() {
    let fixtures = reference_fixtures()
        .with_entry(
            symbol("AXP"),
            FixtureEntry {
                shares_outstanding: None,
                ..FixtureEntry::complete(10.0, 1.0, 1.0, 1.0)
            },
        )
        .with_entry(
            symbol("OXY"),
            FixtureEntry {
                latest_close: None,
                ..FixtureEntry::complete(10.0, 1.0, 1.0, 1.0)
            },
        );
    let provider: Arc<dyn MarketDataProvider> = Arc::new(fixtures);

    let valuation = PortfolioEvaluator::new(2)
        .expect("evaluator")
        .evaluate(
            &symbols(&["MCO", "AXP", "OXY", "AAPL"]),
            provider,
            &ValuationParameters::default(),
        )
        .await;

    let reasons = valuation
        .iter()
        .map(|(symbol, outcome)| (symbol.as_str(), outcome.failure_reason()))
        .collect::<Vec<_>>();
    assert_eq!(
        reasons,
        [
            ("MCO", Some("No cash flow data available")),
            ("AXP", Some("No shares outstanding data available")),
            ("OXY", Some("No current price data available")),
            ("AAPL", None),
        ]
    );
}

#[tokio::test]
async fn when_no_cash_flow_is_reported_later_queries_are_skipped() {
    let provider = Arc::new(ScriptedProvider::new(FixtureProvider::new()));
    let outcome = PortfolioEvaluator::default()
        .evaluate_ticker(provider.as_ref(), &symbol("KHC"), &ValuationParameters::default())
        .await;

    assert_eq!(outcome.failure_reason(), Some("No cash flow data available"));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn when_capex_is_not_reported_it_is_treated_as_zero() {
    let provider: Arc<dyn MarketDataProvider> = Arc::new(FixtureProvider::new().with_entry(
        symbol("KO"),
        FixtureEntry {
            cash_flow: Some(CashFlowStatement::new(Some(1_000.0), None)),
            ..FixtureEntry::complete(0.0, 0.0, 100.0, 500.0)
        },
    ));
    let valuation = PortfolioEvaluator::default()
        .evaluate(&symbols(&["KO"]), provider, &ValuationParameters::default())
        .await;

    let value = valuation
        .get(&symbol("KO"))
        .and_then(TickerOutcome::valuation)
        .map(|result| result.intrinsic_value)
        .expect("KO should be valued");
    assert!((value - 735.714_285_714_285_7).abs() < 1e-9);
}

// =============================================================================
// Parameters and ratios
// =============================================================================

#[tokio::test]
async fn when_growth_equals_discount_rate_every_ticker_reports_invalid_parameters() {
    let params = ValuationParameters {
        discount_rate: 0.05,
        growth_rate: 0.05,
        horizon_years: 10,
    };
    let provider: Arc<dyn MarketDataProvider> = Arc::new(reference_fixtures());

    let valuation = PortfolioEvaluator::new(2)
        .expect("evaluator")
        .evaluate(&symbols(&["AAPL", "KO"]), provider, &params)
        .await;

    for (symbol, outcome) in valuation.iter() {
        match outcome {
            TickerOutcome::Failure(failure) => {
                assert_eq!(failure.kind, FailureKind::InvalidParameters, "{symbol}");
                assert!(failure.reason.contains("must exceed growth rate"), "{symbol}");
            }
            other => panic!("{symbol}: expected failure, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn when_price_is_zero_the_ratio_is_not_applicable() {
    let provider: Arc<dyn MarketDataProvider> = Arc::new(
        FixtureProvider::new()
            .with_entry(symbol("CVX"), FixtureEntry::complete(1_000.0, 0.0, 100.0, 0.0)),
    );
    let valuation = PortfolioEvaluator::default()
        .evaluate(&symbols(&["CVX"]), provider, &ValuationParameters::default())
        .await;

    let result = valuation
        .get(&symbol("CVX"))
        .and_then(TickerOutcome::valuation)
        .expect("CVX should be valued");
    assert_eq!(result.ratio, Ratio::NotApplicable);
    assert_eq!(result.rounded().value_to_price, Ratio::NotApplicable);
}

#[tokio::test]
async fn when_tickers_repeat_each_is_evaluated_once_at_first_position() {
    let provider = Arc::new(ScriptedProvider::new(reference_fixtures()));
    let valuation = PortfolioEvaluator::new(4)
        .expect("evaluator")
        .evaluate(
            &symbols(&["KO", "AAPL", "KO", "CB", "AAPL"]),
            provider.clone(),
            &ValuationParameters::default(),
        )
        .await;

    assert_eq!(order(&valuation), ["KO", "AAPL", "CB"]);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 9, "three queries per unique ticker");
}

#[tokio::test]
async fn sequential_and_concurrent_modes_agree() {
    let tickers = symbols(&["AAPL", "KO", "CB", "BAC", "AXP"]);
    let [sequential, concurrent] = evaluators();

    let first = sequential
        .evaluate(&tickers, Arc::new(reference_fixtures()), &ValuationParameters::default())
        .await;
    let second = concurrent
        .evaluate(&tickers, Arc::new(reference_fixtures()), &ValuationParameters::default())
        .await;

    assert_eq!(first, second);
}
