use std::sync::Arc;

use intrinsic_core::{
    parse_ticker_list, EvaluationConfig, FixtureProvider, MarketDataProvider, PortfolioValuation,
    RequestPolicy, Symbol, ValuationParameters, YahooProvider,
};

use crate::cli::EvaluateArgs;
use crate::error::CliError;

use super::apply_parameters;

#[derive(Debug)]
pub struct PortfolioReport {
    pub provider: &'static str,
    pub parameters: ValuationParameters,
    pub valuation: PortfolioValuation,
}

pub async fn run(args: &EvaluateArgs) -> Result<PortfolioReport, CliError> {
    let config = resolve_config(args)?;

    let (provider, call_budget) = match &args.fixtures {
        Some(path) => {
            let fixtures = FixtureProvider::from_path(path)?;
            tracing::info!(path = %path.display(), tickers = fixtures.len(), "loaded fixtures");
            (
                Arc::new(fixtures) as Arc<dyn MarketDataProvider>,
                config.request_timeout(),
            )
        }
        None => {
            let policy = RequestPolicy::default().with_request_timeout(config.request_timeout());
            let call_budget = policy.call_budget();
            (
                Arc::new(YahooProvider::new(policy)) as Arc<dyn MarketDataProvider>,
                call_budget,
            )
        }
    };

    let evaluator = config.evaluator()?.with_request_timeout(call_budget);
    let valuation = evaluator
        .evaluate(&config.tickers, Arc::clone(&provider), &config.parameters)
        .await;

    Ok(PortfolioReport {
        provider: provider.name(),
        parameters: config.parameters,
        valuation,
    })
}

/// Defaults, then `--config`, then ticker and parameter flags.
fn resolve_config(args: &EvaluateArgs) -> Result<EvaluationConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => EvaluationConfig::from_path(path)?,
        None => EvaluationConfig::default(),
    };

    if !args.symbols.is_empty() {
        config.tickers = args
            .symbols
            .iter()
            .map(|raw| Symbol::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
    } else if let Some(json) = &args.tickers {
        config.tickers = parse_ticker_list(json)?;
    } else if let Some(path) = &args.tickers_file {
        let raw = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?;
        config.tickers = parse_ticker_list(&raw)?;
    }

    config.parameters = apply_parameters(config.parameters, &args.parameters);
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }

    config.validate()?;
    Ok(config)
}
