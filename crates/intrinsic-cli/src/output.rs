use std::io::Write;

use intrinsic_core::{
    round_to_cents, PortfolioValuation, Ratio, RoundedValuation, TickerOutcome,
    ValuationParameters,
};
use serde::ser::Serializer;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::commands::{CommandOutput, PortfolioReport, ValueReport};
use crate::error::CliError;

pub fn render<W: Write>(
    output: &CommandOutput,
    format: OutputFormat,
    pretty: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => match output {
            CommandOutput::Portfolio(report) => render_portfolio_text(&report.valuation, writer)?,
            CommandOutput::Value(report) => render_value_text(report, writer)?,
        },
        OutputFormat::Json => {
            let payload = match output {
                CommandOutput::Portfolio(report) => to_json(&PortfolioJson::from(report), pretty)?,
                CommandOutput::Value(report) => to_json(report, pretty)?,
            };
            writeln!(writer, "{payload}")?;
        }
    }

    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(payload)
}

/// `TICKER | DCF: 735.71, Current Price: 500.00, Ratio: 1.47` or
/// `TICKER | Error: <reason>`.
pub fn ticker_line(symbol: &str, outcome: &TickerOutcome) -> String {
    match outcome {
        TickerOutcome::Success(result) => {
            let rounded = result.rounded();
            format!(
                "{symbol} | DCF: {:.2}, Current Price: {:.2}, Ratio: {}",
                rounded.dcf_value,
                rounded.current_price,
                format_ratio(rounded.value_to_price)
            )
        }
        TickerOutcome::Failure(failure) => format!("{symbol} | Error: {}", failure.reason),
    }
}

fn format_ratio(ratio: Ratio) -> String {
    match ratio {
        Ratio::Value(value) => format!("{value:.2}"),
        Ratio::NotApplicable => String::from("N/A"),
    }
}

fn render_portfolio_text<W: Write>(
    valuation: &PortfolioValuation,
    writer: &mut W,
) -> Result<(), CliError> {
    for (symbol, outcome) in valuation.iter() {
        writeln!(writer, "{}", ticker_line(symbol.as_str(), outcome))?;
    }
    Ok(())
}

fn render_value_text<W: Write>(report: &ValueReport, writer: &mut W) -> Result<(), CliError> {
    let params = &report.parameters;
    writeln!(
        writer,
        "parameters      : r={} g={} n={}",
        params.discount_rate, params.growth_rate, params.horizon_years
    )?;
    writeln!(writer, "free cash flow  : {:.2}", report.free_cash_flow)?;
    writeln!(writer, "pv explicit     : {:.2}", report.breakdown.pv_explicit)?;
    writeln!(writer, "terminal value  : {:.2}", report.breakdown.terminal_value)?;
    writeln!(writer, "pv terminal     : {:.2}", report.breakdown.pv_terminal)?;
    writeln!(writer, "enterprise value: {:.2}", report.breakdown.enterprise_value)?;
    writeln!(writer, "value per share : {:.2}", round_to_cents(report.intrinsic_value))?;
    if let (Some(price), Some(ratio)) = (report.current_price, report.value_to_price) {
        writeln!(writer, "current price   : {:.2}", round_to_cents(price))?;
        writeln!(writer, "value / price   : {}", format_ratio(ratio))?;
    }
    Ok(())
}

#[derive(Serialize)]
struct PortfolioJson<'a> {
    provider: &'a str,
    parameters: &'a ValuationParameters,
    results: TickerResults<'a>,
    succeeded: usize,
    failed: usize,
}

impl<'a> From<&'a PortfolioReport> for PortfolioJson<'a> {
    fn from(report: &'a PortfolioReport) -> Self {
        Self {
            provider: report.provider,
            parameters: &report.parameters,
            results: TickerResults(&report.valuation),
            succeeded: report.valuation.success_count(),
            failed: report.valuation.failure_count(),
        }
    }
}

/// Ticker-keyed map serialized in evaluation order.
struct TickerResults<'a>(&'a PortfolioValuation);

impl Serialize for TickerResults<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(
            self.0
                .iter()
                .map(|(symbol, outcome)| (symbol.as_str(), TickerJson::from(outcome))),
        )
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum TickerJson<'a> {
    Valued(RoundedValuation),
    Failed { error: &'a str },
}

impl<'a> From<&'a TickerOutcome> for TickerJson<'a> {
    fn from(outcome: &'a TickerOutcome) -> Self {
        match outcome {
            TickerOutcome::Success(result) => Self::Valued(result.rounded()),
            TickerOutcome::Failure(failure) => Self::Failed {
                error: &failure.reason,
            },
        }
    }
}
