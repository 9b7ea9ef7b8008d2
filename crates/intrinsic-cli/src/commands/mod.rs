mod evaluate;
mod value;

use intrinsic_core::ValuationParameters;

use crate::cli::{Cli, Command, EvaluateArgs, ParameterArgs};
use crate::error::CliError;

pub use evaluate::PortfolioReport;
pub use value::ValueReport;

/// Result of one command, rendered by [`crate::output`].
#[derive(Debug)]
pub enum CommandOutput {
    Portfolio(PortfolioReport),
    Value(ValueReport),
}

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    match &cli.command {
        None => evaluate::run(&EvaluateArgs::default())
            .await
            .map(CommandOutput::Portfolio),
        Some(Command::Evaluate(args)) => evaluate::run(args).await.map(CommandOutput::Portfolio),
        Some(Command::Value(args)) => value::run(args).map(CommandOutput::Value),
    }
}

/// Overlays the flags that were given on `base`. Validation is left to the caller.
fn apply_parameters(base: ValuationParameters, args: &ParameterArgs) -> ValuationParameters {
    ValuationParameters {
        discount_rate: args.discount_rate.unwrap_or(base.discount_rate),
        growth_rate: args.growth_rate.unwrap_or(base.growth_rate),
        horizon_years: args.horizon_years.unwrap_or(base.horizon_years),
    }
}
