mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::Cli;
use crate::commands::CommandOutput;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    match run(&cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let output = commands::run(cli).await?;
    output::render(&output, cli.format, cli.pretty, &mut std::io::stdout().lock())?;

    if let CommandOutput::Portfolio(report) = &output {
        let failed = report.valuation.failure_count();
        if cli.strict && failed > 0 {
            return Err(CliError::StrictModeViolation {
                failed,
                total: report.valuation.len(),
            });
        }
    }

    Ok(ExitCode::SUCCESS)
}
