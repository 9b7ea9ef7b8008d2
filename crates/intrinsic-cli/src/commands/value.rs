use serde::Serialize;

use intrinsic_core::{
    dcf_breakdown, free_cash_flow, intrinsic_value_per_share, DcfBreakdown, Ratio,
    ValuationParameters,
};

use crate::cli::ValueArgs;
use crate::error::CliError;

use super::apply_parameters;

/// Single valuation from figures supplied on the command line.
#[derive(Debug, Clone, Serialize)]
pub struct ValueReport {
    pub operating_cash_flow: f64,
    pub capital_expenditure: f64,
    pub free_cash_flow: f64,
    pub shares_outstanding: f64,
    pub parameters: ValuationParameters,
    pub breakdown: DcfBreakdown,
    pub intrinsic_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_to_price: Option<Ratio>,
}

pub fn run(args: &ValueArgs) -> Result<ValueReport, CliError> {
    let parameters = apply_parameters(ValuationParameters::default(), &args.parameters);
    parameters.validate()?;

    let fcf = free_cash_flow(args.operating_cash_flow, args.capital_expenditure);
    let breakdown = dcf_breakdown(fcf, &parameters)?;
    let intrinsic_value = intrinsic_value_per_share(fcf, &parameters, args.shares)?;

    Ok(ValueReport {
        operating_cash_flow: args.operating_cash_flow,
        capital_expenditure: args.capital_expenditure,
        free_cash_flow: fcf,
        shares_outstanding: args.shares,
        parameters,
        breakdown,
        intrinsic_value,
        current_price: args.price,
        value_to_price: args
            .price
            .map(|price| Ratio::between(intrinsic_value, price)),
    })
}
