//! # Domain Models
//!
//! Value types shared by the valuation engine, the providers and the batch
//! evaluator.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker |
//! | [`CashFlowStatement`] | Latest cash-flow period with optional fields |
//! | [`FinancialSnapshot`] | Resolved inputs for one ticker |
//! | [`ValuationParameters`] | Discount rate, growth rate, horizon |
//! | [`ValuationResult`] | Raw intrinsic value, price and ratio |
//! | [`TickerOutcome`] | Success or failure for one ticker |

mod models;
mod symbol;

pub use models::{
    round_to_cents, CashFlowStatement, FailureKind, FinancialSnapshot, MissingCapex, Ratio,
    RoundedValuation, TickerFailure, TickerOutcome, ValuationParameters, ValuationResult,
    DATA_RETRIEVAL_FAILED, MAX_HORIZON_YEARS,
};
pub use symbol::{parse_ticker_list, Symbol};
