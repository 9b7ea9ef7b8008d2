//! Free cash flow derivation.

use crate::{CashFlowStatement, MissingCapex};

/// `operating_cash_flow - |capital_expenditure|`.
///
/// Providers disagree on the sign of capital expenditure (cash-flow statements
/// usually report it negative), so it is always treated as an outflow.
pub fn free_cash_flow(operating_cash_flow: f64, capital_expenditure: f64) -> f64 {
    operating_cash_flow - capital_expenditure.abs()
}

impl CashFlowStatement {
    /// Free cash flow of this period, or `None` when `policy` cannot resolve
    /// the statement.
    pub fn free_cash_flow(&self, policy: MissingCapex) -> Option<f64> {
        self.resolve(policy)
            .map(|(operating, capex)| free_cash_flow(operating, capex))
    }
}
