//! Constant-growth discounted cash flow model.
//!
//! The explicit window projects `fcf * (1 + g)^t` for `t = 1..=n` and discounts
//! each year at `(1 + r)^t`. The terminal value is the Gordon Growth perpetuity
//! of the cash flow one year past the window, `fcf * (1 + g)^(n + 1) / (r - g)`,
//! discounted back by `(1 + r)^n`.

use serde::Serialize;

use crate::{ValidationError, ValuationError, ValuationParameters, MAX_HORIZON_YEARS};

/// Intermediate terms of one DCF computation. Values are totals, not per share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DcfBreakdown {
    pub pv_explicit: f64,
    pub terminal_value: f64,
    pub pv_terminal: f64,
    pub enterprise_value: f64,
}

/// Runs the model and returns every intermediate term.
///
/// # Errors
///
/// [`ValuationError::InvalidParameters`] when `params` fail validation, which
/// includes `discount_rate <= growth_rate`; [`ValuationError::NonFinite`] when
/// `fcf` is not finite or the arithmetic overflows.
pub fn dcf_breakdown(fcf: f64, params: &ValuationParameters) -> Result<DcfBreakdown, ValuationError> {
    params.validate()?;
    if !fcf.is_finite() {
        return Err(ValuationError::NonFinite {
            stage: "free cash flow",
        });
    }

    let r = params.discount_rate;
    let g = params.growth_rate;
    let horizon = i32::try_from(params.horizon_years).map_err(|_| {
        ValidationError::HorizonTooLong {
            value: params.horizon_years,
            max: MAX_HORIZON_YEARS,
        }
    })?;

    let pv_explicit = (1..=horizon)
        .map(|t| fcf * (1.0 + g).powi(t) / (1.0 + r).powi(t))
        .sum::<f64>();
    let terminal_value = fcf * (1.0 + g).powi(horizon + 1) / (r - g);
    let pv_terminal = terminal_value / (1.0 + r).powi(horizon);
    let enterprise_value = pv_explicit + pv_terminal;

    if !terminal_value.is_finite() {
        return Err(ValuationError::NonFinite {
            stage: "terminal value",
        });
    }
    if !enterprise_value.is_finite() {
        return Err(ValuationError::NonFinite {
            stage: "enterprise value",
        });
    }

    Ok(DcfBreakdown {
        pv_explicit,
        terminal_value,
        pv_terminal,
        enterprise_value,
    })
}

/// Enterprise value divided by shares outstanding.
///
/// # Errors
///
/// Everything [`dcf_breakdown`] rejects, plus
/// [`ValuationError::NonPositiveShares`] when `shares_outstanding <= 0` or is
/// not finite.
pub fn intrinsic_value_per_share(
    fcf: f64,
    params: &ValuationParameters,
    shares_outstanding: f64,
) -> Result<f64, ValuationError> {
    if !(shares_outstanding.is_finite() && shares_outstanding > 0.0) {
        return Err(ValuationError::NonPositiveShares {
            shares: shares_outstanding,
        });
    }

    let breakdown = dcf_breakdown(fcf, params)?;
    let per_share = breakdown.enterprise_value / shares_outstanding;
    if !per_share.is_finite() {
        return Err(ValuationError::NonFinite {
            stage: "value per share",
        });
    }
    Ok(per_share)
}
