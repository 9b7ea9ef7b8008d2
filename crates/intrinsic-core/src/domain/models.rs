use serde::{Deserialize, Serialize, Serializer};

use crate::ValidationError;

/// Reason surfaced for any failure that is not one of the expected "no data" conditions.
pub const DATA_RETRIEVAL_FAILED: &str = "Data retrieval failed";

/// Most recent reported cash-flow period as returned by a provider.
///
/// Fields are optional so that "not reported" stays distinguishable from a
/// reported zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub operating_cash_flow: Option<f64>,
    pub capital_expenditure: Option<f64>,
    /// Period end date as reported by the provider (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<String>,
}

/// What to do when a statement reports operating cash flow but no capital expenditure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingCapex {
    AssumeZero,
    Reject,
}

impl CashFlowStatement {
    pub fn new(operating_cash_flow: Option<f64>, capital_expenditure: Option<f64>) -> Self {
        Self {
            operating_cash_flow,
            capital_expenditure,
            period_end: None,
        }
    }

    pub fn with_period_end(mut self, period_end: impl Into<String>) -> Self {
        self.period_end = Some(period_end.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.operating_cash_flow.is_none() && self.capital_expenditure.is_none()
    }

    /// Returns `(operating_cash_flow, capital_expenditure)` under `policy`, or
    /// `None` when the statement cannot back a valuation.
    ///
    /// Operating cash flow is never defaulted.
    pub fn resolve(&self, policy: MissingCapex) -> Option<(f64, f64)> {
        let operating = self.operating_cash_flow?;
        match (self.capital_expenditure, policy) {
            (Some(capex), _) => Some((operating, capex)),
            (None, MissingCapex::AssumeZero) => Some((operating, 0.0)),
            (None, MissingCapex::Reject) => None,
        }
    }
}

/// Inputs fetched for one ticker in one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    pub operating_cash_flow: f64,
    pub capital_expenditure: f64,
    pub shares_outstanding: f64,
    pub current_price: f64,
}

/// Longest explicit forecast window accepted by [`ValuationParameters::validate`].
pub const MAX_HORIZON_YEARS: u32 = 1_000;

/// DCF model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationParameters {
    pub discount_rate: f64,
    pub growth_rate: f64,
    pub horizon_years: u32,
}

impl Default for ValuationParameters {
    fn default() -> Self {
        Self {
            discount_rate: 0.044,
            growth_rate: 0.03,
            horizon_years: 10,
        }
    }
}

impl ValuationParameters {
    pub fn new(
        discount_rate: f64,
        growth_rate: f64,
        horizon_years: u32,
    ) -> Result<Self, ValidationError> {
        let params = Self {
            discount_rate,
            growth_rate,
            horizon_years,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks `0 < r < 1`, `0 <= g < r` and `1 <= horizon <= MAX_HORIZON_YEARS`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.discount_rate.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "discount_rate",
            });
        }
        if !self.growth_rate.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "growth_rate",
            });
        }
        if self.discount_rate <= 0.0 || self.discount_rate >= 1.0 {
            return Err(ValidationError::DiscountRateOutOfRange {
                value: self.discount_rate,
            });
        }
        if self.growth_rate < 0.0 {
            return Err(ValidationError::NegativeGrowthRate {
                value: self.growth_rate,
            });
        }
        if self.discount_rate <= self.growth_rate {
            return Err(ValidationError::DiscountNotAboveGrowth {
                discount_rate: self.discount_rate,
                growth_rate: self.growth_rate,
            });
        }
        if self.horizon_years == 0 {
            return Err(ValidationError::ZeroHorizon);
        }
        if self.horizon_years > MAX_HORIZON_YEARS {
            return Err(ValidationError::HorizonTooLong {
                value: self.horizon_years,
                max: MAX_HORIZON_YEARS,
            });
        }
        Ok(())
    }
}

/// Intrinsic value over market price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Value(f64),
    NotApplicable,
}

impl Ratio {
    /// A zero price yields `NotApplicable` instead of dividing.
    pub fn between(intrinsic_value: f64, current_price: f64) -> Self {
        if current_price == 0.0 {
            Self::NotApplicable
        } else {
            Self::Value(intrinsic_value / current_price)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(value),
            Self::NotApplicable => None,
        }
    }

    fn rounded(self) -> Self {
        match self {
            Self::Value(value) => Self::Value(round_to_cents(value)),
            Self::NotApplicable => Self::NotApplicable,
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Value(value) => serializer.serialize_f64(*value),
            Self::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

/// Raw valuation outcome for one ticker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationResult {
    pub intrinsic_value: f64,
    pub current_price: f64,
    pub ratio: Ratio,
}

impl ValuationResult {
    pub fn new(intrinsic_value: f64, current_price: f64) -> Self {
        Self {
            intrinsic_value,
            current_price,
            ratio: Ratio::between(intrinsic_value, current_price),
        }
    }

    /// Display copy with every figure rounded to cents. The raw result is untouched.
    pub fn rounded(&self) -> RoundedValuation {
        RoundedValuation {
            dcf_value: round_to_cents(self.intrinsic_value),
            current_price: round_to_cents(self.current_price),
            value_to_price: self.ratio.rounded(),
        }
    }
}

/// Presentation form of [`ValuationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoundedValuation {
    pub dcf_value: f64,
    pub current_price: f64,
    pub value_to_price: Ratio,
}

/// Failure category carried by [`TickerOutcome::Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    DataUnavailable,
    InvalidParameters,
    Unexpected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerFailure {
    pub kind: FailureKind,
    pub reason: String,
}

/// Per-ticker result of an evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Success(ValuationResult),
    Failure(TickerFailure),
}

impl TickerOutcome {
    pub fn failure(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self::Failure(TickerFailure {
            kind,
            reason: reason.into(),
        })
    }

    pub fn unexpected() -> Self {
        Self::failure(FailureKind::Unexpected, DATA_RETRIEVAL_FAILED)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn valuation(&self) -> Option<&ValuationResult> {
        match self {
            Self::Success(result) => Some(result),
            Self::Failure(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(&failure.reason),
        }
    }
}

/// Rounds to two decimal places, half to even on the exact binary value
/// (`0.125 -> 0.12`, `0.375 -> 0.38`, `2.675 -> 2.67`).
pub fn round_to_cents(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}
