use serde::Serialize;
use thiserror::Error;

use super::{ANNUAL_GROWTH_RATE, FEDERAL_LTCG_RATE, NIIT_RATE};

pub const MIN_HOLDING_PERIOD: u32 = 1;
pub const MAX_HOLDING_PERIOD: u32 = 30;
pub const MAX_STATE_TAX_RATE: f64 = 100.0;

pub const DEFAULT_TICKER: &str = "NVDA";
pub const DEFAULT_STOCK_VALUE: f64 = 5_000_000.0;
pub const DEFAULT_COST_BASIS: f64 = 500_000.0;
pub const DEFAULT_STATE_CODE: &str = "CA";
pub const DEFAULT_STATE_TAX_RATE: f64 = 13.3;
pub const DEFAULT_HOLDING_PERIOD: u32 = 7;

/// Rejection of a scenario field that falls outside its domain.
///
/// The display form is `"<field>: <reason>"`, which is what the CLI prints and
/// the HTTP API returns as its error body.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field}: must be > 0")]
    NotPositive { field: &'static str },
    #[error("{field}: must be >= 0")]
    Negative { field: &'static str },
    #[error("{field}: must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::NotFinite { field }
            | ValidationError::NotPositive { field }
            | ValidationError::Negative { field }
            | ValidationError::OutOfRange { field, .. } => *field,
        }
    }
}

/// Policy rates applied by the projection engine.
///
/// All three are fractions (0.20 = 20%). The defaults are the illustrative
/// figures the calculator publishes; they are not derived from tax law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionAssumptions {
    pub federal_rate: f64,
    pub niit_rate: f64,
    pub annual_growth_rate: f64,
}

impl Default for ProjectionAssumptions {
    fn default() -> Self {
        Self {
            federal_rate: FEDERAL_LTCG_RATE,
            niit_rate: NIIT_RATE,
            annual_growth_rate: ANNUAL_GROWTH_RATE,
        }
    }
}

/// The user-editable scenario fed to the engine.
///
/// Fields are private so the basis invariant (`cost_basis <= stock_value`)
/// holds after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInput {
    ticker: String,
    stock_value: f64,
    cost_basis: f64,
    state_tax_rate: f64,
    holding_period: u32,
}

impl Default for ScenarioInput {
    fn default() -> Self {
        Self {
            ticker: DEFAULT_TICKER.to_string(),
            stock_value: DEFAULT_STOCK_VALUE,
            cost_basis: DEFAULT_COST_BASIS,
            state_tax_rate: DEFAULT_STATE_TAX_RATE,
            holding_period: DEFAULT_HOLDING_PERIOD,
        }
    }
}

impl ScenarioInput {
    pub fn new(
        ticker: &str,
        stock_value: f64,
        cost_basis: f64,
        state_tax_rate: f64,
        holding_period: u32,
    ) -> Result<Self, ValidationError> {
        let mut input = Self::default();
        input.set_ticker(ticker);
        input.set_stock_value(stock_value)?;
        input.set_cost_basis(cost_basis)?;
        input.set_state_tax_rate(state_tax_rate)?;
        input.set_holding_period(holding_period)?;
        Ok(input)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn stock_value(&self) -> f64 {
        self.stock_value
    }

    pub fn cost_basis(&self) -> f64 {
        self.cost_basis
    }

    pub fn state_tax_rate(&self) -> f64 {
        self.state_tax_rate
    }

    pub fn holding_period(&self) -> u32 {
        self.holding_period
    }

    pub fn unrealized_gain(&self) -> f64 {
        self.stock_value - self.cost_basis
    }

    pub fn set_ticker(&mut self, ticker: &str) {
        self.ticker = ticker.trim().to_uppercase();
    }

    /// Sets the position value, pulling the cost basis down with it when the
    /// new value is below the current basis.
    pub fn set_stock_value(&mut self, stock_value: f64) -> Result<(), ValidationError> {
        let field = "stockValue";
        ensure_finite(field, stock_value)?;
        if stock_value <= 0.0 {
            return Err(ValidationError::NotPositive { field });
        }
        self.stock_value = stock_value;
        if self.cost_basis > stock_value {
            self.cost_basis = stock_value;
        }
        Ok(())
    }

    /// Sets the cost basis. A basis above the current stock value is clamped
    /// to it rather than rejected.
    pub fn set_cost_basis(&mut self, cost_basis: f64) -> Result<(), ValidationError> {
        let field = "costBasis";
        ensure_finite(field, cost_basis)?;
        if cost_basis < 0.0 {
            return Err(ValidationError::Negative { field });
        }
        self.cost_basis = cost_basis.min(self.stock_value);
        Ok(())
    }

    /// Sets the state rate in percent (13.3 = 13.3%).
    pub fn set_state_tax_rate(&mut self, state_tax_rate: f64) -> Result<(), ValidationError> {
        let field = "stateTaxRate";
        ensure_finite(field, state_tax_rate)?;
        if !(0.0..=MAX_STATE_TAX_RATE).contains(&state_tax_rate) {
            return Err(ValidationError::OutOfRange {
                field,
                min: 0.0,
                max: MAX_STATE_TAX_RATE,
            });
        }
        self.state_tax_rate = state_tax_rate;
        Ok(())
    }

    pub fn set_holding_period(&mut self, holding_period: u32) -> Result<(), ValidationError> {
        if !(MIN_HOLDING_PERIOD..=MAX_HOLDING_PERIOD).contains(&holding_period) {
            return Err(ValidationError::OutOfRange {
                field: "holdingPeriod",
                min: MIN_HOLDING_PERIOD as f64,
                max: MAX_HOLDING_PERIOD as f64,
            });
        }
        self.holding_period = holding_period;
        Ok(())
    }
}

fn ensure_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite { field })
    }
}

/// Everything derived from one scenario. Values are unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxProjection {
    pub unrealized_gain: f64,
    pub federal_tax: f64,
    pub niit_tax: f64,
    pub state_tax: f64,
    pub total_tax: f64,
    pub growth_factor: f64,
    /// Amount left to reinvest after paying `total_tax` today.
    pub net_proceeds: f64,
    pub sell_and_reinvest_future_value: f64,
    pub deferred_exchange_future_value: f64,
    pub opportunity_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionYear {
    pub year: u32,
    pub sell_and_reinvest_value: f64,
    pub deferred_exchange_value: f64,
    pub opportunity_cost: f64,
}

/// One bar of the sell-versus-exchange comparison chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonBar {
    pub name: &'static str,
    pub value: f64,
    pub opportunity_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JurisdictionRate {
    pub code: &'static str,
    pub display_name: &'static str,
    /// Percent, not a fraction.
    #[serde(rename = "rate")]
    pub top_marginal_rate: f64,
}

/// Result of resolving a jurisdiction code. Unknown codes resolve to a zero
/// rate with the normalised code standing in for the display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLookup {
    pub code: String,
    pub display_name: String,
    pub rate: f64,
    pub known: bool,
}
