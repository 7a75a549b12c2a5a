mod engine;
mod format;
mod rates;
mod types;

pub use engine::{
    EXCHANGE_FUND_LABEL, ProjectionEngine, SELL_AND_REINVEST_LABEL, comparison_bars, project,
    trace,
};
pub use format::{format_rate_pct, format_usd};
pub use rates::{all_jurisdictions, list_sorted, lookup, lookup_rate};
pub use types::{
    ComparisonBar, DEFAULT_COST_BASIS, DEFAULT_HOLDING_PERIOD, DEFAULT_STATE_CODE,
    DEFAULT_STATE_TAX_RATE, DEFAULT_STOCK_VALUE, DEFAULT_TICKER, JurisdictionRate,
    MAX_HOLDING_PERIOD, MAX_STATE_TAX_RATE, MIN_HOLDING_PERIOD, ProjectionAssumptions,
    ProjectionYear, RateLookup, ScenarioInput, TaxProjection, ValidationError,
};

/// Top federal long-term capital gains rate.
pub const FEDERAL_LTCG_RATE: f64 = 0.20;

/// Net Investment Income Tax surcharge, applied flat to the whole gain.
pub const NIIT_RATE: f64 = 0.038;

/// Illustrative annual growth applied to both dispositions.
pub const ANNUAL_GROWTH_RATE: f64 = 0.07;
