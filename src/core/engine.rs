use super::types::{
    ComparisonBar, ProjectionAssumptions, ProjectionYear, ScenarioInput, TaxProjection,
};

pub const SELL_AND_REINVEST_LABEL: &str = "Sell & Reinvest";
pub const EXCHANGE_FUND_LABEL: &str = "Exchange Fund";

/// Compares selling a position today against contributing it to an exchange
/// fund, under a fixed set of policy rates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionEngine {
    assumptions: ProjectionAssumptions,
}

impl ProjectionEngine {
    pub fn new(assumptions: ProjectionAssumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &ProjectionAssumptions {
        &self.assumptions
    }

    pub fn growth_factor(&self, years: u32) -> f64 {
        (1.0 + self.assumptions.annual_growth_rate).powi(years as i32)
    }

    pub fn project(&self, input: &ScenarioInput) -> TaxProjection {
        self.project_position(
            input.stock_value(),
            input.cost_basis(),
            input.state_tax_rate(),
            input.holding_period(),
        )
    }

    /// Year-by-year values from today (year 0) through the holding period.
    /// The last row matches the terminal figures of [`ProjectionEngine::project`].
    pub fn trace(&self, input: &ScenarioInput) -> Vec<ProjectionYear> {
        let projection = self.project(input);
        (0..=input.holding_period())
            .map(|year| {
                let growth = self.growth_factor(year);
                let sell = projection.net_proceeds * growth;
                let deferred = input.stock_value() * growth;
                ProjectionYear {
                    year,
                    sell_and_reinvest_value: sell,
                    deferred_exchange_value: deferred,
                    opportunity_cost: deferred - sell,
                }
            })
            .collect()
    }

    // Gain is floored here as well as by the scenario's basis clamp, so a
    // basis above value can never produce a negative tax.
    fn project_position(
        &self,
        stock_value: f64,
        cost_basis: f64,
        state_tax_rate_pct: f64,
        years: u32,
    ) -> TaxProjection {
        let gain = (stock_value - cost_basis).max(0.0);

        let federal_tax = gain * self.assumptions.federal_rate;
        let niit_tax = gain * self.assumptions.niit_rate;
        let state_tax = gain * (state_tax_rate_pct / 100.0);
        let total_tax = federal_tax + niit_tax + state_tax;

        let growth_factor = self.growth_factor(years);
        let net_proceeds = stock_value - total_tax;
        let sell_and_reinvest_future_value = net_proceeds * growth_factor;
        let deferred_exchange_future_value = stock_value * growth_factor;

        TaxProjection {
            unrealized_gain: gain,
            federal_tax,
            niit_tax,
            state_tax,
            total_tax,
            growth_factor,
            net_proceeds,
            sell_and_reinvest_future_value,
            deferred_exchange_future_value,
            opportunity_cost: deferred_exchange_future_value - sell_and_reinvest_future_value,
        }
    }
}

pub fn project(input: &ScenarioInput) -> TaxProjection {
    ProjectionEngine::default().project(input)
}

pub fn trace(input: &ScenarioInput) -> Vec<ProjectionYear> {
    ProjectionEngine::default().trace(input)
}

/// The two bars of the comparison chart. Only the sell path carries an
/// opportunity cost.
pub fn comparison_bars(projection: &TaxProjection) -> [ComparisonBar; 2] {
    [
        ComparisonBar {
            name: SELL_AND_REINVEST_LABEL,
            value: projection.sell_and_reinvest_future_value,
            opportunity_cost: projection.opportunity_cost,
        },
        ComparisonBar {
            name: EXCHANGE_FUND_LABEL,
            value: projection.deferred_exchange_future_value,
            opportunity_cost: 0.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ANNUAL_GROWTH_RATE, FEDERAL_LTCG_RATE, NIIT_RATE, all_jurisdictions};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn scenario(stock_value: f64, cost_basis: f64, rate: f64, years: u32) -> ScenarioInput {
        ScenarioInput::new("TEST", stock_value, cost_basis, rate, years).expect("valid scenario")
    }

    #[test]
    fn reference_scenario_matches_published_figures() {
        let input = scenario(5_000_000.0, 500_000.0, 13.3, 7);
        let p = project(&input);

        assert_approx(p.unrealized_gain, 4_500_000.0);
        assert_approx(p.federal_tax, 900_000.0);
        assert_approx(p.niit_tax, 171_000.0);
        assert_approx(p.state_tax, 598_500.0);
        assert_approx(p.total_tax, 1_669_500.0);
        assert_approx_tol(p.growth_factor, 1.605_781_476_478_430_6, 1e-12);
        assert_approx(p.net_proceeds, 3_330_500.0);

        assert_eq!(p.sell_and_reinvest_future_value.round(), 5_348_055.0);
        assert_eq!(p.deferred_exchange_future_value.round(), 8_028_907.0);
        assert_eq!(p.opportunity_cost.round(), 2_680_852.0);
    }

    #[test]
    fn default_scenario_is_the_reference_scenario() {
        let p = project(&ScenarioInput::default());
        assert_approx(p.total_tax, 1_669_500.0);
        assert_eq!(p.opportunity_cost.round(), 2_680_852.0);
    }

    #[test]
    fn basis_equal_to_value_has_no_tax_and_no_opportunity_cost() {
        let p = project(&scenario(2_000_000.0, 2_000_000.0, 9.9, 12));
        assert_eq!(p.unrealized_gain, 0.0);
        assert_eq!(p.total_tax, 0.0);
        assert_eq!(p.opportunity_cost, 0.0);
        assert_eq!(
            p.sell_and_reinvest_future_value,
            p.deferred_exchange_future_value
        );
    }

    #[test]
    fn basis_above_value_is_floored_to_zero_gain() {
        let engine = ProjectionEngine::default();
        let p = engine.project_position(1_000_000.0, 1_500_000.0, 13.3, 5);
        assert_eq!(p.unrealized_gain, 0.0);
        assert_eq!(p.total_tax, 0.0);
        assert_eq!(p.net_proceeds, 1_000_000.0);
        assert_eq!(p.opportunity_cost, 0.0);
    }

    #[test]
    fn state_tax_comes_from_the_input_rate() {
        let mut input = scenario(1_000_000.0, 0.0, 13.3, 1);
        input.set_state_tax_rate(0.0).expect("valid rate");
        let p = project(&input);
        assert_eq!(p.state_tax, 0.0);
        assert_approx(p.total_tax, 238_000.0);

        input.set_state_tax_rate(5.0).expect("valid rate");
        let p = project(&input);
        assert_approx(p.state_tax, 50_000.0);
        assert_approx(p.total_tax, 288_000.0);
    }

    #[test]
    fn one_year_horizon_grows_by_one_period() {
        let p = project(&scenario(1_000_000.0, 0.0, 0.0, 1));
        assert_approx(p.growth_factor, 1.07);
        assert_approx(p.deferred_exchange_future_value, 1_070_000.0);
        assert_approx(p.sell_and_reinvest_future_value, 762_000.0 * 1.07);
        assert_approx(p.opportunity_cost, 238_000.0 * 1.07);
    }

    #[test]
    fn tax_above_position_compounds_as_a_shortfall() {
        // 20% + 3.8% + 90% of a zero-basis gain is more than the position.
        let mut input = scenario(1_000_000.0, 0.0, 90.0, 5);
        let shorter = project(&input);
        assert_approx(shorter.total_tax, 1_138_000.0);
        assert_approx(shorter.net_proceeds, -138_000.0);
        assert_approx(
            shorter.sell_and_reinvest_future_value,
            -138_000.0 * 1.07_f64.powi(5),
        );

        input.set_holding_period(6).expect("valid horizon");
        let longer = project(&input);
        assert!(longer.sell_and_reinvest_future_value < shorter.sell_and_reinvest_future_value);
        assert!(longer.deferred_exchange_future_value > shorter.deferred_exchange_future_value);
        assert!(longer.opportunity_cost > shorter.opportunity_cost);
        assert_approx_tol(
            longer.opportunity_cost,
            1_138_000.0 * 1.07_f64.powi(6),
            1e-6,
        );
    }

    #[test]
    fn every_tabled_rate_leaves_positive_proceeds() {
        for j in all_jurisdictions() {
            let p = project(&scenario(1_000_000.0, 0.0, j.top_marginal_rate, 1));
            assert!(p.net_proceeds > 0.0, "{} leaves nothing to reinvest", j.code);
        }
    }

    #[test]
    fn default_assumptions_use_published_constants() {
        let assumptions = ProjectionAssumptions::default();
        assert_eq!(assumptions.federal_rate, FEDERAL_LTCG_RATE);
        assert_eq!(assumptions.niit_rate, NIIT_RATE);
        assert_eq!(assumptions.annual_growth_rate, ANNUAL_GROWTH_RATE);
        assert_eq!(FEDERAL_LTCG_RATE, 0.20);
        assert_eq!(NIIT_RATE, 0.038);
        assert_eq!(ANNUAL_GROWTH_RATE, 0.07);
    }

    #[test]
    fn custom_assumptions_change_rates_without_touching_inputs() {
        let engine = ProjectionEngine::new(ProjectionAssumptions {
            federal_rate: 0.15,
            niit_rate: 0.0,
            annual_growth_rate: 0.0,
        });
        let p = engine.project(&scenario(1_000_000.0, 600_000.0, 10.0, 10));
        assert_approx(p.federal_tax, 60_000.0);
        assert_eq!(p.niit_tax, 0.0);
        assert_approx(p.state_tax, 40_000.0);
        assert_eq!(p.growth_factor, 1.0);
        // Without growth the opportunity cost is the tax bill itself.
        assert_approx(p.opportunity_cost, p.total_tax);
    }

    #[test]
    fn trace_runs_from_today_to_horizon() {
        let input = scenario(5_000_000.0, 500_000.0, 13.3, 7);
        let rows = trace(&input);
        assert_eq!(rows.len(), 8);

        let first = rows[0];
        assert_eq!(first.year, 0);
        assert_eq!(first.deferred_exchange_value, 5_000_000.0);
        assert_approx(first.sell_and_reinvest_value, 3_330_500.0);
        assert_approx(first.opportunity_cost, 1_669_500.0);

        let p = project(&input);
        let last = rows[7];
        assert_eq!(last.year, 7);
        assert_eq!(last.sell_and_reinvest_value, p.sell_and_reinvest_future_value);
        assert_eq!(last.deferred_exchange_value, p.deferred_exchange_future_value);
        assert_eq!(last.opportunity_cost, p.opportunity_cost);

        for pair in rows.windows(2) {
            assert!(pair[1].deferred_exchange_value > pair[0].deferred_exchange_value);
            assert!(pair[1].opportunity_cost > pair[0].opportunity_cost);
        }
    }

    #[test]
    fn comparison_bars_put_opportunity_cost_on_the_sell_path() {
        let p = project(&ScenarioInput::default());
        let [sell, exchange] = comparison_bars(&p);
        assert_eq!(sell.name, "Sell & Reinvest");
        assert_eq!(sell.value, p.sell_and_reinvest_future_value);
        assert_eq!(sell.opportunity_cost, p.opportunity_cost);
        assert_eq!(exchange.name, "Exchange Fund");
        assert_eq!(exchange.value, p.deferred_exchange_future_value);
        assert_eq!(exchange.opportunity_cost, 0.0);
        // Stacked, the sell bar reaches the exchange bar.
        assert_approx_tol(sell.value + sell.opportunity_cost, exchange.value, 1e-6);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_projection_invariants_hold(
            stock_value in 1u32..20_000_000,
            basis_pct in 0u32..=100,
            rate_bp in 0u32..=10_000,
            years in 1u32..=30
        ) {
            let stock_value = stock_value as f64;
            let cost_basis = (stock_value * basis_pct as f64 / 100.0).floor();
            let input = scenario(stock_value, cost_basis, rate_bp as f64 / 100.0, years);
            let p = project(&input);

            prop_assert!(p.unrealized_gain >= 0.0);
            prop_assert_eq!(p.unrealized_gain, stock_value - cost_basis);
            prop_assert_eq!(p.total_tax, p.federal_tax + p.niit_tax + p.state_tax);
            prop_assert!(p.growth_factor > 1.0);
            if p.total_tax > 0.0 {
                prop_assert!(p.opportunity_cost >= 0.0);
                prop_assert!(
                    p.deferred_exchange_future_value >= p.sell_and_reinvest_future_value
                );
            }
            prop_assert!(p.sell_and_reinvest_future_value.is_finite());
            prop_assert!(p.deferred_exchange_future_value.is_finite());
        }

        #[test]
        fn prop_project_is_idempotent(
            stock_value in 1u32..20_000_000,
            basis_pct in 0u32..=100,
            rate_bp in 0u32..=10_000,
            years in 1u32..=30
        ) {
            let stock_value = stock_value as f64;
            let cost_basis = stock_value * basis_pct as f64 / 100.0;
            let input = scenario(stock_value, cost_basis, rate_bp as f64 / 100.0, years);
            let first = project(&input);
            let second = project(&input);
            prop_assert_eq!(first.total_tax.to_bits(), second.total_tax.to_bits());
            prop_assert_eq!(
                first.opportunity_cost.to_bits(),
                second.opportunity_cost.to_bits()
            );
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_longer_horizon_grows_both_paths(
            stock_value in 1u32..20_000_000,
            basis_pct in 0u32..=100,
            rate_bp in 0u32..=10_000,
            years in 1u32..30
        ) {
            let stock_value = stock_value as f64;
            let cost_basis = (stock_value * basis_pct as f64 / 100.0).floor();
            let mut input = scenario(stock_value, cost_basis, rate_bp as f64 / 100.0, years);
            let shorter = project(&input);
            input.set_holding_period(years + 1).expect("valid horizon");
            let longer = project(&input);

            prop_assert!(
                longer.deferred_exchange_future_value > shorter.deferred_exchange_future_value
            );
            prop_assert!(longer.opportunity_cost >= shorter.opportunity_cost);
            // The sell path only grows while something is left after tax.
            if shorter.net_proceeds > 0.0 {
                prop_assert!(
                    longer.sell_and_reinvest_future_value > shorter.sell_and_reinvest_future_value
                );
            } else if shorter.net_proceeds < 0.0 {
                prop_assert!(
                    longer.sell_and_reinvest_future_value < shorter.sell_and_reinvest_future_value
                );
            }
        }
    }
}
