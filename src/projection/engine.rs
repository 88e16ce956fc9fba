//! Core amortization engine for monthly mortgage and rent-vs-buy projections

use log::{debug, warn};

use crate::error::ProjectionError;
use crate::scenario::ScenarioParameters;
use super::annuity::{compound_factor, monthly_annuity_payment, monthly_interest};
use super::schedule::{MonthRow, MonthlySchedule, Projection, ScenarioSummary};

/// Allowed gap between cumulative principal and the loan amount
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Configuration for the amortization engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Convergence tolerance for the principal correction (currency units)
    pub tolerance: f64,

    /// Cap on principal correction steps; None caps at the schedule length
    pub max_correction_iterations: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_correction_iterations: None,
        }
    }
}

/// Main amortization engine
#[derive(Debug, Clone, Default)]
pub struct AmortizationEngine {
    config: EngineConfig,
}

impl AmortizationEngine {
    /// Create a new engine with the given config
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the projection for a single scenario
    pub fn compute(&self, params: &ScenarioParameters) -> Result<Projection, ProjectionError> {
        params.validate()?;

        let months = params.total_months();
        let loan_amount = params.loan_amount();
        let monthly_repayment = monthly_annuity_payment(loan_amount, params.mortgage_rate_pct, months);
        let yearly_extra = params.yearly_extra_repayment_amount();

        debug!(
            "Projecting {} months: loan {:.2}, payment {:.2}, yearly extra {:.2}",
            months, loan_amount, monthly_repayment, yearly_extra
        );

        let payments = payment_plan(months, monthly_repayment, yearly_extra);
        let interest = running_balance_interest(&payments, loan_amount, params.mortgage_rate_pct);

        let mut principal: Vec<f64> = payments
            .iter()
            .zip(&interest)
            .map(|(payment, interest)| payment - interest)
            .collect();
        clamp_overshoot(&mut principal, loan_amount);

        let correction_iterations = self.correct_principal(&mut principal, loan_amount, monthly_repayment)?;

        let schedule = build_schedule(params, &payments, &interest, &principal);
        if let Some(row) = schedule.rows().iter().find(|row| !row.is_finite()) {
            warn!("Projection overflowed at month {}", row.month);
            return Err(ProjectionError::invalid(
                "raw_house_cost",
                format!("projection overflows at month {}", row.month),
            ));
        }
        let summary = summarize(params, &schedule, monthly_repayment, correction_iterations);

        Ok(Projection { schedule, summary })
    }

    /// Push the cumulative principal onto the loan amount
    ///
    /// Each step finds the first month holding the peak cumulative principal
    /// and adds the remaining gap, at most one monthly repayment, to the month
    /// after it. Fails when the cap is reached, when there is no following
    /// month, or when a step does not shrink the gap. The tolerance widens
    /// with the loan size to cover summation rounding.
    fn correct_principal(
        &self,
        principal: &mut [f64],
        loan_amount: f64,
        monthly_repayment: f64,
    ) -> Result<usize, ProjectionError> {
        let max_iterations = self.config.max_correction_iterations.unwrap_or(principal.len());
        let tolerance = self
            .config
            .tolerance
            .max(loan_amount.abs() * f64::EPSILON * principal.len() as f64);
        let mut previous_residual = f64::INFINITY;
        let mut iterations = 0;

        loop {
            let (peak_idx, peak) = peak_cumulative(principal);
            let residual = (peak - loan_amount).abs();

            if residual <= tolerance {
                debug!("Principal converged after {} correction steps", iterations);
                return Ok(iterations);
            }

            let stalled = residual >= previous_residual;
            let no_next_month = peak_idx + 1 >= principal.len();
            if iterations >= max_iterations || stalled || no_next_month {
                warn!(
                    "Principal correction stopped at step {} (residual {:.6}, stalled: {}, end of schedule: {})",
                    iterations, residual, stalled, no_next_month
                );
                return Err(ProjectionError::ScheduleDidNotConverge { iterations, residual });
            }

            let injection = residual.min(monthly_repayment);
            debug!("Correction step {}: adding {:.6} at month {}", iterations + 1, injection, peak_idx + 2);
            principal[peak_idx + 1] += injection;

            previous_residual = residual;
            iterations += 1;
        }
    }
}

/// Project a scenario with the default engine configuration
pub fn compute(params: &ScenarioParameters) -> Result<Projection, ProjectionError> {
    AmortizationEngine::default().compute(params)
}

/// Fixed monthly payments with the yearly extra repayment on months 12, 24, ...
fn payment_plan(months: usize, monthly_repayment: f64, yearly_extra: f64) -> Vec<f64> {
    (1..=months)
        .map(|month| {
            if month % 12 == 0 {
                monthly_repayment + yearly_extra
            } else {
                monthly_repayment
            }
        })
        .collect()
}

/// Interest on the loan less all payments made through each month, floored at zero
fn running_balance_interest(payments: &[f64], loan_amount: f64, annual_rate_pct: f64) -> Vec<f64> {
    let mut paid = 0.0;
    payments
        .iter()
        .map(|payment| {
            paid += payment;
            monthly_interest(loan_amount - paid, annual_rate_pct).max(0.0)
        })
        .collect()
}

/// Zero every month whose cumulative principal already exceeds the loan
fn clamp_overshoot(principal: &mut [f64], loan_amount: f64) {
    let mut cumulative = 0.0;
    for value in principal.iter_mut() {
        cumulative += *value;
        if cumulative > loan_amount {
            *value = 0.0;
        }
    }
}

/// First index holding the maximum cumulative principal, with that maximum
fn peak_cumulative(principal: &[f64]) -> (usize, f64) {
    let mut cumulative = 0.0;
    let mut peak = (0, f64::NEG_INFINITY);

    for (idx, value) in principal.iter().enumerate() {
        cumulative += value;
        if cumulative > peak.1 {
            peak = (idx, cumulative);
        }
    }

    peak
}

fn build_schedule(
    params: &ScenarioParameters,
    payments: &[f64],
    interest: &[f64],
    principal: &[f64],
) -> MonthlySchedule {
    let loan_amount = params.loan_amount();
    let upfront_costs = params.upfront_costs();

    let mut cumulative_principal = 0.0;
    let mut cumulative_interest = 0.0;
    let mut cumulative_repayment = 0.0;

    let rows = payments
        .iter()
        .zip(interest)
        .zip(principal)
        .enumerate()
        .map(|(idx, ((&payment, &interest), &principal))| {
            let month = idx as u32 + 1;
            let total_repayment = interest + principal;

            cumulative_principal += principal;
            cumulative_interest += interest;
            cumulative_repayment += total_repayment;

            // Rent and ancillary use t * amount * growth(t), not a compounding running sum
            let general_growth = compound_factor(params.general_inflation_pct, month);
            let house_valuation = params.house_price * compound_factor(params.house_inflation_pct, month);
            let cumulative_rent = month as f64 * params.monthly_rent * general_growth;
            let cumulative_ancillary = month as f64 * params.monthly_ancillary_cost * general_growth;

            let owed_to_bank = loan_amount - cumulative_principal;
            let total_cumulative_cost = cumulative_repayment + upfront_costs;

            MonthRow {
                month,
                loan_year: (month - 1) / 12 + 1,
                payment,
                interest,
                principal,
                total_repayment,
                cumulative_principal,
                cumulative_interest,
                owed_to_bank,
                total_cumulative_cost,
                house_valuation,
                cumulative_rent,
                cumulative_ancillary,
                profit: house_valuation - owed_to_bank - total_cumulative_cost,
            }
        })
        .collect();

    MonthlySchedule::from_rows(rows)
}

fn summarize(
    params: &ScenarioParameters,
    schedule: &MonthlySchedule,
    monthly_repayment: f64,
    correction_iterations: usize,
) -> ScenarioSummary {
    let misc_costs = params.misc_costs();
    let total_interest = schedule
        .rows()
        .iter()
        .map(|row| row.cumulative_interest)
        .fold(0.0, f64::max);
    let extra_cost = misc_costs + total_interest;

    ScenarioSummary {
        loan_amount: params.loan_amount(),
        misc_costs,
        upfront_costs: params.upfront_costs(),
        monthly_repayment,
        yearly_extra_repayment_amount: params.yearly_extra_repayment_amount(),
        total_interest,
        extra_cost,
        effective_house_cost: params.house_price + extra_cost,
        extra_cost_pct: extra_cost / params.house_price * 100.0,
        monthly_outlay: monthly_repayment + params.monthly_ancillary_cost,
        practical_house_cost: params.house_price + misc_costs,
        correction_iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn reference_scenario() -> ScenarioParameters {
        ScenarioParameters::default()
    }

    fn sample_scenarios() -> Vec<ScenarioParameters> {
        vec![
            reference_scenario(),
            ScenarioParameters {
                yearly_extra_repayment_pct: 0.0,
                ..reference_scenario()
            },
            ScenarioParameters {
                mortgage_rate_pct: 0.0,
                ..reference_scenario()
            },
            ScenarioParameters {
                house_price: 500_000.0,
                down_payment: 100_000.0,
                mortgage_rate_pct: 4.5,
                yearly_extra_repayment_pct: 2.0,
                loan_period_years: 25,
                ..reference_scenario()
            },
            ScenarioParameters {
                mortgage_rate_pct: 6.0,
                yearly_extra_repayment_pct: 0.0,
                loan_period_years: 10,
                ..reference_scenario()
            },
            ScenarioParameters {
                loan_period_years: 1,
                ..reference_scenario()
            },
        ]
    }

    #[test]
    fn test_reference_scenario_figures() {
        let projection = compute(&reference_scenario()).unwrap();
        let summary = &projection.summary;

        assert_relative_eq!(summary.loan_amount, 315_000.0);
        assert_relative_eq!(summary.monthly_repayment, 1467.06, max_relative = 0.005);
        assert_relative_eq!(summary.misc_costs, 37_000.0, max_relative = 0.005);
        assert_relative_eq!(summary.upfront_costs, 72_000.0, max_relative = 0.005);
        assert_relative_eq!(summary.yearly_extra_repayment_amount, 17_500.0);
        assert_relative_eq!(summary.total_interest, 55_936.79, epsilon = 0.01);
        assert_eq!(summary.correction_iterations, 3);
        assert_eq!(projection.schedule.len(), 360);
    }

    #[test]
    fn test_cumulative_principal_exhausts_loan() {
        for params in sample_scenarios() {
            let projection = compute(&params).unwrap();
            let last = projection.schedule.last().unwrap();

            assert_abs_diff_eq!(last.cumulative_principal, params.loan_amount(), epsilon = 1e-6);
            assert_abs_diff_eq!(last.owed_to_bank, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_interest_never_negative() {
        for params in sample_scenarios() {
            let projection = compute(&params).unwrap();
            assert!(projection.schedule.interest().iter().all(|&i| i >= 0.0));
        }
    }

    #[test]
    fn test_valuation_strictly_increasing() {
        let projection = compute(&reference_scenario()).unwrap();
        let valuation = projection.schedule.house_valuation();

        assert!(valuation[0] > reference_scenario().house_price);
        assert!(valuation.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_zero_rate_limit() {
        let params = ScenarioParameters {
            mortgage_rate_pct: 0.0,
            yearly_extra_repayment_pct: 0.0,
            ..reference_scenario()
        };
        let projection = compute(&params).unwrap();

        assert_relative_eq!(projection.summary.monthly_repayment, 315_000.0 / 360.0);
        assert!(projection.schedule.interest().iter().all(|&i| i == 0.0));
        assert_relative_eq!(projection.summary.total_interest, 0.0);
        assert_abs_diff_eq!(
            projection.schedule.last().unwrap().cumulative_principal,
            315_000.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_summary_consistency() {
        for params in sample_scenarios() {
            let summary = compute(&params).unwrap().summary;

            assert_relative_eq!(
                summary.effective_house_cost,
                params.house_price + summary.misc_costs + summary.total_interest,
                max_relative = 1e-12
            );
            assert_relative_eq!(
                summary.extra_cost_pct,
                summary.extra_cost / params.house_price * 100.0,
                max_relative = 1e-12
            );
            assert_relative_eq!(summary.practical_house_cost, params.house_price + summary.misc_costs);
        }
    }

    #[test]
    fn test_extra_repayment_lands_on_year_end() {
        let projection = compute(&reference_scenario()).unwrap();
        let rows = projection.schedule.rows();

        assert_relative_eq!(rows[10].payment, rows[0].payment);
        assert_relative_eq!(rows[11].payment, rows[0].payment + 17_500.0);
        assert_relative_eq!(rows[23].payment, rows[0].payment + 17_500.0);
    }

    #[test]
    fn test_loan_paid_off_early_with_extra_repayments() {
        let projection = compute(&reference_scenario()).unwrap();
        let rows = projection.schedule.rows();

        // Paid off in month 134; nothing owed or paid afterwards
        assert!(rows[132].owed_to_bank > 1.0);
        assert_abs_diff_eq!(rows[133].owed_to_bank, 0.0, epsilon = 1e-6);
        assert!(rows[134..].iter().all(|r| r.principal == 0.0 && r.interest == 0.0));
    }

    #[test]
    fn test_profit_and_costs_relationship() {
        let params = reference_scenario();
        let projection = compute(&params).unwrap();

        for row in projection.schedule.rows() {
            assert_relative_eq!(
                row.profit,
                row.house_valuation - row.owed_to_bank - row.total_cumulative_cost,
                epsilon = 1e-6
            );
        }

        let first = &projection.schedule.rows()[0];
        assert_relative_eq!(first.total_cumulative_cost, first.total_repayment + params.upfront_costs());
        assert_relative_eq!(first.cumulative_rent, 1300.0 * (1.0 + 2.7 / 1200.0), epsilon = 1e-9);
    }

    #[test]
    fn test_cumulative_rent_uses_time_multiplied_growth() {
        let params = reference_scenario();
        let projection = compute(&params).unwrap();
        let row = projection.schedule.get(120).unwrap();

        let growth = (1.0 + 2.7 / 12.0 / 100.0f64).powi(120);
        assert_relative_eq!(row.cumulative_rent, 120.0 * 1300.0 * growth, max_relative = 1e-12);
        assert_relative_eq!(row.cumulative_ancillary, 120.0 * 400.0 * growth, max_relative = 1e-12);
    }

    #[test]
    fn test_full_down_payment_has_no_loan() {
        let params = ScenarioParameters {
            down_payment: 350_000.0,
            ..reference_scenario()
        };
        let projection = compute(&params).unwrap();

        assert_relative_eq!(projection.summary.loan_amount, 0.0);
        assert_relative_eq!(projection.summary.monthly_repayment, 0.0);
        assert_relative_eq!(projection.summary.total_interest, 0.0);
        assert!(projection.schedule.principal().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_invalid_scenario_rejected() {
        let params = ScenarioParameters {
            down_payment: 360_000.0,
            ..reference_scenario()
        };

        match compute(&params) {
            Err(ProjectionError::InvalidScenario { field, .. }) => assert_eq!(field, "down_payment"),
            other => panic!("expected InvalidScenario, got {:?}", other.map(|p| p.summary)),
        }
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        // The reference scenario needs 3 correction steps
        let engine = AmortizationEngine::new(EngineConfig {
            max_correction_iterations: Some(1),
            ..Default::default()
        });

        match engine.compute(&reference_scenario()) {
            Err(ProjectionError::ScheduleDidNotConverge { iterations, residual }) => {
                assert_eq!(iterations, 1);
                assert!(residual > DEFAULT_TOLERANCE);
            }
            other => panic!("expected ScheduleDidNotConverge, got {:?}", other.map(|p| p.summary)),
        }
    }

    #[test]
    fn test_correction_without_following_month_fails() {
        let engine = AmortizationEngine::default();
        let mut principal = vec![100.0, 100.0, 100.0];

        let result = engine.correct_principal(&mut principal, 400.0, 100.0);
        assert!(matches!(
            result,
            Err(ProjectionError::ScheduleDidNotConverge { iterations: 0, .. })
        ));
    }

    #[test]
    fn test_correction_stalls_without_repayment() {
        let engine = AmortizationEngine::default();
        let mut principal = vec![100.0, 0.0, 0.0];

        // Nothing to inject when the monthly repayment is zero
        let result = engine.correct_principal(&mut principal, 200.0, 0.0);
        assert!(matches!(
            result,
            Err(ProjectionError::ScheduleDidNotConverge { iterations: 1, .. })
        ));
    }

    #[test]
    fn test_large_zero_rate_loans_converge() {
        let cases = [
            (229_587_902.29, 41_949_842.33),
            (500_000_000.0, 0.0),
            (500_000_000.0, 100_000_000.0),
        ];

        for (house_price, down_payment) in cases {
            let params = ScenarioParameters {
                house_price,
                down_payment,
                mortgage_rate_pct: 0.0,
                yearly_extra_repayment_pct: 0.0,
                loan_period_years: 40,
                ..reference_scenario()
            };
            let projection = compute(&params).unwrap();
            let last = projection.schedule.last().unwrap();

            assert_eq!(projection.schedule.len(), 480);
            assert_relative_eq!(last.cumulative_principal, params.loan_amount(), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_rounding_gap_in_final_month_is_converged() {
        let engine = AmortizationEngine::default();
        let loan = 5.0e8;
        let mut principal = vec![loan / 480.0; 480];
        // Short of the loan by more than the default tolerance, with no month left to inject into
        principal[479] -= 1.0e-5;

        assert_eq!(engine.correct_principal(&mut principal, loan, loan / 480.0), Ok(0));
    }

    #[test]
    fn test_overflowing_projection_rejected() {
        let params = ScenarioParameters {
            house_price: 1.5e308,
            down_payment: 0.0,
            mortgage_rate_pct: 10.0,
            yearly_extra_repayment_pct: 0.0,
            house_inflation_pct: 0.0,
            ..reference_scenario()
        };

        assert!(matches!(
            compute(&params),
            Err(ProjectionError::InvalidScenario { field: "raw_house_cost", .. })
        ));
    }

    #[test]
    fn test_reference_break_even_month() {
        let projection = compute(&reference_scenario()).unwrap();
        let schedule = &projection.schedule;
        let month = schedule.break_even_month().unwrap();

        assert_eq!(month, 38);

        let gap = |row: &MonthRow| (-row.profit - row.rent_minus_ancillary()).powi(2);
        let best = gap(schedule.get(month).unwrap());
        assert!(schedule.rows().iter().all(|row| gap(row) >= best));
    }

    #[test]
    fn test_clamp_and_peak() {
        let mut principal = vec![40.0, 40.0, 40.0, 40.0];
        clamp_overshoot(&mut principal, 100.0);
        assert_eq!(principal, vec![40.0, 40.0, 0.0, 0.0]);

        let (idx, peak) = peak_cumulative(&principal);
        assert_eq!(idx, 1);
        assert_relative_eq!(peak, 80.0);
    }
}
