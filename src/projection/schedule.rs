//! Schedule and summary output structures for projections

use serde::{Deserialize, Serialize};

/// A single month of the amortization and rent-vs-buy projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthRow {
    // Timing
    /// Projection month (1-indexed)
    pub month: u32,
    /// Loan year (1-indexed)
    pub loan_year: u32,

    // Mortgage
    /// Scheduled payment including any yearly extra repayment
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub total_repayment: f64,
    pub cumulative_principal: f64,
    pub cumulative_interest: f64,
    pub owed_to_bank: f64,
    /// Cumulative repayments plus upfront costs
    pub total_cumulative_cost: f64,

    // Rent-vs-buy comparison
    pub house_valuation: f64,
    pub cumulative_rent: f64,
    pub cumulative_ancillary: f64,
    pub profit: f64,
}

impl MonthRow {
    /// Whether this is the last month of a loan year
    pub fn is_year_end(&self) -> bool {
        self.month % 12 == 0
    }

    /// Net rent-side spend: cumulative rent minus the ancillary costs an owner pays anyway
    pub fn rent_minus_ancillary(&self) -> f64 {
        self.cumulative_rent - self.cumulative_ancillary
    }

    pub fn is_finite(&self) -> bool {
        [
            self.payment,
            self.interest,
            self.principal,
            self.total_repayment,
            self.cumulative_principal,
            self.cumulative_interest,
            self.owed_to_bank,
            self.total_cumulative_cost,
            self.house_valuation,
            self.cumulative_rent,
            self.cumulative_ancillary,
            self.profit,
        ]
        .iter()
        .all(|value| value.is_finite())
    }
}

/// Month-by-month projection, fixed once built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySchedule {
    rows: Vec<MonthRow>,
}

impl MonthlySchedule {
    pub(crate) fn from_rows(rows: Vec<MonthRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[MonthRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, month: u32) -> Option<&MonthRow> {
        month.checked_sub(1).and_then(|idx| self.rows.get(idx as usize))
    }

    pub fn last(&self) -> Option<&MonthRow> {
        self.rows.last()
    }

    /// Rows at months 12, 24, ... for a year-labelled axis
    pub fn year_end_rows(&self) -> impl Iterator<Item = &MonthRow> {
        self.rows.iter().filter(|row| row.is_year_end())
    }

    pub fn principal(&self) -> Vec<f64> {
        self.series(|row| row.principal)
    }

    pub fn interest(&self) -> Vec<f64> {
        self.series(|row| row.interest)
    }

    pub fn total_repayment(&self) -> Vec<f64> {
        self.series(|row| row.total_repayment)
    }

    pub fn cumulative_principal(&self) -> Vec<f64> {
        self.series(|row| row.cumulative_principal)
    }

    pub fn cumulative_interest(&self) -> Vec<f64> {
        self.series(|row| row.cumulative_interest)
    }

    pub fn house_valuation(&self) -> Vec<f64> {
        self.series(|row| row.house_valuation)
    }

    pub fn cumulative_rent(&self) -> Vec<f64> {
        self.series(|row| row.cumulative_rent)
    }

    pub fn cumulative_ancillary(&self) -> Vec<f64> {
        self.series(|row| row.cumulative_ancillary)
    }

    pub fn profit(&self) -> Vec<f64> {
        self.series(|row| row.profit)
    }

    /// Month where the buy-side loss (-profit) comes closest to the net rent
    /// spend; first month wins ties and months with a non-finite gap are skipped
    pub fn break_even_month(&self) -> Option<u32> {
        let mut best: Option<(u32, f64)> = None;

        for row in &self.rows {
            let gap = (-row.profit - row.rent_minus_ancillary()).powi(2);
            if !gap.is_finite() {
                continue;
            }
            match best {
                Some((_, best_gap)) if gap >= best_gap => {}
                _ => best = Some((row.month, gap)),
            }
        }

        best.map(|(month, _)| month)
    }

    fn series<F: Fn(&MonthRow) -> f64>(&self, f: F) -> Vec<f64> {
        self.rows.iter().map(f).collect()
    }
}

/// Scalar figures for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub loan_amount: f64,
    /// One-time purchase fees
    pub misc_costs: f64,
    /// Fees plus down payment
    pub upfront_costs: f64,
    /// Fixed annuity payment before extra repayments
    pub monthly_repayment: f64,
    pub yearly_extra_repayment_amount: f64,
    pub total_interest: f64,
    /// Fees plus lifetime interest
    pub extra_cost: f64,
    pub effective_house_cost: f64,
    /// Extra cost as a percentage of the house price
    pub extra_cost_pct: f64,

    /// Monthly repayment plus ancillary cost
    pub monthly_outlay: f64,
    /// House price plus fees
    pub practical_house_cost: f64,
    /// Correction steps needed to make the principal exhaust the loan
    pub correction_iterations: usize,
}

/// Complete result of one engine run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub schedule: MonthlySchedule,
    pub summary: ScenarioSummary,
}
