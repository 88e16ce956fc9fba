//! Scenario parameter record matching the saved-scenario format

use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::projection::compound_factor;

/// Longest loan horizon accepted by [`ScenarioParameters::validate`]
pub const MAX_LOAN_PERIOD_YEARS: u32 = 100;

/// One-time purchase fees, each a percentage of the house price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseFees {
    /// Broker commission (%)
    #[serde(rename = "broker_commission")]
    pub broker_pct: f64,

    /// Notary fee (%)
    #[serde(rename = "notary")]
    pub notary_pct: f64,

    /// Land registry entry (%)
    #[serde(rename = "land_registry")]
    pub land_registry_pct: f64,

    /// Land transfer tax (%)
    #[serde(rename = "land_transfer_tax")]
    pub land_transfer_tax_pct: f64,
}

impl PurchaseFees {
    /// Sum of all fee percentages
    pub fn total_pct(&self) -> f64 {
        self.broker_pct + self.notary_pct + self.land_registry_pct + self.land_transfer_tax_pct
    }

    fn fields(&self) -> [(&'static str, f64); 4] {
        [
            ("broker_commission", self.broker_pct),
            ("notary", self.notary_pct),
            ("land_registry", self.land_registry_pct),
            ("land_transfer_tax", self.land_transfer_tax_pct),
        ]
    }
}

impl Default for PurchaseFees {
    fn default() -> Self {
        Self {
            broker_pct: 3.57,
            notary_pct: 1.5,
            land_registry_pct: 0.5,
            land_transfer_tax_pct: 5.0,
        }
    }
}

/// Inputs for a single buy-vs-rent projection
///
/// Serialized field names follow the saved-scenario file so existing
/// records load unchanged. Missing fields fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParameters {
    /// Raw purchase price
    #[serde(rename = "raw_house_cost")]
    pub house_price: f64,

    /// Annual nominal mortgage rate (%)
    #[serde(rename = "mortgage_rate")]
    pub mortgage_rate_pct: f64,

    /// Extra principal paid at the end of each loan year, as % of house price
    #[serde(rename = "yearly_repayment")]
    pub yearly_extra_repayment_pct: f64,

    /// Recurring non-mortgage monthly cost (Nebenkosten)
    #[serde(rename = "nebenkosten")]
    pub monthly_ancillary_cost: f64,

    /// Inflation applied to rent and ancillary costs (%)
    #[serde(rename = "inflation")]
    pub general_inflation_pct: f64,

    /// Appreciation applied to the house valuation (%)
    #[serde(rename = "house_inflation")]
    pub house_inflation_pct: f64,

    /// Loan horizon in years
    #[serde(rename = "loan_period")]
    pub loan_period_years: u32,

    /// Cash put down at purchase; reduces the loan but not the fee base
    pub down_payment: f64,

    #[serde(flatten)]
    pub fees: PurchaseFees,

    /// Rent paid in the comparison baseline
    pub monthly_rent: f64,
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            house_price: 350_000.0,
            mortgage_rate_pct: 3.8,
            yearly_extra_repayment_pct: 5.0,
            monthly_ancillary_cost: 400.0,
            general_inflation_pct: 2.7,
            house_inflation_pct: 2.7,
            loan_period_years: 30,
            down_payment: 35_000.0,
            fees: PurchaseFees::default(),
            monthly_rent: 1_300.0,
        }
    }
}

impl ScenarioParameters {
    /// Amount borrowed from the bank
    pub fn loan_amount(&self) -> f64 {
        self.house_price - self.down_payment
    }

    /// One-time purchase fees in currency
    pub fn misc_costs(&self) -> f64 {
        self.house_price * self.fees.total_pct() / 100.0
    }

    /// Cash required at purchase (fees plus down payment)
    pub fn upfront_costs(&self) -> f64 {
        self.misc_costs() + self.down_payment
    }

    /// Extra principal paid once per loan year
    pub fn yearly_extra_repayment_amount(&self) -> f64 {
        self.house_price * self.yearly_extra_repayment_pct / 100.0
    }

    /// Schedule length in months
    pub fn total_months(&self) -> usize {
        self.loan_period_years as usize * 12
    }

    /// Check every precondition of the projection engine
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.loan_period_years < 1 {
            return Err(ProjectionError::invalid("loan_period", "must be at least 1 year"));
        }
        if self.loan_period_years > MAX_LOAN_PERIOD_YEARS {
            return Err(ProjectionError::invalid(
                "loan_period",
                format!("must be at most {} years, got {}", MAX_LOAN_PERIOD_YEARS, self.loan_period_years),
            ));
        }

        let amounts = [
            ("raw_house_cost", self.house_price),
            ("mortgage_rate", self.mortgage_rate_pct),
            ("yearly_repayment", self.yearly_extra_repayment_pct),
            ("nebenkosten", self.monthly_ancillary_cost),
            ("inflation", self.general_inflation_pct),
            ("house_inflation", self.house_inflation_pct),
            ("down_payment", self.down_payment),
            ("monthly_rent", self.monthly_rent),
        ];

        for (field, value) in amounts.into_iter().chain(self.fees.fields()) {
            if !value.is_finite() {
                return Err(ProjectionError::invalid(field, format!("must be finite, got {}", value)));
            }
            if value < 0.0 {
                return Err(ProjectionError::invalid(field, format!("must not be negative, got {}", value)));
            }
        }

        if self.house_price <= 0.0 {
            return Err(ProjectionError::invalid("raw_house_cost", "must be greater than zero"));
        }

        if self.down_payment > self.house_price {
            return Err(ProjectionError::invalid(
                "down_payment",
                format!("{:.2} exceeds house price {:.2}", self.down_payment, self.house_price),
            ));
        }

        // Series grow monotonically, so the final month bounds every row
        let months = self.loan_period_years * 12;
        let rent_side = f64::from(months) * self.monthly_rent.max(self.monthly_ancillary_cost);
        let growth = [
            ("house_inflation", self.house_price, self.house_inflation_pct),
            ("inflation", rent_side, self.general_inflation_pct),
        ];
        for (field, base, pct) in growth {
            let factor = compound_factor(pct, months);
            if !factor.is_finite() || !(base * factor).is_finite() {
                return Err(ProjectionError::invalid(
                    field,
                    format!("{}% overflows over {} months", pct, months),
                ));
            }
        }

        Ok(())
    }
}
