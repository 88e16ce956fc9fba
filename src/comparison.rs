//! Side-by-side comparison of saved scenarios
//!
//! Runs the amortization engine once per selected scenario and keeps only the
//! summary figures plus the inputs needed to label them.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::projection::{AmortizationEngine, ScenarioSummary};
use crate::scenario::ScenarioParameters;

/// Minimum number of distinct scenarios a comparison needs
pub const MIN_SELECTED_SCENARIOS: usize = 2;

/// Summary of one scenario with the inputs shown next to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparedScenario {
    pub name: String,
    pub house_price: f64,
    pub down_payment: f64,
    pub mortgage_rate_pct: f64,
    pub loan_period_years: u32,
    pub summary: ScenarioSummary,
}

/// Comparison results in the caller's selection order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonReport {
    entries: Vec<ComparedScenario>,
}

impl ComparisonReport {
    pub fn get(&self, name: &str) -> Option<&ComparedScenario> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ComparedScenario> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scenario with the lowest effective house cost
    pub fn cheapest(&self) -> Option<&ComparedScenario> {
        self.entries.iter().min_by(|a, b| {
            a.summary
                .effective_house_cost
                .total_cmp(&b.summary.effective_house_cost)
        })
    }
}

impl<'a> IntoIterator for &'a ComparisonReport {
    type Item = &'a ComparedScenario;
    type IntoIter = std::slice::Iter<'a, ComparedScenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Runs the same engine over several named scenarios
#[derive(Debug, Clone, Default)]
pub struct ScenarioComparator {
    engine: AmortizationEngine,
}

impl ScenarioComparator {
    /// Create a comparator using the default engine
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(engine: AmortizationEngine) -> Self {
        Self { engine }
    }

    /// Compare the selected scenarios
    ///
    /// Repeated names count once. Every selected name is resolved before any
    /// projection runs, so a bad selection computes nothing.
    pub fn compare<S: AsRef<str>>(
        &self,
        scenarios: &[(String, ScenarioParameters)],
        selected: &[S],
    ) -> Result<ComparisonReport, ProjectionError> {
        let mut names: Vec<&str> = Vec::with_capacity(selected.len());
        for name in selected {
            let name = name.as_ref();
            if !names.contains(&name) {
                names.push(name);
            }
        }

        if names.len() < MIN_SELECTED_SCENARIOS {
            return Err(ProjectionError::InsufficientScenarios { selected: names.len() });
        }

        let resolved = names
            .into_iter()
            .map(|name| {
                scenarios
                    .iter()
                    .find(|(candidate, _)| candidate == name)
                    .ok_or_else(|| ProjectionError::UnknownScenario(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Comparing {} scenarios", resolved.len());

        // Keep per-scenario results so the first failure in selection order is reported
        let results: Vec<Result<ComparedScenario, ProjectionError>> = resolved
            .par_iter()
            .map(|(name, params)| {
                let projection = self.engine.compute(params)?;
                Ok(ComparedScenario {
                    name: name.clone(),
                    house_price: params.house_price,
                    down_payment: params.down_payment,
                    mortgage_rate_pct: params.mortgage_rate_pct,
                    loan_period_years: params.loan_period_years,
                    summary: projection.summary,
                })
            })
            .collect();

        let entries = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(ComparisonReport { entries })
    }
}

/// Compare scenarios with the default engine configuration
pub fn compare<S: AsRef<str>>(
    scenarios: &[(String, ScenarioParameters)],
    selected: &[S],
) -> Result<ComparisonReport, ProjectionError> {
    ScenarioComparator::new().compare(scenarios, selected)
}
