//! Amortization engine for single-scenario mortgage projections

mod annuity;
mod engine;
mod schedule;

pub use annuity::{compound_factor, monthly_annuity_payment, monthly_interest};
pub use engine::{compute, AmortizationEngine, EngineConfig, DEFAULT_TOLERANCE};
pub use schedule::{MonthRow, MonthlySchedule, Projection, ScenarioSummary};
