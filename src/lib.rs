//! Mortgage System - month-by-month house financing and rent-vs-buy projections
//!
//! This library provides:
//! - Amortization schedules with yearly extra repayments
//! - Rent-vs-buy comparison series (valuation, cumulative rent, profit)
//! - Multi-scenario comparison of summary figures
//! - Named scenario storage and CSV schedule export

pub mod error;
pub mod scenario;
pub mod projection;
pub mod comparison;
pub mod report;

// Re-export commonly used types
pub use error::ProjectionError;
pub use scenario::{ScenarioParameters, PurchaseFees, ScenarioStore};
pub use projection::{compute, AmortizationEngine, EngineConfig, MonthlySchedule, Projection, ScenarioSummary};
pub use comparison::{compare, ComparisonReport, ScenarioComparator};
