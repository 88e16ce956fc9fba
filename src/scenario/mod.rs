//! Scenario parameters and named scenario storage

mod data;
pub mod store;

pub use data::{ScenarioParameters, PurchaseFees, MAX_LOAN_PERIOD_YEARS};
pub use store::{ScenarioStore, StoredScenario, StoreError, DEFAULT_SCENARIO_PATH};
