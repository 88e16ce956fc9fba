//! Named scenario persistence
//!
//! Scenarios are kept in a single JSON document mapping scenario name to its
//! parameter record plus a creation timestamp (house_calc_scenarios.json).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::{NaiveDateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ScenarioParameters;

/// Default location of the scenario file
pub const DEFAULT_SCENARIO_PATH: &str = "house_calc_scenarios.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("scenario file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("scenario file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("scenario name must not be empty")]
    EmptyName,

    #[error("scenario not found: {0}")]
    NotFound(String),
}

/// A saved scenario record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredScenario {
    #[serde(flatten)]
    pub parameters: ScenarioParameters,

    /// When the record was saved (UTC); absent in hand-written files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
}

/// In-memory view of the scenario file, sorted by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioStore {
    scenarios: BTreeMap<String, StoredScenario>,
}

impl ScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load scenarios from a file; a missing file yields an empty store
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No scenario file at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let store = Self::from_reader(BufReader::new(File::open(path)?))?;
        info!("Loaded {} scenarios from {}", store.len(), path.display());
        Ok(store)
    }

    /// Load scenarios from the default scenario file
    pub fn load_default() -> Result<Self, StoreError> {
        Self::load(DEFAULT_SCENARIO_PATH)
    }

    /// Load scenarios from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StoreError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write all scenarios to a file as indented JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        info!("Saved {} scenarios to {}", self.len(), path.display());
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), StoreError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Store parameters under a name, replacing any existing record
    pub fn insert(&mut self, name: &str, parameters: ScenarioParameters) -> Result<(), StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }

        let record = StoredScenario {
            parameters,
            timestamp: Some(Utc::now().naive_utc()),
        };
        self.scenarios.insert(name.to_string(), record);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StoredScenario> {
        self.scenarios.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Result<StoredScenario, StoreError> {
        self.scenarios
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    /// Scenario names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.scenarios.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// All scenarios as (name, parameters) pairs, ready for comparison
    pub fn named_parameters(&self) -> Vec<(String, ScenarioParameters)> {
        self.scenarios
            .iter()
            .map(|(name, record)| (name.clone(), record.parameters.clone()))
            .collect()
    }
}
