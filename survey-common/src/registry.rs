//! Model registry records
//!
//! The classification service lists every trained model as an
//! `{id, name, project_id}` record. Only the models belonging to the survey
//! classifier project take part in an ensemble, so a [`ModelRegistry`] is
//! always a view over a single project (or over a listing that is already
//! project-scoped).
//!
//! The two lookups built here feed the ensemble stages:
//! - `name_to_id` resolves sub-classifier names to model identifiers
//! - `id_to_name` gives each model a display name in the per-model breakdown

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Opaque model identifier assigned by the classification service
///
/// The service hands out integer ids, but nothing here interprets them, so
/// string ids are accepted as well. Integers order before strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelId::Int(id) => write!(f, "{}", id),
            ModelId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for ModelId {
    type Err = std::convert::Infallible;

    /// JSON object keys are always strings; `"7"` must name the same model as `7`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().parse::<i64>() {
            Ok(id) => ModelId::Int(id),
            Err(_) => ModelId::Text(s.to_string()),
        })
    }
}

impl From<i64> for ModelId {
    fn from(id: i64) -> Self {
        ModelId::Int(id)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        ModelId::Text(id.to_string())
    }
}

impl From<String> for ModelId {
    fn from(id: String) -> Self {
        ModelId::Text(id)
    }
}

/// One trained model as listed by the classification service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: ModelId,
    pub name: String,
    pub project_id: i64,
}

/// Models of one project, with name/id lookups
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    project_id: Option<i64>,
    models: Vec<ModelRecord>,
}

impl ModelRegistry {
    /// Keep only the records belonging to `project_id`
    pub fn for_project(records: Vec<ModelRecord>, project_id: i64) -> Result<Self> {
        let total = records.len();
        let models: Vec<ModelRecord> = records
            .into_iter()
            .filter(|record| record.project_id == project_id)
            .collect();

        debug!(
            project_id,
            kept = models.len(),
            total,
            "Filtered model records to project"
        );

        Self::build(Some(project_id), models)
    }

    /// Use every record as-is (listing already scoped to one project)
    pub fn from_records(records: Vec<ModelRecord>) -> Result<Self> {
        Self::build(None, records)
    }

    fn build(project_id: Option<i64>, models: Vec<ModelRecord>) -> Result<Self> {
        let mut names_by_id: HashMap<&ModelId, &str> = HashMap::new();
        for record in &models {
            if let Some(existing) = names_by_id.insert(&record.id, record.name.as_str()) {
                if existing != record.name {
                    return Err(Error::InvalidInput(format!(
                        "model id {} is registered as both '{}' and '{}'",
                        record.id, existing, record.name
                    )));
                }
            }
        }

        Ok(Self { project_id, models })
    }

    /// Project this registry was filtered to, if any
    pub fn project_id(&self) -> Option<i64> {
        self.project_id
    }

    pub fn models(&self) -> &[ModelRecord] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Sub-classifier name → model id
    ///
    /// When two models share a name the one listed last wins.
    pub fn name_to_id(&self) -> HashMap<String, ModelId> {
        let mut lookup = HashMap::with_capacity(self.models.len());
        for record in &self.models {
            if let Some(previous) = lookup.insert(record.name.clone(), record.id.clone()) {
                warn!(
                    name = %record.name,
                    previous = %previous,
                    replacement = %record.id,
                    "Duplicate model name in registry, later record wins"
                );
            }
        }
        lookup
    }

    /// Model id → display name
    pub fn id_to_name(&self) -> HashMap<ModelId, String> {
        self.models
            .iter()
            .map(|record| (record.id.clone(), record.name.clone()))
            .collect()
    }
}
