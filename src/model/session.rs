use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{ComparisonMode, DifferenceResult, Id, InstanceId, Summary};

/// Immutable record of one comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSession {
    pub id: Id,
    pub name: String,
    /// Compared instances in declared order
    pub instance_ids: Vec<InstanceId>,
    /// Endpoint label of the comparison type the payloads were fetched from
    pub endpoint: String,
    pub mode: ComparisonMode,
    #[serde(default)]
    pub base_instance_id: Option<InstanceId>,
    /// ISO 8601 creation time
    pub timestamp: String,
    pub results: Vec<DifferenceResult>,
    pub summary: Summary,
    /// SHA-256 of each instance's canonical payload, `None` when it was absent
    #[serde(default)]
    pub payload_fingerprints: HashMap<InstanceId, Option<String>>,
}

/// Lightweight listing entry that leaves the result rows out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Id,
    pub name: String,
    pub instance_ids: Vec<InstanceId>,
    pub endpoint: String,
    pub timestamp: String,
    pub summary: Summary,
    pub active: bool,
}

impl ComparisonSession {
    pub fn listing(&self, active: bool) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            instance_ids: self.instance_ids.clone(),
            endpoint: self.endpoint.clone(),
            timestamp: self.timestamp.clone(),
            summary: self.summary,
            active,
        }
    }
}

/// Input of one comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComparison {
    /// Session name; generated from mode and time when absent
    #[serde(default)]
    pub name: Option<String>,
    pub instance_ids: Vec<InstanceId>,
    pub mode: ComparisonMode,
    #[serde(default)]
    pub base_instance_id: Option<InstanceId>,
    #[serde(default)]
    pub endpoint: String,
}
