use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Id, InstanceId};

/// Selection of units to push from one session instance to another
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRequest {
    pub source_instance_id: InstanceId,
    pub target_instance_id: InstanceId,
    /// Unit identifiers (paths or item ids) to migrate
    pub units: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedUnit {
    pub unit: String,
    pub reason: String,
}

/// Write-back payload built from a session's source values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub session_id: Id,
    pub source_instance_id: InstanceId,
    pub target_instance_id: InstanceId,
    pub endpoint: String,
    /// Nested object for object modes, array of records for array mode
    pub payload: Value,
    pub migrated_units: Vec<String>,
    pub skipped: Vec<SkippedUnit>,
    /// False when the source payload changed since the session was recorded
    #[serde(default)]
    pub source_is_current: Option<bool>,
}
