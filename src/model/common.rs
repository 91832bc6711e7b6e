use uuid::Uuid;

pub type Id = String;

/// Opaque key naming one data source (e.g. "prod-001")
pub type InstanceId = String;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Current time as an ISO 8601 string, the format every persisted timestamp uses
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
