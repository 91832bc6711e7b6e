use thiserror::Error;

use crate::model::InstanceId;

/// Rejections of a comparison run; no session is created when one is returned
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("malformed comparison config: {0}")]
    MalformedConfig(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("instance '{0}' is not part of the session")]
    UnknownInstance(InstanceId),
    #[error("source and target are both '{0}'")]
    SameInstance(InstanceId),
    #[error("no units selected for migration")]
    NothingToMigrate,
}
