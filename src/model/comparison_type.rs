use serde::{Deserialize, Serialize};

use crate::model::{ComparisonMode, Id};

pub const SETTINGS_TYPE_ID: &str = "settings";
pub const CODE_TABLE_TYPE_ID: &str = "code-table";
pub const FEATURE_TOGGLE_TYPE_ID: &str = "feature-toggle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadShape {
    Object,
    Array,
}

/// A named kind of payload that can be fetched from instances and compared.
///
/// Built-in types ship with the service; custom types are registered at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonType {
    pub id: Id,
    pub name: String,
    /// Path on the instance the payload is fetched from
    pub endpoint: String,
    pub shape: PayloadShape,
    /// Record key for array payloads
    #[serde(default)]
    pub identifier_field: Option<String>,
    /// Fields taking part in the comparison; empty means all of them
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub builtin: bool,
}

impl ComparisonType {
    pub fn builtins() -> Vec<ComparisonType> {
        vec![
            ComparisonType {
                id: SETTINGS_TYPE_ID.to_string(),
                name: "Settings".to_string(),
                endpoint: "/settings".to_string(),
                shape: PayloadShape::Object,
                identifier_field: None,
                fields: Vec::new(),
                builtin: true,
            },
            ComparisonType {
                id: CODE_TABLE_TYPE_ID.to_string(),
                name: "Code Tables".to_string(),
                endpoint: "/code-tables".to_string(),
                shape: PayloadShape::Object,
                identifier_field: None,
                fields: Vec::new(),
                builtin: true,
            },
            ComparisonType {
                id: FEATURE_TOGGLE_TYPE_ID.to_string(),
                name: "Feature Toggles".to_string(),
                endpoint: "/feature-toggles".to_string(),
                shape: PayloadShape::Array,
                identifier_field: Some("name".to_string()),
                fields: vec!["enabled".to_string()],
                builtin: true,
            },
        ]
    }

    /// Comparison mode for payloads of this type.
    ///
    /// Object types with a field list compare only those fields; array types key
    /// records by their identifier field.
    pub fn mode(&self) -> ComparisonMode {
        match self.shape {
            PayloadShape::Array => ComparisonMode::ArrayByIdentifier {
                identifier_field: self.identifier_field.clone().unwrap_or_default(),
                fields: self.fields.clone(),
            },
            PayloadShape::Object if self.fields.is_empty() => ComparisonMode::GenericObject,
            PayloadShape::Object => ComparisonMode::FieldSubsetOfObject {
                fields: self.fields.clone(),
            },
        }
    }
}
