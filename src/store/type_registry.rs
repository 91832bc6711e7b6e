use anyhow::{anyhow, Result};
use parking_lot::RwLock;

use crate::model::{ComparisonType, PayloadShape};

/// Comparison types known to the service: the built-ins plus registered custom types
#[derive(Debug)]
pub struct TypeRegistry {
    types: RwLock<Vec<ComparisonType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            types: RwLock::new(ComparisonType::builtins()),
        }
    }

    pub fn list(&self) -> Vec<ComparisonType> {
        self.types.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<ComparisonType> {
        self.types.read().iter().find(|t| t.id == id).cloned()
    }

    /// Register or replace a custom type; built-ins cannot be replaced
    pub fn upsert_custom(&self, mut custom: ComparisonType) -> Result<ComparisonType> {
        if custom.id.trim().is_empty() {
            return Err(anyhow!("Comparison type id must not be empty"));
        }
        if custom.shape == PayloadShape::Array
            && custom
                .identifier_field
                .as_deref()
                .map_or(true, |field| field.trim().is_empty())
        {
            return Err(anyhow!(
                "Array comparison type '{}' needs an identifier field",
                custom.id
            ));
        }
        custom.builtin = false;

        let mut types = self.types.write();
        match types.iter_mut().find(|t| t.id == custom.id) {
            Some(existing) if existing.builtin => {
                return Err(anyhow!(
                    "Built-in comparison type '{}' cannot be replaced",
                    custom.id
                ));
            }
            Some(existing) => *existing = custom.clone(),
            None => types.push(custom.clone()),
        }
        log::info!("Registered comparison type '{}'", custom.id);
        Ok(custom)
    }

    /// Remove a custom type; built-ins are never removed
    pub fn remove_custom(&self, id: &str) -> Result<bool> {
        let mut types = self.types.write();
        match types.iter().position(|t| t.id == id) {
            Some(idx) if types[idx].builtin => {
                Err(anyhow!("Built-in comparison type '{}' cannot be removed", id))
            }
            Some(idx) => {
                types.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
