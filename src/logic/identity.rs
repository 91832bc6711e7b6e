use itertools::Itertools;
use serde_json::Value;
use std::collections::HashMap;

use crate::logic::canonical::canonical_json;
use crate::logic::paths::get_value_at_path;
use crate::model::InstanceId;

/// Per-instance records keyed by identifier, plus the union of identifiers
#[derive(Debug, Default)]
pub struct IdentityMaps<'a> {
    pub by_instance: HashMap<InstanceId, HashMap<String, &'a Value>>,
    /// Every identifier seen, in first-seen order across the instances
    pub identifiers: Vec<String>,
    /// Identifier field value as it first appeared, before conversion to a key
    pub raw_identifiers: HashMap<String, &'a Value>,
}

impl<'a> IdentityMaps<'a> {
    pub fn record(&self, instance_id: &str, identifier: &str) -> Option<&'a Value> {
        self.by_instance
            .get(instance_id)
            .and_then(|records| records.get(identifier))
            .copied()
    }

    pub fn raw_identifier(&self, identifier: &str) -> Option<&'a Value> {
        self.raw_identifiers.get(identifier).copied()
    }
}

/// Key of a record, or `None` when it cannot be identified
pub fn identifier_of(record: &Value, identifier_field: &str) -> Option<String> {
    let key = match get_value_at_path(record, identifier_field)? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => canonical_json(other),
    };
    (!key.is_empty()).then_some(key)
}

/// Index the array payload of each listed instance by `identifier_field`.
///
/// Records without a usable identifier are skipped. A repeated identifier within
/// one instance keeps the last record.
pub fn build_identity_maps<'a>(
    payloads: &'a HashMap<InstanceId, Value>,
    instance_ids: &[InstanceId],
    identifier_field: &str,
) -> IdentityMaps<'a> {
    let mut by_instance = HashMap::new();
    let mut identifiers = Vec::new();
    let mut raw_identifiers = HashMap::new();

    for instance_id in instance_ids {
        let mut records = HashMap::new();
        let items = payloads
            .get(instance_id)
            .and_then(Value::as_array)
            .map(|items| items.as_slice())
            .unwrap_or_default();

        for record in items.iter().filter(|r| r.is_object()) {
            let Some(identifier) = identifier_of(record, identifier_field) else {
                continue;
            };
            if records.insert(identifier.clone(), record).is_some() {
                log::warn!(
                    "Duplicate identifier '{}' in instance '{}'; keeping the last record",
                    identifier,
                    instance_id
                );
            }
            if let Some(raw) = get_value_at_path(record, identifier_field) {
                raw_identifiers.entry(identifier.clone()).or_insert(raw);
            }
            identifiers.push(identifier);
        }

        by_instance.insert(instance_id.clone(), records);
    }

    IdentityMaps {
        by_instance,
        identifiers: identifiers.into_iter().unique().collect(),
        raw_identifiers,
    }
}
