use itertools::Itertools;
use serde_json::{Map, Value};

use crate::error::MigrationError;
use crate::logic::canonical::fingerprint;
use crate::logic::paths::set_value_at_path;
use crate::model::{
    ComparisonMode, ComparisonSession, MigrationPlan, MigrationRequest, SkippedUnit, UnitValue,
};

pub struct MigrationBuilder;

impl MigrationBuilder {
    /// Build the write-back payload for pushing the selected units from the
    /// source instance to the target instance.
    ///
    /// `current_source` is the source payload as it is cached now; when given, the
    /// plan records whether it still matches the snapshot the session compared.
    pub fn build_plan(
        session: &ComparisonSession,
        request: &MigrationRequest,
        current_source: Option<&Value>,
    ) -> Result<MigrationPlan, MigrationError> {
        let source = &request.source_instance_id;
        let target = &request.target_instance_id;
        for instance_id in [source, target] {
            if !session.instance_ids.contains(instance_id) {
                return Err(MigrationError::UnknownInstance(instance_id.clone()));
            }
        }
        if source == target {
            return Err(MigrationError::SameInstance(source.clone()));
        }
        if request.units.is_empty() {
            return Err(MigrationError::NothingToMigrate);
        }

        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for unit in request.units.iter().unique() {
            let Some(result) = session.results.iter().find(|r| &r.path == unit) else {
                skipped.push(SkippedUnit {
                    unit: unit.clone(),
                    reason: "no difference recorded for this unit".to_string(),
                });
                continue;
            };
            match result.values.get(source) {
                Some(UnitValue::Present(value)) => entries.push((result, value.clone())),
                _ => skipped.push(SkippedUnit {
                    unit: unit.clone(),
                    reason: format!("missing in source instance '{}'", source),
                }),
            }
        }

        let migrated_units: Vec<String> =
            entries.iter().map(|(result, _)| result.path.clone()).collect();
        let payload = match &session.mode {
            ComparisonMode::ArrayByIdentifier {
                identifier_field,
                fields,
            } => Value::Array(
                entries
                    .into_iter()
                    .map(|(result, value)| {
                        // Results stored without an identifier fall back to the key
                        let identifier = result
                            .identifier
                            .clone()
                            .unwrap_or_else(|| Value::String(result.path.clone()));
                        build_record(identifier_field, fields, identifier, value)
                    })
                    .collect(),
            ),
            ComparisonMode::GenericObject | ComparisonMode::FieldSubsetOfObject { .. } => {
                let mut payload = Value::Object(Map::new());
                for (result, value) in entries {
                    set_value_at_path(&mut payload, &result.path, value);
                }
                payload
            }
        };

        let source_is_current = current_source.map(|current| {
            session
                .payload_fingerprints
                .get(source)
                .and_then(|recorded| recorded.as_deref())
                == Some(fingerprint(current).as_str())
        });
        if source_is_current == Some(false) {
            log::warn!(
                "Source '{}' changed since session {} was recorded",
                source,
                session.id
            );
        }

        log::info!(
            "Built migration {} -> {} for session {}: {} units, {} skipped",
            source,
            target,
            session.id,
            migrated_units.len(),
            skipped.len()
        );

        Ok(MigrationPlan {
            session_id: session.id.clone(),
            source_instance_id: source.clone(),
            target_instance_id: target.clone(),
            endpoint: session.endpoint.clone(),
            payload,
            migrated_units,
            skipped,
            source_is_current,
        })
    }
}

/// Record for array write-back: the identifier plus the compared fields
fn build_record(
    identifier_field: &str,
    fields: &[String],
    identifier: Value,
    value: Value,
) -> Value {
    // Whole-record comparisons already carry the identifier
    if fields.is_empty() {
        return value;
    }

    let mut record = Value::Object(Map::new());
    set_value_at_path(&mut record, identifier_field, identifier);
    if let Value::Object(projected) = value {
        for (field, field_value) in projected {
            set_value_at_path(&mut record, &field, field_value);
        }
    }
    record
}
