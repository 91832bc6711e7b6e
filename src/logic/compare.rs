use itertools::Itertools;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use crate::error::CompareError;
use crate::logic::classify::classify_unit;
use crate::logic::identity::build_identity_maps;
use crate::logic::paths::{collect_paths, get_value_at_path};
use crate::model::{
    ComparisonMode, ComparisonOutcome, DifferenceResult, InstanceId, InstanceValues, Summary,
    UnitValue,
};

/// Drives one comparison run over already-fetched payloads
pub struct ComparisonEngine;

impl ComparisonEngine {
    /// Compare the payloads of `instance_ids` unit by unit.
    ///
    /// An instance without an entry in `payloads` is treated as missing every unit.
    /// Results follow the unit order of the mode: first-seen order for discovered
    /// paths and identifiers, configured order for field subsets.
    pub fn run_comparison(
        payloads: &HashMap<InstanceId, Value>,
        instance_ids: &[InstanceId],
        mode: &ComparisonMode,
        base_instance_id: Option<&str>,
    ) -> Result<ComparisonOutcome, CompareError> {
        Self::validate(instance_ids, mode, base_instance_id)?;

        let absent: Vec<&InstanceId> = instance_ids
            .iter()
            .filter(|id| !payloads.contains_key(*id))
            .collect();
        if !absent.is_empty() {
            log::warn!(
                "No payload for instances {:?}; treating all their units as missing",
                absent
            );
        }

        let results = match mode {
            ComparisonMode::GenericObject => {
                Self::compare_generic(payloads, instance_ids, base_instance_id)
            }
            ComparisonMode::ArrayByIdentifier {
                identifier_field,
                fields,
            } => Self::compare_array(
                payloads,
                instance_ids,
                identifier_field,
                fields,
                base_instance_id,
            ),
            ComparisonMode::FieldSubsetOfObject { fields } => {
                Self::compare_fields(payloads, instance_ids, fields, base_instance_id)
            }
        };

        let summary = Summary::from_results(&results);
        log::info!(
            "Compared {} instances in {} mode: {} differences ({} added, {} deleted, {} edited)",
            instance_ids.len(),
            mode.label(),
            summary.total_differences,
            summary.added,
            summary.deleted,
            summary.edited
        );

        Ok(ComparisonOutcome { results, summary })
    }

    fn validate(
        instance_ids: &[InstanceId],
        mode: &ComparisonMode,
        base_instance_id: Option<&str>,
    ) -> Result<(), CompareError> {
        if instance_ids.len() < 2 {
            return Err(CompareError::Validation(
                "at least 2 instances required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = instance_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(CompareError::Validation(format!(
                "instance '{}' is listed more than once",
                duplicate
            )));
        }

        if let Some(base) = base_instance_id {
            if !instance_ids.iter().any(|id| id == base) {
                return Err(CompareError::Validation(format!(
                    "base instance '{}' is not one of the compared instances",
                    base
                )));
            }
        }

        match mode {
            ComparisonMode::GenericObject => {}
            ComparisonMode::ArrayByIdentifier {
                identifier_field, ..
            } => {
                if identifier_field.trim().is_empty() {
                    return Err(CompareError::MalformedConfig(
                        "array comparison requires an identifier field".to_string(),
                    ));
                }
            }
            ComparisonMode::FieldSubsetOfObject { fields } => {
                if fields.is_empty() {
                    return Err(CompareError::MalformedConfig(
                        "field comparison requires at least one field".to_string(),
                    ));
                }
                if fields.iter().any(|field| field.trim().is_empty()) {
                    return Err(CompareError::MalformedConfig(
                        "field list contains an empty field".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    fn compare_generic(
        payloads: &HashMap<InstanceId, Value>,
        instance_ids: &[InstanceId],
        base_instance_id: Option<&str>,
    ) -> Vec<DifferenceResult> {
        let units = collect_paths(instance_ids.iter().filter_map(|id| payloads.get(id)));
        log::debug!("Collected {} paths", units.len());

        Self::compare_paths(payloads, instance_ids, &units, base_instance_id)
    }

    fn compare_fields(
        payloads: &HashMap<InstanceId, Value>,
        instance_ids: &[InstanceId],
        fields: &[String],
        base_instance_id: Option<&str>,
    ) -> Vec<DifferenceResult> {
        let units: Vec<String> = fields.iter().unique().cloned().collect();
        Self::compare_paths(payloads, instance_ids, &units, base_instance_id)
    }

    fn compare_paths(
        payloads: &HashMap<InstanceId, Value>,
        instance_ids: &[InstanceId],
        units: &[String],
        base_instance_id: Option<&str>,
    ) -> Vec<DifferenceResult> {
        units
            .iter()
            .filter_map(|path| {
                let values: InstanceValues = instance_ids
                    .iter()
                    .map(|id| {
                        let value = payloads
                            .get(id)
                            .and_then(|payload| get_value_at_path(payload, path))
                            .cloned();
                        (id.clone(), UnitValue::from_option(value))
                    })
                    .collect();
                classify_unit(path, values, base_instance_id, false)
            })
            .collect()
    }

    fn compare_array(
        payloads: &HashMap<InstanceId, Value>,
        instance_ids: &[InstanceId],
        identifier_field: &str,
        fields: &[String],
        base_instance_id: Option<&str>,
    ) -> Vec<DifferenceResult> {
        let maps = build_identity_maps(payloads, instance_ids, identifier_field);
        log::debug!(
            "Indexed {} identifiers by '{}'",
            maps.identifiers.len(),
            identifier_field
        );

        maps.identifiers
            .iter()
            .filter_map(|identifier| {
                let values: InstanceValues = instance_ids
                    .iter()
                    .map(|id| {
                        let value = maps
                            .record(id, identifier)
                            .map(|record| project_fields(record, fields));
                        (id.clone(), UnitValue::from_option(value))
                    })
                    .collect();
                let mut result = classify_unit(identifier, values, base_instance_id, true)?;
                result.identifier = maps.raw_identifier(identifier).cloned();
                Some(result)
            })
            .collect()
    }
}

/// Sub-object of `record` holding only the compared fields, keyed by field path.
///
/// Fields absent from the record are left out; no fields means the whole record.
pub fn project_fields(record: &Value, fields: &[String]) -> Value {
    if fields.is_empty() {
        return record.clone();
    }

    let projected: Map<String, Value> = fields
        .iter()
        .filter_map(|field| {
            get_value_at_path(record, field).map(|value| (field.clone(), value.clone()))
        })
        .collect();
    Value::Object(projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DifferenceType;
    use serde_json::json;

    fn ids(list: &[&str]) -> Vec<InstanceId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn payloads(entries: Vec<(&str, Value)>) -> HashMap<InstanceId, Value> {
        entries
            .into_iter()
            .map(|(id, value)| (id.to_string(), value))
            .collect()
    }

    #[test]
    fn test_rejects_single_instance() {
        let data = payloads(vec![("a", json!({"x": 1}))]);
        let err = ComparisonEngine::run_comparison(
            &data,
            &ids(&["a"]),
            &ComparisonMode::GenericObject,
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompareError::Validation("at least 2 instances required".to_string())
        );
    }

    #[test]
    fn test_rejects_duplicate_instances_and_foreign_base() {
        let data = payloads(vec![("a", json!({})), ("b", json!({}))]);

        let dup = ComparisonEngine::run_comparison(
            &data,
            &ids(&["a", "a"]),
            &ComparisonMode::GenericObject,
            None,
        );
        assert!(matches!(dup, Err(CompareError::Validation(_))));

        let foreign = ComparisonEngine::run_comparison(
            &data,
            &ids(&["a", "b"]),
            &ComparisonMode::GenericObject,
            Some("c"),
        );
        assert!(matches!(foreign, Err(CompareError::Validation(_))));
    }

    #[test]
    fn test_rejects_malformed_modes() {
        let data = payloads(vec![("a", json!([])), ("b", json!([]))]);
        let instances = ids(&["a", "b"]);

        let no_identifier = ComparisonMode::ArrayByIdentifier {
            identifier_field: " ".to_string(),
            fields: vec![],
        };
        assert!(matches!(
            ComparisonEngine::run_comparison(&data, &instances, &no_identifier, None),
            Err(CompareError::MalformedConfig(_))
        ));

        let no_fields = ComparisonMode::FieldSubsetOfObject { fields: vec![] };
        assert!(matches!(
            ComparisonEngine::run_comparison(&data, &instances, &no_fields, None),
            Err(CompareError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_missing_payload_degrades_to_missing_values() {
        let data = payloads(vec![("a", json!({"x": 1, "y": {"z": 2}}))]);
        let outcome = ComparisonEngine::run_comparison(
            &data,
            &ids(&["a", "b"]),
            &ComparisonMode::GenericObject,
            None,
        )
        .unwrap();

        let paths: Vec<_> = outcome.results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["x", "y", "y.z"]);
        for result in &outcome.results {
            assert_eq!(result.values.get("b"), Some(&UnitValue::Missing));
            assert_eq!(result.difference_type, DifferenceType::Deleted);
        }
    }

    #[test]
    fn test_nested_edit_reports_parent_and_leaf() {
        let data = payloads(vec![
            ("a", json!({"db": {"host": "a", "port": 5432}})),
            ("b", json!({"db": {"host": "b", "port": 5432}})),
        ]);
        let outcome = ComparisonEngine::run_comparison(
            &data,
            &ids(&["a", "b"]),
            &ComparisonMode::GenericObject,
            None,
        )
        .unwrap();

        let paths: Vec<_> = outcome.results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["db", "db.host"]);
        assert_eq!(outcome.summary.edited, 2);
    }

    #[test]
    fn test_field_subset_keeps_configured_order_and_ignores_other_fields() {
        let data = payloads(vec![
            ("a", json!({"limits": {"rate": 5}, "name": "a", "noise": 1})),
            ("b", json!({"limits": {"rate": 9}, "name": "b", "noise": 2})),
        ]);
        let mode = ComparisonMode::FieldSubsetOfObject {
            fields: vec!["name".to_string(), "limits.rate".to_string(), "absent".to_string()],
        };

        let outcome =
            ComparisonEngine::run_comparison(&data, &ids(&["a", "b"]), &mode, None).unwrap();
        let paths: Vec<_> = outcome.results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "limits.rate"]);
    }

    #[test]
    fn test_array_mode_compares_only_configured_fields() {
        let data = payloads(vec![
            ("a", json!([{"name": "beta", "enabled": true, "updatedAt": "2024-01-01"}])),
            ("b", json!([{"name": "beta", "enabled": true, "updatedAt": "2025-06-30"}])),
        ]);
        let mode = ComparisonMode::ArrayByIdentifier {
            identifier_field: "name".to_string(),
            fields: vec!["enabled".to_string()],
        };

        let outcome =
            ComparisonEngine::run_comparison(&data, &ids(&["a", "b"]), &mode, None).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.summary, Summary::default());
    }

    #[test]
    fn test_array_mode_without_fields_compares_whole_record() {
        let data = payloads(vec![
            ("a", json!([{"id": 1, "label": "one"}])),
            ("b", json!([{"id": 1, "label": "uno"}])),
        ]);
        let mode = ComparisonMode::ArrayByIdentifier {
            identifier_field: "id".to_string(),
            fields: vec![],
        };

        let outcome =
            ComparisonEngine::run_comparison(&data, &ids(&["a", "b"]), &mode, None).unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].path, "1");
        assert_eq!(outcome.results[0].identifier, Some(json!(1)));
        assert_eq!(
            outcome.results[0].values.get("b"),
            Some(&UnitValue::Present(json!({"id": 1, "label": "uno"})))
        );
    }

    #[test]
    fn test_payloads_of_unlisted_instances_are_ignored() {
        let data = payloads(vec![
            ("a", json!({"x": 1})),
            ("b", json!({"x": 1})),
            ("c", json!({"x": 2, "only_c": true})),
        ]);
        let outcome = ComparisonEngine::run_comparison(
            &data,
            &ids(&["a", "b"]),
            &ComparisonMode::GenericObject,
            None,
        )
        .unwrap();
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_project_fields() {
        let record = json!({"id": "f1", "rollout": {"percent": 10}, "enabled": false});
        let fields = vec![
            "enabled".to_string(),
            "rollout.percent".to_string(),
            "gone".to_string(),
        ];
        assert_eq!(
            project_fields(&record, &fields),
            json!({"enabled": false, "rollout.percent": 10})
        );
    }
}
