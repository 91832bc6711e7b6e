//! Difference detection and classification for a single comparison unit.
//!
//! With a base instance that holds a value, every other instance is compared
//! against the base only. Otherwise a unit differs when its instances disagree
//! on any value, with absence counted as a value of its own.

use serde_json::Value;
use std::collections::HashSet;

use crate::logic::canonical::{canonical_json, values_equal};
use crate::model::{DifferenceResult, DifferenceType, InstanceId, InstanceValues, UnitValue};

const DESCRIPTION_VALUE_LIMIT: usize = 60;

/// Classify one comparison unit.
///
/// `values` must hold one entry per compared instance, in declared order.
/// `require_full_presence` reports the unit whenever some instance lacks it
/// (array mode). Returns `None` for units without a difference.
pub fn classify_unit(
    unit: &str,
    values: InstanceValues,
    base_instance_id: Option<&str>,
    require_full_presence: bool,
) -> Option<DifferenceResult> {
    let present = values.present_instances();
    let missing = values.missing_instances();
    if present.is_empty() {
        return None;
    }

    let base_value = base_instance_id
        .and_then(|base| values.get(base))
        .and_then(UnitValue::as_present);

    let mut has_difference = match (base_instance_id, base_value) {
        (Some(base), Some(base_value)) => {
            !differing_from_base(&values, base, base_value).is_empty()
        }
        _ => distinct_value_count(&values) > 1,
    };
    if require_full_presence && present.len() != values.len() {
        has_difference = true;
    }
    if !has_difference {
        return None;
    }

    let difference_type = if missing.is_empty() {
        DifferenceType::Edited
    } else {
        match base_instance_id {
            Some(_) if base_value.is_none() => DifferenceType::Added,
            Some(_) => DifferenceType::Deleted,
            None if missing.len() < present.len() => DifferenceType::Added,
            None => DifferenceType::Deleted,
        }
    };

    let description = describe(
        unit,
        difference_type,
        &values,
        &present,
        &missing,
        base_instance_id,
        base_value,
    );

    Some(DifferenceResult {
        path: unit.to_string(),
        difference_type,
        values,
        affected_instances: present,
        description,
        identifier: None,
    })
}

/// Non-base instances whose value is missing or differs from the base value
fn differing_from_base(
    values: &InstanceValues,
    base: &str,
    base_value: &Value,
) -> Vec<InstanceId> {
    values
        .iter()
        .filter(|(id, _)| id.as_str() != base)
        .filter(|(_, value)| match value {
            UnitValue::Missing => true,
            UnitValue::Present(value) => !values_equal(value, base_value),
        })
        .map(|(id, _)| id.clone())
        .collect()
}

fn distinct_value_count(values: &InstanceValues) -> usize {
    values
        .iter()
        .map(|(_, value)| value.as_present().map(canonical_json))
        .collect::<HashSet<_>>()
        .len()
}

fn describe(
    unit: &str,
    difference_type: DifferenceType,
    values: &InstanceValues,
    present: &[InstanceId],
    missing: &[InstanceId],
    base_instance_id: Option<&str>,
    base_value: Option<&Value>,
) -> String {
    match (difference_type, base_instance_id, base_value) {
        (DifferenceType::Edited, Some(base), Some(base_value)) => {
            let differing = differing_from_base(values, base, base_value);
            format!(
                "'{}' edited: {} of {} other instances differ from base '{}' ({}): {}",
                unit,
                differing.len(),
                values.len() - 1,
                base,
                preview(base_value),
                differing.join(", ")
            )
        }
        (DifferenceType::Edited, _, _) => format!(
            "'{}' edited: {} distinct values across {} instances",
            unit,
            distinct_value_count(values),
            values.len()
        ),
        (DifferenceType::Added, Some(base), _) => format!(
            "'{}' added: missing in base '{}', present in {} instances: {}",
            unit,
            base,
            present.len(),
            present.join(", ")
        ),
        (DifferenceType::Deleted, Some(base), Some(base_value)) => format!(
            "'{}' deleted: present in base '{}' ({}), missing in {} instances: {}",
            unit,
            base,
            preview(base_value),
            missing.len(),
            missing.join(", ")
        ),
        _ => format!(
            "'{}' {}: present in {} instances ({}), missing in {} instances ({})",
            unit,
            difference_type,
            present.len(),
            present.join(", "),
            missing.len(),
            missing.join(", ")
        ),
    }
}

fn preview(value: &Value) -> String {
    let text = canonical_json(value);
    if text.chars().count() <= DESCRIPTION_VALUE_LIMIT {
        return text;
    }
    let truncated: String = text.chars().take(DESCRIPTION_VALUE_LIMIT).collect();
    format!("{}...", truncated)
}
