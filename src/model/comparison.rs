use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::model::InstanceId;

/// Wire marker for a comparison unit that does not exist in an instance's payload
pub const MISSING: &str = "MISSING";

/// How the payloads of one comparison run are broken into comparison units.
///
/// Selected by the caller once per run; the engine never infers it from payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ComparisonMode {
    /// Every dotted path reachable through nested objects is a unit
    GenericObject,
    /// Each record of an array payload is a unit, keyed by its identifier field.
    /// Only `fields` of the record take part in equality (all fields when empty).
    #[serde(rename_all = "camelCase")]
    ArrayByIdentifier {
        identifier_field: String,
        #[serde(default)]
        fields: Vec<String>,
    },
    /// A fixed, ordered list of dotted paths into an object payload
    FieldSubsetOfObject { fields: Vec<String> },
}

impl ComparisonMode {
    pub fn label(&self) -> &'static str {
        match self {
            ComparisonMode::GenericObject => "object",
            ComparisonMode::ArrayByIdentifier { .. } => "array",
            ComparisonMode::FieldSubsetOfObject { .. } => "fields",
        }
    }
}

/// Value of one comparison unit in one instance
#[derive(Debug, Clone, PartialEq)]
pub enum UnitValue {
    Present(Value),
    Missing,
}

impl UnitValue {
    pub fn from_option(value: Option<Value>) -> Self {
        match value {
            Some(value) => UnitValue::Present(value),
            None => UnitValue::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, UnitValue::Missing)
    }

    pub fn as_present(&self) -> Option<&Value> {
        match self {
            UnitValue::Present(value) => Some(value),
            UnitValue::Missing => None,
        }
    }
}

impl Serialize for UnitValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UnitValue::Present(value) => value.serialize(serializer),
            UnitValue::Missing => serializer.serialize_str(MISSING),
        }
    }
}

impl<'de> Deserialize<'de> for UnitValue {
    /// Decodes the bare marker as `Missing`; `DifferenceResult` corrects this for
    /// instances it lists as affected.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(ref s) if s == MISSING => UnitValue::Missing,
            other => UnitValue::Present(other),
        })
    }
}

/// Per-instance values of one unit, in declared instance order.
///
/// Serialized as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceValues(Vec<(InstanceId, UnitValue)>);

impl InstanceValues {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Appends an entry; a repeated id replaces the earlier value in place
    pub fn insert(&mut self, instance_id: impl Into<InstanceId>, value: UnitValue) {
        let instance_id = instance_id.into();
        match self.0.iter_mut().find(|(id, _)| *id == instance_id) {
            Some(entry) => entry.1 = value,
            None => self.0.push((instance_id, value)),
        }
    }

    pub fn get(&self, instance_id: &str) -> Option<&UnitValue> {
        self.0
            .iter()
            .find(|(id, _)| id == instance_id)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstanceId, &UnitValue)> {
        self.0.iter().map(|(id, value)| (id, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.0.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn present_instances(&self) -> Vec<InstanceId> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_missing())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn missing_instances(&self) -> Vec<InstanceId> {
        self.0
            .iter()
            .filter(|(_, value)| value.is_missing())
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl FromIterator<(InstanceId, UnitValue)> for InstanceValues {
    fn from_iter<T: IntoIterator<Item = (InstanceId, UnitValue)>>(iter: T) -> Self {
        let mut values = InstanceValues::new();
        for (id, value) in iter {
            values.insert(id, value);
        }
        values
    }
}

impl Serialize for InstanceValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, value) in &self.0 {
            map.serialize_entry(id, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for InstanceValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct InstanceValuesVisitor;

        impl<'de> Visitor<'de> for InstanceValuesVisitor {
            type Value = InstanceValues;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map from instance id to value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut values = InstanceValues::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, value)) = access.next_entry::<InstanceId, UnitValue>()? {
                    values.insert(id, value);
                }
                Ok(values)
            }
        }

        deserializer.deserialize_map(InstanceValuesVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceType {
    Added,
    Deleted,
    Edited,
}

impl fmt::Display for DifferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifferenceType::Added => f.write_str("added"),
            DifferenceType::Deleted => f.write_str("deleted"),
            DifferenceType::Edited => f.write_str("edited"),
        }
    }
}

/// One differing comparison unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "DifferenceResultRepr")]
pub struct DifferenceResult {
    /// Dotted path or item identifier
    pub path: String,
    #[serde(rename = "type")]
    pub difference_type: DifferenceType,
    /// One entry per compared instance, in declared order
    pub values: InstanceValues,
    /// Instances where the unit is present, in declared order
    pub affected_instances: Vec<InstanceId>,
    pub description: String,
    /// Identifier field value of an array record, with its original JSON type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DifferenceResultRepr {
    path: String,
    #[serde(rename = "type")]
    difference_type: DifferenceType,
    values: InstanceValues,
    affected_instances: Vec<InstanceId>,
    description: String,
    #[serde(default)]
    identifier: Option<Value>,
}

impl From<DifferenceResultRepr> for DifferenceResult {
    fn from(repr: DifferenceResultRepr) -> Self {
        // A literal "MISSING" string for an affected instance was a real value
        let values = repr
            .values
            .0
            .into_iter()
            .map(|(id, value)| {
                let value = match value {
                    UnitValue::Missing if repr.affected_instances.contains(&id) => {
                        UnitValue::Present(Value::String(MISSING.to_string()))
                    }
                    other => other,
                };
                (id, value)
            })
            .collect();

        Self {
            path: repr.path,
            difference_type: repr.difference_type,
            values,
            affected_instances: repr.affected_instances,
            description: repr.description,
            identifier: repr.identifier,
        }
    }
}

/// Aggregate counts over a result set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_differences: usize,
    pub added: usize,
    pub deleted: usize,
    pub edited: usize,
}

impl Summary {
    pub fn from_results(results: &[DifferenceResult]) -> Self {
        let mut summary = Summary::default();
        for result in results {
            match result.difference_type {
                DifferenceType::Added => summary.added += 1,
                DifferenceType::Deleted => summary.deleted += 1,
                DifferenceType::Edited => summary.edited += 1,
            }
        }
        summary.total_differences = summary.added + summary.deleted + summary.edited;
        summary
    }
}

/// Output of one orchestrator run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonOutcome {
    pub results: Vec<DifferenceResult>,
    pub summary: Summary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_with(values: InstanceValues, affected: &[&str]) -> DifferenceResult {
        DifferenceResult {
            path: "flag".to_string(),
            difference_type: DifferenceType::Edited,
            values,
            affected_instances: affected.iter().map(|s| s.to_string()).collect(),
            description: String::new(),
            identifier: None,
        }
    }

    #[test]
    fn test_values_serialize_in_declared_order() {
        let values: InstanceValues = vec![
            ("zeta".to_string(), UnitValue::Present(json!(1))),
            ("alpha".to_string(), UnitValue::Missing),
        ]
        .into_iter()
        .collect();

        let text = serde_json::to_string(&values).unwrap();
        assert_eq!(text, r#"{"zeta":1,"alpha":"MISSING"}"#);

        let back: InstanceValues = serde_json::from_str(&text).unwrap();
        assert_eq!(back.instance_ids(), vec!["zeta", "alpha"]);
        assert_eq!(back, values);
    }

    #[test]
    fn test_literal_missing_string_survives_when_instance_is_affected() {
        let values: InstanceValues = vec![
            ("a".to_string(), UnitValue::Present(json!("MISSING"))),
            ("b".to_string(), UnitValue::Missing),
        ]
        .into_iter()
        .collect();
        let result = result_with(values, &["a"]);

        let text = serde_json::to_string(&result).unwrap();
        let back: DifferenceResult = serde_json::from_str(&text).unwrap();

        assert_eq!(back.values.get("a"), Some(&UnitValue::Present(json!("MISSING"))));
        assert_eq!(back.values.get("b"), Some(&UnitValue::Missing));
        assert_eq!(back, result);
    }

    #[test]
    fn test_difference_result_wire_shape() {
        let values: InstanceValues = vec![
            ("a".to_string(), UnitValue::Present(json!(2))),
            ("b".to_string(), UnitValue::Present(json!(3))),
        ]
        .into_iter()
        .collect();
        let result = result_with(values, &["a", "b"]);

        let wire = serde_json::to_value(&result).unwrap();
        assert_eq!(wire["type"], json!("edited"));
        assert_eq!(wire["affectedInstances"], json!(["a", "b"]));
        assert_eq!(wire["values"], json!({"a": 2, "b": 3}));
        assert!(wire.get("identifier").is_none());
    }

    #[test]
    fn test_identifier_keeps_its_json_type() {
        let mut values = InstanceValues::new();
        values.insert("a", UnitValue::Present(json!({"v": 1})));
        let mut result = result_with(values, &["a"]);
        result.path = "7".to_string();
        result.identifier = Some(json!(7));

        let wire = serde_json::to_value(&result).unwrap();
        assert_eq!(wire["identifier"], json!(7));

        let back: DifferenceResult = serde_json::from_value(wire).unwrap();
        assert_eq!(back.identifier, Some(json!(7)));
    }

    #[test]
    fn test_summary_counts_each_type() {
        let mut added = result_with(InstanceValues::new(), &[]);
        added.difference_type = DifferenceType::Added;
        let mut deleted = added.clone();
        deleted.difference_type = DifferenceType::Deleted;
        let edited = result_with(InstanceValues::new(), &[]);

        let summary = Summary::from_results(&[added.clone(), deleted, edited, added]);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.edited, 1);
        assert_eq!(summary.total_differences, 4);
    }

    #[test]
    fn test_mode_wire_format() {
        let mode: ComparisonMode = serde_json::from_value(json!({
            "kind": "arrayByIdentifier",
            "identifierField": "id",
            "fields": ["enabled"]
        }))
        .unwrap();
        assert_eq!(
            mode,
            ComparisonMode::ArrayByIdentifier {
                identifier_field: "id".to_string(),
                fields: vec!["enabled".to_string()],
            }
        );

        let generic: ComparisonMode =
            serde_json::from_value(json!({"kind": "genericObject"})).unwrap();
        assert_eq!(generic, ComparisonMode::GenericObject);
    }
}
