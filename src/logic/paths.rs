use itertools::Itertools;
use serde_json::{Map, Value};

/// Collect every dotted path reachable through nested objects.
///
/// Arrays and scalars are leaves. The result is the union over all payloads,
/// in first-seen order.
pub fn collect_paths<'a, I>(payloads: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut paths = Vec::new();
    for payload in payloads {
        collect_into(payload, None, &mut paths);
    }
    paths.into_iter().unique().collect()
}

fn collect_into(value: &Value, prefix: Option<&str>, paths: &mut Vec<String>) {
    let Value::Object(map) = value else {
        return;
    };

    for (key, child) in map {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        paths.push(path.clone());
        if child.is_object() {
            collect_into(child, Some(&path), paths);
        }
    }
}

/// Value at a dotted path, or `None` as soon as a step is not an object or the key is absent
pub fn get_value_at_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

/// Set the value at a dotted path, creating intermediate objects.
///
/// Non-object intermediates are replaced by objects.
pub fn set_value_at_path(target: &mut Value, path: &str, value: Value) {
    let mut current = target;
    let mut keys = path.split('.').peekable();

    while let Some(key) = keys.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };

        if keys.peek().is_none() {
            map.insert(key.to_string(), value);
            return;
        }
        current = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}
