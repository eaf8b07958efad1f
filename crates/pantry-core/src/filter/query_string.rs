//! Build filter values out of URL query parameters.
//!
//! Two encodings are accepted for a parameter named `filter` (or `where`):
//!
//! - JSON: `?filter={"where":{"cost":{"gt":10}},"limit":5}`
//! - brackets: `?filter[where][cost][gt]=10&filter[limit]=5`
//!
//! Bracket values are kept as strings; the filter parser and the where
//! evaluator coerce them where a number or boolean is expected.

use serde_json::{Map, Value};

use super::FilterError;

/// Collect the value of parameter `root` from decoded query pairs.
/// Returns `None` when the parameter is absent or empty.
pub fn extract(pairs: &[(String, String)], root: &str) -> Result<Option<Value>, FilterError> {
    let mut json: Option<Value> = None;
    let mut nested = Map::new();

    for (key, raw) in pairs {
        if key == root {
            if raw.trim().is_empty() {
                continue;
            }
            let value = serde_json::from_str(raw).map_err(|e| FilterError::Json {
                param: root.to_string(),
                reason: e.to_string(),
            })?;
            json = Some(value);
        } else if let Some(rest) = key.strip_prefix(root)
            && rest.starts_with('[')
        {
            let path = parse_segments(key, rest)?;
            insert(&mut nested, &path, Value::String(raw.clone()), key)?;
        }
    }

    match (json, nested.is_empty()) {
        (Some(_), false) => Err(FilterError::MalformedKey(format!(
            "`{root}` given both as JSON and in bracket notation"
        ))),
        (Some(value), true) => Ok(Some(value)),
        (None, false) => Ok(Some(arrayify(Value::Object(nested)))),
        (None, true) => Ok(None),
    }
}

/// `[where][cost][gt]` → `["where", "cost", "gt"]`.
fn parse_segments(key: &str, mut rest: &str) -> Result<Vec<String>, FilterError> {
    let mut segments = Vec::new();
    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .ok_or_else(|| FilterError::MalformedKey(key.to_string()))?;
        let end = inner
            .find(']')
            .ok_or_else(|| FilterError::MalformedKey(key.to_string()))?;
        segments.push(inner[..end].to_string());
        rest = &inner[end + 1..];
    }
    if segments.iter().any(String::is_empty) {
        return Err(FilterError::MalformedKey(key.to_string()));
    }
    Ok(segments)
}

fn insert(
    target: &mut Map<String, Value>,
    path: &[String],
    value: Value,
    key: &str,
) -> Result<(), FilterError> {
    let Some((last, parents)) = path.split_last() else {
        return Err(FilterError::MalformedKey(key.to_string()));
    };

    let mut current = target;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match slot {
            Value::Object(map) => map,
            _ => return Err(FilterError::MalformedKey(key.to_string())),
        };
    }

    if current.contains_key(last) {
        return Err(FilterError::MalformedKey(key.to_string()));
    }
    current.insert(last.clone(), value);
    Ok(())
}

/// Objects keyed `0..n` become arrays, recursively.
fn arrayify(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let indexed = !map.is_empty()
                && (0..map.len()).all(|i| map.contains_key(&i.to_string()));
            if indexed {
                let mut map = map;
                let items = (0..map.len())
                    .filter_map(|i| map.remove(&i.to_string()))
                    .map(arrayify)
                    .collect();
                Value::Array(items)
            } else {
                Value::Object(map.into_iter().map(|(k, v)| (k, arrayify(v))).collect())
            }
        }
        other => other,
    }
}
