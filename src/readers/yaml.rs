use super::{Reader, into_mapping, read_to_string};
use crate::error::ReaderError;
use serde_json::{Map, Number, Value};
use std::path::Path;

/// YAML documents via `serde_yaml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlReader;

impl Reader for YamlReader {
    fn read(&self, path: &Path) -> Result<Map<String, Value>, ReaderError> {
        let content = read_to_string(path)?;
        parse(path, &content)
    }
}

pub(super) fn parse(path: &Path, content: &str) -> Result<Map<String, Value>, ReaderError> {
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|err| ReaderError::syntax(path, err))?;
    into_mapping(path, into_json(value))
}

/// Convert a YAML value to the JSON model used by the tree.
///
/// Non-string keys are stringified and tags are dropped.
pub(super) fn into_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(flag) => Value::Bool(flag),
        Yaml::Number(number) => {
            if let Some(n) = number.as_i64() {
                Value::from(n)
            } else if let Some(n) = number.as_u64() {
                Value::from(n)
            } else {
                number
                    .as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Yaml::String(text) => Value::String(text),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(into_json).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(key, value)| (key_string(key), into_json(value)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => into_json(tagged.value),
    }
}

fn key_string(key: serde_yaml::Value) -> String {
    match into_json(key) {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
