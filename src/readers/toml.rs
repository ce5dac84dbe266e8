use super::{Reader, read_to_string};
use crate::error::ReaderError;
use serde_json::{Map, Number, Value};
use std::path::Path;

/// TOML documents via the `toml` crate. Datetimes become strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlReader;

impl Reader for TomlReader {
    fn read(&self, path: &Path) -> Result<Map<String, Value>, ReaderError> {
        let content = read_to_string(path)?;
        let table: ::toml::Table =
            ::toml::from_str(&content).map_err(|err| ReaderError::syntax(path, err))?;
        Ok(convert_table(table))
    }
}

fn convert_table(table: ::toml::Table) -> Map<String, Value> {
    table
        .into_iter()
        .map(|(key, value)| (key, convert(value)))
        .collect()
}

fn convert(value: ::toml::Value) -> Value {
    use ::toml::Value as Toml;

    match value {
        Toml::String(text) => Value::String(text),
        Toml::Integer(n) => Value::from(n),
        Toml::Float(n) => Number::from_f64(n).map_or(Value::Null, Value::Number),
        Toml::Boolean(flag) => Value::Bool(flag),
        Toml::Datetime(datetime) => Value::String(datetime.to_string()),
        Toml::Array(items) => Value::Array(items.into_iter().map(convert).collect()),
        Toml::Table(table) => Value::Object(convert_table(table)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_tables_and_datetimes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.toml");
        std::fs::write(
            &path,
            "name = \"api\"\n\n[server]\nport = 8080\nstarted = 1979-05-27T07:32:00Z\n\n[[workers]]\nid = 1\n",
        )
        .unwrap();

        let map = TomlReader.read(&path).unwrap();
        assert_eq!(
            Value::Object(map),
            json!({
                "name": "api",
                "server": {"port": 8080, "started": "1979-05-27T07:32:00Z"},
                "workers": [{"id": 1}]
            })
        );
    }

    #[test]
    fn test_malformed_document_is_syntax_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.toml");
        std::fs::write(&path, "name = ").unwrap();

        assert!(matches!(
            TomlReader.read(&path).unwrap_err(),
            ReaderError::Syntax { .. }
        ));
    }
}
