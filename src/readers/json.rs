use super::{Reader, into_mapping, read_to_string};
use crate::error::ReaderError;
use serde_json::{Map, Value};
use std::path::Path;

/// JSON documents via `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReader;

impl Reader for JsonReader {
    fn read(&self, path: &Path) -> Result<Map<String, Value>, ReaderError> {
        let content = read_to_string(path)?;
        let value: Value =
            serde_json::from_str(&content).map_err(|err| ReaderError::syntax(path, err))?;
        into_mapping(path, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_nested_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("json.json");
        std::fs::write(&path, r#"{"foo": {"bar": "baz"}, "list": [1, 2]}"#).unwrap();

        let map = JsonReader.read(&path).unwrap();
        assert_eq!(Value::Object(map), json!({"foo": {"bar": "baz"}, "list": [1, 2]}));
    }

    #[test]
    fn test_malformed_document_is_syntax_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, r#"{"foo": "#).unwrap();

        let err = JsonReader.read(&path).unwrap_err();
        assert!(matches!(err, ReaderError::Syntax { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = JsonReader.read(&temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ReaderError::Io { .. }));
    }
}
