use super::Reader;
use crate::error::ReaderError;
use serde_json::{Map, Value};
use std::path::Path;

/// INI files via `rust-ini`.
///
/// Sections become nested mappings and keys outside any section land at the
/// top level. `key[] = v` collects into a sequence, `key[name] = v` into a
/// mapping. Values stay strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct IniReader;

impl Reader for IniReader {
    fn read(&self, path: &Path) -> Result<Map<String, Value>, ReaderError> {
        let ini = ::ini::Ini::load_from_file(path).map_err(|err| match err {
            ::ini::Error::Io(source) => ReaderError::io(path, source),
            ::ini::Error::Parse(parse) => ReaderError::syntax(path, parse),
        })?;

        let mut root = Map::new();
        for (section, properties) in ini.iter() {
            let target = match section {
                None => &mut root,
                Some(name) => {
                    let slot = root
                        .entry(name.to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if !slot.is_object() {
                        *slot = Value::Object(Map::new());
                    }
                    let Value::Object(map) = slot else { continue };
                    map
                }
            };

            for (key, value) in properties.iter() {
                insert_property(target, key, value);
            }
        }

        Ok(root)
    }
}

fn insert_property(target: &mut Map<String, Value>, key: &str, value: &str) {
    let value = Value::String(value.to_string());

    let Some((base, rest)) = key.split_once('[') else {
        target.insert(key.to_string(), value);
        return;
    };
    let Some(sub) = rest.strip_suffix(']') else {
        target.insert(key.to_string(), value);
        return;
    };

    let slot = target.entry(base.to_string()).or_insert(Value::Null);
    if sub.is_empty() {
        match slot {
            Value::Array(items) => items.push(value),
            Value::Object(map) => {
                let index = map.len().to_string();
                map.insert(index, value);
            }
            other => *other = Value::Array(vec![value]),
        }
    } else {
        if !slot.is_object() {
            let mut map = Map::new();
            if let Value::Array(items) = std::mem::take(slot) {
                for (index, item) in items.into_iter().enumerate() {
                    map.insert(index.to_string(), item);
                }
            }
            *slot = Value::Object(map);
        }
        if let Value::Object(map) = slot {
            map.insert(sub.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn read(content: &str) -> Result<Map<String, Value>, ReaderError> {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ini.ini");
        std::fs::write(&path, content).unwrap();
        IniReader.read(&path)
    }

    #[test]
    fn test_sections_become_mappings() {
        let map = read("name = app\n\n[foo]\nbar = baz\n\n[db]\nhost = localhost\nport = 5432\n").unwrap();
        assert_eq!(
            Value::Object(map),
            json!({
                "name": "app",
                "foo": {"bar": "baz"},
                "db": {"host": "localhost", "port": "5432"}
            })
        );
    }

    #[test]
    fn test_bracket_keys_collect() {
        let map = read("[paths]\ndirs[] = /a\ndirs[] = /b\nnamed[first] = 1\nnamed[second] = 2\n").unwrap();
        assert_eq!(
            map["paths"],
            json!({"dirs": ["/a", "/b"], "named": {"first": "1", "second": "2"}})
        );
    }

    #[test]
    fn test_broken_section_header_is_syntax_error() {
        let err = read("[unclosed\nkey = value\n").unwrap_err();
        assert!(matches!(err, ReaderError::Syntax { .. }));
    }
}
