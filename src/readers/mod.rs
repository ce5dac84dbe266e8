//! Format readers.
//!
//! A reader turns one file into a nested mapping. The loader picks a reader
//! by file extension; see [`default_bindings`] for the built-in table.

mod ini;
mod json;
mod neon;
mod php;
mod toml;
mod xml;
mod yaml;

pub use ini::IniReader;
pub use json::JsonReader;
pub use neon::NeonReader;
pub use php::PhpArrayReader;
pub use toml::TomlReader;
pub use xml::XmlReader;
pub use yaml::YamlReader;

use crate::config::Binding;
use crate::error::{ReaderError, type_name};
use serde_json::{Map, Value};
use std::path::Path;

/// Turns a file into a configuration mapping.
pub trait Reader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Map<String, Value>, ReaderError>;
}

/// Extension bindings every loader starts with.
pub fn default_bindings() -> Vec<(&'static str, Binding<dyn Reader>)> {
    vec![
        ("php", Binding::reader::<PhpArrayReader>()),
        ("ini", Binding::reader::<IniReader>()),
        ("json", Binding::reader::<JsonReader>()),
        ("xml", Binding::reader::<XmlReader>()),
        ("yml", Binding::reader::<YamlReader>()),
        ("yaml", Binding::reader::<YamlReader>()),
        ("neon", Binding::reader::<NeonReader>()),
        ("toml", Binding::reader::<TomlReader>()),
    ]
}

/// Read a whole file as UTF-8. The handle is closed before returning.
pub(crate) fn read_to_string(path: &Path) -> Result<String, ReaderError> {
    std::fs::read_to_string(path).map_err(|err| ReaderError::io(path, err))
}

/// Require a top-level mapping. An empty document counts as an empty mapping.
pub(crate) fn into_mapping(path: &Path, value: Value) -> Result<Map<String, Value>, ReaderError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::Array(list) if list.is_empty() => Ok(Map::new()),
        other => Err(ReaderError::NotAMapping {
            path: path.to_path_buf(),
            found: type_name(&other),
        }),
    }
}
