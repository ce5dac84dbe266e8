//! The aggregate configuration tree.
//!
//! Unlike a field-by-field deep merge, namespaces are only ever introduced:
//! inserting over an existing namespace fails instead of overwriting it.

use crate::error::ConfigError;
use serde_json::{Map, Value};

/// Insertion-ordered mapping from namespace to loaded content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    items: Map<String, Value>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Map<String, Value>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &Map<String, Value> {
        &self.items
    }

    pub fn into_items(self) -> Map<String, Value> {
        self.items
    }

    /// Whether a non-null value already lives at `namespace`.
    pub fn contains(&self, namespace: &str) -> bool {
        self.extract(namespace).is_some()
    }

    /// Insert `value` under `namespace`, nesting on `.`.
    ///
    /// Intermediate mappings are created as needed and may be shared between
    /// namespaces (`subdir.a` and `subdir.b`). A null intermediate is replaced
    /// by a mapping; any other non-mapping intermediate is a conflict.
    pub fn insert_namespace(&mut self, namespace: &str, value: Value) -> Result<(), ConfigError> {
        let mut segments: Vec<&str> = namespace.split('.').collect();
        let Some(last) = segments.pop() else {
            return Err(ConfigError::NamespaceInUse(namespace.to_string()));
        };

        let mut current = &mut self.items;
        let mut walked = String::new();
        for segment in segments {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);

            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => {
                    return Err(ConfigError::NamespaceConflict {
                        namespace: namespace.to_string(),
                        at: walked,
                    });
                }
            };
        }

        match current.get(last) {
            Some(existing) if !existing.is_null() => {
                Err(ConfigError::NamespaceInUse(namespace.to_string()))
            }
            _ => {
                current.insert(last.to_string(), value);
                Ok(())
            }
        }
    }

    /// Walk a dotted path. Mappings are indexed by key, sequences by decimal
    /// position. Missing segments and null values both yield `None`.
    pub fn extract(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.items.get(first)?;

        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(list) => list.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        if current.is_null() { None } else { Some(current) }
    }
}
