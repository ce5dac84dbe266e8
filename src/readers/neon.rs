use super::{Reader, read_to_string, yaml};
use crate::error::ReaderError;
use serde_json::{Map, Value};
use std::path::Path;

/// NEON documents.
///
/// Covers the block and inline syntax NEON shares with YAML (`key: value`,
/// `- item`, `[a, b]`, `{a: b}`, `#` comments). NEON entities such as
/// `Service(arg)` are not supported and fail as syntax errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeonReader;

impl Reader for NeonReader {
    fn read(&self, path: &Path) -> Result<Map<String, Value>, ReaderError> {
        let content = read_to_string(path)?;
        yaml::parse(path, &content)
    }
}
