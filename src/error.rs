//! Error types for loading and resolving configuration.
//!
//! Three families mirror the three places a load can fail:
//! - [`ConfigError`] - policy violations raised by the loader and registries
//! - [`ReaderError`] - a format reader could not turn a file into a mapping
//! - [`ResolverError`] - a placeholder resolver could not produce a value
//!
//! [`Error`] is their transparent union and is what `load` returns.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which registry a binding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Reader,
    Resolver,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Reader => write!(f, "reader"),
            BindingKind::Resolver => write!(f, "resolver"),
        }
    }
}

/// Structural and policy violations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the namespace \"{0}\" is already in use")]
    NamespaceInUse(String),

    /// A dotted namespace would have to descend through a value that is not a mapping.
    #[error("the namespace \"{namespace}\" conflicts with the non-mapping value at \"{at}\"")]
    NamespaceConflict { namespace: String, at: String },

    #[error("the configuration item \"{namespace}\" must be a file or directory string, \"{found}\" given")]
    InvalidSource {
        namespace: String,
        found: &'static str,
    },

    #[error("the configuration file or directory \"{}\" does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("the path \"{}\" is not readable: {source}", path.display())]
    NotReadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("the file extension \"{0}\" has no valid reader")]
    UnknownExtension(String),

    #[error("the item \"{item}\" has no valid resolver for scheme \"{scheme}\"")]
    UnknownResolver { item: String, scheme: String },

    #[error("the item \"{item}\" contains a malformed placeholder: {reason}")]
    MalformedPlaceholder { item: String, reason: &'static str },

    #[error("the {kind} with name \"{name}\" is already in use")]
    AlreadyRegistered { kind: BindingKind, name: String },

    #[error("the factory could not build {kind} \"{id}\" bound to \"{name}\"")]
    FactoryMiss {
        kind: BindingKind,
        name: String,
        id: String,
    },

    #[error("the value at \"{path}\" could not be decoded: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of a format reader.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("could not read file \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse file \"{}\": {message}", path.display())]
    Syntax { path: PathBuf, message: String },

    #[error("file \"{}\" must contain a mapping at the top level, found {found}", path.display())]
    NotAMapping { path: PathBuf, found: &'static str },
}

impl ReaderError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn syntax(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Syntax {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Failures of a placeholder resolver.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("the environment variable \"{0}\" does not exist")]
    MissingVariable(String),

    #[error("the environment variable \"{0}\" is not valid unicode")]
    NotUnicode(String),

    /// Free-form failure for resolvers outside this crate.
    #[error("{0}")]
    Message(String),
}

impl ResolverError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Any error a load can produce.
///
/// Reader and resolver errors pass through unchanged so callers can match on
/// the failure as the reader or resolver reported it.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Short type name of a JSON value, used in error messages.
pub(crate) fn type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolver_error_passes_through_unchanged() {
        let err: Error = ResolverError::MissingVariable("DB_HOST".into()).into();
        assert!(matches!(err, Error::Resolver(ResolverError::MissingVariable(ref name)) if name == "DB_HOST"));
        assert_eq!(
            err.to_string(),
            "the environment variable \"DB_HOST\" does not exist"
        );
    }

    #[test]
    fn test_already_registered_message_names_kind() {
        let err = ConfigError::AlreadyRegistered {
            kind: BindingKind::Reader,
            name: "php".into(),
        };
        assert_eq!(err.to_string(), "the reader with name \"php\" is already in use");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name(&json!(null)), "null");
        assert_eq!(type_name(&json!({"a": 1})), "object");
        assert_eq!(type_name(&json!([1])), "array");
        assert_eq!(type_name(&json!(1.5)), "number");
    }
}
