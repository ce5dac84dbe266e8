use super::Resolver;
use crate::error::ResolverError;
use serde_json::Value;
use std::env::{self, VarError};

/// Reads process environment variables.
///
/// Literal values are mapped before returning:
/// - `true` / `(true)` - boolean true
/// - `false` / `(false)` - boolean false
/// - `empty` / `(empty)` - empty string
/// - `null` / `(null)` - null
/// - `"quoted"` - the text between the quotes
///
/// Anything else is returned as the raw string.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvResolver;

impl Resolver for EnvResolver {
    fn resolve(&self, argument: &str) -> Result<Value, ResolverError> {
        match env::var(argument) {
            Ok(raw) => Ok(interpret(&raw)),
            Err(VarError::NotPresent) => Err(ResolverError::MissingVariable(argument.to_string())),
            Err(VarError::NotUnicode(_)) => Err(ResolverError::NotUnicode(argument.to_string())),
        }
    }
}

fn interpret(raw: &str) -> Value {
    match raw {
        "true" | "(true)" => Value::Bool(true),
        "false" | "(false)" => Value::Bool(false),
        "empty" | "(empty)" => Value::String(String::new()),
        "null" | "(null)" => Value::Null,
        _ => match raw.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
            Some(inner) if raw.len() > 1 => Value::String(inner.to_string()),
            _ => Value::String(raw.to_string()),
        },
    }
}
