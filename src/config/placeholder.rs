//! Placeholder substitution in freshly read configuration.
//!
//! A placeholder is `%scheme:argument%`: the text between a `%` and the next
//! `%`, split on its first `:`. A string leaf that is exactly one placeholder
//! is replaced by the resolved value as-is, so `"%env:DEBUG%"` can become a
//! boolean. Placeholders embedded in longer strings are interpolated using the
//! value's string form.

use crate::error::{ConfigError, Error};
use serde_json::Value;
use std::ops::Range;
use tracing::trace;

/// One `%scheme:argument%` occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub scheme: &'a str,
    pub argument: &'a str,
}

/// Find the first token starting at or after byte `from`.
///
/// Returns the byte span of the whole token including both `%` signs.
pub fn find_token(text: &str, from: usize) -> Result<Option<(Range<usize>, Token<'_>)>, &'static str> {
    let Some(open) = text[from..].find('%').map(|offset| from + offset) else {
        return Ok(None);
    };
    let Some(close) = text[open + 1..].find('%').map(|offset| open + 1 + offset) else {
        return Err("unmatched '%'");
    };

    let body = &text[open + 1..close];
    let Some((scheme, argument)) = body.split_once(':') else {
        return Err("expected \"%scheme:argument%\"");
    };

    Ok(Some((open..close + 1, Token { scheme, argument })))
}

/// String form used when a value is interpolated into a longer string.
pub fn interpolated(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Resolve every placeholder in `value` in place.
///
/// `resolve` returns `Ok(None)` when no resolver is bound to the token's
/// scheme. Mapping keys and non-string scalars are left untouched, and
/// substituted text is never scanned again.
pub fn resolve_placeholders<F>(value: &mut Value, resolve: &mut F) -> Result<(), Error>
where
    F: FnMut(&Token<'_>) -> Result<Option<Value>, Error>,
{
    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                resolve_placeholders(child, resolve)?;
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                resolve_placeholders(child, resolve)?;
            }
        }
        Value::String(text) if text.contains('%') => {
            *value = resolve_leaf(text, resolve)?;
        }
        _ => {}
    }
    Ok(())
}

fn resolve_leaf<F>(leaf: &str, resolve: &mut F) -> Result<Value, Error>
where
    F: FnMut(&Token<'_>) -> Result<Option<Value>, Error>,
{
    let malformed = |reason| ConfigError::MalformedPlaceholder {
        item: leaf.to_string(),
        reason,
    };
    let mut lookup = |token: &Token<'_>| -> Result<Value, Error> {
        let resolved = resolve(token)?.ok_or_else(|| ConfigError::UnknownResolver {
            item: leaf.to_string(),
            scheme: token.scheme.to_string(),
        })?;
        trace!(scheme = token.scheme, argument = token.argument, "resolved placeholder");
        Ok(resolved)
    };

    let Some((span, token)) = find_token(leaf, 0).map_err(malformed)? else {
        return Ok(Value::String(leaf.to_string()));
    };
    if span == (0..leaf.len()) {
        return lookup(&token);
    }

    let mut out = String::with_capacity(leaf.len());
    let mut cursor = 0;
    let mut next = Some((span, token));
    while let Some((span, token)) = next {
        out.push_str(&leaf[cursor..span.start]);
        out.push_str(&interpolated(&lookup(&token)?));
        cursor = span.end;
        next = find_token(leaf, cursor).map_err(malformed)?;
    }
    out.push_str(&leaf[cursor..]);

    Ok(Value::String(out))
}
