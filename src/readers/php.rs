use super::{Reader, into_mapping, read_to_string};
use crate::error::ReaderError;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::path::Path;

/// PHP files that `return` an array literal.
///
/// The file is parsed, never executed. Accepted input is the `<?php` prologue,
/// optional `declare`, `namespace` and `use` statements, then
/// `return <array>;`. Values may be nested `[...]` / `array(...)` literals,
/// quoted strings, integers, floats, `true`, `false` and `null`. Anything
/// else (variables, calls, constants, concatenation) is rejected.
///
/// Arrays whose keys are exactly `0..n` in order become sequences; all other
/// arrays become mappings with stringified keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhpArrayReader;

impl Reader for PhpArrayReader {
    fn read(&self, path: &Path) -> Result<Map<String, Value>, ReaderError> {
        let content = read_to_string(path)?;
        let value = Parser::new(&content)
            .document()
            .map_err(|err| ReaderError::syntax(path, err))?;
        into_mapping(path, value)
    }
}

#[derive(Debug)]
struct ParseError {
    line: usize,
    message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on line {}", self.message, self.line)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    fn into_string(self) -> String {
        match self {
            Key::Int(n) => n.to_string(),
            Key::Str(text) => text,
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

type ParseResult<T> = Result<T, ParseError>;

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.src[..self.pos].matches('\n').count() + 1,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> ParseResult<()> {
        self.skip_trivia();
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected \"{token}\"")))
        }
    }

    /// Skip whitespace and `//`, `#`, `/* */` comments.
    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if self.rest().starts_with("//") || self.rest().starts_with('#') {
                match self.rest().find('\n') {
                    Some(end) => self.pos += end,
                    None => self.pos = self.src.len(),
                }
            } else if self.rest().starts_with("/*") {
                match self.rest()[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => self.pos = self.src.len(),
                }
            } else {
                return;
            }
        }
    }

    /// Case-insensitive keyword not followed by an identifier character.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = self.rest();
        let Some(head) = rest.get(..keyword.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(keyword) {
            return false;
        }
        let boundary = rest[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|ch| !is_ident(ch));
        if boundary {
            self.pos += keyword.len();
        }
        boundary
    }

    fn skip_statement(&mut self) -> ParseResult<()> {
        match self.rest().find(';') {
            Some(end) => {
                self.pos += end + 1;
                Ok(())
            }
            None => Err(self.error("unterminated statement")),
        }
    }

    fn document(&mut self) -> ParseResult<Value> {
        self.skip_trivia();
        if !self.eat_keyword("<?php") {
            return Err(self.error("expected \"<?php\" opening tag"));
        }

        loop {
            self.skip_trivia();
            if self.eat_keyword("declare") || self.eat_keyword("namespace") || self.eat_keyword("use") {
                self.skip_statement()?;
            } else {
                break;
            }
        }

        if !self.eat_keyword("return") {
            return Err(self.error("expected \"return\" statement"));
        }
        let value = self.value()?;

        self.skip_trivia();
        self.eat(";");
        self.skip_trivia();
        self.eat("?>");
        self.skip_trivia();
        if self.pos < self.src.len() {
            return Err(self.error("unexpected content after return statement"));
        }
        Ok(value)
    }

    fn value(&mut self) -> ParseResult<Value> {
        self.skip_trivia();
        match self.peek() {
            Some('[') => {
                self.bump();
                self.array(']')
            }
            Some('\'') => self.single_quoted().map(Value::String),
            Some('"') => self.double_quoted().map(Value::String),
            Some(ch) if ch == '-' || ch == '+' || ch == '.' || ch.is_ascii_digit() => self.number(),
            Some(ch) if is_ident(ch) => {
                if self.eat_keyword("array") {
                    self.expect("(")?;
                    return self.array(')');
                }
                if self.eat_keyword("true") {
                    return Ok(Value::Bool(true));
                }
                if self.eat_keyword("false") {
                    return Ok(Value::Bool(false));
                }
                if self.eat_keyword("null") {
                    return Ok(Value::Null);
                }
                let ident: String = self.rest().chars().take_while(|ch| is_ident(*ch)).collect();
                Err(self.error(format!("unsupported expression \"{ident}\"")))
            }
            Some('$') => Err(self.error("variables are not supported")),
            Some(ch) => Err(self.error(format!("unexpected character '{ch}'"))),
            None => Err(self.error("unexpected end of file")),
        }
    }

    fn array(&mut self, close: char) -> ParseResult<Value> {
        let mut entries: Vec<(Key, Value)> = Vec::new();
        let mut next_index: i64 = 0;

        loop {
            self.skip_trivia();
            if self.peek() == Some(close) {
                self.bump();
                break;
            }

            let first = self.value()?;
            self.skip_trivia();
            let (key, value) = if self.eat("=>") {
                let key = self.key(first)?;
                (key, self.value()?)
            } else {
                (Key::Int(next_index), first)
            };

            if let Key::Int(n) = key {
                next_index = next_index.max(n.saturating_add(1));
            }
            match entries.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }

            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(ch) if ch == close => {
                    self.bump();
                    break;
                }
                _ => return Err(self.error(format!("expected ',' or '{close}' in array"))),
            }
        }

        let is_list = entries
            .iter()
            .enumerate()
            .all(|(index, (key, _))| *key == Key::Int(index as i64));
        if is_list && !entries.is_empty() {
            Ok(Value::Array(entries.into_iter().map(|(_, value)| value).collect()))
        } else {
            Ok(Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.into_string(), value))
                    .collect(),
            ))
        }
    }

    /// PHP key casting: integral strings, booleans and floats become integers.
    fn key(&self, value: Value) -> ParseResult<Key> {
        match value {
            Value::String(text) => match text.parse::<i64>() {
                Ok(n) if n.to_string() == text => Ok(Key::Int(n)),
                _ => Ok(Key::Str(text)),
            },
            Value::Number(number) => match number.as_i64() {
                Some(n) => Ok(Key::Int(n)),
                None => Ok(Key::Int(number.as_f64().unwrap_or_default() as i64)),
            },
            Value::Bool(flag) => Ok(Key::Int(i64::from(flag))),
            Value::Null => Ok(Key::Str(String::new())),
            Value::Array(_) | Value::Object(_) => Err(self.error("illegal offset type for array key")),
        }
    }

    fn single_quoted(&mut self) -> ParseResult<String> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\'') => return Ok(out),
                Some('\\') => match self.peek() {
                    Some(ch @ ('\'' | '\\')) => {
                        self.bump();
                        out.push(ch);
                    }
                    _ => out.push('\\'),
                },
                Some(ch) => out.push(ch),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn double_quoted(&mut self) -> ParseResult<String> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('$') if self.peek().is_some_and(|ch| ch == '{' || is_ident(ch)) => {
                    return Err(self.error("variable interpolation is not supported"));
                }
                Some('\\') => self.escape(&mut out)?,
                Some(ch) => out.push(ch),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> ParseResult<()> {
        let Some(ch) = self.bump() else {
            return Err(self.error("unterminated string"));
        };
        match ch {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'v' => out.push('\u{0B}'),
            'e' => out.push('\u{1B}'),
            'f' => out.push('\u{0C}'),
            '0' => out.push('\0'),
            '\\' | '$' | '"' => out.push(ch),
            'u' if self.peek() == Some('{') => {
                self.bump();
                let Some(end) = self.rest().find('}') else {
                    return Err(self.error("unterminated unicode escape"));
                };
                let hex = &self.rest()[..end];
                let decoded = u32::from_str_radix(hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error(format!("invalid unicode escape \"{hex}\"")))?;
                self.pos += end + 1;
                out.push(decoded);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn number(&mut self) -> ParseResult<Value> {
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };
        self.skip_trivia();

        let literal = number_literal(self.rest()).to_string();
        if literal.is_empty() {
            return Err(self.error("expected a number"));
        }
        let digits = literal.replace('_', "");
        let lower = digits.to_ascii_lowercase();

        let radix = |prefix: &str, radix: u32| -> Option<i64> {
            lower
                .strip_prefix(prefix)
                .and_then(|body| i64::from_str_radix(body, radix).ok())
        };
        let integer = if lower.starts_with("0x") {
            radix("0x", 16)
        } else if lower.starts_with("0b") {
            radix("0b", 2)
        } else if lower.starts_with("0o") {
            radix("0o", 8)
        } else if lower.len() > 1 && lower.starts_with('0') && lower.bytes().all(|b| b.is_ascii_digit()) {
            i64::from_str_radix(&lower[1..], 8).ok()
        } else {
            lower.parse::<i64>().ok()
        };

        let value = match integer {
            Some(n) => Value::from(if negative { -n } else { n }),
            None => {
                let float = lower
                    .parse::<f64>()
                    .map_err(|_| self.error(format!("invalid number \"{literal}\"")))?;
                let float = if negative { -float } else { float };
                Number::from_f64(float).map_or(Value::Null, Value::Number)
            }
        };

        self.pos += literal.len();
        Ok(value)
    }
}

/// Longest numeric literal at the start of `rest`. A sign is part of the
/// literal only directly after the exponent marker of a decimal number.
fn number_literal(rest: &str) -> &str {
    let bytes = rest.as_bytes();
    let prefixed = bytes.len() > 1
        && bytes[0] == b'0'
        && matches!(bytes[1], b'x' | b'X' | b'b' | b'B');

    let mut end = 0;
    while let Some(&byte) = bytes.get(end) {
        let signed_exponent = matches!(byte, b'+' | b'-')
            && !prefixed
            && end >= 2
            && matches!(bytes[end - 1], b'e' | b'E')
            && (bytes[end - 2].is_ascii_digit() || bytes[end - 2] == b'.');
        if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'_' || signed_exponent {
            end += 1;
        } else {
            break;
        }
    }
    &rest[..end]
}

fn is_ident(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
