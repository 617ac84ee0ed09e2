//! Env text codec.
//!
//! Parses and serialises the plaintext form of an environment file: one
//! `KEY=value` pair per line, `#` comments, single- or double-quoted values
//! with shell-style escapes. Parsed values land in a [`SecretMap`] so they
//! are zeroed when the map is dropped.

use zeroize::Zeroizing;

use crate::core::secret::{SecretBuffer, SecretMap};
use crate::error::{Error, Result};

/// Parse environment file content.
///
/// Empty input yields an empty map. A non-empty, non-comment line without
/// `=` is a parse error reported with its 1-based line number.
pub fn parse(data: &[u8]) -> Result<SecretMap> {
    let text = std::str::from_utf8(data)
        .map_err(|_| Error::validation("environment format", "content is not valid UTF-8"))?;

    let mut vars = SecretMap::new();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(Error::validation(
                "environment format",
                format!("line {}: missing '=' separator", i + 1),
            ));
        };

        let key = key.trim().to_string();
        let value = parse_value(value.trim());
        vars.insert(key, SecretBuffer::new(value.into_bytes()));
    }

    Ok(vars)
}

/// Serialise a variable map to canonical environment file form.
///
/// Values containing whitespace, quotes, backslashes, `#`, or `=` are
/// double-quoted and escaped so the output round-trips through [`parse`].
/// An empty map serialises to empty output.
pub fn serialize(vars: &SecretMap) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(String::new());

    for (key, value) in vars.iter() {
        let value = value.as_str();
        if needs_quotes(&value) {
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_value(&value));
            out.push_str("\"\n");
        } else {
            out.push_str(key);
            out.push('=');
            out.push_str(&value);
            out.push('\n');
        }
    }

    Zeroizing::new(std::mem::take(&mut *out).into_bytes())
}

fn parse_value(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return unescape_double_quoted(&raw[1..raw.len() - 1]);
    }

    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }

    raw.to_string()
}

fn unescape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.chars().any(|ch| ch.is_whitespace())
        || value.contains('#')
        || value.contains('=')
        || value.contains('"')
        || value.contains('\'')
        || value.contains('\\')
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(ch),
        }
    }

    escaped
}
