//! Template substitution.
//!
//! Replaces variable references in a template with decrypted values. With
//! custom delimiters the single pattern is `left <name> right` (optional
//! whitespace inside); by default `${NAME}` is applied first, then `$NAME`.
//! Strict mode collects every missing name and fails with the de-duplicated
//! list; otherwise unknown references are left verbatim.

use regex::bytes::Regex;
use zeroize::Zeroizing;

use crate::core::secret::SecretMap;
use crate::error::{Error, Result};

const NAME_PATTERN: &str = "[A-Za-z_][A-Za-z0-9_]*";

/// Substitute variables into `content`.
///
/// The returned buffer and every intermediate pass buffer are zeroed on
/// drop, since substituted output carries secret values.
pub fn substitute(
    content: &[u8],
    variables: &SecretMap,
    delimiters: Option<(&str, &str)>,
    strict: bool,
) -> Result<Zeroizing<Vec<u8>>> {
    let patterns = build_patterns(delimiters)?;

    let mut missing: Vec<String> = Vec::new();
    let mut result = Zeroizing::new(content.to_vec());

    for pattern in &patterns {
        let pass = pattern
            .replace_all(result.as_slice(), |caps: &regex::bytes::Captures<'_>| {
                let name = String::from_utf8_lossy(&caps[1]).to_string();

                match variables.get(&name) {
                    Some(value) => value.as_bytes().to_vec(),
                    None => {
                        if strict {
                            missing.push(name);
                        }
                        caps[0].to_vec()
                    }
                }
            })
            .into_owned();

        result = Zeroizing::new(pass);
    }

    if !missing.is_empty() {
        let unique = dedup(missing);
        return Err(Error::validation(
            "missing variables",
            format!("variables not found: [{}]", unique.join(" ")),
        ));
    }

    Ok(result)
}

/// Compile the substitution patterns for the delimiter configuration.
fn build_patterns(delimiters: Option<(&str, &str)>) -> Result<Vec<Regex>> {
    match delimiters {
        Some((left, right)) => {
            if left.is_empty() || right.is_empty() {
                return Err(Error::validation(
                    "delimiters",
                    "both left and right delimiters must be specified together",
                ));
            }

            let pattern = format!(
                "{}\\s*({})\\s*{}",
                regex::escape(left),
                NAME_PATTERN,
                regex::escape(right)
            );
            let compiled = Regex::new(&pattern)
                .map_err(|e| Error::operation("compile", "template pattern", e))?;

            Ok(vec![compiled])
        }
        None => {
            let braces = Regex::new(&format!("\\$\\{{({})\\}}", NAME_PATTERN))
                .map_err(|e| Error::operation("compile", "template pattern", e))?;
            let simple = Regex::new(&format!("\\$({})", NAME_PATTERN))
                .map_err(|e| Error::operation("compile", "template pattern", e))?;

            Ok(vec![braces, simple])
        }
    }
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}
