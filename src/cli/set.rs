//! Set command.
//!
//! Stores a single variable (value from the argument or a hidden prompt)
//! or merges a batch of variables from a JSON file.

use std::path::Path;

use tracing::debug;
use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::runtime::Runtime;
use crate::core::secret::SecretBuffer;
use crate::core::{store, validation};
use crate::error::{Error, Result};

/// Maximum number of entries accepted from a JSON file.
const MAX_JSON_ENTRIES: usize = 1000;

pub fn execute(
    rt: &Runtime,
    name: Option<&str>,
    value: Option<&str>,
    file: &str,
    from_file: Option<&Path>,
) -> Result<()> {
    validate(name, file, from_file)?;

    let cfg = rt.load_config()?;
    let identity = rt.load_identity(Some(&cfg))?;

    if let Some(path) = from_file {
        return set_from_file(&identity, &cfg, file, path);
    }

    let name = name.ok_or_else(|| {
        Error::validation("arguments", "must provide either variable name or --from-file")
    })?;

    set_single(&identity, &cfg, file, name, value)
}

fn validate(name: Option<&str>, file: &str, from_file: Option<&Path>) -> Result<()> {
    if from_file.is_some() && name.is_some() {
        return Err(Error::validation(
            "arguments",
            "cannot use both --from-file and variable name argument",
        ));
    }

    if from_file.is_none() && name.is_none() {
        return Err(Error::validation(
            "arguments",
            "must provide either variable name or --from-file",
        ));
    }

    if let Some(name) = name {
        if !validation::is_valid_var_name(name) {
            return Err(Error::validation(
                "variable name",
                "must start with letter or underscore, followed by letters, numbers, or underscores",
            ));
        }
    }

    if !validation::is_valid_file_name(file) {
        return Err(Error::validation(
            "file name",
            "cannot contain '..' or '/' characters",
        ));
    }

    if let Some(path) = from_file {
        let display = path.display().to_string();
        if !validation::is_valid_file_path(&display) {
            return Err(Error::validation("JSON file path", "invalid file path"));
        }

        if !path.exists() {
            return Err(Error::validation("JSON file", "file does not exist"));
        }
    }

    Ok(())
}

fn set_single(
    identity: &crate::core::identity::Identity,
    cfg: &crate::core::config::Config,
    file: &str,
    name: &str,
    value: Option<&str>,
) -> Result<()> {
    let value: Zeroizing<Vec<u8>> = match value {
        Some(v) if !v.is_empty() => Zeroizing::new(v.as_bytes().to_vec()),
        _ => read_value_hidden(name)?,
    };

    validation::is_valid_env_value(&value)?;
    let clean = Zeroizing::new(validation::sanitize_env_value(&value));

    store::set_one(identity, cfg, file, name, &clean)?;

    output::success(&format!("set {} in '{}'", name, file));

    Ok(())
}

fn set_from_file(
    identity: &crate::core::identity::Identity,
    cfg: &crate::core::config::Config,
    file: &str,
    path: &Path,
) -> Result<()> {
    debug!(json = %path.display(), "parsing JSON file");

    let incoming = parse_json_file(path)?;

    let mut variables = store::get_all(identity, cfg, file)?;

    let mut added = 0usize;
    let mut updated = 0usize;
    for (key, value) in incoming {
        if variables.contains_key(&key) {
            updated += 1;
        } else {
            added += 1;
        }
        variables.insert(key, value);
    }

    store::set_all(identity, cfg, file, &variables)?;

    output::success(&format!(
        "set variables in '{}' from {} ({} added, {} updated, {} total)",
        file,
        path.display(),
        added,
        updated,
        variables.len()
    ));

    Ok(())
}

/// Parse a JSON object of variables.
///
/// Values must be strings, numbers, booleans, or null: integral numbers
/// render without decimals, booleans as `true`/`false`, null as the empty
/// string. Arrays and objects are rejected.
fn parse_json_file(path: &Path) -> Result<Vec<(String, SecretBuffer)>> {
    let data = std::fs::read(path)
        .map_err(|e| Error::file_access("read", &path.display().to_string(), e))?;

    let parsed: serde_json::Value = serde_json::from_slice(&data).map_err(|e| {
        Error::validation(
            "JSON format",
            format!("invalid JSON in file '{}': {}", path.display(), e),
        )
    })?;

    let serde_json::Value::Object(object) = parsed else {
        return Err(Error::validation(
            "JSON format",
            "top-level value must be an object",
        ));
    };

    if object.is_empty() {
        return Err(Error::validation(
            "JSON content",
            "no valid environment variables found",
        ));
    }

    if object.len() > MAX_JSON_ENTRIES {
        return Err(Error::validation(
            "JSON content",
            format!("too many variables (max {})", MAX_JSON_ENTRIES),
        ));
    }

    let mut variables = Vec::with_capacity(object.len());

    for (key, value) in object {
        if !validation::is_valid_var_name(&key) {
            return Err(Error::validation(
                "variable name",
                format!(
                    "'{}' must start with letter or underscore, followed by letters, numbers, or underscores",
                    key
                ),
            ));
        }

        let text = coerce_json_value(&key, &value)?;

        validation::is_valid_env_value(text.as_bytes()).map_err(|e| {
            Error::validation("variable value", format!("invalid value for '{}': {}", key, e))
        })?;

        let clean = validation::sanitize_env_value(text.as_bytes());
        variables.push((key, SecretBuffer::new(clean)));
    }

    Ok(variables)
}

fn coerce_json_value(key: &str, value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Ok(u.to_string())
            } else {
                let f = n.as_f64().unwrap_or(0.0);
                if f.is_finite() && f.fract() == 0.0 {
                    Ok(format!("{:.0}", f))
                } else {
                    Ok(format!("{}", f))
                }
            }
        }
        other => Err(Error::validation(
            "variable value",
            format!("unsupported value type for '{}': {}", key, json_type_name(other)),
        )),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Prompt for a value with hidden input.
fn read_value_hidden(name: &str) -> Result<Zeroizing<Vec<u8>>> {
    let value = dialoguer::Password::new()
        .with_prompt(format!("Enter value for {}", name))
        .allow_empty_password(true)
        .interact()
        .map_err(|_| {
            Error::input(
                "stdin",
                "failed to read value",
                "ensure terminal supports hidden input",
            )
        })?;

    Ok(Zeroizing::new(value.into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_json_values() {
        use serde_json::json;

        assert_eq!(coerce_json_value("K", &json!("text")).unwrap(), "text");
        assert_eq!(coerce_json_value("K", &json!(true)).unwrap(), "true");
        assert_eq!(coerce_json_value("K", &json!(false)).unwrap(), "false");
        assert_eq!(coerce_json_value("K", &json!(null)).unwrap(), "");
        assert_eq!(coerce_json_value("K", &json!(8080)).unwrap(), "8080");
        assert_eq!(coerce_json_value("K", &json!(-3)).unwrap(), "-3");
        assert_eq!(coerce_json_value("K", &json!(10.0)).unwrap(), "10");
        assert_eq!(coerce_json_value("K", &json!(1.5)).unwrap(), "1.5");

        assert!(coerce_json_value("K", &json!([1, 2])).is_err());
        assert!(coerce_json_value("K", &json!({"a": 1})).is_err());
    }

    #[test]
    fn test_parse_json_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("vars.json");
        std::fs::write(&path, r#"{"PORT": 8080, "NAME": "svc", "FLAG": true}"#).unwrap();

        let vars = parse_json_file(&path).unwrap();
        assert_eq!(vars.len(), 3);

        let port = vars.iter().find(|(k, _)| k == "PORT").unwrap();
        assert_eq!(port.1.as_bytes(), b"8080");
    }

    #[test]
    fn test_parse_json_file_rejects_bad_names() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("vars.json");
        std::fs::write(&path, r#"{"9BAD": "x"}"#).unwrap();

        assert!(parse_json_file(&path).is_err());
    }

    #[test]
    fn test_parse_json_file_rejects_non_object() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("vars.json");
        std::fs::write(&path, r#"["a", "b"]"#).unwrap();

        assert!(parse_json_file(&path).is_err());
    }

    #[test]
    fn test_validate_argument_combinations() {
        assert!(validate(None, "default", None).is_err());
        assert!(validate(Some("OK"), "default", None).is_ok());
        assert!(validate(Some("9bad"), "default", None).is_err());
        assert!(validate(Some("OK"), "../bad", None).is_err());
    }
}
