//! Get command.
//!
//! Prints a single decrypted variable to stdout, raw or as JSON.

use crate::cli::output;
use crate::cli::runtime::Runtime;
use crate::cli::GetFormat;
use crate::core::{store, validation};
use crate::error::{Error, Result};

pub fn execute(rt: &Runtime, name: &str, file: &str, format: GetFormat) -> Result<()> {
    if !validation::is_valid_var_name(name) {
        return Err(Error::validation(
            "variable name",
            "must start with letter or underscore, followed by letters, numbers, or underscores",
        ));
    }

    if !validation::is_valid_file_name(file) {
        return Err(Error::validation(
            "file name",
            "cannot contain '..' or '/' characters",
        ));
    }

    let cfg = rt.load_config()?;
    let identity = rt.load_identity(Some(&cfg))?;

    let value = store::get_one(&identity, &cfg, file, name)?;

    match format {
        GetFormat::Value => {
            // Raw value, no trailing newline added beyond print semantics.
            print!("{}", value.as_str());
            use std::io::Write;
            let _ = std::io::stdout().flush();
        }
        GetFormat::Json => {
            let mut object = serde_json::Map::new();
            object.insert(
                name.to_string(),
                serde_json::Value::String(value.as_str().into_owned()),
            );
            output::data(&serde_json::to_string(&serde_json::Value::Object(object)).map_err(
                |e| Error::operation("serialize", "JSON output", e),
            )?);
        }
    }

    Ok(())
}
