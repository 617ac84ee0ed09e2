//! Export command.
//!
//! Writes every decrypted variable to stdout as shell `export` lines,
//! JSON, or YAML, sorted by key.

use std::collections::BTreeMap;

use crate::cli::runtime::Runtime;
use crate::cli::ExportFormat;
use crate::core::secret::SecretMap;
use crate::core::{store, validation};
use crate::error::{Error, Result};

pub fn execute(rt: &Runtime, file: &str, format: ExportFormat) -> Result<()> {
    if !validation::is_valid_file_name(file) {
        return Err(Error::validation(
            "file name",
            "cannot contain '..' or '/' characters",
        ));
    }

    let cfg = rt.load_config()?;
    let identity = rt.load_identity(Some(&cfg))?;

    let variables = store::get_all(&identity, &cfg, file)?;

    match format {
        ExportFormat::Shell => export_shell(&variables),
        ExportFormat::Json => export_json(&variables),
        ExportFormat::Yaml => export_yaml(&variables),
    }
}

fn export_shell(variables: &SecretMap) -> Result<()> {
    use std::io::Write;

    let mut out = String::new();
    for (key, value) in variables.iter() {
        out.push_str("export ");
        out.push_str(key);
        out.push_str("='");
        out.push_str(&value.as_str().replace('\'', "'\"'\"'"));
        out.push_str("'\n");
    }

    print!("{}", out);
    let _ = std::io::stdout().flush();

    Ok(())
}

fn export_json(variables: &SecretMap) -> Result<()> {
    let map: BTreeMap<&str, String> = variables
        .iter()
        .map(|(k, v)| (k, v.as_str().into_owned()))
        .collect();

    let rendered = serde_json::to_string_pretty(&map)
        .map_err(|e| Error::operation("serialize", "JSON output", e))?;
    println!("{}", rendered);

    Ok(())
}

fn export_yaml(variables: &SecretMap) -> Result<()> {
    let map: BTreeMap<&str, String> = variables
        .iter()
        .map(|(k, v)| (k, v.as_str().into_owned()))
        .collect();

    let rendered = serde_yaml::to_string(&map)
        .map_err(|e| Error::operation("serialize", "YAML output", e))?;
    print!("{}", rendered);
    use std::io::Write;
    let _ = std::io::stdout().flush();

    Ok(())
}
