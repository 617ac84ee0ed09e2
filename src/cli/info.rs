//! Info command.
//!
//! Shows the status of configured environment files: path, size,
//! modification time, and (with `--verify`) whether the caller's key can
//! decrypt them.

use chrono::{DateTime, Local};

use crate::cli::output;
use crate::cli::runtime::Runtime;
use crate::core::config::Config;
use crate::core::identity::Identity;
use crate::core::{store, validation};
use crate::error::{Error, Result};

pub fn execute(rt: &Runtime, file: Option<&str>, verify: bool) -> Result<()> {
    if let Some(name) = file {
        if !validation::is_valid_file_name(name) {
            return Err(Error::validation(
                "file name",
                "cannot contain '..' or '/' characters",
            ));
        }
    }

    let cfg = rt.load_config()?;

    let files: Vec<String> = match file {
        Some(name) => vec![name.to_string()],
        None => cfg.files.keys().cloned().collect(),
    };

    // The identity is loaded once and only when verification asks for it.
    let identity = if verify {
        match rt.load_identity(Some(&cfg)) {
            Ok(identity) => Some(identity),
            Err(_) => None,
        }
    } else {
        None
    };

    let mut failed = 0usize;

    for name in &files {
        if show_file_info(&cfg, name, verify, identity.as_ref()).is_err() {
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(Error::config(
            format!("failed to get info for {} file(s)", failed),
            "check kiln.toml file definitions",
        ));
    }

    Ok(())
}

fn show_file_info(
    cfg: &Config,
    name: &str,
    verify: bool,
    identity: Option<&Identity>,
) -> Result<()> {
    let path = cfg.get_env_file(name)?.to_string();

    let metadata = match std::fs::metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            output::data(&format!(
                "{} ({}): file not found (will be created on first use)",
                name, path
            ));
            return Ok(());
        }
        Err(e) => return Err(Error::file_access("stat", &path, e)),
    };

    let modified: DateTime<Local> = metadata
        .modified()
        .map_err(|e| Error::file_access("stat", &path, e))?
        .into();
    let size_kb = metadata.len() as f64 / 1024.0;

    let status = verification_status(cfg, name, verify, identity);

    output::data(&format!(
        "{} ({}): {:.2} KB, modified {}{}",
        name,
        path,
        size_kb,
        modified.format("%Y-%m-%d %H:%M:%S"),
        status
    ));

    Ok(())
}

fn verification_status(
    cfg: &Config,
    name: &str,
    verify: bool,
    identity: Option<&Identity>,
) -> &'static str {
    if !verify {
        return "";
    }

    let Some(identity) = identity else {
        return " (cannot load key for verification)";
    };

    if store::check(identity, cfg, name).is_ok() {
        " (can decrypt)"
    } else {
        " (cannot decrypt)"
    }
}
