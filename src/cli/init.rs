//! Init commands.
//!
//! `init key` generates an age keypair on disk; `init config` writes a
//! fresh `kiln.toml` with the supplied recipients.

use std::path::{Path, PathBuf};

use tracing::debug;
use zeroize::Zeroizing;

use crate::cli::output;
use crate::core::config::Config;
use crate::core::{keys, validation};
use crate::error::{Error, Result};

/// Generate a new encryption key pair.
pub fn key(path: &str, encrypt: bool, force: bool) -> Result<()> {
    if path.is_empty() || !validation::is_valid_file_path(&expand_home(path).display().to_string())
    {
        return Err(Error::validation("key path", "invalid file path"));
    }

    let key_path = expand_home(path);

    if key_path.exists() && !force {
        return Err(Error::config(
            format!("key already exists at '{}'", key_path.display()),
            "use --force to override",
        ));
    }

    debug!(path = %key_path.display(), encrypt, "generating key pair");

    let (private_key, public_key) = keys::generate_keypair();

    let key_data: Zeroizing<Vec<u8>> = if encrypt {
        Zeroizing::new(keys::encrypt_private_key(private_key.as_bytes())?)
    } else {
        Zeroizing::new(private_key.as_bytes().to_vec())
    };

    keys::save_keys(&key_data, &public_key, &key_path)?;

    if !encrypt {
        output::warn("private key is not password protected");
    }

    output::success(&format!("private key generated at {}", key_path.display()));
    output::kv("public key:", &public_key);
    output::kv(
        "stored at:",
        format!("{}.pub", key_path.display()),
    );

    Ok(())
}

/// Create a new configuration file.
pub fn config(path: &Path, recipient_specs: &[String], force: bool) -> Result<()> {
    if !validation::is_valid_file_path(&path.display().to_string()) {
        return Err(Error::validation("config path", "invalid file path"));
    }

    if Config::exists(path) && !force {
        return Err(Error::config(
            format!("config already exists at '{}'", path.display()),
            "use --force to override",
        ));
    }

    let mut cfg = Config::new();
    for spec in recipient_specs {
        let spec = keys::parse_recipient_spec(spec)?;
        cfg.add_recipient(&spec.name, &spec.public_key);
    }

    if cfg.recipients.is_empty() {
        return Err(Error::validation(
            "recipients",
            "at least one recipient is required (use --recipients name=key)",
        ));
    }

    debug!(path = %path.display(), recipients = cfg.recipients.len(), "creating configuration");

    cfg.save(path)?;

    output::success(&format!("configuration initialized at {}", path.display()));
    for name in cfg.recipients.keys() {
        output::kv("recipient:", name);
    }

    Ok(())
}

/// Expand a leading `~/` against the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    PathBuf::from(path)
}
