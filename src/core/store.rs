//! Store operations.
//!
//! Stateless façade tying config, key material, envelope, and the env
//! codec together: read, write, and verify encrypted environment files.
//! Writes are atomic; a missing ciphertext reads as the empty map.

use std::path::Path;

use tracing::debug;

use crate::core::config::Config;
use crate::core::envelope::{self, Envelope};
use crate::core::identity::Identity;
use crate::core::secret::{SecretBuffer, SecretMap};
use crate::core::{env, fs};
use crate::error::{Error, Result};

/// Decrypt and parse every variable in the named file.
///
/// A file that has never been written yields an empty map.
pub fn get_all(identity: &Identity, cfg: &Config, file_name: &str) -> Result<SecretMap> {
    let file_path = cfg.get_env_file(file_name)?.to_string();

    if !fs::file_exists(Path::new(&file_path)) {
        debug!(file = file_name, "environment file does not exist yet");
        return Ok(SecretMap::new());
    }

    let recipient_keys = cfg.resolve_file_access(file_name).map_err(|_| {
        Error::security(
            format!("access denied for '{}'", file_name),
            "check file permissions in kiln.toml",
        )
    })?;

    let recipients = envelope::parse_recipients(&recipient_keys).map_err(|_| {
        Error::config(
            format!("invalid recipients for '{}'", file_name),
            "verify public keys in configuration",
        )
    })?;

    let crypto = Envelope::new(recipients, vec![identity.as_age()]);

    let encrypted = std::fs::read(&file_path)
        .map_err(|e| Error::file_access("read", &file_path, e))?;

    let plaintext = crypto.decrypt(&encrypted).map_err(|_| {
        Error::security(
            format!("cannot decrypt '{}'", file_name),
            "ensure your key has access to this file",
        )
    })?;

    let variables = env::parse(&plaintext).map_err(|_| {
        Error::validation(
            "environment format",
            format!("file '{}' contains invalid format", file_name),
        )
    })?;

    debug!(file = file_name, count = variables.len(), "variables decrypted");

    Ok(variables)
}

/// Encrypt and atomically write the full variable map to the named file.
pub fn set_all(
    identity: &Identity,
    cfg: &Config,
    file_name: &str,
    variables: &SecretMap,
) -> Result<()> {
    let file_path = cfg.get_env_file(file_name)?.to_string();

    let recipient_keys = cfg.resolve_file_access(file_name).map_err(|e| {
        Error::security(
            format!("access error for '{}': {}", file_name, e),
            "check file permissions in kiln.toml",
        )
    })?;

    let recipients = envelope::parse_recipients(&recipient_keys).map_err(|_| {
        Error::config(
            format!("invalid recipients for '{}'", file_name),
            "verify public keys in configuration",
        )
    })?;

    let total: usize = variables.iter().map(|(_, v)| v.len()).sum();
    if total > crate::core::validation::MAX_MAP_SIZE {
        return Err(Error::validation(
            "environment file",
            "total size exceeds 10MB limit",
        ));
    }

    let crypto = Envelope::new(recipients, vec![identity.as_age()]);

    let content = env::serialize(variables);
    let encrypted = crypto
        .encrypt(&content)
        .map_err(|e| Error::operation("encrypt", format!("file '{}'", file_name), e))?;

    fs::write_atomic(Path::new(&file_path), &encrypted)?;
    debug!(file = file_name, count = variables.len(), "variables saved");

    Ok(())
}

/// Retrieve a single variable, copied into its own buffer.
pub fn get_one(
    identity: &Identity,
    cfg: &Config,
    file_name: &str,
    key: &str,
) -> Result<SecretBuffer> {
    let variables = get_all(identity, cfg, file_name)?;

    let value = variables.get(key).ok_or_else(|| Error::VariableNotFound {
        name: key.to_string(),
        file: file_name.to_string(),
    })?;

    Ok(value.duplicate())
}

/// Insert or update a single variable and write the file back.
pub fn set_one(
    identity: &Identity,
    cfg: &Config,
    file_name: &str,
    key: &str,
    value: &[u8],
) -> Result<()> {
    let mut variables = get_all(identity, cfg, file_name)?;
    variables.insert(key, SecretBuffer::from_slice(value));

    set_all(identity, cfg, file_name, &variables)
}

/// Verify the named file decrypts cleanly; the contents are discarded.
pub fn check(identity: &Identity, cfg: &Config, file_name: &str) -> Result<()> {
    get_all(identity, cfg, file_name).map(|_| ())
}
