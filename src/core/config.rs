//! Configuration file management.
//!
//! Handles reading, writing, and validating `kiln.toml`: named recipients,
//! optional groups, and the mapping from logical file names to encrypted
//! environment files with their access lists.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::fs;
use crate::error::{Error, Result};

/// Default name for kiln configuration files.
pub const DEFAULT_CONFIG_FILE: &str = "kiln.toml";

/// Default name for encrypted environment files.
pub const DEFAULT_ENV_FILE: &str = ".kiln.env";

/// The kiln configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Map of recipient names to their public keys (age or SSH).
    #[serde(default)]
    pub recipients: BTreeMap<String, String>,

    /// Named flat groups of recipient names.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,

    /// Logical file name to environment file mapping.
    #[serde(default)]
    pub files: BTreeMap<String, FileEntry>,
}

/// Configuration for one environment file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    /// Path to the ciphertext, stored verbatim and resolved relative to the
    /// config file's directory on load.
    pub filename: String,

    /// Access tokens: recipient names, group names, or `*`.
    pub access: Vec<String>,
}

impl Config {
    /// New configuration with a single `default` file open to everyone.
    pub fn new() -> Self {
        let mut files = BTreeMap::new();
        files.insert(
            "default".to_string(),
            FileEntry {
                filename: DEFAULT_ENV_FILE.to_string(),
                access: vec!["*".to_string()],
            },
        );

        Self {
            recipients: BTreeMap::new(),
            groups: BTreeMap::new(),
            files,
        }
    }

    /// Load and deserialise a configuration file.
    ///
    /// Relative `filename` entries are resolved against the directory
    /// containing `path`. A config without recipients is rejected.
    pub fn load(path: &Path) -> Result<Self> {
        let abs = std::path::absolute(path)
            .map_err(|e| Error::file_access("resolve", &path.display().to_string(), e))?;

        let contents = std::fs::read_to_string(&abs)
            .map_err(|e| Error::file_access("read", &abs.display().to_string(), e))?;

        let mut config: Self = toml::from_str(&contents)
            .map_err(|e| Error::operation("parse", "configuration", e))?;

        if config.recipients.is_empty() {
            return Err(Error::config(
                "no recipients in configuration",
                "add at least one recipient to kiln.toml",
            ));
        }

        let config_dir = abs.parent().unwrap_or(Path::new("."));
        for entry in config.files.values_mut() {
            let file_path = Path::new(&entry.filename);
            if !file_path.is_absolute() {
                entry.filename = config_dir.join(file_path).display().to_string();
            }
        }

        Ok(config)
    }

    /// Write the configuration to `path` with mode 0600.
    ///
    /// The containing directory is created 0700 if missing; the write is
    /// atomic (tempfile plus rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::operation("serialize", "configuration", e))?;

        fs::write_atomic(path, contents.as_bytes())
    }

    /// Check structural invariants.
    ///
    /// At least one recipient; every file entry has a non-empty filename
    /// and access list; access tokens and group members refer to declared
    /// names; group names do not collide with recipient names.
    pub fn validate(&self) -> Result<()> {
        if self.recipients.is_empty() {
            return Err(Error::config(
                "no recipients configured",
                "add at least one recipient to kiln.toml",
            ));
        }

        for (name, members) in &self.groups {
            if self.recipients.contains_key(name) {
                return Err(Error::config(
                    format!("group '{}' collides with a recipient name", name),
                    "rename the group or the recipient",
                ));
            }

            for member in members {
                if !self.recipients.contains_key(member) {
                    return Err(Error::config(
                        format!("group '{}' references unknown recipient '{}'", name, member),
                        "declare the recipient or remove it from the group",
                    ));
                }
            }
        }

        for (name, entry) in &self.files {
            if entry.filename.trim().is_empty() {
                return Err(Error::config(
                    format!("file path for '{}' is empty", name),
                    "set a filename in kiln.toml",
                ));
            }

            if entry.access.is_empty() {
                return Err(Error::config(
                    format!("no access control defined for file '{}'", name),
                    "add recipients, groups, or '*' to the access list",
                ));
            }

            for token in &entry.access {
                if token != "*"
                    && !self.recipients.contains_key(token)
                    && !self.groups.contains_key(token)
                {
                    return Err(Error::config(
                        format!("file '{}' grants access to unknown name '{}'", name, token),
                        "declare the recipient or group in kiln.toml",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Insert or overwrite a recipient.
    pub fn add_recipient(&mut self, name: &str, public_key: &str) {
        self.recipients
            .insert(name.to_string(), public_key.to_string());
    }

    /// Remove a recipient; returns whether it existed.
    pub fn remove_recipient(&mut self, name: &str) -> bool {
        self.recipients.remove(name).is_some()
    }

    /// Path for the named environment file. Empty means `default`.
    pub fn get_env_file(&self, name: &str) -> Result<&str> {
        let name = if name.is_empty() { "default" } else { name };

        if let Some(entry) = self.files.get(name) {
            return Ok(&entry.filename);
        }

        let available: Vec<&str> = self.files.keys().map(String::as_str).collect();
        Err(Error::config(
            format!("file '{}' not found in configuration", name),
            format!("available files: {}", available.join(", ")),
        ))
    }

    /// Resolve the set of public keys with access to the named file.
    ///
    /// Walks the access list in order: `*` unions in every recipient and
    /// ends the walk; a group token unions in its declared members; a
    /// recipient token unions in its key. Dangling tokens are skipped here
    /// — [`Config::validate`] catches them at load time.
    pub fn resolve_file_access(&self, name: &str) -> Result<Vec<String>> {
        let entry = self.files.get(name).ok_or_else(|| {
            Error::config(
                format!("file '{}' not found in configuration", name),
                "check kiln.toml file definitions",
            )
        })?;

        let mut keys = BTreeSet::new();

        for token in &entry.access {
            if token == "*" {
                keys.extend(self.recipients.values().cloned());
                break;
            }

            if let Some(members) = self.groups.get(token) {
                for member in members {
                    if let Some(key) = self.recipients.get(member) {
                        keys.insert(key.clone());
                    }
                }
                continue;
            }

            if let Some(key) = self.recipients.get(token) {
                keys.insert(key.clone());
            }
        }

        if keys.is_empty() {
            return Err(Error::config(
                format!("no valid recipients found for file '{}'", name),
                "check the access list in kiln.toml",
            ));
        }

        Ok(keys.into_iter().collect())
    }

    /// Whether a config file exists at `path` (empty means the default).
    pub fn exists(path: &Path) -> bool {
        let path = if path.as_os_str().is_empty() {
            Path::new(DEFAULT_CONFIG_FILE)
        } else {
            path
        };
        path.exists()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
