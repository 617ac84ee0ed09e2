//! Shared command state.
//!
//! Carries the global `--config`/`--key` paths and loads the configuration
//! and identity when a command needs them. Key discovery only runs when no
//! explicit key path was given.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::config::Config;
use crate::core::identity::Identity;
use crate::core::keys;
use crate::error::{Error, Result};

/// Global options threaded through every command.
pub struct Runtime {
    config_path: PathBuf,
    key_path: Option<PathBuf>,
    pub verbose: bool,
}

impl Runtime {
    pub fn new(config_path: PathBuf, key_path: Option<PathBuf>, verbose: bool) -> Self {
        Self {
            config_path,
            key_path,
            verbose,
        }
    }

    /// The configuration file path.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load and validate the configuration.
    pub fn load_config(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Err(Error::config(
                format!("configuration file '{}' not found", self.config_path.display()),
                "use 'kiln init config' to create it",
            ));
        }

        let cfg = Config::load(&self.config_path)?;
        cfg.validate()?;

        debug!(
            config = %self.config_path.display(),
            recipients = cfg.recipients.len(),
            "configuration loaded"
        );

        Ok(cfg)
    }

    /// Load the identity from the explicit key path or via discovery.
    ///
    /// Discovery prefers a key matching one of the config's recipients
    /// when a config is available.
    pub fn load_identity(&self, cfg: Option<&Config>) -> Result<Identity> {
        let key_path = match &self.key_path {
            Some(path) => path.clone(),
            None => self.discover_key(cfg)?,
        };

        let identity = Identity::from_key_file(&key_path).map_err(|e| {
            Error::config(
                format!("cannot load identity from '{}': {}", key_path.display(), e),
                "check the key file or pass --key",
            )
        })?;

        debug!(
            key = %key_path.display(),
            kind = identity.kind().as_str(),
            "identity loaded"
        );

        Ok(identity)
    }

    fn discover_key(&self, cfg: Option<&Config>) -> Result<PathBuf> {
        match cfg {
            Some(cfg) => keys::find_private_key_for_config(cfg),
            None => keys::default_key_path().ok_or_else(|| {
                Error::config(
                    "no private key found",
                    "run 'kiln init key' or specify one with --key",
                )
            }),
        }
    }
}
