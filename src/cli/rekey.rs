//! Rekey command.
//!
//! Adds recipients to the config and re-encrypts the target file for the
//! new recipient set. The ciphertext is rewritten before the config is
//! saved, so no observable state grants access the file cannot honour.

use std::path::Path;

use tracing::debug;

use crate::cli::output;
use crate::cli::runtime::Runtime;
use crate::core::keys::{self, RecipientSpec};
use crate::core::{fs, rekey, store, validation};
use crate::error::{Error, Result};

pub fn execute(rt: &Runtime, file: &str, add_recipient: &[String], force: bool) -> Result<()> {
    if !validation::is_valid_file_name(file) {
        return Err(Error::validation(
            "file name",
            "cannot contain '..' or '/' characters",
        ));
    }

    if add_recipient.is_empty() {
        return Err(Error::validation(
            "recipients",
            "no recipients specified (use --add-recipient name=key)",
        ));
    }

    let additions: Vec<RecipientSpec> = add_recipient
        .iter()
        .map(|spec| keys::parse_recipient_spec(spec))
        .collect::<Result<_>>()?;

    let mut cfg = rt.load_config()?;

    rekey::check_conflicts(&cfg, &additions)?;

    let file_path = cfg.get_env_file(file)?.to_string();

    rekey::register_recipients(&mut cfg, file, &additions);

    if fs::file_exists(Path::new(&file_path)) {
        if !force && !confirm_rekey(file, additions.len())? {
            output::status("rekey cancelled");
            return Ok(());
        }

        let identity = rt.load_identity(Some(&cfg))?;

        debug!(file, added = additions.len(), "re-encrypting for new recipient set");

        let variables = store::get_all(&identity, &cfg, file)?;
        store::set_all(&identity, &cfg, file, &variables)?;
        cfg.save(rt.config_path())?;

        output::success(&format!(
            "rekeyed '{}' ({} recipients added, {} total)",
            file,
            additions.len(),
            cfg.recipients.len()
        ));
    } else {
        cfg.save(rt.config_path())?;

        output::success(&format!(
            "rekeyed '{}' (file will be created with new recipients when variables are added)",
            file
        ));
    }

    Ok(())
}

fn confirm_rekey(file: &str, count: usize) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(format!(
            "Re-encrypt '{}' for {} new recipient(s)?",
            file, count
        ))
        .default(true)
        .interact()
        .map_err(|e| Error::operation("read", "confirmation", e))
}
