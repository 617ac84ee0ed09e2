//! Edit command.
//!
//! Opens the decrypted file in an editor, then validates and re-encrypts
//! the result if it changed.

use crate::cli::output;
use crate::cli::runtime::Runtime;
use crate::core::{editor, env, store, validation};
use crate::error::{Error, Result};

/// Seed content for a file with no variables yet.
const EMPTY_SEED: &[u8] = b"# Environment Variables\n# Format: KEY=value\n";

pub fn execute(rt: &Runtime, file: &str, editor_flag: Option<&str>) -> Result<()> {
    if !validation::is_valid_file_name(file) {
        return Err(Error::validation(
            "file name",
            "cannot contain '..' or '/' characters",
        ));
    }

    let editor_cmd = determine_editor(editor_flag)?;

    let cfg = rt.load_config()?;
    let identity = rt.load_identity(Some(&cfg))?;

    let variables = store::get_all(&identity, &cfg, file)?;
    let seed = if variables.is_empty() {
        zeroize::Zeroizing::new(EMPTY_SEED.to_vec())
    } else {
        env::serialize(&variables)
    };
    drop(variables);

    let Some(modified) = editor::edit_session(&seed, &editor_cmd)? else {
        output::status("No changes detected");
        return Ok(());
    };

    let updated = env::parse(&modified)?;

    for name in updated.keys() {
        if !validation::is_valid_var_name(name) {
            return Err(Error::validation(
                "variable name",
                format!(
                    "'{}' must start with letter or underscore, followed by letters, numbers, or underscores",
                    name
                ),
            ));
        }
    }

    store::set_all(&identity, &cfg, file, &updated)?;

    output::success(&format!(
        "updated '{}' ({} variables)",
        file,
        updated.len()
    ));

    Ok(())
}

/// The `--editor` flag wins over `$EDITOR`; both missing is an error.
fn determine_editor(flag: Option<&str>) -> Result<String> {
    let editor = match flag {
        Some(editor) => editor.to_string(),
        None => std::env::var("EDITOR").unwrap_or_default(),
    };

    if editor.is_empty() {
        return Err(Error::config(
            "no editor specified",
            "set EDITOR environment variable or use --editor flag",
        ));
    }

    validation::is_valid_editor(&editor)?;

    Ok(editor)
}
