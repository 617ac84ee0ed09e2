//! Apply command.
//!
//! Substitutes decrypted variables into a template file and writes the
//! result to stdout or an output file (mode 0644).

use std::io::Write;
use std::path::Path;

use crate::cli::runtime::Runtime;
use crate::core::{store, template, validation};
use crate::error::{Error, Result};

#[allow(clippy::too_many_arguments)]
pub fn execute(
    rt: &Runtime,
    template_path: &Path,
    file: &str,
    output: Option<&Path>,
    strict: bool,
    left_delimiter: Option<&str>,
    right_delimiter: Option<&str>,
) -> Result<()> {
    validate(template_path, file, output, left_delimiter, right_delimiter)?;

    let delimiters = left_delimiter.zip(right_delimiter);

    let cfg = rt.load_config()?;
    let identity = rt.load_identity(Some(&cfg))?;

    let variables = store::get_all(&identity, &cfg, file)?;

    let content = std::fs::read(template_path)
        .map_err(|e| Error::file_access("read", &template_path.display().to_string(), e))?;

    let rendered = template::substitute(&content, &variables, delimiters, strict)?;

    match output {
        Some(path) => write_output(path, &rendered),
        None => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(&rendered)
                .and_then(|_| stdout.flush())
                .map_err(|e| Error::operation("write", "stdout", e))
        }
    }
}

fn validate(
    template_path: &Path,
    file: &str,
    output: Option<&Path>,
    left_delimiter: Option<&str>,
    right_delimiter: Option<&str>,
) -> Result<()> {
    if !validation::is_valid_file_name(file) {
        return Err(Error::validation(
            "file name",
            "cannot contain '..' or '/' characters",
        ));
    }

    if !validation::is_valid_file_path(&template_path.display().to_string()) {
        return Err(Error::validation("template path", "invalid file path"));
    }

    if let Some(path) = output {
        if !validation::is_valid_file_path(&path.display().to_string()) {
            return Err(Error::validation("output path", "invalid file path"));
        }
    }

    if left_delimiter.is_some() != right_delimiter.is_some() {
        return Err(Error::validation(
            "delimiters",
            "both left and right delimiters must be specified together",
        ));
    }

    Ok(())
}

/// Write rendered output with mode 0644.
fn write_output(path: &Path, rendered: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .mode(0o644)
            .open(path)
            .map_err(|e| Error::file_access("write", &path.display().to_string(), e))?;

        file.write_all(rendered)
            .map_err(|e| Error::file_access("write", &path.display().to_string(), e))?;

        // An existing file keeps its old mode through OpenOptions.
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::file_access("chmod", &path.display().to_string(), e))?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, rendered)
            .map_err(|e| Error::file_access("write", &path.display().to_string(), e))?;
    }

    Ok(())
}
