//! Input validation for kiln operations.
//!
//! Pure predicates over variable names, file names and paths, value bytes,
//! command argument lists, timeouts, editors, and working directories.
//! Every surface that ingests external input goes through these.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Maximum size of a single environment variable value (1 MiB).
pub const MAX_VALUE_SIZE: usize = 1_048_576;

/// Maximum total size of a decrypted environment map (10 MiB).
pub const MAX_MAP_SIZE: usize = 10 * 1_048_576;

/// Maximum length of a single command argument.
const MAX_ARG_LEN: usize = 4096;

/// Whether `name` is a valid environment variable name.
///
/// Names match `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `name` is a valid logical file name.
///
/// Logical names refer to entries in the config; rejecting `..` and `/`
/// keeps them from smuggling in path segments.
pub fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains("..") && !name.contains('/')
}

/// Whether `path` is a usable file path.
///
/// The absolute form must not contain a parent-directory component.
pub fn is_valid_file_path(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }

    let p = Path::new(path);
    let abs: PathBuf = if p.is_absolute() {
        p.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(dir) => dir.join(p),
            Err(_) => return false,
        }
    };

    !abs.components().any(|c| matches!(c, Component::ParentDir))
}

/// Whether `timeout` is within the accepted range (0, 24h].
pub fn is_valid_timeout(timeout: Duration) -> bool {
    timeout > Duration::ZERO && timeout <= Duration::from_secs(24 * 60 * 60)
}

/// Validate an environment variable value.
///
/// Values are capped at 1 MiB and may not contain NUL or C0 control bytes
/// other than tab, newline, and carriage return.
pub fn is_valid_env_value(value: &[u8]) -> Result<()> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(Error::validation("variable value", "value too large (max 1MB)"));
    }

    for (i, b) in value.iter().enumerate() {
        if *b == 0 {
            return Err(Error::validation(
                "variable value",
                format!("null byte at position {}", i),
            ));
        }

        if *b < 0x20 && *b != b'\t' && *b != b'\n' && *b != b'\r' {
            return Err(Error::validation(
                "variable value",
                format!("invalid control character at position {}", i),
            ));
        }
    }

    Ok(())
}

/// Drop control bytes that [`is_valid_env_value`] forbids.
pub fn sanitize_env_value(value: &[u8]) -> Vec<u8> {
    value
        .iter()
        .copied()
        .filter(|b| *b >= 0x20 || *b == b'\t' || *b == b'\n' || *b == b'\r')
        .collect()
}

/// Validate a command argument list.
pub fn is_valid_command(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Err(Error::validation("command", "no command specified"));
    }

    for (i, arg) in args.iter().enumerate() {
        if arg.len() > MAX_ARG_LEN {
            return Err(Error::validation(
                "command",
                format!("argument {} too long (max {} bytes)", i, MAX_ARG_LEN),
            ));
        }

        if arg.contains('\0') {
            return Err(Error::validation(
                "command",
                format!("argument {} contains null byte", i),
            ));
        }
    }

    Ok(())
}

/// Validate that `editor` names an executable reachable on PATH.
pub fn is_valid_editor(editor: &str) -> Result<()> {
    if editor.is_empty() {
        return Err(Error::validation("editor", "editor cannot be empty"));
    }

    if editor.contains("..") {
        return Err(Error::validation("editor", "editor path cannot contain '..'"));
    }

    which::which(editor).map_err(|_| {
        Error::validation("editor", format!("editor '{}' not found in PATH", editor))
    })?;

    Ok(())
}

/// Validate a working directory: valid path, exists, is a directory.
pub fn is_valid_working_directory(path: &str) -> Result<()> {
    if !is_valid_file_path(path) {
        return Err(Error::validation("working directory", "invalid directory path"));
    }

    let meta = std::fs::metadata(path)
        .map_err(|_| Error::validation("working directory", "directory does not exist"))?;

    if !meta.is_dir() {
        return Err(Error::validation("working directory", "path is not a directory"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_var_names() {
        assert!(is_valid_var_name("DATABASE_URL"));
        assert!(is_valid_var_name("API_KEY"));
        assert!(is_valid_var_name("SECRET_123"));
        assert!(is_valid_var_name("_PRIVATE"));
        assert!(is_valid_var_name("lower_case"));
        assert!(is_valid_var_name("A"));
    }

    #[test]
    fn test_invalid_var_names() {
        assert!(!is_valid_var_name(""));
        assert!(!is_valid_var_name("123_KEY"));
        assert!(!is_valid_var_name("API-KEY"));
        assert!(!is_valid_var_name("API.KEY"));
        assert!(!is_valid_var_name("API KEY"));
        assert!(!is_valid_var_name("API@KEY"));
    }

    #[test]
    fn test_file_names() {
        assert!(is_valid_file_name("default"));
        assert!(is_valid_file_name("staging"));
        assert!(!is_valid_file_name(""));
        assert!(!is_valid_file_name("../escape"));
        assert!(!is_valid_file_name("dir/file"));
    }

    #[test]
    fn test_file_paths() {
        assert!(is_valid_file_path("/tmp/kiln.env"));
        assert!(is_valid_file_path("relative/path.env"));
        assert!(!is_valid_file_path(""));
        assert!(!is_valid_file_path("../outside"));
        assert!(!is_valid_file_path("/tmp/../etc/passwd"));
    }

    #[test]
    fn test_timeouts() {
        assert!(is_valid_timeout(Duration::from_secs(1)));
        assert!(is_valid_timeout(Duration::from_secs(24 * 60 * 60)));
        assert!(!is_valid_timeout(Duration::ZERO));
        assert!(!is_valid_timeout(Duration::from_secs(24 * 60 * 60 + 1)));
    }

    #[test]
    fn test_env_values() {
        assert!(is_valid_env_value(b"plain value").is_ok());
        assert!(is_valid_env_value(b"tabs\tand\nnewlines\r").is_ok());
        assert!(is_valid_env_value(b"").is_ok());

        assert!(is_valid_env_value(b"nul\0byte").is_err());
        assert!(is_valid_env_value(&[0x01, b'x']).is_err());
        assert!(is_valid_env_value(&vec![b'a'; MAX_VALUE_SIZE + 1]).is_err());
    }

    #[test]
    fn test_sanitize_env_value() {
        let dirty = b"ok\x01\x02\ttab\x1b";
        assert_eq!(sanitize_env_value(dirty), b"ok\ttab");
    }

    #[test]
    fn test_commands() {
        assert!(is_valid_command(&["echo".to_string(), "hi".to_string()]).is_ok());
        assert!(is_valid_command(&[]).is_err());
        assert!(is_valid_command(&["bad\0arg".to_string()]).is_err());
        assert!(is_valid_command(&["x".repeat(MAX_ARG_LEN + 1)]).is_err());
    }

    #[test]
    fn test_editor_validation() {
        assert!(is_valid_editor("").is_err());
        assert!(is_valid_editor("../vim").is_err());
        assert!(is_valid_editor("definitely-not-an-editor-9f2d").is_err());
        // `sh` is available on any unix test machine.
        #[cfg(unix)]
        assert!(is_valid_editor("sh").is_ok());
    }

    #[test]
    fn test_working_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().to_str().unwrap().to_string();
        assert!(is_valid_working_directory(&dir).is_ok());

        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(is_valid_working_directory(file.to_str().unwrap()).is_err());

        assert!(is_valid_working_directory("/definitely/not/here").is_err());
    }
}
