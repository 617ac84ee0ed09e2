//! Filesystem helpers.
//!
//! Every persistent write in kiln goes through [`write_atomic`]: data lands
//! in a 0600 tempfile in the target directory, is synced, and is renamed
//! into place, so a crash never leaves a truncated target behind.

use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// Whether a file exists.
pub fn file_exists(path: &Path) -> bool {
    path.exists()
}

/// Atomically write `data` to `path` with mode 0600.
///
/// The containing directory is created (mode 0700) if missing.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    ensure_dir(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".kiln-write-")
        .tempfile_in(dir)
        .map_err(|e| Error::file_access("create temporary", &path.display().to_string(), e))?;

    // NamedTempFile is created 0600 on unix; enforce it anyway so the
    // guarantee does not depend on tempfile internals.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))
            .map_err(|e| Error::file_access("chmod", &path.display().to_string(), e))?;
    }

    tmp.write_all(data)
        .map_err(|e| Error::file_access("write", &path.display().to_string(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::file_access("sync", &path.display().to_string(), e))?;

    tmp.persist(path)
        .map_err(|e| Error::file_access("rename", &path.display().to_string(), e.error))?;

    Ok(())
}

/// Create a directory (and parents) with restrictive permissions.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(dir)
            .map_err(|e| Error::file_access("create directory", &dir.display().to_string(), e))?;
    }

    #[cfg(not(unix))]
    {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::file_access("create directory", &dir.display().to_string(), e))?;
    }

    Ok(())
}
