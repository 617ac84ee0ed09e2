//! Interactive edit sessions.
//!
//! Materialises decrypted content into a short-lived 0600 temp file
//! (preferring a memory-backed filesystem), launches the editor, and
//! detects modification by comparing mtimes. The temp file is removed on
//! every exit path, including signal-driven cancellation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::debug;
use zeroize::Zeroizing;

use crate::core::runner::signals;
use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run an editor over `content`.
///
/// Returns `None` when the editor exited without modifying the file, or
/// `Some(new_content)` when it did. The temp file is deleted before this
/// function returns, whatever the path taken.
pub fn edit_session(content: &[u8], editor: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
    let mut tmp = tempfile::Builder::new()
        .prefix("kiln-edit-")
        .suffix(".env")
        .tempfile_in(temp_dir())
        .map_err(|e| Error::operation("create", "temporary file", e))?;

    tmp.write_all(content)
        .map_err(|e| Error::operation("write", "temporary file", e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::operation("sync", "temporary file", e))?;

    let before = modified_time(tmp.path())?;

    debug!(editor, path = %tmp.path().display(), "launching editor");
    run_editor(editor, tmp.path())?;

    let after = modified_time(tmp.path())?;
    if after <= before {
        return Ok(None);
    }

    let modified = Zeroizing::new(
        std::fs::read(tmp.path())
            .map_err(|e| Error::operation("read", "temporary file", e))?,
    );

    Ok(Some(modified))
    // tmp drops here and unlinks the file.
}

/// Run the editor as a cancellable child with inherited stdio.
fn run_editor(editor: &str, path: &Path) -> Result<()> {
    signals::install();

    let mut child = Command::new(editor)
        .arg(path)
        .spawn()
        .map_err(|e| Error::operation("launch", format!("editor '{}'", editor), e))?;

    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| Error::operation("wait", "editor", e))?
        {
            if !status.success() {
                return Err(Error::config(
                    format!("editor exited with status {}", status.code().unwrap_or(1)),
                    "check the editor command",
                ));
            }
            return Ok(());
        }

        if signals::interrupted() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::operation(
                "run",
                "editor",
                std::io::Error::new(std::io::ErrorKind::Interrupted, "editor interrupted"),
            ));
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Preferred directory for edit temp files.
///
/// `/dev/shm` keeps plaintext off persistent storage when available.
fn temp_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let shm = Path::new("/dev/shm");
        if shm.is_dir() {
            return shm.to_path_buf();
        }
    }

    std::env::temp_dir()
}

fn modified_time(path: &Path) -> Result<std::time::SystemTime> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| Error::operation("stat", "temporary file", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_unmodified_returns_none() {
        // `true` exits immediately without touching the file.
        let result = edit_session(b"KEY=value\n", "true").unwrap();
        assert!(result.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_modification_detected() {
        // Use a tiny script-as-editor that rewrites the file. The mtime
        // comparison needs a tick between write and edit.
        let tmp = tempfile::TempDir::new().unwrap();
        let script = tmp.path().join("editor.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 1\necho 'NEW=1' > \"$1\"\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let result = edit_session(b"OLD=0\n", script.to_str().unwrap())
            .unwrap()
            .expect("modification should be detected");
        assert_eq!(result.as_slice(), b"NEW=1\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_editor_is_error() {
        assert!(edit_session(b"KEY=value\n", "false").is_err());
    }

    #[test]
    fn test_missing_editor_is_error() {
        assert!(edit_session(b"KEY=value\n", "kiln-no-such-editor").is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_temp_dir_prefers_shm() {
        if Path::new("/dev/shm").is_dir() {
            assert_eq!(temp_dir(), PathBuf::from("/dev/shm"));
        }
    }
}
