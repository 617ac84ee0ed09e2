//! Child process execution.
//!
//! Spawns a command with decrypted variables merged into the parent
//! environment. The child runs in its own process group with inherited
//! stdio; SIGINT/SIGTERM received by the parent, or an elapsed timeout,
//! terminate the child. The decrypted map is dropped (and zeroed) as soon
//! as the child's environment has been populated.

use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::core::secret::SecretMap;
use crate::error::{Error, Result};

/// Options for one command execution.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub timeout: Option<Duration>,
    pub workdir: Option<PathBuf>,
    pub shell: bool,
}

/// How often the parent polls the child and the cancellation state.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a terminated child gets before it is killed outright.
const TERM_GRACE: Duration = Duration::from_secs(2);

/// Run `command` with `variables` injected into its environment.
///
/// Returns the child's exit code; a child terminated by a signal, a
/// timeout, or cancellation yields 1. The variable map is consumed and
/// destroyed before this function waits on the child.
pub fn execute(command: &[String], variables: SecretMap, opts: &RunOptions) -> Result<i32> {
    let mut cmd = build_command(command, opts)?;

    for (key, value) in variables.iter() {
        cmd.env(key, env_value(value.as_bytes()));
    }

    if let Some(dir) = &opts.workdir {
        cmd.current_dir(dir);
    }

    signals::install();

    let mut child = cmd
        .spawn()
        .map_err(|e| Error::operation("spawn", format!("command '{}'", command[0]), e))?;

    // The child holds its own copy of the environment now.
    drop(variables);

    let deadline = opts.timeout.map(|t| Instant::now() + t);
    debug!(pid = child.id(), "child process started");

    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| Error::operation("wait", "child process", e))?
        {
            let code = status.code().unwrap_or(1);
            debug!(code, "child process exited");
            return Ok(code);
        }

        if signals::interrupted() {
            debug!("interrupt received, terminating child");
            terminate(&mut child);
            return Ok(1);
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            debug!("timeout elapsed, terminating child");
            terminate(&mut child);
            return Ok(1);
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Build the child command for shell or direct execution.
fn build_command(command: &[String], opts: &RunOptions) -> Result<Command> {
    let mut cmd = if opts.shell {
        let joined = command.join(" ");
        debug!(command = %joined, "executing through shell");

        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(joined);
        cmd
    } else {
        let mut executable = command[0].clone();
        if executable.starts_with("./") || executable.starts_with("../") {
            if let Ok(abs) = std::path::absolute(&executable) {
                executable = abs.display().to_string();
            }
        }
        debug!(executable = %executable, "executing directly");

        let mut cmd = Command::new(executable);
        cmd.args(&command[1..]);
        cmd
    };

    // Own process group: terminal signals reach the child only through the
    // parent's forwarding below.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    Ok(cmd)
}

/// Terminate the child's process group, escalating after a grace period.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        let pgid = child.id() as i32;
        unsafe {
            libc::kill(-pgid, libc::SIGTERM);
        }

        let deadline = Instant::now() + TERM_GRACE;
        while Instant::now() < deadline {
            if matches!(child.try_wait(), Ok(Some(_))) {
                return;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }

    #[cfg(not(unix))]
    {
        let _ = child.kill();
    }

    let _ = child.wait();
}

#[cfg(unix)]
fn env_value(bytes: &[u8]) -> std::ffi::OsString {
    use std::os::unix::ffi::OsStrExt;
    std::ffi::OsStr::from_bytes(bytes).to_os_string()
}

#[cfg(not(unix))]
fn env_value(bytes: &[u8]) -> std::ffi::OsString {
    String::from_utf8_lossy(bytes).into_owned().into()
}

/// SIGINT/SIGTERM translate into a process-wide cancellation flag polled
/// by the execution loops.
#[cfg(unix)]
pub mod signals {
    use std::sync::atomic::{AtomicBool, Ordering};

    static INTERRUPTED: AtomicBool = AtomicBool::new(false);

    extern "C" fn handle(_sig: libc::c_int) {
        INTERRUPTED.store(true, Ordering::SeqCst);
    }

    /// Install handlers for SIGINT and SIGTERM. Idempotent.
    pub fn install() {
        let handler = handle as extern "C" fn(libc::c_int);
        unsafe {
            libc::signal(libc::SIGINT, handler as libc::sighandler_t);
            libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
        }
    }

    /// Whether a termination signal has arrived.
    pub fn interrupted() -> bool {
        INTERRUPTED.load(Ordering::SeqCst)
    }
}

#[cfg(not(unix))]
pub mod signals {
    pub fn install() {}

    pub fn interrupted() -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::secret::{SecretBuffer, SecretMap};

    fn map_of(pairs: &[(&str, &str)]) -> SecretMap {
        let mut map = SecretMap::new();
        for (k, v) in pairs {
            map.insert(*k, SecretBuffer::from_slice(v.as_bytes()));
        }
        map
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_propagation() {
        let command = vec!["sh".to_string(), "-c".to_string(), "exit 42".to_string()];
        let code = execute(&command, SecretMap::new(), &RunOptions::default()).unwrap();
        assert_eq!(code, 42);
    }

    #[cfg(unix)]
    #[test]
    fn test_env_injection() {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            "test \"$INJECTED\" = expected".to_string(),
        ];
        let vars = map_of(&[("INJECTED", "expected")]);
        let code = execute(&command, vars, &RunOptions::default()).unwrap();
        assert_eq!(code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_mode() {
        let command = vec!["exit 7".to_string()];
        let opts = RunOptions {
            shell: true,
            ..Default::default()
        };
        let code = execute(&command, SecretMap::new(), &opts).unwrap();
        assert_eq!(code, 7);
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_terminates_child() {
        let command = vec!["sleep".to_string(), "30".to_string()];
        let opts = RunOptions {
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        };

        let start = Instant::now();
        let code = execute(&command, SecretMap::new(), &opts).unwrap();

        assert_eq!(code, 1);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_workdir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let canonical = tmp.path().canonicalize().unwrap();

        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            format!("test \"$(pwd)\" = '{}'", canonical.display()),
        ];
        let opts = RunOptions {
            workdir: Some(canonical),
            ..Default::default()
        };
        let code = execute(&command, SecretMap::new(), &opts).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_spawn_error() {
        let command = vec!["kiln-definitely-missing-binary".to_string()];
        assert!(execute(&command, SecretMap::new(), &RunOptions::default()).is_err());
    }
}
