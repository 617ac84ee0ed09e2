//! Run command.
//!
//! Executes a command with decrypted variables injected as environment
//! variables. The parent exits with the child's exit code; framework
//! failures (spawn errors, timeouts, signals) exit 1.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::output;
use crate::cli::runtime::Runtime;
use crate::core::runner::{self, RunOptions};
use crate::core::{store, validation};
use crate::error::{Error, Result};

pub fn execute(
    rt: &Runtime,
    command: &[String],
    file: &str,
    dry_run: bool,
    timeout: Option<&str>,
    workdir: Option<&str>,
    shell: bool,
) -> Result<()> {
    validation::is_valid_command(command)?;

    if !validation::is_valid_file_name(file) {
        return Err(Error::validation(
            "file name",
            "cannot contain '..' or '/' characters",
        ));
    }

    let timeout = match timeout {
        Some(raw) => {
            let duration = parse_duration(raw)?;
            if !validation::is_valid_timeout(duration) {
                return Err(Error::validation(
                    "timeout",
                    "must be between 1 second and 24 hours",
                ));
            }
            Some(duration)
        }
        None => None,
    };

    if let Some(dir) = workdir {
        validation::is_valid_working_directory(dir)?;
    }

    let cfg = rt.load_config()?;
    let identity = rt.load_identity(Some(&cfg))?;

    let variables = store::get_all(&identity, &cfg, file)?;

    if dry_run {
        output::status(&format!("would execute: {}", command.join(" ")));
        output::status(&format!("environment file: {}", file));
        output::status(&format!("variables: {}", variables.len()));
        for (key, value) in variables.iter() {
            output::data(&format!("  {}={}", key, value.as_str()));
        }
        return Ok(());
    }

    let opts = RunOptions {
        timeout,
        workdir: workdir.map(PathBuf::from),
        shell,
    };

    // The variable map is consumed and zeroed inside the runner before the
    // exit code comes back; the identity is dropped here for the same
    // reason, since process::exit runs no destructors.
    let code = runner::execute(command, variables, &opts)?;

    drop(identity);
    drop(cfg);

    std::process::exit(code);
}

/// Parse a duration like `90s`, `10m`, `2h`, `500ms`, or a bare number of
/// seconds.
fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();

    let (digits, unit) = match raw.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(pos) => raw.split_at(pos),
        None => (raw, "s"),
    };

    let value: f64 = digits
        .parse()
        .map_err(|_| Error::validation("timeout", format!("invalid duration '{}'", raw)))?;

    let duration = match unit {
        "ms" => Duration::from_secs_f64(value / 1000.0),
        "s" => Duration::from_secs_f64(value),
        "m" => Duration::from_secs_f64(value * 60.0),
        "h" => Duration::from_secs_f64(value * 3600.0),
        _ => {
            return Err(Error::validation(
                "timeout",
                format!("invalid duration unit in '{}' (use ms, s, m, or h)", raw),
            ));
        }
    };

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("15").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("s").is_err());
    }
}
