//! Test support utilities for kiln integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod commands;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// Each test gets its own temporary project dir and home dir. No
/// process-global state is mutated — child processes use `.current_dir()`
/// so tests can safely run in parallel.
pub struct Test {
    /// Temporary directory for the test project
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");

        Self { dir, home }
    }

    /// Create a test environment with a generated key and a config listing
    /// `name` as the sole recipient.
    pub fn bootstrapped(name: &str) -> Self {
        let t = Self::new();

        let output = t.init_key("kiln.key");
        assert!(
            output.status.success(),
            "failed to init key: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let public_key = t.public_key("kiln.key");
        let output = t.init_config(&[&format!("{}={}", name, public_key)]);
        assert!(
            output.status.success(),
            "failed to init config: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        t
    }

    /// Create a bootstrapped environment with variables already set.
    pub fn with_vars(name: &str, vars: &[(&str, &str)]) -> Self {
        let t = Self::bootstrapped(name);
        for (key, value) in vars {
            let output = t.set(key, value);
            assert!(
                output.status.success(),
                "failed to set {}: {}",
                key,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        t
    }

    /// Absolute path of a file inside the project dir.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// The public key written next to a generated private key.
    pub fn public_key(&self, key_name: &str) -> String {
        let pub_path = self.path(&format!("{}.pub", key_name));
        std::fs::read_to_string(&pub_path)
            .unwrap_or_else(|e| panic!("failed to read {}: {}", pub_path.display(), e))
            .trim()
            .to_string()
    }

    /// Append raw TOML to the project config.
    pub fn append_config(&self, toml: &str) {
        use std::io::Write;

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(self.path("kiln.toml"))
            .expect("failed to open kiln.toml");
        writeln!(file, "{}", toml).expect("failed to append to kiln.toml");
    }
}

/// Stdout as a string.
pub fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Stderr as a string.
pub fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Assert the command succeeded, printing stderr on failure.
pub fn assert_success(output: &std::process::Output) {
    assert!(
        output.status.success(),
        "command failed: {}",
        stderr(output)
    );
}

/// Assert the command failed with exit code 1.
pub fn assert_failure(output: &std::process::Output) {
    assert!(!output.status.success(), "command unexpectedly succeeded");
    assert_eq!(output.status.code(), Some(1), "expected exit code 1");
}
