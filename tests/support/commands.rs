//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a kiln command with an isolated environment.
    ///
    /// HOME points at the temporary home so key discovery never sees the
    /// real user's keys; the kiln env overrides are cleared.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("kiln").expect("failed to find kiln binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env_remove("KILN_CONFIG_FILE");
        cmd.env_remove("KILN_PRIVATE_KEY_FILE");
        cmd.env_remove("EDITOR");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// A command pre-wired with the project config and key.
    pub fn project_cmd(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.args(["--config", "kiln.toml", "--key", "kiln.key"]);
        cmd
    }

    /// `kiln init key --path <name>`.
    pub fn init_key(&self, name: &str) -> Output {
        self.cmd()
            .args(["init", "key", "--path", name])
            .output()
            .expect("failed to run kiln init key")
    }

    /// `kiln init config --recipients <spec>...`.
    pub fn init_config(&self, recipients: &[&str]) -> Output {
        let mut cmd = self.cmd();
        cmd.args(["init", "config", "--path", "kiln.toml"]);
        for spec in recipients {
            cmd.args(["--recipients", spec]);
        }
        cmd.output().expect("failed to run kiln init config")
    }

    /// `kiln set KEY VALUE`.
    pub fn set(&self, key: &str, value: &str) -> Output {
        self.project_cmd()
            .args(["set", key, value])
            .output()
            .expect("failed to run kiln set")
    }

    /// `kiln set KEY VALUE --file <file>`.
    pub fn set_in(&self, file: &str, key: &str, value: &str) -> Output {
        self.project_cmd()
            .args(["set", key, value, "--file", file])
            .output()
            .expect("failed to run kiln set")
    }

    /// `kiln set --from-file <path>`.
    pub fn set_from_file(&self, path: &str) -> Output {
        self.project_cmd()
            .args(["set", "--from-file", path])
            .output()
            .expect("failed to run kiln set --from-file")
    }

    /// `kiln get KEY`.
    pub fn get(&self, key: &str) -> Output {
        self.project_cmd()
            .args(["get", key])
            .output()
            .expect("failed to run kiln get")
    }

    /// `kiln get KEY` with an alternate key file.
    pub fn get_with_key(&self, key: &str, key_file: &str) -> Output {
        self.cmd()
            .args(["--config", "kiln.toml", "--key", key_file, "get", key])
            .output()
            .expect("failed to run kiln get")
    }

    /// `kiln get KEY --file <file> --key <key_file>`.
    pub fn get_in_with_key(&self, file: &str, key: &str, key_file: &str) -> Output {
        self.cmd()
            .args([
                "--config", "kiln.toml", "--key", key_file, "get", key, "--file", file,
            ])
            .output()
            .expect("failed to run kiln get")
    }

    /// `kiln export --format <format>`.
    pub fn export(&self, format: &str) -> Output {
        self.project_cmd()
            .args(["export", "--format", format])
            .output()
            .expect("failed to run kiln export")
    }

    /// `kiln apply <template> [args...]`.
    pub fn apply(&self, template: &str, extra: &[&str]) -> Output {
        let mut cmd = self.project_cmd();
        cmd.args(["apply", template]);
        cmd.args(extra);
        cmd.output().expect("failed to run kiln apply")
    }

    /// `kiln run [extra...] -- <command...>`.
    pub fn run(&self, extra: &[&str], command: &[&str]) -> Output {
        let mut cmd = self.project_cmd();
        cmd.arg("run");
        cmd.args(extra);
        cmd.arg("--");
        cmd.args(command);
        cmd.output().expect("failed to run kiln run")
    }

    /// `kiln rekey --file <file> --add-recipient <spec> --force`.
    pub fn rekey(&self, file: &str, spec: &str) -> Output {
        self.project_cmd()
            .args(["rekey", "--file", file, "--add-recipient", spec, "--force"])
            .output()
            .expect("failed to run kiln rekey")
    }

    /// `kiln info [--verify]`.
    pub fn info(&self, verify: bool) -> Output {
        let mut cmd = self.project_cmd();
        cmd.arg("info");
        if verify {
            cmd.arg("--verify");
        }
        cmd.output().expect("failed to run kiln info")
    }

    /// `kiln edit --editor <editor>`.
    pub fn edit_with(&self, editor: &str) -> Output {
        self.project_cmd()
            .args(["edit", "--editor", editor])
            .output()
            .expect("failed to run kiln edit")
    }
}
