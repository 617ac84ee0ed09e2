//! Tests for `kiln init`.

mod support;
use support::{assert_failure, assert_success, stderr, Test};

#[test]
fn test_init_key_creates_keypair() {
    let t = Test::new();

    let output = t.init_key("kiln.key");
    assert_success(&output);

    assert!(t.path("kiln.key").exists());
    assert!(t.path("kiln.key.pub").exists());

    let private = std::fs::read_to_string(t.path("kiln.key")).unwrap();
    assert!(private.trim().starts_with("AGE-SECRET-KEY-"));

    let public = t.public_key("kiln.key");
    assert!(public.starts_with("age1"));
}

#[cfg(unix)]
#[test]
fn test_init_key_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let t = Test::new();
    assert_success(&t.init_key("kiln.key"));

    for name in ["kiln.key", "kiln.key.pub"] {
        let mode = std::fs::metadata(t.path(name))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600, "wrong mode for {}", name);
    }
}

#[test]
fn test_init_key_warns_when_unencrypted() {
    let t = Test::new();
    let output = t.init_key("kiln.key");
    assert_success(&output);
    assert!(stderr(&output).contains("not password protected"));
}

#[test]
fn test_init_key_refuses_overwrite_without_force() {
    let t = Test::new();
    assert_success(&t.init_key("kiln.key"));

    let output = t.init_key("kiln.key");
    assert_failure(&output);
    assert!(stderr(&output).contains("already exists"));

    let output = t
        .cmd()
        .args(["init", "key", "--path", "kiln.key", "--force"])
        .output()
        .unwrap();
    assert_success(&output);
}

#[test]
fn test_init_config_creates_toml() {
    let t = Test::new();
    assert_success(&t.init_key("kiln.key"));

    let public = t.public_key("kiln.key");
    let output = t.init_config(&[&format!("alice={}", public)]);
    assert_success(&output);

    let config = std::fs::read_to_string(t.path("kiln.toml")).unwrap();
    assert!(config.contains("alice"));
    assert!(config.contains(&public));
    assert!(config.contains(".kiln.env"));
    assert!(config.contains("\"*\""));
}

#[test]
fn test_init_config_accepts_key_file_path() {
    let t = Test::new();
    assert_success(&t.init_key("kiln.key"));

    // A path to the .pub file resolves to its contents.
    let output = t.init_config(&["alice=kiln.key.pub"]);
    assert_success(&output);

    let config = std::fs::read_to_string(t.path("kiln.toml")).unwrap();
    assert!(config.contains(&t.public_key("kiln.key")));
}

#[test]
fn test_init_config_requires_recipients() {
    let t = Test::new();
    let output = t.init_config(&[]);
    assert_failure(&output);
    assert!(stderr(&output).contains("recipient"));
}

#[test]
fn test_init_config_rejects_private_key_as_recipient() {
    let t = Test::new();
    assert_success(&t.init_key("kiln.key"));

    let private = std::fs::read_to_string(t.path("kiln.key"))
        .unwrap()
        .trim()
        .to_string();
    let output = t.init_config(&[&format!("alice={}", private)]);
    assert_failure(&output);
    assert!(stderr(&output).contains("private key"));
}

#[test]
fn test_init_config_refuses_overwrite_without_force() {
    let t = Test::bootstrapped("alice");

    let public = t.public_key("kiln.key");
    let output = t.init_config(&[&format!("alice={}", public)]);
    assert_failure(&output);
    assert!(stderr(&output).contains("already exists"));
}

#[test]
fn test_init_config_rejects_bad_spec() {
    let t = Test::new();
    let output = t.init_config(&["no-equals-sign"]);
    assert_failure(&output);
}
