//! Key generation and storage.
//!
//! Generates age keypairs, loads private keys (including passphrase
//! protected ones), saves key files with restrictive permissions, and
//! discovers a usable private key for a given configuration.

use std::path::{Path, PathBuf};

use age::secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::config::Config;
use crate::core::envelope::{self, validate_public_key};
use crate::core::fs;
use crate::error::{Error, Result};

/// Environment variable overriding private key discovery.
pub const PRIVATE_KEY_ENV: &str = "KILN_PRIVATE_KEY_FILE";

/// Marker present in any age-encrypted blob, including protected key files.
const AGE_HEADER: &str = "age-encryption.org/v1";

/// A recipient specification supplied as `name=key-or-path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientSpec {
    pub name: String,
    pub public_key: String,
}

/// Generate a new age keypair.
///
/// Returns the private key string (zeroed on drop) and the public key.
pub fn generate_keypair() -> (Zeroizing<String>, String) {
    let identity = age::x25519::Identity::generate();
    let public_key = identity.to_public().to_string();
    let secret = identity.to_string();

    (
        Zeroizing::new(secret.expose_secret().to_string()),
        public_key,
    )
}

/// Save a private key (0600) and its sibling `.pub` file (also 0600).
pub fn save_keys(private_key: &[u8], public_key: &str, path: &Path) -> Result<()> {
    let mut data = Zeroizing::new(Vec::with_capacity(private_key.len() + 1));
    data.extend_from_slice(private_key);
    data.push(b'\n');

    fs::write_atomic(path, &data)?;

    if !public_key.is_empty() {
        let pub_path = sibling_pub_path(path);
        fs::write_atomic(&pub_path, format!("{}\n", public_key).as_bytes())?;
    }

    Ok(())
}

/// Load a private key from `path`.
///
/// A passphrase-protected age key is decrypted in place against an
/// interactive prompt; the returned buffer always holds usable key
/// material and is zeroed on drop.
pub fn load_private_key(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    let raw = Zeroizing::new(
        std::fs::read(path)
            .map_err(|e| Error::file_access("read private key", &path.display().to_string(), e))?,
    );

    let trimmed = trim_bytes(&raw);
    if trimmed.is_empty() {
        return Err(Error::validation("private key", "private key file is empty"));
    }

    if contains_bytes(trimmed, AGE_HEADER.as_bytes()) {
        eprintln!("Private key is passphrase-protected");
        return decrypt_private_key(trimmed);
    }

    Ok(Zeroizing::new(trimmed.to_vec()))
}

/// Encrypt a private key under a passphrase (age scrypt recipient).
pub fn encrypt_private_key(private_key: &[u8]) -> Result<Vec<u8>> {
    let passphrase = prompt_new_passphrase()?;
    let recipient = age::scrypt::Recipient::new(passphrase);

    let encryptor =
        age::Encryptor::with_recipients(std::iter::once(&recipient as &dyn age::Recipient))
            .map_err(|e| Error::operation("encrypt", "private key", e))?;

    let mut encrypted = Vec::new();
    let mut writer = encryptor
        .wrap_output(&mut encrypted)
        .map_err(|e| Error::operation("encrypt", "private key", e))?;

    use std::io::Write;
    writer
        .write_all(private_key)
        .map_err(|e| Error::operation("encrypt", "private key", e))?;
    writer
        .finish()
        .map_err(|e| Error::operation("encrypt", "private key", e))?;

    Ok(encrypted)
}

/// Decrypt a passphrase-protected age private key.
fn decrypt_private_key(encrypted: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let passphrase = prompt_passphrase("Enter passphrase")?;
    let identity = age::scrypt::Identity::new(passphrase);

    let decryptor = age::Decryptor::new(encrypted)
        .map_err(|e| Error::operation("decrypt", "private key", e))?;

    let mut reader = decryptor
        .decrypt(std::iter::once(&identity as &dyn age::Identity))
        .map_err(|_| {
            Error::security(
                "cannot decrypt private key",
                "check the passphrase and try again",
            )
        })?;

    use std::io::Read;
    let mut decrypted = Zeroizing::new(Vec::new());
    reader
        .read_to_end(&mut decrypted)
        .map_err(|e| Error::operation("decrypt", "private key", e))?;

    Ok(decrypted)
}

/// Resolve a public key from a literal string or a file path.
///
/// A file may hold a public key or an (optionally passphrase-protected)
/// age private key, in which case the derived public key is returned.
pub fn load_public_key(input: &str) -> Result<String> {
    if validate_public_key(input).is_ok() {
        return Ok(input.trim().to_string());
    }

    let path = Path::new(input);
    let data = Zeroizing::new(
        std::fs::read(path)
            .map_err(|e| Error::file_access("read", input, e))?,
    );

    let content = std::str::from_utf8(trim_bytes(&data))
        .map_err(|_| Error::input(input, "file is not valid UTF-8", "check the key file"))?;

    if validate_public_key(content).is_ok() {
        return Ok(content.to_string());
    }

    if !envelope::is_private_key(content) {
        return Err(Error::input(
            input,
            "file does not contain a valid age key",
            "pass a public key or a key file path",
        ));
    }

    derive_public_key(content)
}

/// Derive the public key from age private key content, prompting for a
/// passphrase when the content is protected.
pub fn derive_public_key(content: &str) -> Result<String> {
    if content.contains(AGE_HEADER) {
        eprintln!("Private key is passphrase-protected");
        let decrypted = decrypt_private_key(content.as_bytes())?;
        let text = std::str::from_utf8(&decrypted).map_err(|_| {
            Error::validation("private key", "decrypted key is not valid UTF-8")
        })?;
        return derive_from_unencrypted(text.trim());
    }

    derive_from_unencrypted(content.trim())
}

fn derive_from_unencrypted(content: &str) -> Result<String> {
    let identity: age::x25519::Identity = content
        .parse()
        .map_err(|e: &str| Error::validation("private key", format!("invalid format: {}", e)))?;

    Ok(identity.to_public().to_string())
}

/// Parse a `name=key-or-path` recipient specification.
pub fn parse_recipient_spec(spec: &str) -> Result<RecipientSpec> {
    let Some((name, key_or_path)) = spec.split_once('=') else {
        return Err(Error::input(
            spec,
            "invalid format",
            "use 'name=public-key'",
        ));
    };

    let name = name.trim();
    let key_or_path = key_or_path.trim();

    if name.is_empty() {
        return Err(Error::input(spec, "recipient name cannot be empty", "use 'name=public-key'"));
    }

    if envelope::is_private_key(key_or_path) {
        return Err(Error::security(
            format!("recipient '{}': private key provided instead of public key", name),
            "use the corresponding public key",
        ));
    }

    let public_key = load_public_key(key_or_path)?;

    Ok(RecipientSpec {
        name: name.to_string(),
        public_key,
    })
}

/// Potential private key locations in discovery order.
pub fn private_key_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(env_path) = std::env::var(PRIVATE_KEY_ENV) {
        if !env_path.is_empty() {
            candidates.push(PathBuf::from(env_path));
        }
    }

    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".kiln").join("kiln.key"));
        candidates.push(home.join(".ssh").join("id_ed25519"));
        candidates.push(home.join(".ssh").join("id_rsa"));
    }

    candidates
}

/// First existing key from the default locations.
///
/// Used only when no configuration is available.
pub fn default_key_path() -> Option<PathBuf> {
    private_key_candidates().into_iter().find(|p| p.exists())
}

/// Best private key path for the given configuration.
///
/// The `KILN_PRIVATE_KEY_FILE` variable wins outright (and pointing it at
/// a missing file is a hard error). Otherwise existing candidates whose
/// public key matches a config recipient are preferred; failing that, the
/// first existing candidate is returned.
pub fn find_private_key_for_config(cfg: &Config) -> Result<PathBuf> {
    if let Ok(env_path) = std::env::var(PRIVATE_KEY_ENV) {
        if !env_path.is_empty() {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Ok(path);
            }
            return Err(Error::config(
                format!("{} points to non-existent file: {}", PRIVATE_KEY_ENV, env_path),
                "fix or unset the variable",
            ));
        }
    }

    let config_keys: Vec<String> = cfg
        .recipients
        .values()
        .map(|k| k.trim().to_string())
        .collect();

    let candidates = private_key_candidates();

    for path in &candidates {
        if path.exists() && key_matches_any(path, &config_keys) {
            debug!(key = %path.display(), "discovered matching private key");
            return Ok(path.clone());
        }
    }

    for path in &candidates {
        if path.exists() {
            debug!(key = %path.display(), "falling back to first available key");
            return Ok(path.clone());
        }
    }

    Err(Error::config(
        "no private key found",
        "run 'kiln init key' or specify one with --key",
    ))
}

/// Whether the key at `path` corresponds to any of `public_keys`.
fn key_matches_any(path: &Path, public_keys: &[String]) -> bool {
    ssh_key_matches(path, public_keys) || age_key_matches(path, public_keys)
}

/// SSH candidates are matched by their sibling `.pub` file.
fn ssh_key_matches(path: &Path, public_keys: &[String]) -> bool {
    if !path.to_string_lossy().contains(".ssh/") {
        return false;
    }

    let pub_path = sibling_pub_path(path);
    let Ok(content) = std::fs::read_to_string(&pub_path) else {
        return false;
    };

    public_keys.iter().any(|k| k == content.trim())
}

/// Age candidates are matched by X25519 derivation. Passphrase-protected
/// keys are skipped rather than prompting mid-discovery.
fn age_key_matches(path: &Path, public_keys: &[String]) -> bool {
    let Ok(raw) = std::fs::read(path) else {
        return false;
    };
    let raw = Zeroizing::new(raw);

    let Ok(content) = std::str::from_utf8(trim_bytes(&raw)) else {
        return false;
    };

    if !content.starts_with("AGE-SECRET-KEY-") {
        return false;
    }

    match derive_from_unencrypted(content) {
        Ok(derived) => public_keys.iter().any(|k| *k == derived),
        Err(_) => false,
    }
}

/// `path` with `.pub` appended to the full file name.
pub fn sibling_pub_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".pub");
    PathBuf::from(name)
}

fn prompt_passphrase(prompt: &str) -> Result<SecretString> {
    let passphrase = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| Error::operation("read", "passphrase", e))?;

    if passphrase.is_empty() {
        return Err(Error::validation("passphrase", "passphrase cannot be empty"));
    }

    Ok(SecretString::from(passphrase))
}

fn prompt_new_passphrase() -> Result<SecretString> {
    let passphrase = dialoguer::Password::new()
        .with_prompt("Enter passphrase")
        .with_confirmation("Confirm passphrase", "passphrases do not match")
        .allow_empty_password(true)
        .interact()
        .map_err(|e| Error::operation("read", "passphrase", e))?;

    if passphrase.is_empty() {
        return Err(Error::validation("passphrase", "passphrase cannot be empty"));
    }

    Ok(SecretString::from(passphrase))
}

fn trim_bytes(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &data[start..end]
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}
