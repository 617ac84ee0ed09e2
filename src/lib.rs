//! Encrypted environment variable management for project teams.
//!
//! Kiln stores application configuration as standalone age-encrypted
//! environment files. A `kiln.toml` config declares named recipients
//! (age or SSH public keys), optional groups, and one or more environment
//! files, each with an access list. Anyone holding an authorised private
//! key can decrypt; everything else stays ciphertext at rest.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use kiln::core::{config::Config, identity::Identity, store};
//!
//! # fn main() -> kiln::Result<()> {
//! let cfg = Config::load(Path::new("kiln.toml"))?;
//! let identity = Identity::from_key_file(Path::new("kiln.key"))?;
//!
//! store::set_one(&identity, &cfg, "default", "DATABASE_URL", b"postgres://localhost/db")?;
//! let value = store::get_one(&identity, &cfg, "default", "DATABASE_URL")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **`core`**: validation, secret buffers, key material, the age
//!   envelope, the env text codec, the config model, and the store,
//!   template, runner, and editor operations built on them
//! - **`cli`**: the `kiln` command-line surface
//!
//! Every decrypted value lives in a [`core::secret::SecretBuffer`] and is
//! zeroed when dropped; decrypted files travel as
//! [`core::secret::SecretMap`]s carrying the same guarantee.

pub mod cli;
pub mod core;
pub mod error;

pub use core::config::Config;
pub use core::envelope::Envelope;
pub use core::identity::{Identity, IdentityKind};
pub use core::secret::{SecretBuffer, SecretMap};
pub use error::{Error, Result};
