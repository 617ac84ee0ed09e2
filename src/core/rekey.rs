//! Rekey planning.
//!
//! Computes the new recipient set for a file: rejects conflicting
//! re-registrations, inserts new recipients, and extends the file's access
//! list with any name whose access is not already implied. The caller
//! re-encrypts the ciphertext *before* persisting the config, so the
//! config never grants access the ciphertext cannot honour.

use crate::core::config::{Config, FileEntry};
use crate::core::keys::RecipientSpec;
use crate::error::{Error, Result};

/// Reject additions that re-register an existing name with a different key.
///
/// Re-registering an identical name/key pair is a no-op, not an error.
pub fn check_conflicts(cfg: &Config, additions: &[RecipientSpec]) -> Result<()> {
    for spec in additions {
        if let Some(existing) = cfg.recipients.get(&spec.name) {
            if existing != &spec.public_key {
                return Err(Error::config(
                    format!("recipient '{}' already exists with different key", spec.name),
                    "use different name or remove existing recipient first",
                ));
            }
        }
    }

    Ok(())
}

/// Insert the new recipients and extend the target file's access list.
///
/// A recipient is skipped when its access is already implied: it appears
/// directly in the list, the list contains `*`, or it is a member of any
/// group the list names.
pub fn register_recipients(cfg: &mut Config, file_name: &str, additions: &[RecipientSpec]) {
    for spec in additions {
        cfg.add_recipient(&spec.name, &spec.public_key);
    }

    let Some(entry) = cfg.files.get(file_name).cloned() else {
        return;
    };

    let mut access = entry.access.clone();
    for spec in additions {
        if has_file_access(cfg, &entry, &spec.name) || access.contains(&spec.name) {
            continue;
        }
        access.push(spec.name.clone());
    }

    if let Some(entry) = cfg.files.get_mut(file_name) {
        entry.access = access;
    }
}

/// Whether `name` already has access to the file described by `entry`.
fn has_file_access(cfg: &Config, entry: &FileEntry, name: &str) -> bool {
    if entry.access.iter().any(|t| t == name || t == "*") {
        return true;
    }

    // Scan every group in the access list, not just the first.
    entry.access.iter().any(|token| {
        cfg.groups
            .get(token)
            .is_some_and(|members| members.iter().any(|m| m == name))
    })
}
