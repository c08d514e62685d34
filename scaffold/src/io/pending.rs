//! Pending locators: keys a capture could not resolve, kept per test case in
//! `<state_dir>/pending/<slug>.json` until a later capture resolves them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::capture::PendingLocator;
use crate::core::locator_set::LocatorSet;
use crate::io::files::{read_optional, write_atomic};

pub fn pending_path(pending_dir: &Path, slug: &str) -> PathBuf {
    pending_dir.join(format!("{slug}.json"))
}

/// Read the pending list; a missing file is an empty list.
pub fn read_pending(path: &Path) -> Result<Vec<PendingLocator>> {
    let Some(raw) = read_optional(path)? else {
        return Ok(Vec::new());
    };
    serde_json::from_str(&raw).with_context(|| format!("parse pending locators {}", path.display()))
}

/// Fold one capture into the pending list. Entries with a selector in
/// `known` are removed and misses for known keys are not added. An empty
/// result deletes the file.
pub fn update_pending(
    path: &Path,
    misses: &[PendingLocator],
    known: &LocatorSet,
) -> Result<Vec<PendingLocator>> {
    let mut pending = read_pending(path)?;
    pending.retain(|entry| !known.contains(&entry.key, entry.platform));
    for miss in misses {
        let listed = pending
            .iter()
            .any(|entry| entry.key == miss.key && entry.platform == miss.platform);
        if !listed && !known.contains(&miss.key, miss.platform) {
            pending.push(miss.clone());
        }
    }

    if pending.is_empty() {
        if path.exists() {
            fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
            debug!(path = %path.display(), "pending locators cleared");
        }
        return Ok(pending);
    }

    let json = serde_json::to_string_pretty(&pending).context("serialize pending locators")?;
    write_atomic(path, &format!("{json}\n"))?;
    for entry in &pending {
        warn!(key = %entry.key, platform = %entry.platform, reason = %entry.reason, "locator still pending");
    }
    Ok(pending)
}
