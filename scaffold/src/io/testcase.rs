//! Test case documents on disk: reading and Actions block write-back.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::actions::render_actions_block;
use crate::core::document::{TestCaseDocument, parse_document};
use crate::core::types::Action;
use crate::io::files::write_atomic;

/// A parsed document together with the text it was parsed from.
#[derive(Debug, Clone)]
pub struct LoadedTestCase {
    pub raw: String,
    pub document: TestCaseDocument,
}

#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_test_case(path: &Path) -> Result<LoadedTestCase> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read test case {}", path.display()))?;
    let document =
        parse_document(&raw).with_context(|| format!("parse test case {}", path.display()))?;
    debug!(title = %document.title, "test case parsed");
    Ok(LoadedTestCase { raw, document })
}

/// Append an `Actions:` block for `actions` to the document at `path`.
///
/// Returns `false` without touching the file when the document already has
/// an Actions block or there is nothing to write. The in-memory document is
/// not re-parsed.
pub fn persist_actions_block(path: &Path, loaded: &LoadedTestCase, actions: &[Action]) -> Result<bool> {
    if loaded.document.has_actions_block() || actions.is_empty() {
        return Ok(false);
    }
    let mut updated = loaded.raw.trim_end().to_string();
    updated.push_str("\n\n");
    updated.push_str(&render_actions_block(actions));
    write_atomic(path, &updated)?;
    info!(path = %path.display(), actions = actions.len(), "actions block written back");
    Ok(true)
}
