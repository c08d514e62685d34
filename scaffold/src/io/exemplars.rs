//! Style exemplars: recent generated specs and page objects shown to the
//! generation service so new artifacts match the house style.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exemplar {
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    pub content: String,
    pub truncated: bool,
}

/// Most recently modified files under `dir` whose name ends in `suffix`,
/// newest first, skipping `exclude`. Each is cut at `max_bytes` on a char
/// boundary.
pub fn collect_exemplars(
    project_root: &Path,
    dir: &Path,
    suffix: &str,
    exclude: &[PathBuf],
    limit: usize,
    max_bytes: usize,
) -> Result<Vec<Exemplar>> {
    if limit == 0 || !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();
    walk(dir, suffix, &mut candidates)?;
    candidates.retain(|(path, _)| !exclude.iter().any(|excluded| excluded == path));
    // Newest first; ties broken by path for stable output.
    candidates.sort_by(|(a_path, a_time), (b_path, b_time)| {
        b_time.cmp(a_time).then_with(|| a_path.cmp(b_path))
    });

    let mut exemplars = Vec::new();
    for (path, _) in candidates.into_iter().take(limit) {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read exemplar {}", path.display()))?;
        let (content, truncated) = truncate_at_boundary(&raw, max_bytes);
        let relative = path.strip_prefix(project_root).unwrap_or(&path);
        exemplars.push(Exemplar {
            path: relative.to_string_lossy().replace('\\', "/"),
            content: content.to_string(),
            truncated,
        });
    }
    debug!(dir = %dir.display(), suffix, count = exemplars.len(), "exemplars collected");
    Ok(exemplars)
}

fn walk(dir: &Path, suffix: &str, out: &mut Vec<(PathBuf, SystemTime)>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, suffix, out)?;
        } else if file_type.is_file()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(suffix))
        {
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            out.push((path, modified));
        }
    }
    Ok(())
}

fn truncate_at_boundary(raw: &str, max_bytes: usize) -> (&str, bool) {
    if raw.len() <= max_bytes {
        return (raw, false);
    }
    let mut end = max_bytes;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    (&raw[..end], true)
}
