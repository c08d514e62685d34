//! Small filesystem helpers shared by the writers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Write `contents` to a sibling temp file, then rename it over `path`.
///
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let mut tmp_name = path
        .file_name()
        .with_context(|| format!("path missing file name {}", path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = parent.join(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

/// Read file contents if it exists, returning `None` for missing files.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(Some(contents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parents_and_replaces() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("a/b/out.json");
        write_atomic(&path, "one").expect("write");
        write_atomic(&path, "two").expect("rewrite");
        assert_eq!(fs::read_to_string(&path).expect("read"), "two");
        assert!(!temp.path().join("a/b/out.json.tmp").exists());
    }

    #[test]
    fn read_optional_missing_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(read_optional(&temp.path().join("nope")).expect("read").is_none());
    }
}
