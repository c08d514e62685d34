//! Locator repository: every `*.json` locator file under the locator root,
//! merged into one set.
//!
//! Files load in file-name order and a later file wins per (key, platform)
//! pair; a platform missing from a later file is kept from an earlier one.
//! Persisting reads the target file, merges, and writes it back atomically,
//! so platforms the current run did not touch survive.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::capture::LocatorSink;
use crate::core::locator_set::{LocatorEntry, LocatorSet, MergePolicy};
use crate::core::types::Platform;
use crate::io::files::{read_optional, write_atomic};

#[derive(Debug, Clone)]
pub struct LocatorRepository {
    root: PathBuf,
    merged: LocatorSet,
    sources: Vec<PathBuf>,
    warnings: Vec<String>,
}

impl LocatorRepository {
    /// Repository with no sources, rooted at `root`.
    pub fn empty(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            merged: LocatorSet::new(),
            sources: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Load every locator file under `root`. A missing root is an empty
    /// repository; an unreadable or malformed file is skipped with a warning.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn load(root: &Path) -> Result<Self> {
        let mut repository = Self::empty(root);
        if !root.exists() {
            debug!("locator root missing, starting empty");
            return Ok(repository);
        }

        let mut files: Vec<PathBuf> = fs::read_dir(root)
            .with_context(|| format!("read locator root {}", root.display()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        for path in files {
            let parsed = fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))
                .and_then(|raw| {
                    LocatorSet::from_json_lenient(&raw)
                        .with_context(|| format!("parse {}", path.display()))
                });
            match parsed {
                Ok(parsed) => {
                    for skipped in &parsed.skipped {
                        warn!(path = %path.display(), entry = %skipped, "locator entry skipped");
                    }
                    repository.merged.merge(&parsed.set, MergePolicy::IncomingWins);
                    repository.sources.push(path);
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    warn!(error = %message, "locator file skipped");
                    repository.warnings.push(message);
                }
            }
        }
        info!(
            files = repository.sources.len(),
            keys = repository.merged.len(),
            "locator repository loaded"
        );
        Ok(repository)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn merged(&self) -> &LocatorSet {
        &self.merged
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Files that could not be loaded.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn get(&self, key: &str, platform: Platform) -> Option<&str> {
        self.merged.get(key, platform)
    }

    pub fn entry(&self, key: &str) -> Option<&LocatorEntry> {
        self.merged.entry(key)
    }

    /// Merge `incoming` into the file at `target` and into the in-memory
    /// view, returning what was written.
    ///
    /// The existing file must be a locator document; a file that is not
    /// JSON is left untouched and reported as an error.
    #[instrument(skip_all, fields(target = %target.display(), keys = incoming.len()))]
    pub fn persist(
        &mut self,
        target: &Path,
        incoming: &LocatorSet,
        policy: MergePolicy,
    ) -> Result<LocatorSet> {
        let mut on_disk = match read_optional(target)? {
            Some(raw) => {
                let parsed = LocatorSet::from_json_lenient(&raw)
                    .with_context(|| format!("existing locator file {} is malformed", target.display()))?;
                for skipped in &parsed.skipped {
                    warn!(entry = %skipped, "dropping invalid existing locator entry");
                }
                parsed.set
            }
            None => LocatorSet::new(),
        };
        on_disk.merge(incoming, policy);
        if on_disk.is_empty() {
            debug!("nothing to persist");
            return Ok(on_disk);
        }

        write_atomic(target, &on_disk.to_pretty_json()?)?;
        self.merged.merge(incoming, policy);
        if !self.sources.iter().any(|source| source == target) {
            self.sources.push(target.to_path_buf());
        }
        debug!(keys = on_disk.len(), "locator file written");
        Ok(on_disk)
    }
}

/// Sink that persists each captured selector to one locator file as soon as
/// it is captured.
pub struct RepositorySink<'a> {
    repository: &'a mut LocatorRepository,
    target: PathBuf,
}

impl<'a> RepositorySink<'a> {
    pub fn new(repository: &'a mut LocatorRepository, target: PathBuf) -> Self {
        Self { repository, target }
    }
}

impl LocatorSink for RepositorySink<'_> {
    fn record(&mut self, key: &str, platform: Platform, selector: &str) -> Result<()> {
        let mut fresh = LocatorSet::new();
        if !fresh.insert(key, platform, selector) {
            return Ok(());
        }
        self.repository
            .persist(&self.target, &fresh, MergePolicy::IncomingWins)
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::create_dir_all(dir).expect("mkdir");
        fs::write(dir.join(name), body).expect("write");
    }

    #[test]
    fn later_files_win_without_deleting_platforms() {
        let temp = tempfile::tempdir().expect("tempdir");
        write(temp.path(), "a.json", r#"{"x":{"android":"A1","ios":"I1"}}"#);
        write(temp.path(), "b.json", r#"{"x":{"android":"A2"},"y":{"ios":"Y"}}"#);
        let repo = LocatorRepository::load(temp.path()).expect("load");
        assert_eq!(repo.get("x", Platform::Android), Some("A2"));
        assert_eq!(repo.get("x", Platform::Ios), Some("I1"));
        assert_eq!(repo.get("y", Platform::Ios), Some("Y"));
        assert_eq!(repo.sources().len(), 2);
    }

    #[test]
    fn malformed_file_is_skipped_with_warning() {
        let temp = tempfile::tempdir().expect("tempdir");
        write(temp.path(), "bad.json", "{ not json");
        write(temp.path(), "good.json", r#"{"k":{"android":"S"}}"#);
        write(temp.path(), "notes.txt", "ignored");
        let repo = LocatorRepository::load(temp.path()).expect("load");
        assert_eq!(repo.warnings().len(), 1);
        assert_eq!(repo.get("k", Platform::Android), Some("S"));
    }

    #[test]
    fn missing_root_is_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = LocatorRepository::load(&temp.path().join("none")).expect("load");
        assert!(repo.merged().is_empty());
    }

    #[test]
    fn persist_keeps_sibling_platform() {
        let temp = tempfile::tempdir().expect("tempdir");
        write(temp.path(), "login.json", r#"{"x":{"android":"A","ios":"I"}}"#);
        let mut repo = LocatorRepository::load(temp.path()).expect("load");
        let mut fresh = LocatorSet::new();
        fresh.insert("x", Platform::Android, "B");
        repo.persist(&temp.path().join("login.json"), &fresh, MergePolicy::IncomingWins)
            .expect("persist");

        let raw = fs::read_to_string(temp.path().join("login.json")).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value, serde_json::json!({"x": {"android": "B", "ios": "I"}}));
        assert_eq!(repo.get("x", Platform::Android), Some("B"));
    }

    #[test]
    fn existing_wins_only_fills_gaps() {
        let temp = tempfile::tempdir().expect("tempdir");
        write(temp.path(), "login.json", r#"{"x":{"android":"captured"}}"#);
        let mut repo = LocatorRepository::load(temp.path()).expect("load");
        let mut generated = LocatorSet::new();
        generated.insert("x", Platform::Android, "guessed");
        generated.insert("x", Platform::Ios, "guessed-ios");
        let written = repo
            .persist(&temp.path().join("login.json"), &generated, MergePolicy::ExistingWins)
            .expect("persist");
        assert_eq!(written.get("x", Platform::Android), Some("captured"));
        assert_eq!(written.get("x", Platform::Ios), Some("guessed-ios"));
    }

    #[test]
    fn persist_refuses_to_overwrite_non_json_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        write(temp.path(), "login.json", "hand written notes");
        let mut repo = LocatorRepository::empty(temp.path());
        let mut fresh = LocatorSet::new();
        fresh.insert("x", Platform::Android, "B");
        assert!(
            repo.persist(&temp.path().join("login.json"), &fresh, MergePolicy::IncomingWins)
                .is_err()
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("login.json")).expect("read"),
            "hand written notes"
        );
    }

    #[test]
    fn sink_writes_each_capture() {
        let temp = tempfile::tempdir().expect("tempdir");
        let target = temp.path().join("repo/case.json");
        let mut repo = LocatorRepository::empty(&temp.path().join("repo"));
        {
            let mut sink = RepositorySink::new(&mut repo, target.clone());
            sink.record("loginButton", Platform::Android, "//a").expect("record");
            sink.record("emailField", Platform::Android, "//b").expect("record");
        }
        let reloaded = LocatorRepository::load(&temp.path().join("repo")).expect("load");
        assert_eq!(reloaded.merged().len(), 2);
        assert_eq!(repo.get("emailField", Platform::Android), Some("//b"));
    }
}
