//! Run diagnostics under `<state_dir>/runs/<slug>/`.
//!
//! Each file is rewritten by the step that produces it, so the directory
//! always reflects the latest run of a test case.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::capture::CaptureReport;
use crate::core::types::Action;

#[derive(Debug, Clone)]
pub struct RunLogPaths {
    pub dir: PathBuf,
    pub actions_path: PathBuf,
    pub capture_path: PathBuf,
    pub prompt_path: PathBuf,
    pub response_path: PathBuf,
}

impl RunLogPaths {
    pub fn new(runs_dir: &Path, slug: &str) -> Self {
        let dir = runs_dir.join(slug);
        Self {
            dir: dir.clone(),
            actions_path: dir.join("actions.json"),
            capture_path: dir.join("capture.json"),
            prompt_path: dir.join("prompt.md"),
            response_path: dir.join("response.txt"),
        }
    }
}

/// Writer for one test case's run directory.
#[derive(Debug, Clone)]
pub struct RunLog {
    paths: RunLogPaths,
}

impl RunLog {
    pub fn new(runs_dir: &Path, slug: &str) -> Self {
        Self {
            paths: RunLogPaths::new(runs_dir, slug),
        }
    }

    pub fn paths(&self) -> &RunLogPaths {
        &self.paths
    }

    pub fn write_actions(&self, actions: &[Action]) -> Result<()> {
        self.write_json(&self.paths.actions_path, &actions)
    }

    pub fn write_capture(&self, report: &CaptureReport) -> Result<()> {
        self.write_json(&self.paths.capture_path, report)
    }

    pub fn write_prompt(&self, prompt: &str) -> Result<()> {
        self.write_text(&self.paths.prompt_path, prompt)
    }

    /// Raw service output, written before it is validated.
    pub fn write_response(&self, raw: &str) -> Result<()> {
        self.write_text(&self.paths.response_path, raw)
    }

    fn write_text(&self, path: &Path, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.paths.dir)
            .with_context(|| format!("create run dir {}", self.paths.dir.display()))?;
        fs::write(path, contents).with_context(|| format!("write {}", path.display()))
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let mut buf = serde_json::to_string_pretty(value)?;
        buf.push('\n');
        self.write_text(path, &buf)
    }
}
