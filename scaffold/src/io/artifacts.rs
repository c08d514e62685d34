//! Writing a validated artifact set to the project.
//!
//! Every target is resolved below its own root (spec, page or locator root)
//! and carries the exact required file name whatever the service proposed.
//! Generated locators always go to `<locator_root>/<slug>.json`, the same
//! file captures write to. Files are written one by one; there is no
//! cross-file rollback.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::core::contract::GenerationArtifactSet;
use crate::core::locator_set::MergePolicy;
use crate::core::naming::ArtifactNames;
use crate::core::safe_path::{resolve_safe_path, strip_logical_prefix};
use crate::io::config::{PathsConfig, ProjectPaths};
use crate::io::files::write_atomic;
use crate::io::locator_store::LocatorRepository;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenArtifacts {
    pub spec: PathBuf,
    pub page: PathBuf,
    pub locators: PathBuf,
    /// Locator keys in the written locator file.
    pub locator_keys: Vec<String>,
}

/// Where a proposed file lands: below `root`, with `required_name` as its
/// file name. Subdirectories the proposal names below the root are kept.
pub fn artifact_target(root: &Path, logical_root: &str, proposed: &str, required_name: &str) -> PathBuf {
    let relative = strip_logical_prefix(proposed, logical_root);
    let resolved = resolve_safe_path(root, &relative, required_name);
    let parent = resolved
        .parent()
        .filter(|parent| parent.starts_with(root))
        .unwrap_or(root);
    let target = parent.join(required_name);
    if target != resolved {
        warn!(
            proposed,
            target = %target.display(),
            "proposed artifact path replaced with required name"
        );
    }
    target
}

/// The locator file for `names`, shared by capture and generation.
pub fn locator_target(paths: &ProjectPaths, names: &ArtifactNames) -> PathBuf {
    resolve_safe_path(&paths.locator_root, &names.locators_file, &names.locators_file)
}

/// Spec, page and locator targets for `names`, ignoring any proposal.
pub fn default_targets(paths: &ProjectPaths, names: &ArtifactNames) -> (PathBuf, PathBuf, PathBuf) {
    (
        paths.spec_root.join(&names.spec_file),
        paths.page_root.join(&names.page_file),
        locator_target(paths, names),
    )
}

#[instrument(skip_all, fields(slug = %names.slug))]
pub fn write_artifacts(
    paths: &ProjectPaths,
    logical: &PathsConfig,
    names: &ArtifactNames,
    artifacts: &GenerationArtifactSet,
    repository: &mut LocatorRepository,
) -> Result<WrittenArtifacts> {
    let spec = artifact_target(&paths.spec_root, &logical.spec_root, &artifacts.spec.path, &names.spec_file);
    let page = artifact_target(&paths.page_root, &logical.page_root, &artifacts.page.path, &names.page_file);
    let locators = locator_target(paths, names);
    if paths.root.join(&artifacts.locators_path) != locators {
        warn!(
            proposed = %artifacts.locators_path,
            target = %locators.display(),
            "proposed locator path replaced with the locator file"
        );
    }

    write_atomic(&spec, &with_trailing_newline(&artifacts.spec.content))
        .with_context(|| format!("write spec {}", spec.display()))?;
    write_atomic(&page, &with_trailing_newline(&artifacts.page.content))
        .with_context(|| format!("write page object {}", page.display()))?;

    for skipped in &artifacts.skipped_locators {
        warn!(entry = %skipped, "generated locator entry dropped");
    }
    let written = repository
        .persist(&locators, &artifacts.locators, MergePolicy::ExistingWins)
        .with_context(|| format!("write locators {}", locators.display()))?;

    info!(
        spec = %spec.display(),
        page = %page.display(),
        locators = %locators.display(),
        "artifacts written"
    );
    Ok(WrittenArtifacts {
        spec,
        page,
        locators,
        locator_keys: written.keys().map(str::to_string).collect(),
    })
}

fn with_trailing_newline(content: &str) -> String {
    let mut out = content.trim_end().to_string();
    out.push('\n');
    out
}
