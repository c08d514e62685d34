//! Pipeline orchestration: parse a test case, optionally capture locators on
//! a device, then generate and write the artifacts.
//!
//! Each step is a separate function so the CLI can stop after any of them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::capture::driver::AutomationBackend;
use crate::capture::{CaptureOptions, CaptureReport, CaptureSession};
use crate::core::contract::parse_artifact_response;
use crate::core::document::TestCaseDocument;
use crate::core::naming::ArtifactNames;
use crate::core::synthesizer::synthesize_actions;
use crate::core::types::Action;
use crate::io::artifacts::{WrittenArtifacts, default_targets, locator_target, write_artifacts};
use crate::io::config::{ProjectPaths, ScaffoldConfig, load_project_config};
use crate::io::exemplars::collect_exemplars;
use crate::io::locator_store::{LocatorRepository, RepositorySink};
use crate::io::oracle::{GenerationRequest, GenerationService, SYSTEM_PROMPT};
use crate::io::pending::{pending_path, read_pending, update_pending};
use crate::io::prompt::{PromptBuilder, PromptInputs, TargetPaths};
use crate::io::run_log::RunLog;
use crate::io::testcase::{LoadedTestCase, persist_actions_block, read_test_case};

/// Where a test case's action list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionSource {
    /// The document's own `Actions:` block.
    Explicit,
    /// Synthesized from the `Steps:` text.
    Synthesized,
    /// Neither produced anything.
    Empty,
}

/// Explicit actions when the block yields at least one valid action,
/// otherwise actions synthesized from the steps.
pub fn canonical_actions(document: &TestCaseDocument) -> (Vec<Action>, ActionSource) {
    if let Some(parsed) = &document.actions
        && !parsed.actions.is_empty()
    {
        return (parsed.actions.clone(), ActionSource::Explicit);
    }
    let synthesized = document
        .steps
        .as_deref()
        .map(synthesize_actions)
        .unwrap_or_default();
    if synthesized.is_empty() {
        (synthesized, ActionSource::Empty)
    } else {
        (synthesized, ActionSource::Synthesized)
    }
}

/// Project root, config and derived directories for one invocation.
#[derive(Debug, Clone)]
pub struct Project {
    pub config: ScaffoldConfig,
    pub paths: ProjectPaths,
}

impl Project {
    pub fn new(root: &Path, config: ScaffoldConfig) -> Self {
        let paths = ProjectPaths::new(root, &config.paths);
        Self { config, paths }
    }

    /// Load `scaffold.toml` and environment overrides for `root`.
    pub fn load(root: &Path) -> Result<Self> {
        Ok(Self::new(root, load_project_config(root)?))
    }

    pub fn load_repository(&self) -> Result<LocatorRepository> {
        LocatorRepository::load(&self.paths.locator_root)
    }

    pub fn run_log(&self, names: &ArtifactNames) -> RunLog {
        RunLog::new(&self.paths.runs_dir(), &names.slug)
    }

    pub fn pending_file(&self, names: &ArtifactNames) -> PathBuf {
        pending_path(&self.paths.pending_dir(), &names.slug)
    }

    /// Locator file captures and generated locators for `names` go to.
    pub fn locator_target(&self, names: &ArtifactNames) -> PathBuf {
        locator_target(&self.paths, names)
    }

    pub fn capture_options(&self) -> CaptureOptions {
        let device = &self.config.device;
        CaptureOptions {
            wait_timeout: Duration::from_millis(device.wait_timeout_ms),
            step_pause: Duration::from_millis(device.step_pause_ms),
            poll_interval: Duration::from_millis(device.poll_interval_ms),
            app_path: device.app_path.clone(),
        }
    }
}

/// A parsed test case with its canonical actions.
#[derive(Debug, Clone)]
pub struct PreparedCase {
    pub path: PathBuf,
    pub loaded: LoadedTestCase,
    pub names: ArtifactNames,
    pub actions: Vec<Action>,
    pub source: ActionSource,
    /// Actions block lines that did not parse.
    pub rejected: Vec<String>,
}

impl PreparedCase {
    pub fn document(&self) -> &TestCaseDocument {
        &self.loaded.document
    }
}

/// Parse the test case at `input` and settle its action list. With
/// `persist_actions`, synthesized actions are appended to the document.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn prepare_case(input: &Path, persist_actions: bool) -> Result<PreparedCase> {
    let loaded = read_test_case(input)?;
    let names = ArtifactNames::from_title(&loaded.document.title);
    let (actions, source) = canonical_actions(&loaded.document);
    let rejected = loaded
        .document
        .actions
        .as_ref()
        .map(|parsed| parsed.rejected.clone())
        .unwrap_or_default();
    for line in &rejected {
        warn!(line = %line, "action line rejected");
    }
    if source == ActionSource::Empty {
        warn!("test case yields no actions");
    }
    info!(title = %names.title, actions = actions.len(), source = ?source, "test case prepared");

    if persist_actions && source == ActionSource::Synthesized {
        persist_actions_block(input, &loaded, &actions)?;
    }

    Ok(PreparedCase {
        path: input.to_path_buf(),
        loaded,
        names,
        actions,
        source,
        rejected,
    })
}

/// Drive a capture session through the case's actions, persisting every
/// captured selector and the misses that still have no known selector. The report is written to the
/// run log even when the session fails.
#[instrument(skip_all, fields(slug = %case.names.slug))]
pub fn run_capture<B: AutomationBackend>(
    project: &Project,
    case: &PreparedCase,
    backend: &B,
    repository: &mut LocatorRepository,
) -> Result<CaptureReport> {
    let run_log = project.run_log(&case.names);
    run_log.write_actions(&case.actions)?;

    let mut session = CaptureSession::new(
        backend,
        project.config.device.capabilities(),
        project.capture_options(),
    );
    let mut sink = RepositorySink::new(repository, project.locator_target(&case.names));
    let outcome = session.run(&case.actions, &mut sink);
    let report = session.into_report();

    run_log.write_capture(&report)?;
    outcome?;
    update_pending(&project.pending_file(&case.names), &report.pending, repository.merged())?;
    Ok(report)
}

/// Render the generation instruction for a prepared case.
pub fn build_prompt(
    project: &Project,
    case: &PreparedCase,
    repository: &LocatorRepository,
) -> Result<String> {
    let generation = &project.config.generation;
    let logical = &project.config.paths;
    let names = &case.names;
    let (spec_target, page_target, _) = default_targets(&project.paths, names);

    let spec_exemplars = collect_exemplars(
        &project.paths.root,
        &project.paths.spec_root,
        ".spec.ts",
        &[spec_target],
        generation.exemplar_limit,
        generation.exemplar_max_bytes,
    )?;
    let page_exemplars = collect_exemplars(
        &project.paths.root,
        &project.paths.page_root,
        ".page.ts",
        &[page_target],
        generation.exemplar_limit,
        generation.exemplar_max_bytes,
    )?;
    let pending = read_pending(&project.pending_file(names))?;
    let document = case.document();

    let inputs = PromptInputs {
        names,
        targets: TargetPaths {
            spec: logical_path(&logical.spec_root, &names.spec_file),
            page: logical_path(&logical.page_root, &names.page_file),
            locators: logical_path(&logical.locator_root, &names.locators_file),
        },
        platform: project.config.device.platform,
        actions: &case.actions,
        locators: repository.merged(),
        pending: &pending,
        preconditions: document.preconditions.as_deref(),
        expected: document.expected_results.as_deref(),
        spec_exemplars: &spec_exemplars,
        page_exemplars: &page_exemplars,
    };
    PromptBuilder::new(generation.prompt_budget_bytes).build(&inputs)
}

fn logical_path(root: &str, file: &str) -> String {
    let root = root.trim_end_matches(['/', '\\']);
    if root.is_empty() {
        file.to_string()
    } else {
        format!("{root}/{file}")
    }
}

/// Call the generation service and write the validated artifacts.
///
/// The raw response is logged before validation; a contract violation
/// aborts before any artifact is written.
#[instrument(skip_all, fields(slug = %case.names.slug))]
pub fn generate_artifacts<S: GenerationService + ?Sized>(
    project: &Project,
    case: &PreparedCase,
    repository: &mut LocatorRepository,
    service: &S,
) -> Result<WrittenArtifacts> {
    let run_log = project.run_log(&case.names);
    let prompt = build_prompt(project, case, repository)?;
    run_log.write_prompt(&prompt)?;

    let request = GenerationRequest {
        model: project.config.generation.model.clone(),
        system: SYSTEM_PROMPT.to_string(),
        instruction: prompt,
        temperature: project.config.generation.temperature,
    };
    let raw = service.complete(&request)?;
    run_log.write_response(&raw)?;

    let artifacts = parse_artifact_response(&raw)?;
    write_artifacts(
        &project.paths,
        &project.config.paths,
        &case.names,
        &artifacts,
        repository,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::parse_document;
    use crate::core::types::ActionVerb;

    #[test]
    fn explicit_block_wins_over_steps() {
        let doc = parse_document(
            "TestCaseTitle: Validate Login\nSteps:\nTap settings\nActions:\nclick(loginButton)\nwaitUntilVisible(formScreen, 20000)\n",
        )
        .expect("parse");
        let (actions, source) = canonical_actions(&doc);
        assert_eq!(source, ActionSource::Explicit);
        assert_eq!(
            actions,
            vec![
                Action::new(ActionVerb::Click, "loginButton"),
                Action::new(ActionVerb::WaitUntilVisible, "formScreen").with_param("20000"),
            ]
        );
    }

    #[test]
    fn invalid_block_falls_back_to_steps() {
        let doc = parse_document("Title: Settings\nSteps:\nTap the settings icon\nActions:\nnot an action\n")
            .expect("parse");
        let (actions, source) = canonical_actions(&doc);
        assert_eq!(source, ActionSource::Synthesized);
        assert_eq!(actions[0].verb, ActionVerb::Click);
    }

    #[test]
    fn nothing_to_act_on_is_empty() {
        let doc = parse_document("Title: Nothing\n").expect("parse");
        assert_eq!(canonical_actions(&doc), (Vec::new(), ActionSource::Empty));
    }

    #[test]
    fn logical_paths_join_with_slash() {
        assert_eq!(logical_path("test/specs/", "a.spec.ts"), "test/specs/a.spec.ts");
        assert_eq!(logical_path("", "a.json"), "a.json");
    }
}
