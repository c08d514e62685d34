//! Mobile UI test scaffolder CLI.
//!
//! Reads a manual test case, optionally captures element locators on a live
//! device through Appium, and generates a WebdriverIO spec, page object and
//! locator file through an OpenAI-compatible service.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use scaffold::core::actions::{executor_call, locator_keys};
use scaffold::core::naming::ArtifactNames;
use scaffold::core::types::{Action, Platform};
use scaffold::error::exit_code_for;
use scaffold::generate::{
    ActionSource, Project, build_prompt, generate_artifacts, prepare_case, run_capture,
};
use scaffold::io::oracle::OpenAiService;
use scaffold::io::webdriver::AppiumBackend;
use scaffold::logging;

#[derive(Parser)]
#[command(
    name = "scaffold",
    version,
    about = "Generate WebdriverIO + Appium test artifacts from manual test cases"
)]
struct Cli {
    /// Project root holding `scaffold.toml` and the test sources.
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical action list of a test case as JSON.
    Actions {
        input: PathBuf,
        /// Append synthesized actions to the test case as an `Actions:` block.
        #[arg(long)]
        persist: bool,
    },
    /// Capture element locators on a connected device.
    Capture {
        input: PathBuf,
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Generate the spec, page object and locator file.
    Generate {
        input: PathBuf,
        /// Run a capture session before generating.
        #[arg(long)]
        capture: bool,
        #[command(flatten)]
        device: DeviceArgs,
        /// Override the generation model.
        #[arg(long)]
        model: Option<String>,
        /// Append synthesized actions to the test case.
        #[arg(long)]
        persist_actions: bool,
        /// Print the generation prompt and exit without calling the service.
        #[arg(long)]
        print_prompt: bool,
    },
    /// Show the merged locator repository.
    Locators {
        /// Only show this key.
        #[arg(long)]
        key: Option<String>,
    },
}

#[derive(Args)]
struct DeviceArgs {
    /// Target platform (`android` or `ios`).
    #[arg(long)]
    platform: Option<Platform>,
    /// App binary to install when the app is missing on the device.
    #[arg(long)]
    app_path: Option<PathBuf>,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(exit_code_for(&err));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Actions { input, persist } => cmd_actions(&cli.project_dir, &input, persist),
        Command::Capture { input, device } => cmd_capture(&cli.project_dir, &input, &device),
        Command::Generate {
            input,
            capture,
            device,
            model,
            persist_actions,
            print_prompt,
        } => cmd_generate(
            &cli.project_dir,
            &input,
            GenerateArgs {
                capture,
                device,
                model,
                persist_actions,
                print_prompt,
            },
        ),
        Command::Locators { key } => cmd_locators(&cli.project_dir, key.as_deref()),
    }
}

struct GenerateArgs {
    capture: bool,
    device: DeviceArgs,
    model: Option<String>,
    persist_actions: bool,
    print_prompt: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionsOutput<'a> {
    title: &'a str,
    names: &'a ArtifactNames,
    source: ActionSource,
    actions: &'a [Action],
    calls: Vec<String>,
    locator_keys: Vec<String>,
    rejected: &'a [String],
}

fn cmd_actions(project_dir: &Path, input: &Path, persist: bool) -> Result<()> {
    let input = resolve_input(project_dir, input);
    let case = prepare_case(&input, persist)?;
    let output = ActionsOutput {
        title: &case.names.title,
        names: &case.names,
        source: case.source,
        actions: &case.actions,
        calls: case.actions.iter().map(executor_call).collect(),
        locator_keys: locator_keys(&case.actions),
        rejected: &case.rejected,
    };
    print_json(&output)
}

fn cmd_capture(project_dir: &Path, input: &Path, device: &DeviceArgs) -> Result<()> {
    let project = load_project(project_dir, device, None)?;
    let case = prepare_case(&resolve_input(project_dir, input), false)?;
    let mut repository = project.load_repository()?;
    let backend = appium_backend(&project)?;
    let report = run_capture(&project, &case, &backend, &mut repository)?;
    print_json(&report)
}

fn cmd_generate(project_dir: &Path, input: &Path, args: GenerateArgs) -> Result<()> {
    let project = load_project(project_dir, &args.device, args.model)?;
    let case = prepare_case(&resolve_input(project_dir, input), args.persist_actions)?;
    let mut repository = project.load_repository()?;

    if args.print_prompt {
        print!("{}", build_prompt(&project, &case, &repository)?);
        return Ok(());
    }

    // Credential first: a missing key must not cost a device session.
    let service = OpenAiService::from_config(&project.config.generation, |name| {
        std::env::var(name).ok()
    })?;

    if args.capture {
        let backend = appium_backend(&project)?;
        let report = run_capture(&project, &case, &backend, &mut repository)?;
        info!(
            captured = report.captured.len(),
            pending = report.pending.len(),
            "capture finished"
        );
    }

    let written = generate_artifacts(&project, &case, &mut repository, &service)?;
    print_json(&written)
}

fn cmd_locators(project_dir: &Path, key: Option<&str>) -> Result<()> {
    let project = Project::load(project_dir)?;
    let repository = project.load_repository()?;
    for warning in repository.warnings() {
        eprintln!("warning: {warning}");
    }
    let merged = repository.merged().to_json_value();
    match key {
        None => print_json(&merged),
        Some(key) => {
            let entry = merged
                .get(key)
                .with_context(|| format!("no locator entry for key {key}"))?;
            print_json(entry)
        }
    }
}

fn load_project(project_dir: &Path, device: &DeviceArgs, model: Option<String>) -> Result<Project> {
    let mut project = Project::load(project_dir)?;
    if let Some(platform) = device.platform {
        project.config.device.platform = platform;
    }
    if let Some(app_path) = &device.app_path {
        project.config.device.app_path = Some(app_path.clone());
    }
    if let Some(model) = model {
        project.config.generation.model = model;
    }
    Ok(project)
}

fn appium_backend(project: &Project) -> Result<AppiumBackend> {
    let device = &project.config.device;
    AppiumBackend::new(&device.endpoint, device.request_timeout(), device.probe_timeout())
}

fn resolve_input(project_dir: &Path, input: &Path) -> PathBuf {
    if input.is_absolute() {
        input.to_path_buf()
    } else {
        project_dir.join(input)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{payload}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_actions_with_persist() {
        let cli = Cli::parse_from(["scaffold", "actions", "cases/login.md", "--persist"]);
        assert!(matches!(cli.command, Command::Actions { persist: true, .. }));
        assert_eq!(cli.project_dir, PathBuf::from("."));
    }

    #[test]
    fn parse_generate_flags() {
        let cli = Cli::parse_from([
            "scaffold",
            "--project-dir",
            "/tmp/app",
            "generate",
            "cases/login.md",
            "--capture",
            "--platform",
            "ios",
            "--model",
            "gpt-4o",
        ]);
        match cli.command {
            Command::Generate {
                capture,
                device,
                model,
                print_prompt,
                ..
            } => {
                assert!(capture);
                assert!(!print_prompt);
                assert_eq!(device.platform, Some(Platform::Ios));
                assert_eq!(model.as_deref(), Some("gpt-4o"));
            }
            _ => panic!("expected generate"),
        }
        assert_eq!(cli.project_dir, PathBuf::from("/tmp/app"));
    }

    #[test]
    fn unknown_platform_is_rejected() {
        assert!(Cli::try_parse_from(["scaffold", "capture", "a.md", "--platform", "symbian"]).is_err());
    }

    #[test]
    fn relative_inputs_resolve_against_project() {
        assert_eq!(
            resolve_input(Path::new("/p"), Path::new("cases/a.md")),
            PathBuf::from("/p/cases/a.md")
        );
        assert_eq!(resolve_input(Path::new("/p"), Path::new("/abs/a.md")), PathBuf::from("/abs/a.md"));
    }
}
