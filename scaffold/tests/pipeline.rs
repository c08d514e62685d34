//! End-to-end pipeline tests against an in-memory device and a scripted
//! generation service.

use std::fs;

use scaffold::capture::CaptureState;
use scaffold::core::types::Platform;
use scaffold::error::exit_code_for;
use scaffold::exit_codes;
use scaffold::generate::{ActionSource, Project, generate_artifacts, prepare_case, run_capture};
use scaffold::io::pending::read_pending;
use scaffold::test_support::{
    FakeBackend, FakeDriver, FakeElement, ScriptedGenerationService, TempProject, login_response,
};

const LOGIN_CASE: &str = "\
TestCaseTitle: Validate Login
Preconditions:
The app is installed and the user is logged out.
Steps:
1. Enter email
2. Tap Login button
Expected Results:
The home screen is shown.
Actions:
setValue(emailField, \"user@example.com\")
click(loginButton)
isVisible(checkoutButton)
";

fn login_screen() -> FakeDriver {
    FakeDriver::new(vec![
        FakeElement::new("android.widget.EditText")
            .id("com.app:id/email_field")
            .hint("Email")
            .interactive(),
        FakeElement::new("android.widget.Button").desc("loginButton").text("LOGIN"),
    ])
}

fn checkout_screen() -> FakeDriver {
    FakeDriver::new(vec![
        FakeElement::new("android.widget.Button").desc("checkoutButton"),
    ])
}

fn project(temp: &TempProject) -> Project {
    Project::new(temp.root(), temp.config())
}

#[test]
fn capture_then_generate_keeps_captured_selectors() {
    let temp = TempProject::new().expect("temp project");
    let input = temp.write("cases/login.md", LOGIN_CASE).expect("write case");
    let project = project(&temp);
    let case = prepare_case(&input, false).expect("prepare");
    assert_eq!(case.source, ActionSource::Explicit);
    assert_eq!(case.names.slug, "validate-login");

    let mut repository = project.load_repository().expect("load repository");
    let backend = FakeBackend::new(login_screen());
    let report = run_capture(&project, &case, &backend, &mut repository).expect("capture");

    assert_eq!(report.state, CaptureState::Completed);
    assert_eq!(
        report.captured.get("loginButton", Platform::Android),
        Some("//android.widget.Button[@content-desc='loginButton']")
    );
    assert!(report.captured.get("emailField", Platform::Android).is_some());
    assert_eq!(report.pending.len(), 1);
    assert_eq!(report.pending[0].key, "checkoutButton");
    assert_eq!(
        backend.log(),
        vec![
            "set:0:user@example.com".to_string(),
            "click:1".to_string(),
            "quit".to_string(),
        ]
    );

    let pending = read_pending(&project.pending_file(&case.names)).expect("pending");
    assert_eq!(pending.len(), 1);

    let service = ScriptedGenerationService::new(&[&login_response(
        r#"{"loginButton":{"android":"//guess","ios":"~loginButton"},"checkoutButton":{"android":"//checkout"}}"#,
    )]);
    let written =
        generate_artifacts(&project, &case, &mut repository, &service).expect("generate");

    let paths = temp.paths();
    assert_eq!(written.spec, paths.spec_root.join("validate-login.spec.ts"));
    assert_eq!(written.page, paths.page_root.join("validate-login.page.ts"));
    assert_eq!(written.locators, paths.locator_root.join("validate-login.json"));

    let locators: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&written.locators).expect("read locators"))
            .expect("locator json");
    assert_eq!(
        locators["loginButton"]["android"],
        "//android.widget.Button[@content-desc='loginButton']"
    );
    assert_eq!(locators["loginButton"]["ios"], "~loginButton");
    assert_eq!(locators["checkoutButton"]["android"], "//checkout");
    assert!(locators["emailField"]["android"].is_string());

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    let instruction = &requests[0].instruction;
    assert!(instruction.contains("click(\"loginButton\")"));
    assert!(instruction.contains("checkoutButton"));
    assert!(instruction.contains("validate-login.page.ts"));

    let run_dir = paths.runs_dir().join("validate-login");
    for file in ["actions.json", "capture.json", "prompt.md", "response.txt"] {
        assert!(run_dir.join(file).is_file(), "missing run log {file}");
    }
}

#[test]
fn later_capture_clears_pending_entries() {
    let temp = TempProject::new().expect("temp project");
    let input = temp.write("cases/login.md", LOGIN_CASE).expect("write case");
    let project = project(&temp);
    let case = prepare_case(&input, false).expect("prepare");
    let mut repository = project.load_repository().expect("load repository");

    run_capture(&project, &case, &FakeBackend::new(login_screen()), &mut repository)
        .expect("first capture");
    let pending_file = project.pending_file(&case.names);
    assert!(pending_file.is_file());

    run_capture(&project, &case, &FakeBackend::new(checkout_screen()), &mut repository)
        .expect("second capture");
    assert!(!pending_file.exists());
    assert_eq!(
        repository.get("checkoutButton", Platform::Android),
        Some("//android.widget.Button[@content-desc='checkoutButton']")
    );
    // Earlier captures survive a run that no longer sees them.
    assert!(repository.get("loginButton", Platform::Android).is_some());
}

#[test]
fn contract_violation_leaves_response_and_writes_nothing() {
    let temp = TempProject::new().expect("temp project");
    let input = temp.write("cases/login.md", LOGIN_CASE).expect("write case");
    let project = project(&temp);
    let case = prepare_case(&input, false).expect("prepare");
    let mut repository = project.load_repository().expect("load repository");

    let service = ScriptedGenerationService::new(&["Sorry, I cannot help with that."]);
    let err = generate_artifacts(&project, &case, &mut repository, &service).unwrap_err();
    assert_eq!(exit_code_for(&err), exit_codes::CONTRACT);

    let paths = temp.paths();
    let response = paths.runs_dir().join("validate-login").join("response.txt");
    assert_eq!(
        fs::read_to_string(response).expect("response log"),
        "Sorry, I cannot help with that."
    );
    assert!(!paths.spec_root.join("validate-login.spec.ts").exists());
    assert!(!paths.page_root.join("validate-login.page.ts").exists());
    assert!(!paths.locator_root.join("validate-login.json").exists());
}

#[test]
fn missing_title_is_a_precondition_failure() {
    let temp = TempProject::new().expect("temp project");
    let input = temp
        .write("cases/untitled.md", "Steps:\n1. Tap Login button\n")
        .expect("write case");
    let err = prepare_case(&input, false).unwrap_err();
    assert_eq!(exit_code_for(&err), exit_codes::PRECONDITION);
}

#[test]
fn capture_without_device_fails_and_logs_report() {
    let temp = TempProject::new().expect("temp project");
    let input = temp.write("cases/login.md", LOGIN_CASE).expect("write case");
    let project = project(&temp);
    let case = prepare_case(&input, false).expect("prepare");
    let mut repository = project.load_repository().expect("load repository");

    let backend = FakeBackend::new(login_screen()).without_devices();
    let err = run_capture(&project, &case, &backend, &mut repository).unwrap_err();
    assert_eq!(exit_code_for(&err), exit_codes::PRECONDITION);
    assert!(backend.sessions().is_empty());

    let capture = temp
        .read(".scaffold/runs/validate-login/capture.json")
        .expect("capture log");
    let report: serde_json::Value = serde_json::from_str(&capture).expect("capture json");
    assert_eq!(report["state"]["state"], "failed");
    assert!(repository.merged().is_empty());
}

#[test]
fn synthesized_actions_can_be_persisted() {
    let temp = TempProject::new().expect("temp project");
    let input = temp
        .write(
            "cases/settings.md",
            "Title: Open Settings\nSteps:\n1. Tap Settings button\n2. Press Enter\n",
        )
        .expect("write case");

    let case = prepare_case(&input, true).expect("prepare");
    assert_eq!(case.source, ActionSource::Synthesized);

    let updated = temp.read("cases/settings.md").expect("read case");
    assert!(updated.starts_with("Title: Open Settings\nSteps:\n1. Tap Settings button\n2. Press Enter\n"));
    assert!(updated.contains("Actions:"));
    assert!(updated.contains("click(settingsButton)"));

    let reparsed = prepare_case(&input, true).expect("prepare again");
    assert_eq!(reparsed.source, ActionSource::Explicit);
    assert_eq!(reparsed.actions, case.actions);
    assert_eq!(temp.read("cases/settings.md").expect("read case"), updated);
}
