//! Capture session: drive one live device session through a list of actions
//! and record the selectors of every element it touches.
//!
//! States run `Idle → SessionStarting → AppResolution → Ready →
//! ExecutingAction(i) → Completed | Failed`. Preconditions (endpoint up, a
//! device online) are checked while still `Idle`. Per-action errors, a
//! failed locator write included, never leave the action loop; the session
//! is always quit before an error is returned.

use std::fmt;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::capture::driver::{AutomationBackend, DeviceDriver, DriverError, DriverResult};
use crate::capture::resolver::{Resolution, ResolutionStrategy, read_attributes, resolve_element};
use crate::core::capabilities::SessionCapabilities;
use crate::core::locator_set::LocatorSet;
use crate::core::selector::{ElementAttributes, SelectorAnchor, synthesize_selector};
use crate::core::types::{Action, ActionVerb, Platform};
use crate::error::ScaffoldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "index")]
pub enum CaptureState {
    Idle,
    SessionStarting,
    AppResolution,
    Ready,
    ExecutingAction(usize),
    Completed,
    Failed,
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureState::Idle => f.write_str("idle"),
            CaptureState::SessionStarting => f.write_str("session-starting"),
            CaptureState::AppResolution => f.write_str("app-resolution"),
            CaptureState::Ready => f.write_str("ready"),
            CaptureState::ExecutingAction(index) => write!(f, "executing-action({index})"),
            CaptureState::Completed => f.write_str("completed"),
            CaptureState::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Default wait for `waitUntilVisible` when the action has no timeout.
    pub wait_timeout: Duration,
    /// Pause after every action.
    pub step_pause: Duration,
    /// Delay between resolution attempts while waiting for an element.
    pub poll_interval: Duration,
    /// Local app package installed when the app is missing on the device.
    pub app_path: Option<PathBuf>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_millis(20_000),
            step_pause: Duration::from_millis(500),
            poll_interval: Duration::from_millis(250),
            app_path: None,
        }
    }
}

/// Where freshly captured selectors go as soon as they are known.
pub trait LocatorSink {
    fn record(&mut self, key: &str, platform: Platform, selector: &str) -> Result<()>;
}

impl LocatorSink for LocatorSet {
    fn record(&mut self, key: &str, platform: Platform, selector: &str) -> Result<()> {
        self.insert(key, platform, selector);
        Ok(())
    }
}

/// A locator key the session could not resolve on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLocator {
    pub key: String,
    pub platform: Platform,
    pub reason: String,
}

/// Outcome of one action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    pub index: usize,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<SelectorAnchor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ResolutionStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<ElementAttributes>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaptureResult {
    fn new(index: usize, action: &Action) -> Self {
        Self {
            index,
            action: action.clone(),
            selector: None,
            anchor: None,
            strategy: None,
            attributes: None,
            success: false,
            error: None,
        }
    }
}

/// Everything a session produced, complete or partial.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReport {
    pub platform: Platform,
    pub state: CaptureState,
    pub transitions: Vec<CaptureState>,
    pub results: Vec<CaptureResult>,
    /// Selectors captured in this session, by key.
    #[serde(serialize_with = "serialize_locators")]
    pub captured: LocatorSet,
    pub pending: Vec<PendingLocator>,
    pub warnings: Vec<String>,
}

fn serialize_locators<S: serde::Serializer>(set: &LocatorSet, serializer: S) -> Result<S::Ok, S::Error> {
    set.to_json_value().serialize(serializer)
}

impl CaptureReport {
    fn new(platform: Platform) -> Self {
        Self {
            platform,
            state: CaptureState::Idle,
            transitions: vec![CaptureState::Idle],
            results: Vec::new(),
            captured: LocatorSet::new(),
            pending: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|result| result.success).count()
    }
}

pub struct CaptureSession<'a, B: AutomationBackend> {
    backend: &'a B,
    capabilities: SessionCapabilities,
    options: CaptureOptions,
    report: CaptureReport,
}

impl<'a, B: AutomationBackend> CaptureSession<'a, B> {
    pub fn new(backend: &'a B, capabilities: SessionCapabilities, options: CaptureOptions) -> Self {
        let report = CaptureReport::new(capabilities.platform());
        Self {
            backend,
            capabilities,
            options,
            report,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.report.state
    }

    pub fn report(&self) -> &CaptureReport {
        &self.report
    }

    pub fn into_report(self) -> CaptureReport {
        self.report
    }

    fn platform(&self) -> Platform {
        self.capabilities.platform()
    }

    fn transition(&mut self, next: CaptureState) {
        debug!(from = %self.report.state, to = %next, "capture state");
        self.report.state = next;
        self.report.transitions.push(next);
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.report.warnings.push(message);
    }

    /// Run every action in order. The report stays available afterwards,
    /// whatever the outcome.
    #[instrument(skip_all, fields(platform = %self.platform(), actions = actions.len()))]
    pub fn run(&mut self, actions: &[Action], sink: &mut dyn LocatorSink) -> Result<()> {
        if let Err(err) = self.check_preconditions() {
            self.transition(CaptureState::Failed);
            return Err(err);
        }

        self.transition(CaptureState::SessionStarting);
        let mut driver = match self
            .backend
            .start_session(&self.capabilities)
            .with_context(|| format!("start automation session at {}", self.backend.endpoint()))
        {
            Ok(driver) => driver,
            Err(err) => {
                self.transition(CaptureState::Failed);
                return Err(err);
            }
        };

        self.drive(&mut driver, actions, sink);

        if let Err(err) = driver.quit() {
            self.warn(format!("session teardown failed: {err}"));
        }

        self.transition(CaptureState::Completed);
        info!(
            succeeded = self.report.succeeded(),
            total = actions.len(),
            captured = self.report.captured.len(),
            pending = self.report.pending.len(),
            "capture finished"
        );
        Ok(())
    }

    fn check_preconditions(&self) -> Result<()> {
        self.backend.check_endpoint()?;
        let platform = self.platform();
        let devices = self
            .backend
            .online_devices(platform)
            .map_err(|err| ScaffoldError::NoDevice {
                platform,
                detail: format!("{err:#}"),
            })?;
        if devices.is_empty() {
            return Err(ScaffoldError::NoDevice {
                platform,
                detail: "no device or simulator is online".to_string(),
            }
            .into());
        }
        debug!(devices = ?devices, "devices online");
        Ok(())
    }

    fn drive(&mut self, driver: &mut B::Driver, actions: &[Action], sink: &mut dyn LocatorSink) {
        self.transition(CaptureState::AppResolution);
        self.resolve_app(driver);
        self.transition(CaptureState::Ready);

        for (index, action) in actions.iter().enumerate() {
            self.transition(CaptureState::ExecutingAction(index));
            let result = self.execute(driver, index, action, sink);
            self.report.results.push(result);
            if !self.options.step_pause.is_zero() {
                thread::sleep(self.options.step_pause);
            }
        }
    }

    /// Foreground the app, installing it first when missing and a package
    /// is available. Never fails the session.
    fn resolve_app(&mut self, driver: &mut B::Driver) {
        let Some(app_id) = self.capabilities.app_id().map(str::to_string) else {
            self.warn("no app id configured; capturing against the current foreground app".to_string());
            return;
        };

        let installed = match driver.is_app_installed(&app_id) {
            Ok(installed) => installed,
            Err(err) => {
                self.warn(format!("could not check whether {app_id} is installed: {err}"));
                return;
            }
        };

        if !installed {
            match self.options.app_path.clone() {
                Some(path) => {
                    info!(app_id = %app_id, path = %path.display(), "installing app");
                    if let Err(err) = driver.install_app(&path) {
                        self.warn(format!("install of {} failed: {err}", path.display()));
                        return;
                    }
                }
                None => {
                    self.warn(format!(
                        "{app_id} is not installed and no app package path was given; continuing without install"
                    ));
                    return;
                }
            }
        }

        if let Err(err) = driver.activate_app(&app_id) {
            self.warn(format!("could not foreground {app_id}: {err}"));
        }
    }

    /// Execute one action. Every failure ends up in the result.
    fn execute(
        &mut self,
        driver: &mut B::Driver,
        index: usize,
        action: &Action,
        sink: &mut dyn LocatorSink,
    ) -> CaptureResult {
        let mut result = CaptureResult::new(index, action);

        if !action.verb.targets_element() {
            debug!(index, key = %action.target, "keypress is a pacing step");
            result.success = true;
            return result;
        }

        let platform = self.platform();
        let key = action.target.as_str();
        let resolution = match action.verb {
            ActionVerb::WaitUntilVisible => self.wait_for(driver, action),
            _ => resolve_element(driver, platform, key),
        };

        let resolution = match resolution {
            Ok(Some(resolution)) => resolution,
            Ok(None) => {
                let reason = match action.verb {
                    ActionVerb::WaitUntilVisible => {
                        format!("not visible within {}ms", self.wait_timeout(action).as_millis())
                    }
                    _ => "no displayed element matched".to_string(),
                };
                warn!(index, key, reason = %reason, "element not found, skipping");
                self.mark_pending(key, &reason);
                result.error = Some(reason);
                return result;
            }
            Err(err) => {
                warn!(index, key, error = %err, "resolution failed, skipping");
                let reason = format!("resolution failed: {err}");
                self.mark_pending(key, &reason);
                result.error = Some(reason);
                return result;
            }
        };
        result.strategy = Some(resolution.strategy);

        let attributes = match read_attributes(driver, platform, &resolution.element) {
            Ok(attributes) => attributes,
            Err(err) => {
                warn!(index, key, error = %err, "attribute snapshot failed, skipping");
                let reason = format!("attribute snapshot failed: {err}");
                self.mark_pending(key, &reason);
                result.error = Some(reason);
                return result;
            }
        };

        match synthesize_selector(platform, &attributes) {
            Some(selector) => {
                match sink.record(key, platform, &selector.expression) {
                    Ok(()) => {
                        self.report.captured.insert(key, platform, &selector.expression);
                        self.clear_pending(key);
                    }
                    Err(err) => {
                        let reason = format!("locator write failed: {err:#}");
                        self.warn(format!("{key}: {reason}"));
                        self.mark_pending(key, &reason);
                        result.error = Some(reason);
                    }
                }
                result.selector = Some(selector.expression);
                result.anchor = Some(selector.anchor);
            }
            None => warn!(index, key, "element exposes no identifying attribute"),
        }
        result.attributes = Some(attributes);

        match perform(driver, action, &resolution) {
            Ok(()) => result.success = true,
            Err(err) => {
                warn!(index, key, error = %err, "action failed, continuing");
                result.error = Some(err.to_string());
            }
        }
        result
    }

    fn wait_timeout(&self, action: &Action) -> Duration {
        action
            .first_param()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map_or(self.options.wait_timeout, Duration::from_millis)
    }

    /// Resolve repeatedly until the element shows up or the timeout expires.
    /// Remote errors count as "not yet"; the last one is returned only when
    /// the final attempt failed.
    fn wait_for(&self, driver: &mut B::Driver, action: &Action) -> DriverResult<Option<Resolution>> {
        let deadline = Instant::now() + self.wait_timeout(action);
        loop {
            let last_error = match resolve_element(driver, self.platform(), &action.target) {
                Ok(Some(found)) => return Ok(Some(found)),
                Ok(None) => None,
                Err(err) => {
                    debug!(key = %action.target, error = %err, "resolution failed while waiting, retrying");
                    Some(err)
                }
            };
            let now = Instant::now();
            if now >= deadline {
                return last_error.map_or(Ok(None), Err);
            }
            thread::sleep(self.options.poll_interval.min(deadline - now));
        }
    }

    fn mark_pending(&mut self, key: &str, reason: &str) {
        let platform = self.platform();
        if self.report.captured.contains(key, platform)
            || self.report.pending.iter().any(|pending| pending.key == key)
        {
            return;
        }
        self.report.pending.push(PendingLocator {
            key: key.to_string(),
            platform,
            reason: reason.to_string(),
        });
    }

    fn clear_pending(&mut self, key: &str) {
        self.report.pending.retain(|pending| pending.key != key);
    }
}

/// Apply an action's effect to a resolved element.
fn perform<D: DeviceDriver + ?Sized>(
    driver: &mut D,
    action: &Action,
    resolution: &Resolution,
) -> DriverResult<()> {
    let element = &resolution.element;
    match action.verb {
        ActionVerb::Click | ActionVerb::FallbackClick => driver.click(element),
        ActionVerb::SetValue => {
            match driver.clear(element) {
                Ok(()) | Err(DriverError::Unsupported { .. }) => {}
                Err(err) => return Err(err),
            }
            driver.set_value(element, action.first_param().unwrap_or_default())
        }
        ActionVerb::WaitUntilVisible => Ok(()),
        ActionVerb::IsVisible => {
            if driver.is_displayed(element)? {
                Ok(())
            } else {
                Err(DriverError::failed("is visible", "element is not displayed"))
            }
        }
        ActionVerb::Keypress => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capabilities::AndroidCapabilities;
    use crate::test_support::{FakeBackend, FakeDriver, FakeElement};

    fn caps(app: Option<&str>) -> SessionCapabilities {
        SessionCapabilities::Android(AndroidCapabilities {
            app_package: app.map(str::to_string),
            ..AndroidCapabilities::default()
        })
    }

    fn fast() -> CaptureOptions {
        CaptureOptions {
            wait_timeout: Duration::from_millis(30),
            step_pause: Duration::ZERO,
            poll_interval: Duration::from_millis(5),
            app_path: None,
        }
    }

    fn login_screen() -> FakeDriver {
        FakeDriver::new(vec![
            FakeElement::new("android.widget.EditText").id("com.app:id/email_field").hint("Email").interactive(),
            FakeElement::new("android.widget.Button").desc("loginButton").text("LOGIN"),
            FakeElement::new("android.view.ViewGroup").desc("formScreen"),
        ])
    }

    #[test]
    fn captures_selectors_in_action_order() {
        let backend = FakeBackend::new(login_screen());
        let actions = vec![
            Action::new(ActionVerb::Click, "loginButton"),
            Action::new(ActionVerb::WaitUntilVisible, "formScreen").with_param("20000"),
        ];
        let mut sink = LocatorSet::new();
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        session.run(&actions, &mut sink).expect("run");
        let report = session.into_report();

        assert_eq!(report.state, CaptureState::Completed);
        assert_eq!(report.results.len(), 2);
        assert!(report.results.iter().all(|result| result.success));
        assert_eq!(
            sink.get("loginButton", Platform::Android),
            Some("//android.widget.Button[@content-desc='loginButton']")
        );
        assert_eq!(
            sink.get("formScreen", Platform::Android),
            Some("//android.view.ViewGroup[@content-desc='formScreen']")
        );
        assert_eq!(backend.log(), vec!["click:1".to_string(), "quit".to_string()]);
    }

    #[test]
    fn transitions_follow_the_state_machine() {
        let backend = FakeBackend::new(login_screen());
        let actions = vec![Action::new(ActionVerb::Click, "loginButton")];
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        session.run(&actions, &mut LocatorSet::new()).expect("run");
        assert_eq!(
            session.report().transitions,
            vec![
                CaptureState::Idle,
                CaptureState::SessionStarting,
                CaptureState::AppResolution,
                CaptureState::Ready,
                CaptureState::ExecutingAction(0),
                CaptureState::Completed,
            ]
        );
    }

    #[test]
    fn misses_are_pending_and_do_not_stop_the_loop() {
        let backend = FakeBackend::new(login_screen());
        let actions = vec![
            Action::new(ActionVerb::Click, "checkoutButton"),
            Action::new(ActionVerb::SetValue, "emailField").with_param("a@b.c"),
        ];
        let mut sink = LocatorSet::new();
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        session.run(&actions, &mut sink).expect("run");
        let report = session.into_report();

        assert!(!report.results[0].success);
        assert!(report.results[1].success);
        assert_eq!(report.pending.len(), 1);
        assert_eq!(report.pending[0].key, "checkoutButton");
        assert!(!sink.contains("checkoutButton", Platform::Android));
        assert!(backend.log().contains(&"set:0:a@b.c".to_string()));
    }

    #[test]
    fn remote_failure_is_recorded_and_skipped() {
        let backend = FakeBackend::new(login_screen().failing_clicks());
        let actions = vec![
            Action::new(ActionVerb::Click, "loginButton"),
            Action::new(ActionVerb::IsVisible, "formScreen"),
        ];
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        session.run(&actions, &mut LocatorSet::new()).expect("run");
        let report = session.into_report();
        assert!(!report.results[0].success);
        assert!(report.results[0].selector.is_some());
        assert!(report.results[1].success);
    }

    #[test]
    fn missing_device_is_fatal_before_session_start() {
        let backend = FakeBackend::new(login_screen()).without_devices();
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        let err = session.run(&[], &mut LocatorSet::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScaffoldError>(),
            Some(ScaffoldError::NoDevice { .. })
        ));
        assert_eq!(session.state(), CaptureState::Failed);
        assert!(backend.log().is_empty());
    }

    #[test]
    fn unreachable_endpoint_is_fatal() {
        let backend = FakeBackend::new(login_screen()).unreachable();
        let mut session = CaptureSession::new(&backend, caps(None), fast());
        let err = session.run(&[], &mut LocatorSet::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScaffoldError>(),
            Some(ScaffoldError::EndpointUnreachable { .. })
        ));
    }

    #[test]
    fn missing_app_is_installed_from_package() {
        let backend = FakeBackend::new(login_screen().without_app());
        let options = CaptureOptions {
            app_path: Some(PathBuf::from("/builds/app.apk")),
            ..fast()
        };
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), options);
        session.run(&[], &mut LocatorSet::new()).expect("run");
        assert_eq!(
            backend.app_log(),
            vec!["install:/builds/app.apk".to_string(), "activate:com.app".to_string()]
        );
        assert!(session.report().warnings.is_empty());
    }

    #[test]
    fn missing_app_without_package_only_warns() {
        let backend = FakeBackend::new(login_screen().without_app());
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        session.run(&[], &mut LocatorSet::new()).expect("run");
        assert!(backend.app_log().is_empty());
        assert_eq!(session.report().warnings.len(), 1);
        assert_eq!(session.state(), CaptureState::Completed);
    }

    struct BrokenSink;

    impl LocatorSink for BrokenSink {
        fn record(&mut self, _key: &str, _platform: Platform, _selector: &str) -> Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }
    }

    #[test]
    fn sink_failure_is_recorded_and_the_loop_continues() {
        let backend = FakeBackend::new(login_screen());
        let actions = vec![
            Action::new(ActionVerb::Click, "loginButton"),
            Action::new(ActionVerb::SetValue, "emailField").with_param("a@b.c"),
        ];
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        session.run(&actions, &mut BrokenSink).expect("run");
        let report = session.into_report();

        assert_eq!(report.state, CaptureState::Completed);
        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].error.as_deref().is_some_and(|e| e.contains("disk full")));
        assert!(report.captured.is_empty());
        let pending: Vec<&str> = report.pending.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(pending, vec!["loginButton", "emailField"]);
        assert!(report.warnings.iter().any(|w| w.contains("disk full")));
        assert_eq!(
            backend.log(),
            vec!["click:1".to_string(), "set:0:a@b.c".to_string(), "quit".to_string()]
        );
    }

    #[test]
    fn wait_polls_through_remote_errors() {
        let backend = FakeBackend::new(login_screen().failing_finds(2));
        let actions = vec![Action::new(ActionVerb::WaitUntilVisible, "formScreen").with_param("2000")];
        let mut sink = LocatorSet::new();
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        session.run(&actions, &mut sink).expect("run");
        let report = session.into_report();
        assert!(report.results[0].success);
        assert!(report.pending.is_empty());
        assert!(sink.get("formScreen", Platform::Android).is_some());
    }

    #[test]
    fn resolution_errors_become_pending() {
        let backend = FakeBackend::new(login_screen().failing_finds(1));
        let actions = vec![
            Action::new(ActionVerb::Click, "loginButton"),
            Action::new(ActionVerb::Click, "loginButton"),
        ];
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        let mut sink = LocatorSet::new();
        session.run(&actions, &mut sink).expect("run");
        let report = session.report();
        assert!(!report.results[0].success);
        assert!(
            report.results[0]
                .error
                .as_deref()
                .is_some_and(|e| e.contains("instrumentation not ready"))
        );
        // The retry on the next action resolves the key and clears the entry.
        assert!(report.results[1].success);
        assert!(report.pending.is_empty());
    }

    #[test]
    fn unresolved_errors_stay_pending() {
        let backend = FakeBackend::new(login_screen().failing_finds(1));
        let actions = vec![Action::new(ActionVerb::Click, "loginButton")];
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        session.run(&actions, &mut LocatorSet::new()).expect("run");
        let pending = &session.report().pending;
        assert_eq!(pending.len(), 1);
        assert!(pending[0].reason.starts_with("resolution failed"));
    }

    #[test]
    fn teardown_failure_is_a_warning() {
        let backend = FakeBackend::new(login_screen().failing_quit());
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        session.run(&[], &mut LocatorSet::new()).expect("run");
        assert_eq!(session.state(), CaptureState::Completed);
        assert!(session.report().warnings.iter().any(|w| w.contains("teardown")));
    }

    #[test]
    fn wait_times_out_into_pending() {
        let backend = FakeBackend::new(login_screen());
        let actions = vec![Action::new(ActionVerb::WaitUntilVisible, "successBanner").with_param("20")];
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        session.run(&actions, &mut LocatorSet::new()).expect("run");
        let report = session.into_report();
        assert_eq!(report.pending[0].reason, "not visible within 20ms");
    }

    #[test]
    fn keypress_needs_no_element() {
        let backend = FakeBackend::new(login_screen());
        let actions = vec![Action::new(ActionVerb::Keypress, "enter")];
        let mut session = CaptureSession::new(&backend, caps(Some("com.app")), fast());
        session.run(&actions, &mut LocatorSet::new()).expect("run");
        assert!(session.report().results[0].success);
    }
}
