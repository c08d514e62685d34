//! Test-only fakes: an in-memory device, an automation backend around it, a
//! scripted generation service and a temporary project layout.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::capture::driver::{AutomationBackend, DeviceDriver, DriverError, DriverResult, ElementId};
use crate::core::capabilities::SessionCapabilities;
use crate::core::selector::{ElementQuery, attribute_names};
use crate::core::types::Platform;
use crate::error::ScaffoldError;
use crate::io::config::{PathsConfig, ProjectPaths, ScaffoldConfig};
use crate::io::oracle::{GenerationRequest, GenerationService};

/// One element of the fake UI tree.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub class_name: String,
    pub resource_id: Option<String>,
    pub content_desc: Option<String>,
    pub text: Option<String>,
    pub hint: Option<String>,
    pub displayed: bool,
    pub interactive: bool,
    /// Attribute reads fail as if the element went stale.
    pub stale: bool,
}

impl FakeElement {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            displayed: true,
            ..Self::default()
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn desc(mut self, desc: &str) -> Self {
        self.content_desc = Some(desc.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }

    fn matches(&self, query: &ElementQuery) -> bool {
        let eq = |field: &Option<String>, value: &str| field.as_deref() == Some(value);
        let contains = |field: &Option<String>, value: &str| {
            field
                .as_deref()
                .is_some_and(|field| field.to_lowercase().contains(&value.to_lowercase()))
        };
        match query {
            ElementQuery::DescriptionEquals(value) => eq(&self.content_desc, value),
            ElementQuery::IdEquals(value) => eq(&self.resource_id, value),
            ElementQuery::TextEquals(value) => eq(&self.text, value),
            ElementQuery::TextContains(value) => contains(&self.text, value),
            ElementQuery::DescriptionContains(value) => contains(&self.content_desc, value),
            ElementQuery::ClassWithText { class, text } => {
                self.class_name == *class && eq(&self.text, text)
            }
            ElementQuery::Interactive => self.interactive,
        }
    }
}

#[derive(Debug, Default)]
struct Journal {
    effects: Vec<String>,
    app: Vec<String>,
    /// Remaining `find_elements` calls that fail before queries succeed.
    find_failures: usize,
}

/// In-memory [`DeviceDriver`]. Clones share one journal of effects.
#[derive(Debug, Clone)]
pub struct FakeDriver {
    platform: Platform,
    elements: Vec<FakeElement>,
    unsupported: Vec<String>,
    failing_clicks: bool,
    failing_quit: bool,
    app_installed: bool,
    journal: Rc<RefCell<Journal>>,
}

impl FakeDriver {
    pub fn new(elements: Vec<FakeElement>) -> Self {
        Self {
            platform: Platform::Android,
            elements,
            unsupported: Vec::new(),
            failing_clicks: false,
            failing_quit: false,
            app_installed: true,
            journal: Rc::new(RefCell::new(Journal::default())),
        }
    }

    pub fn on_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Queries whose wire strategy is `using` report `Unsupported`.
    pub fn unsupported_query(mut self, using: &str) -> Self {
        self.unsupported.push(using.to_string());
        self
    }

    pub fn failing_clicks(mut self) -> Self {
        self.failing_clicks = true;
        self
    }

    pub fn failing_quit(mut self) -> Self {
        self.failing_quit = true;
        self
    }

    /// The next `count` element queries fail remotely.
    pub fn failing_finds(self, count: usize) -> Self {
        self.journal.borrow_mut().find_failures = count;
        self
    }

    pub fn without_app(mut self) -> Self {
        self.app_installed = false;
        self
    }

    pub fn id_of(&self, index: usize) -> ElementId {
        ElementId(index.to_string())
    }

    /// Effects performed so far: `click:<i>`, `clear:<i>`, `set:<i>:<value>`, `quit`.
    pub fn effects(&self) -> Vec<String> {
        self.journal.borrow().effects.clone()
    }

    /// App management calls: `install:<path>`, `activate:<id>`.
    pub fn app_calls(&self) -> Vec<String> {
        self.journal.borrow().app.clone()
    }

    fn element(&self, id: &ElementId, operation: &'static str) -> DriverResult<&FakeElement> {
        id.0.parse::<usize>()
            .ok()
            .and_then(|index| self.elements.get(index))
            .ok_or_else(|| DriverError::failed(operation, format!("stale element {}", id.0)))
    }

    fn record(&self, effect: String) {
        self.journal.borrow_mut().effects.push(effect);
    }
}

impl DeviceDriver for FakeDriver {
    fn find_elements(&mut self, query: &ElementQuery) -> DriverResult<Vec<ElementId>> {
        {
            let mut journal = self.journal.borrow_mut();
            if journal.find_failures > 0 {
                journal.find_failures -= 1;
                return Err(DriverError::failed("find elements", "instrumentation not ready"));
            }
        }
        let using = query.to_wire(self.platform).using;
        if self.unsupported.iter().any(|strategy| strategy == using) {
            return Err(DriverError::Unsupported {
                operation: "find elements",
            });
        }
        Ok(self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.matches(query))
            .map(|(index, _)| self.id_of(index))
            .collect())
    }

    fn is_displayed(&mut self, element: &ElementId) -> DriverResult<bool> {
        Ok(self.element(element, "is displayed")?.displayed)
    }

    fn attribute(&mut self, element: &ElementId, name: &str) -> DriverResult<Option<String>> {
        let el = self.element(element, "get attribute")?;
        if el.stale {
            return Err(DriverError::failed("get attribute", "stale element reference"));
        }
        let names = attribute_names(self.platform);
        let value = if name == names.class_name {
            Some(el.class_name.clone())
        } else if name == names.resource_id {
            el.resource_id.clone()
        } else if name == names.content_desc {
            el.content_desc.clone()
        } else if name == names.text {
            el.text.clone()
        } else if name == names.hint {
            el.hint.clone()
        } else {
            None
        };
        Ok(value)
    }

    fn click(&mut self, element: &ElementId) -> DriverResult<()> {
        self.element(element, "click")?;
        if self.failing_clicks {
            return Err(DriverError::failed("click", "element click intercepted"));
        }
        self.record(format!("click:{}", element.0));
        Ok(())
    }

    fn clear(&mut self, element: &ElementId) -> DriverResult<()> {
        self.element(element, "clear")?;
        Err(DriverError::Unsupported { operation: "clear" })
    }

    fn set_value(&mut self, element: &ElementId, value: &str) -> DriverResult<()> {
        self.element(element, "set value")?;
        self.record(format!("set:{}:{value}", element.0));
        Ok(())
    }

    fn is_app_installed(&mut self, _app_id: &str) -> DriverResult<bool> {
        Ok(self.app_installed)
    }

    fn activate_app(&mut self, app_id: &str) -> DriverResult<()> {
        self.journal.borrow_mut().app.push(format!("activate:{app_id}"));
        Ok(())
    }

    fn install_app(&mut self, app_path: &Path) -> DriverResult<()> {
        self.journal
            .borrow_mut()
            .app
            .push(format!("install:{}", app_path.display()));
        self.app_installed = true;
        Ok(())
    }

    fn quit(&mut self) -> DriverResult<()> {
        self.record("quit".to_string());
        if self.failing_quit {
            return Err(DriverError::failed("delete session", "session already gone"));
        }
        Ok(())
    }
}

/// [`AutomationBackend`] handing out clones of one [`FakeDriver`].
#[derive(Debug)]
pub struct FakeBackend {
    driver: FakeDriver,
    devices: Vec<String>,
    reachable: bool,
    sessions: RefCell<Vec<SessionCapabilities>>,
}

impl FakeBackend {
    pub fn new(driver: FakeDriver) -> Self {
        Self {
            driver,
            devices: vec!["emulator-5554".to_string()],
            reachable: true,
            sessions: RefCell::new(Vec::new()),
        }
    }

    pub fn without_devices(mut self) -> Self {
        self.devices.clear();
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Driver effects across every session, in order.
    pub fn log(&self) -> Vec<String> {
        self.driver.effects()
    }

    pub fn app_log(&self) -> Vec<String> {
        self.driver.app_calls()
    }

    /// Capabilities of every session started.
    pub fn sessions(&self) -> Vec<SessionCapabilities> {
        self.sessions.borrow().clone()
    }
}

impl AutomationBackend for FakeBackend {
    type Driver = FakeDriver;

    fn endpoint(&self) -> &str {
        "fake://appium"
    }

    fn check_endpoint(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(ScaffoldError::EndpointUnreachable {
                endpoint: self.endpoint().to_string(),
                reason: "connection refused".to_string(),
            }
            .into())
        }
    }

    fn online_devices(&self, _platform: Platform) -> Result<Vec<String>> {
        Ok(self.devices.clone())
    }

    fn start_session(&self, capabilities: &SessionCapabilities) -> Result<FakeDriver> {
        self.sessions.borrow_mut().push(capabilities.clone());
        Ok(self.driver.clone().on_platform(capabilities.platform()))
    }
}

/// [`GenerationService`] returning canned responses in order.
#[derive(Debug, Default)]
pub struct ScriptedGenerationService {
    responses: RefCell<Vec<String>>,
    requests: RefCell<Vec<GenerationRequest>>,
}

impl ScriptedGenerationService {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: RefCell::new(responses.iter().rev().map(|r| r.to_string()).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.borrow().clone()
    }
}

impl GenerationService for ScriptedGenerationService {
    fn complete(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop()
            .ok_or_else(|| anyhow!("no scripted response left"))
    }
}

/// A well-formed response for the "Validate Login" case.
pub fn login_response(locators_content: &str) -> String {
    serde_json::json!({
        "specPath": "test/specs/validate-login.spec.ts",
        "specContent": "import ValidateLoginPage from '../../src/pages/validate-login.page';\n\ndescribe('Validate Login', () => {\n  it('logs in', async () => {\n    await ValidateLoginPage.run();\n  });\n});\n",
        "pagePath": "src/pages/validate-login.page.ts",
        "pageContent": "class ValidateLoginPage {\n  async run() {}\n}\nexport default new ValidateLoginPage();\n",
        "locatorsPath": "src/object-repository/validate-login.json",
        "locatorsContent": locators_content,
    })
    .to_string()
}

/// A throwaway project directory with the default layout.
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> ProjectPaths {
        ProjectPaths::new(self.root(), &PathsConfig::default())
    }

    /// Config with zero pauses and short waits, for fast capture runs.
    pub fn config(&self) -> ScaffoldConfig {
        let mut config = ScaffoldConfig::default();
        config.device.app_id = Some("com.example.app".to_string());
        config.device.step_pause_ms = 0;
        config.device.wait_timeout_ms = 50;
        config.device.poll_interval_ms = 5;
        config
    }

    /// Write a file relative to the project root, creating parents.
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        Ok(fs::read_to_string(self.root().join(relative))?)
    }
}
