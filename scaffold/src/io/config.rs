//! Project configuration stored in `scaffold.toml` at the project root.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::capabilities::{AndroidCapabilities, IosCapabilities, SessionCapabilities};
use crate::core::types::Platform;

pub const CONFIG_FILE_NAME: &str = "scaffold.toml";

/// Scaffolder configuration (TOML).
///
/// Every section is optional; missing fields fall back to defaults that match
/// a stock WebdriverIO + Appium project layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScaffoldConfig {
    pub paths: PathsConfig,
    pub generation: GenerationConfig,
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// Logical root for generated spec files.
    pub spec_root: String,
    /// Logical root for generated page objects.
    pub page_root: String,
    /// Directory holding locator JSON files.
    pub locator_root: String,
    /// Scaffolder-owned state (pending locators, run logs).
    pub state_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            spec_root: "test/specs".to_string(),
            page_root: "src/pages".to_string(),
            locator_root: "src/object-repository".to_string(),
            state_dir: ".scaffold".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible API.
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub prompt_budget_bytes: usize,
    /// Maximum exemplars per kind (spec, page).
    pub exemplar_limit: usize,
    pub exemplar_max_bytes: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
            temperature: 0.2,
            prompt_budget_bytes: 60_000,
            exemplar_limit: 2,
            exemplar_max_bytes: 6_000,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeviceConfig {
    pub platform: Platform,
    /// Appium server base URL.
    pub endpoint: String,
    pub device_name: Option<String>,
    pub platform_version: Option<String>,
    /// Android package or iOS bundle id of the app under test.
    pub app_id: Option<String>,
    /// Android launch activity.
    pub app_activity: Option<String>,
    /// Local app binary installed when the app is missing from the device.
    pub app_path: Option<PathBuf>,
    pub no_reset: bool,
    pub request_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub wait_timeout_ms: u64,
    pub step_pause_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Android,
            endpoint: "http://127.0.0.1:4723".to_string(),
            device_name: None,
            platform_version: None,
            app_id: None,
            app_activity: None,
            app_path: None,
            no_reset: true,
            request_timeout_secs: 30,
            probe_timeout_secs: 15,
            wait_timeout_ms: 20_000,
            step_pause_ms: 500,
            poll_interval_ms: 250,
        }
    }
}

impl DeviceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Capabilities for the configured platform.
    pub fn capabilities(&self) -> SessionCapabilities {
        match self.platform {
            Platform::Android => {
                let defaults = AndroidCapabilities::default();
                SessionCapabilities::Android(AndroidCapabilities {
                    device_name: self.device_name.clone().unwrap_or(defaults.device_name),
                    platform_version: self.platform_version.clone(),
                    app_package: self.app_id.clone(),
                    app_activity: self.app_activity.clone(),
                    no_reset: self.no_reset,
                    auto_grant_permissions: defaults.auto_grant_permissions,
                })
            }
            Platform::Ios => {
                let defaults = IosCapabilities::default();
                SessionCapabilities::Ios(IosCapabilities {
                    device_name: self.device_name.clone().unwrap_or(defaults.device_name),
                    platform_version: self.platform_version.clone(),
                    bundle_id: self.app_id.clone(),
                    no_reset: self.no_reset,
                })
            }
        }
    }
}

impl ScaffoldConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("paths.spec_root", &self.paths.spec_root),
            ("paths.page_root", &self.paths.page_root),
            ("paths.locator_root", &self.paths.locator_root),
            ("paths.state_dir", &self.paths.state_dir),
            ("generation.endpoint", &self.generation.endpoint),
            ("generation.model", &self.generation.model),
            ("generation.api_key_env", &self.generation.api_key_env),
            ("device.endpoint", &self.device.endpoint),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("{name} must not be empty"));
            }
        }
        if self.generation.timeout_secs == 0 {
            return Err(anyhow!("generation.timeout_secs must be > 0"));
        }
        if self.generation.prompt_budget_bytes == 0 {
            return Err(anyhow!("generation.prompt_budget_bytes must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(anyhow!("generation.temperature must be within 0.0..=2.0"));
        }
        if self.device.request_timeout_secs == 0 {
            return Err(anyhow!("device.request_timeout_secs must be > 0"));
        }
        if self.device.probe_timeout_secs == 0 {
            return Err(anyhow!("device.probe_timeout_secs must be > 0"));
        }
        if self.device.wait_timeout_ms == 0 {
            return Err(anyhow!("device.wait_timeout_ms must be > 0"));
        }
        if self.device.poll_interval_ms == 0 {
            return Err(anyhow!("device.poll_interval_ms must be > 0"));
        }
        Ok(())
    }

    /// Apply environment overrides through `lookup` (usually `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(model) = get("OPENAI_MODEL") {
            self.generation.model = model;
        }
        if let Some(platform) = get("PLATFORM") {
            self.device.platform = platform.parse().context("PLATFORM")?;
        }
        if let Some(endpoint) = get("APPIUM_URL") {
            self.device.endpoint = endpoint;
        }
        if let Some(device_name) = get("DEVICE_NAME") {
            self.device.device_name = Some(device_name);
        }
        if let Some(app_id) = get("APP_ID") {
            self.device.app_id = Some(app_id);
        }
        if let Some(app_path) = get("APP_PATH") {
            self.device.app_path = Some(PathBuf::from(app_path));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ScaffoldConfig::default()`.
pub fn load_config(path: &Path) -> Result<ScaffoldConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ScaffoldConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ScaffoldConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Load `scaffold.toml` from a project root and apply process environment overrides.
pub fn load_project_config(project_root: &Path) -> Result<ScaffoldConfig> {
    let mut cfg = load_config(&project_root.join(CONFIG_FILE_NAME))?;
    cfg.apply_env(|name| std::env::var(name).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

/// Absolute directories derived from [`PathsConfig`] for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub spec_root: PathBuf,
    pub page_root: PathBuf,
    pub locator_root: PathBuf,
    pub state_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: &Path, paths: &PathsConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            spec_root: root.join(&paths.spec_root),
            page_root: root.join(&paths.page_root),
            locator_root: root.join(&paths.locator_root),
            state_dir: root.join(&paths.state_dir),
        }
    }

    pub fn pending_dir(&self) -> PathBuf {
        self.state_dir.join("pending")
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.state_dir.join("runs")
    }
}
