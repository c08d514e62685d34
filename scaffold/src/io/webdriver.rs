//! Blocking W3C WebDriver client with the Appium device extensions.
//!
//! [`AppiumBackend`] implements [`AutomationBackend`] and hands out
//! [`AppiumSession`]s implementing [`DeviceDriver`]. Every remote error is
//! mapped to [`DriverError`]: unknown commands become `Unsupported`, the
//! rest `Failed`.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Method;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::capture::driver::{
    AutomationBackend, DeviceDriver, DriverError, DriverResult, ElementId,
};
use crate::core::capabilities::SessionCapabilities;
use crate::core::selector::ElementQuery;
use crate::core::types::Platform;
use crate::error::ScaffoldError;
use crate::io::devices;

/// W3C element reference key.
const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
/// Legacy JSONWP element reference key still sent by older servers.
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

const UNSUPPORTED_ERRORS: &[&str] = &["unknown command", "unknown method", "unsupported operation"];

/// Connection to an Appium server.
pub struct AppiumBackend {
    endpoint: String,
    client: Client,
    probe_timeout: Duration,
}

impl AppiumBackend {
    pub fn new(endpoint: &str, request_timeout: Duration, probe_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("build webdriver http client")?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            probe_timeout,
        })
    }
}

impl AutomationBackend for AppiumBackend {
    type Driver = AppiumSession;

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    fn check_endpoint(&self) -> Result<()> {
        let unreachable = |reason: String| ScaffoldError::EndpointUnreachable {
            endpoint: self.endpoint.clone(),
            reason,
        };
        let response = self
            .client
            .get(format!("{}/status", self.endpoint))
            .send()
            .map_err(|err| unreachable(err.to_string()))?;
        if !response.status().is_success() {
            return Err(unreachable(format!("status probe returned {}", response.status())).into());
        }
        debug!("automation endpoint is up");
        Ok(())
    }

    fn online_devices(&self, platform: Platform) -> Result<Vec<String>> {
        devices::online_devices(platform, self.probe_timeout)
    }

    #[instrument(skip_all, fields(platform = %capabilities.platform()))]
    fn start_session(&self, capabilities: &SessionCapabilities) -> Result<AppiumSession> {
        let response = self
            .client
            .post(format!("{}/session", self.endpoint))
            .json(&capabilities.to_wire())
            .send()
            .context("send new-session request")?;
        let status = response.status();
        let body: Value = response.json().context("decode new-session response")?;
        if !status.is_success() {
            return Err(anyhow!(
                "session start rejected ({status}): {}",
                error_message(&body)
            ));
        }
        let session_id = body["value"]["sessionId"]
            .as_str()
            .or_else(|| body["sessionId"].as_str())
            .ok_or_else(|| anyhow!("new-session response has no sessionId"))?
            .to_string();
        info!(session_id = %session_id, "automation session started");
        Ok(AppiumSession {
            client: self.client.clone(),
            base: format!("{}/session/{session_id}", self.endpoint),
            platform: capabilities.platform(),
            closed: false,
        })
    }
}

/// One live Appium session.
pub struct AppiumSession {
    client: Client,
    base: String,
    platform: Platform,
    closed: bool,
}

impl AppiumSession {
    fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        operation: &'static str,
    ) -> DriverResult<Value> {
        let url = format!("{}{path}", self.base);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .map_err(|err| DriverError::failed(operation, err.to_string()))?;
        let status = response.status();
        let payload: Value = response
            .json()
            .map_err(|err| DriverError::failed(operation, format!("decode response: {err}")))?;
        if status.is_success() {
            return Ok(payload.get("value").cloned().unwrap_or(Value::Null));
        }

        let code = payload["value"]["error"].as_str().unwrap_or_default();
        if UNSUPPORTED_ERRORS.contains(&code) || status == reqwest::StatusCode::METHOD_NOT_ALLOWED {
            return Err(DriverError::Unsupported { operation });
        }
        Err(DriverError::failed(
            operation,
            format!("{status} [{code}]: {}", error_message(&payload)),
        ))
    }

    fn element_path(element: &ElementId, suffix: &str) -> String {
        format!("/element/{}/{suffix}", element.0)
    }

    fn app_id_body(&self, app_id: &str) -> Value {
        match self.platform {
            Platform::Android => json!({ "appId": app_id }),
            Platform::Ios => json!({ "bundleId": app_id }),
        }
    }
}

impl DeviceDriver for AppiumSession {
    fn find_elements(&mut self, query: &ElementQuery) -> DriverResult<Vec<ElementId>> {
        let wire = query.to_wire(self.platform);
        debug!(using = wire.using, value = %wire.value, "find elements");
        let value = match self.call(
            Method::POST,
            "/elements",
            Some(json!({ "using": wire.using, "value": wire.value })),
            "find elements",
        ) {
            Ok(value) => value,
            Err(DriverError::Failed { message, .. }) if message.contains("no such element") => {
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };
        let refs = value.as_array().cloned().unwrap_or_default();
        Ok(refs
            .iter()
            .filter_map(|entry| {
                entry
                    .get(W3C_ELEMENT_KEY)
                    .or_else(|| entry.get(LEGACY_ELEMENT_KEY))
                    .and_then(Value::as_str)
                    .map(|id| ElementId(id.to_string()))
            })
            .collect())
    }

    fn is_displayed(&mut self, element: &ElementId) -> DriverResult<bool> {
        let value = self.call(
            Method::GET,
            &Self::element_path(element, "displayed"),
            None,
            "is displayed",
        )?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn attribute(&mut self, element: &ElementId, name: &str) -> DriverResult<Option<String>> {
        let value = self.call(
            Method::GET,
            &Self::element_path(element, &format!("attribute/{name}")),
            None,
            "get attribute",
        )?;
        Ok(match value {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        })
    }

    fn click(&mut self, element: &ElementId) -> DriverResult<()> {
        self.call(
            Method::POST,
            &Self::element_path(element, "click"),
            Some(json!({})),
            "click",
        )
        .map(|_| ())
    }

    fn clear(&mut self, element: &ElementId) -> DriverResult<()> {
        self.call(
            Method::POST,
            &Self::element_path(element, "clear"),
            Some(json!({})),
            "clear",
        )
        .map(|_| ())
    }

    fn set_value(&mut self, element: &ElementId, value: &str) -> DriverResult<()> {
        self.call(
            Method::POST,
            &Self::element_path(element, "value"),
            Some(json!({ "text": value })),
            "set value",
        )
        .map(|_| ())
    }

    fn is_app_installed(&mut self, app_id: &str) -> DriverResult<bool> {
        let value = self.call(
            Method::POST,
            "/appium/device/app_installed",
            Some(self.app_id_body(app_id)),
            "is app installed",
        )?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn activate_app(&mut self, app_id: &str) -> DriverResult<()> {
        self.call(
            Method::POST,
            "/appium/device/activate_app",
            Some(self.app_id_body(app_id)),
            "activate app",
        )
        .map(|_| ())
    }

    fn install_app(&mut self, app_path: &Path) -> DriverResult<()> {
        self.call(
            Method::POST,
            "/appium/device/install_app",
            Some(json!({ "appPath": app_path.display().to_string() })),
            "install app",
        )
        .map(|_| ())
    }

    fn quit(&mut self) -> DriverResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.call(Method::DELETE, "", None, "delete session").map(|_| ())
    }
}

impl Drop for AppiumSession {
    fn drop(&mut self) {
        if !self.closed
            && let Err(err) = self.quit()
        {
            warn!(error = %err, "failed to close automation session on drop");
        }
    }
}

fn error_message(body: &Value) -> String {
    body["value"]["message"]
        .as_str()
        .or_else(|| body["value"]["error"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}
