//! Session capabilities sent when opening an automation session.
//!
//! The app is identified by package/bundle id only; no binary path is sent
//! at session start. Installing a missing app is a separate step handled by
//! the capture session.

use serde_json::{Map, Value, json};

use crate::core::types::Platform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidCapabilities {
    pub device_name: String,
    pub platform_version: Option<String>,
    /// Package id of the app under test, e.g. `com.example.app`.
    pub app_package: Option<String>,
    pub app_activity: Option<String>,
    pub no_reset: bool,
    pub auto_grant_permissions: bool,
}

impl Default for AndroidCapabilities {
    fn default() -> Self {
        Self {
            device_name: "Android Emulator".to_string(),
            platform_version: None,
            app_package: None,
            app_activity: None,
            no_reset: true,
            auto_grant_permissions: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IosCapabilities {
    pub device_name: String,
    pub platform_version: Option<String>,
    pub bundle_id: Option<String>,
    pub no_reset: bool,
}

impl Default for IosCapabilities {
    fn default() -> Self {
        Self {
            device_name: "iPhone Simulator".to_string(),
            platform_version: None,
            bundle_id: None,
            no_reset: true,
        }
    }
}

/// Capabilities for exactly one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCapabilities {
    Android(AndroidCapabilities),
    Ios(IosCapabilities),
}

impl SessionCapabilities {
    pub fn platform(&self) -> Platform {
        match self {
            SessionCapabilities::Android(_) => Platform::Android,
            SessionCapabilities::Ios(_) => Platform::Ios,
        }
    }

    /// Package or bundle id of the app under test, if configured.
    pub fn app_id(&self) -> Option<&str> {
        match self {
            SessionCapabilities::Android(caps) => caps.app_package.as_deref(),
            SessionCapabilities::Ios(caps) => caps.bundle_id.as_deref(),
        }
        .map(str::trim)
        .filter(|id| !id.is_empty())
    }

    /// W3C new-session payload.
    pub fn to_wire(&self) -> Value {
        let mut always = Map::new();
        let mut set = |key: &str, value: Value| {
            always.insert(key.to_string(), value);
        };
        match self {
            SessionCapabilities::Android(caps) => {
                set("platformName", json!("Android"));
                set("appium:automationName", json!("UiAutomator2"));
                set("appium:deviceName", json!(caps.device_name));
                if let Some(version) = &caps.platform_version {
                    set("appium:platformVersion", json!(version));
                }
                if let Some(package) = &caps.app_package {
                    set("appium:appPackage", json!(package));
                }
                if let Some(activity) = &caps.app_activity {
                    set("appium:appActivity", json!(activity));
                }
                set("appium:noReset", json!(caps.no_reset));
                set(
                    "appium:autoGrantPermissions",
                    json!(caps.auto_grant_permissions),
                );
            }
            SessionCapabilities::Ios(caps) => {
                set("platformName", json!("iOS"));
                set("appium:automationName", json!("XCUITest"));
                set("appium:deviceName", json!(caps.device_name));
                if let Some(version) = &caps.platform_version {
                    set("appium:platformVersion", json!(version));
                }
                if let Some(bundle) = &caps.bundle_id {
                    set("appium:bundleId", json!(bundle));
                }
                set("appium:noReset", json!(caps.no_reset));
            }
        }
        json!({ "capabilities": { "alwaysMatch": always, "firstMatch": [{}] } })
    }
}
