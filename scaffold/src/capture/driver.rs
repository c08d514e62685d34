//! Capability interfaces the capture session runs against.
//!
//! [`AutomationBackend`] covers everything needed before a session exists
//! (endpoint health, device listing, session start); [`DeviceDriver`] is one
//! live session. The Appium client in `io::webdriver` implements both, and
//! `test_support` provides in-memory fakes.

use std::path::Path;

use anyhow::Result;
use thiserror::Error;

use crate::core::capabilities::SessionCapabilities;
use crate::core::selector::ElementQuery;
use crate::core::types::Platform;

/// Opaque element reference handed out by a driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

#[derive(Debug, Error)]
pub enum DriverError {
    /// The remote side does not implement the operation.
    #[error("{operation} is not supported by this session")]
    Unsupported { operation: &'static str },
    #[error("{operation} failed: {message}")]
    Failed {
        operation: &'static str,
        message: String,
    },
}

impl DriverError {
    pub fn failed(operation: &'static str, message: impl Into<String>) -> Self {
        DriverError::Failed {
            operation,
            message: message.into(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, DriverError::Unsupported { .. })
    }
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// One live automation session.
pub trait DeviceDriver {
    /// Elements matching `query`; an empty list when nothing matches.
    fn find_elements(&mut self, query: &ElementQuery) -> DriverResult<Vec<ElementId>>;
    fn is_displayed(&mut self, element: &ElementId) -> DriverResult<bool>;
    /// Attribute value, `None` when the element does not expose it.
    fn attribute(&mut self, element: &ElementId, name: &str) -> DriverResult<Option<String>>;
    fn click(&mut self, element: &ElementId) -> DriverResult<()>;
    fn clear(&mut self, element: &ElementId) -> DriverResult<()>;
    fn set_value(&mut self, element: &ElementId, value: &str) -> DriverResult<()>;
    fn is_app_installed(&mut self, app_id: &str) -> DriverResult<bool>;
    fn activate_app(&mut self, app_id: &str) -> DriverResult<()>;
    fn install_app(&mut self, app_path: &Path) -> DriverResult<()>;
    /// End the session. Called exactly once by the capture session.
    fn quit(&mut self) -> DriverResult<()>;
}

/// Pre-session capabilities of an automation stack.
pub trait AutomationBackend {
    type Driver: DeviceDriver;

    /// Endpoint the backend talks to, for messages.
    fn endpoint(&self) -> &str;
    /// Succeeds when the automation endpoint answers a health probe.
    fn check_endpoint(&self) -> Result<()>;
    /// Devices currently online for `platform`.
    fn online_devices(&self, platform: Platform) -> Result<Vec<String>>;
    fn start_session(&self, capabilities: &SessionCapabilities) -> Result<Self::Driver>;
}
