//! Shared deterministic types for the scaffolder core.
//!
//! These types define stable contracts between the parser, the synthesizer,
//! the capture session and the generation oracle. They carry no I/O.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Mobile platform a locator or a capture session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(anyhow!("unknown platform {other:?} (expected android or ios)")),
        }
    }
}

/// Closed vocabulary of verbs a test step can be expressed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionVerb {
    Click,
    WaitUntilVisible,
    SetValue,
    IsVisible,
    Keypress,
    /// Click emitted for navigation-style steps no specific rule claimed.
    FallbackClick,
}

impl ActionVerb {
    pub const ALL: [ActionVerb; 6] = [
        ActionVerb::Click,
        ActionVerb::WaitUntilVisible,
        ActionVerb::SetValue,
        ActionVerb::IsVisible,
        ActionVerb::Keypress,
        ActionVerb::FallbackClick,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionVerb::Click => "click",
            ActionVerb::WaitUntilVisible => "waitUntilVisible",
            ActionVerb::SetValue => "setValue",
            ActionVerb::IsVisible => "isVisible",
            ActionVerb::Keypress => "keypress",
            ActionVerb::FallbackClick => "fallbackClick",
        }
    }

    /// Resolve a verb written in an Actions block. Matching ignores case,
    /// underscores and hyphens so `wait_until_visible` and `waitUntilVisible`
    /// name the same verb.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str().to_ascii_lowercase() == normalized)
    }

    /// Whether executing this verb needs a resolved on-screen element.
    pub fn targets_element(self) -> bool {
        !matches!(self, ActionVerb::Keypress)
    }
}

impl fmt::Display for ActionVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executable step of a test case.
///
/// `target` is a locator key for element verbs and a key name for
/// [`ActionVerb::Keypress`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub verb: ActionVerb,
    pub target: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl Action {
    pub fn new(verb: ActionVerb, target: impl Into<String>) -> Self {
        Self {
            verb,
            target: target.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn first_param(&self) -> Option<&str> {
        self.params.first().map(String::as_str)
    }
}
