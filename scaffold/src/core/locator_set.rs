//! In-memory locator sets and their merge rules.
//!
//! A locator set maps a locator key to at most one selector per platform.
//! Serialized output is ordered (keys, then platforms) so repeated writes of
//! the same data are byte-identical.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use serde_json::{Map, Value};

use crate::core::types::Platform;

/// Selectors for one key, by platform.
pub type LocatorEntry = BTreeMap<Platform, String>;

/// How [`LocatorSet::merge`] settles a (key, platform) pair present on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Incoming selectors replace existing ones. Used for freshly captured locators.
    IncomingWins,
    /// Existing selectors are kept; incoming ones only fill gaps. Used for
    /// locators proposed by the generation service.
    ExistingWins,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorSet {
    entries: BTreeMap<String, LocatorEntry>,
}

/// Result of reading a locator document leniently.
#[derive(Debug, Clone, Default)]
pub struct LenientParse {
    pub set: LocatorSet,
    /// One line per dropped key or platform entry.
    pub skipped: Vec<String>,
}

impl LocatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entry(&self, key: &str) -> Option<&LocatorEntry> {
        self.entries.get(key)
    }

    pub fn get(&self, key: &str, platform: Platform) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|entry| entry.get(&platform))
            .map(String::as_str)
    }

    pub fn contains(&self, key: &str, platform: Platform) -> bool {
        self.get(key, platform).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LocatorEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Set one selector. Blank keys or selectors are ignored; returns whether
    /// the set changed.
    pub fn insert(&mut self, key: &str, platform: Platform, selector: &str) -> bool {
        let key = key.trim();
        let selector = selector.trim();
        if key.is_empty() || selector.is_empty() {
            return false;
        }
        let entry = self.entries.entry(key.to_string()).or_default();
        let previous = entry.insert(platform, selector.to_string());
        previous.as_deref() != Some(selector)
    }

    /// Merge `incoming` into `self` pair by pair. Never deletes anything.
    pub fn merge(&mut self, incoming: &LocatorSet, policy: MergePolicy) {
        for (key, entry) in &incoming.entries {
            for (platform, selector) in entry {
                if policy == MergePolicy::ExistingWins && self.contains(key, *platform) {
                    continue;
                }
                self.insert(key, *platform, selector);
            }
        }
    }

    /// Parse a locator document, dropping unknown platforms and null, empty
    /// or non-string selectors. Fails only when the document is not a JSON
    /// object of objects at the top level.
    pub fn from_json_lenient(raw: &str) -> Result<LenientParse> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(root) = value else {
            return Err(anyhow!("locator document must be a JSON object"));
        };

        let mut parsed = LenientParse::default();
        for (key, entry) in root {
            let Value::Object(platforms) = entry else {
                parsed.skipped.push(format!("{key}: entry is not an object"));
                continue;
            };
            for (platform_name, selector) in platforms {
                let Ok(platform) = platform_name.parse::<Platform>() else {
                    parsed
                        .skipped
                        .push(format!("{key}.{platform_name}: unknown platform"));
                    continue;
                };
                match selector {
                    Value::String(selector) if !selector.trim().is_empty() => {
                        parsed.set.insert(&key, platform, &selector);
                    }
                    _ => parsed
                        .skipped
                        .push(format!("{key}.{platform_name}: empty or non-string selector")),
                }
            }
        }
        Ok(parsed)
    }

    pub fn to_json_value(&self) -> Value {
        let mut root = Map::new();
        for (key, entry) in &self.entries {
            let platforms: Map<String, Value> = entry
                .iter()
                .map(|(platform, selector)| {
                    (platform.as_str().to_string(), Value::String(selector.clone()))
                })
                .collect();
            root.insert(key.clone(), Value::Object(platforms));
        }
        Value::Object(root)
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(&self.to_json_value())?;
        out.push('\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, Platform, &str)]) -> LocatorSet {
        let mut set = LocatorSet::new();
        for (key, platform, selector) in pairs {
            set.insert(key, *platform, selector);
        }
        set
    }

    #[test]
    fn incoming_wins_per_pair_and_never_deletes() {
        let mut existing = set(&[
            ("loginButton", Platform::Android, "//old"),
            ("loginButton", Platform::Ios, "//ios"),
            ("header", Platform::Android, "//header"),
        ]);
        existing.merge(
            &set(&[("loginButton", Platform::Android, "//new")]),
            MergePolicy::IncomingWins,
        );
        assert_eq!(existing.get("loginButton", Platform::Android), Some("//new"));
        assert_eq!(existing.get("loginButton", Platform::Ios), Some("//ios"));
        assert_eq!(existing.get("header", Platform::Android), Some("//header"));
    }

    #[test]
    fn existing_wins_only_fills_gaps() {
        let mut existing = set(&[("loginButton", Platform::Android, "//captured")]);
        existing.merge(
            &set(&[
                ("loginButton", Platform::Android, "//guessed"),
                ("loginButton", Platform::Ios, "//guessed-ios"),
            ]),
            MergePolicy::ExistingWins,
        );
        assert_eq!(existing.get("loginButton", Platform::Android), Some("//captured"));
        assert_eq!(existing.get("loginButton", Platform::Ios), Some("//guessed-ios"));
    }

    #[test]
    fn lenient_parse_drops_bad_entries() {
        let raw = r#"{
            "a": {"android": "//a", "web": "//w", "ios": null},
            "b": "not an object",
            "c": {"ios": "  "}
        }"#;
        let parsed = LocatorSet::from_json_lenient(raw).expect("parse");
        assert_eq!(parsed.set.len(), 1);
        assert_eq!(parsed.set.get("a", Platform::Android), Some("//a"));
        assert_eq!(parsed.skipped.len(), 4);
    }

    #[test]
    fn non_object_document_is_rejected() {
        assert!(LocatorSet::from_json_lenient("[1, 2]").is_err());
        assert!(LocatorSet::from_json_lenient("{oops").is_err());
    }

    #[test]
    fn serialization_is_sorted_and_stable() {
        let a = set(&[
            ("zeta", Platform::Ios, "//z"),
            ("alpha", Platform::Ios, "//ai"),
            ("alpha", Platform::Android, "//aa"),
        ]);
        let json = a.to_pretty_json().expect("json");
        let alpha = json.find("alpha").expect("alpha");
        let zeta = json.find("zeta").expect("zeta");
        assert!(alpha < zeta);
        assert!(json.find("android").expect("android") < json.find("\"ios\"").expect("ios"));
        assert_eq!(json, a.clone().to_pretty_json().expect("json again"));
    }

    #[test]
    fn blank_inserts_are_ignored() {
        let mut s = LocatorSet::new();
        assert!(!s.insert("", Platform::Android, "//x"));
        assert!(!s.insert("k", Platform::Android, " "));
        assert!(s.is_empty());
    }
}
