//! Element resolution: from a locator key to one displayed element.
//!
//! Strategies run in a fixed order and the first displayed match wins:
//!
//! 1. accessibility description equals a search term
//! 2. resource id / name equals a search term
//! 3. visible text equals a search term
//! 4. visible text contains a search term (case-insensitive)
//! 5. description contains a search term (case-insensitive)
//! 6. a typed control class with matching text
//! 7. broad scan over interactive elements whose text, hint, description or
//!    normalized id contains the lower-cased key
//!
//! Search terms are the key itself and its human label (`loginButton` and
//! `Login`).

use serde::Serialize;
use tracing::debug;

use crate::capture::driver::{DeviceDriver, DriverError, DriverResult, ElementId};
use crate::core::locator_key::humanize_key;
use crate::core::selector::{ElementAttributes, ElementQuery, attribute_names, control_classes};
use crate::core::types::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionStrategy {
    DescriptionEquals,
    IdEquals,
    TextEquals,
    TextContains,
    DescriptionContains,
    TypedControl,
    BroadScan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub element: ElementId,
    pub strategy: ResolutionStrategy,
    /// Search term that produced the match, or the key for the broad scan.
    pub term: String,
}

/// Search terms for a key, deduplicated, key first.
pub fn search_terms(key: &str) -> Vec<String> {
    let mut terms = vec![key.to_string()];
    let label = humanize_key(key);
    if !label.is_empty() && !terms.contains(&label) {
        terms.push(label);
    }
    terms
}

/// Resolve `key` to a displayed element, or `None` when every strategy misses.
///
/// Strategies a driver reports as unsupported are skipped; any other driver
/// error aborts resolution.
pub fn resolve_element<D: DeviceDriver + ?Sized>(
    driver: &mut D,
    platform: Platform,
    key: &str,
) -> DriverResult<Option<Resolution>> {
    let terms = search_terms(key);

    let mut queries: Vec<(ResolutionStrategy, ElementQuery, &str)> = Vec::new();
    for term in &terms {
        queries.push((ResolutionStrategy::DescriptionEquals, ElementQuery::DescriptionEquals(term.clone()), term));
    }
    for term in &terms {
        queries.push((ResolutionStrategy::IdEquals, ElementQuery::IdEquals(term.clone()), term));
    }
    for term in &terms {
        queries.push((ResolutionStrategy::TextEquals, ElementQuery::TextEquals(term.clone()), term));
    }
    for term in &terms {
        queries.push((ResolutionStrategy::TextContains, ElementQuery::TextContains(term.clone()), term));
    }
    for term in &terms {
        queries.push((
            ResolutionStrategy::DescriptionContains,
            ElementQuery::DescriptionContains(term.clone()),
            term,
        ));
    }
    for class in control_classes(platform) {
        for term in &terms {
            queries.push((
                ResolutionStrategy::TypedControl,
                ElementQuery::ClassWithText {
                    class: (*class).to_string(),
                    text: term.clone(),
                },
                term,
            ));
        }
    }

    for (strategy, query, term) in queries {
        let candidates = match driver.find_elements(&query) {
            Ok(candidates) => candidates,
            Err(DriverError::Unsupported { operation }) => {
                debug!(?strategy, operation, "strategy unsupported, skipping");
                continue;
            }
            Err(err) => return Err(err),
        };
        if let Some(element) = first_displayed(driver, candidates) {
            debug!(key, ?strategy, term, "element resolved");
            return Ok(Some(Resolution {
                element,
                strategy,
                term: term.to_string(),
            }));
        }
    }

    broad_scan(driver, platform, key)
}

fn broad_scan<D: DeviceDriver + ?Sized>(
    driver: &mut D,
    platform: Platform,
    key: &str,
) -> DriverResult<Option<Resolution>> {
    let needle = key.to_lowercase();
    let candidates = match driver.find_elements(&ElementQuery::Interactive) {
        Ok(candidates) => candidates,
        Err(err) if err.is_unsupported() => return Ok(None),
        Err(err) => return Err(err),
    };
    for element in candidates {
        let attrs = match read_attributes(driver, platform, &element) {
            Ok(attrs) => attrs,
            Err(err) => {
                debug!(element = %element.0, error = %err, "broad scan candidate unreadable, skipping");
                continue;
            }
        };
        let matches = [&attrs.text, &attrs.hint, &attrs.content_desc]
            .into_iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(&needle))
            || attrs
                .resource_id
                .as_deref()
                .is_some_and(|id| normalize_id(id).contains(&needle));
        if matches && driver.is_displayed(&element).unwrap_or(false) {
            debug!(key, "element resolved by broad scan");
            return Ok(Some(Resolution {
                element,
                strategy: ResolutionStrategy::BroadScan,
                term: key.to_string(),
            }));
        }
    }
    Ok(None)
}

/// First candidate reporting itself displayed. Visibility probe errors
/// count as not displayed.
fn first_displayed<D: DeviceDriver + ?Sized>(
    driver: &mut D,
    candidates: Vec<ElementId>,
) -> Option<ElementId> {
    candidates.into_iter().find(|element| match driver.is_displayed(element) {
        Ok(displayed) => displayed,
        Err(err) => {
            debug!(error = %err, "visibility probe failed");
            false
        }
    })
}

/// Lower-case id without package prefix, whitespace, `_` or `-`.
///
/// `com.app:id/login_button` becomes `loginbutton`.
pub fn normalize_id(id: &str) -> String {
    let local = id.rsplit_once(":id/").map_or(id, |(_, local)| local);
    local
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Read the attributes selector synthesis needs, using platform names.
pub fn read_attributes<D: DeviceDriver + ?Sized>(
    driver: &mut D,
    platform: Platform,
    element: &ElementId,
) -> DriverResult<ElementAttributes> {
    let names = attribute_names(platform);
    let mut read = |name: &str| -> DriverResult<Option<String>> {
        match driver.attribute(element, name) {
            Ok(value) => Ok(value.filter(|v| !v.trim().is_empty())),
            Err(err) if err.is_unsupported() => Ok(None),
            Err(err) => Err(err),
        }
    };
    Ok(ElementAttributes {
        class_name: read(names.class_name)?,
        resource_id: read(names.resource_id)?,
        content_desc: read(names.content_desc)?,
        text: read(names.text)?,
        hint: read(names.hint)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeDriver, FakeElement};

    #[test]
    fn terms_include_human_label() {
        assert_eq!(search_terms("loginButton"), vec!["loginButton", "Login"]);
        assert_eq!(search_terms("Email"), vec!["Email"]);
    }

    #[test]
    fn description_match_wins_over_text_match() {
        let mut driver = FakeDriver::new(vec![
            FakeElement::new("android.widget.TextView").text("Login"),
            FakeElement::new("android.widget.Button").desc("loginButton"),
        ]);
        let hit = resolve_element(&mut driver, Platform::Android, "loginButton")
            .expect("resolve")
            .expect("hit");
        assert_eq!(hit.strategy, ResolutionStrategy::DescriptionEquals);
        assert_eq!(hit.element, driver.id_of(1));
    }

    #[test]
    fn hidden_elements_are_skipped() {
        let mut driver = FakeDriver::new(vec![
            FakeElement::new("android.widget.Button").desc("loginButton").hidden(),
            FakeElement::new("android.widget.Button").text("Login"),
        ]);
        let hit = resolve_element(&mut driver, Platform::Android, "loginButton")
            .expect("resolve")
            .expect("hit");
        assert_eq!(hit.strategy, ResolutionStrategy::TextEquals);
        assert_eq!(hit.term, "Login");
    }

    #[test]
    fn broad_scan_skips_unreadable_candidates() {
        let mut driver = FakeDriver::new(vec![
            FakeElement::new("android.widget.EditText").interactive().stale(),
            FakeElement::new("android.widget.EditText").id("com.app:id/email_field").interactive(),
        ]);
        let hit = resolve_element(&mut driver, Platform::Android, "emailField")
            .expect("resolve")
            .expect("hit");
        assert_eq!(hit.strategy, ResolutionStrategy::BroadScan);
        assert_eq!(hit.element, driver.id_of(1));
    }

    #[test]
    fn text_contains_is_case_insensitive() {
        let mut driver = FakeDriver::new(vec![
            FakeElement::new("android.widget.TextView").text("Welcome back, LOGIN complete"),
        ]);
        let hit = resolve_element(&mut driver, Platform::Android, "loginButton")
            .expect("resolve")
            .expect("hit");
        assert_eq!(hit.strategy, ResolutionStrategy::TextContains);
    }

    #[test]
    fn broad_scan_matches_normalized_id() {
        let mut driver = FakeDriver::new(vec![
            FakeElement::new("android.widget.EditText")
                .id("com.app:id/email_field")
                .interactive(),
        ]);
        let hit = resolve_element(&mut driver, Platform::Android, "emailField")
            .expect("resolve")
            .expect("hit");
        assert_eq!(hit.strategy, ResolutionStrategy::BroadScan);
    }

    #[test]
    fn miss_returns_none() {
        let mut driver = FakeDriver::new(vec![FakeElement::new("android.widget.TextView").text("Other")]);
        assert!(
            resolve_element(&mut driver, Platform::Android, "checkoutButton")
                .expect("resolve")
                .is_none()
        );
    }

    #[test]
    fn unsupported_strategies_are_skipped() {
        let mut driver = FakeDriver::new(vec![FakeElement::new("android.widget.Button").text("Login")])
            .unsupported_query("accessibility id");
        let hit = resolve_element(&mut driver, Platform::Android, "loginButton")
            .expect("resolve")
            .expect("hit");
        assert_eq!(hit.strategy, ResolutionStrategy::TextEquals);
    }

    #[test]
    fn id_normalization() {
        assert_eq!(normalize_id("com.app:id/login_button"), "loginbutton");
        assert_eq!(normalize_id("Sign-In Btn"), "signinbtn");
    }
}
