//! Rule-based translation of prose steps into actions.
//!
//! Each step line is cleaned of numbering and bullets, a trailing keypress
//! clause ("... and press Enter") is split off, and the remaining clause is
//! matched against an ordered rule table. The first rule whose pattern
//! matches and whose classifier finds a target wins. Lines no rule claims
//! produce nothing.

use std::sync::LazyLock;

use regex::{Match, Regex};

use crate::core::locator_key::derive_locator_key;
use crate::core::types::{Action, ActionVerb};

/// Wait timeout used when a step names none.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 20_000;

type Classifier = fn(&str, Match<'_>) -> Option<Action>;

/// One entry of the rule table.
pub struct SynthesisRule {
    pub name: &'static str,
    pattern: Regex,
    classify: Classifier,
}

impl SynthesisRule {
    fn new(name: &'static str, pattern: &str, classify: Classifier) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("synthesis rule regex should compile"),
            classify,
        }
    }

    fn apply(&self, clause: &str) -> Option<Action> {
        let m = self.pattern.find(clause)?;
        (self.classify)(clause, m)
    }
}

static RULES: LazyLock<Vec<SynthesisRule>> = LazyLock::new(|| {
    vec![
        SynthesisRule::new(
            "click",
            r"(?i)\b(?:click(?:s|ed)?|tap(?:s|ped)?|press(?:es|ed)?|open(?:s|ed)?|touch(?:es|ed)?)\b",
            classify_click,
        ),
        SynthesisRule::new(
            "wait",
            r"(?i)\bwait(?:s|ing)?\b|\bshould\s+(?:appear|load)\b|\bshould\s+be\s+loaded\b",
            classify_wait,
        ),
        SynthesisRule::new(
            "isVisible",
            r"(?i)\b(?:validates?|verif(?:y|ies)|checks?|should|is\s+visible|appears?|displayed)\b",
            classify_visible,
        ),
        SynthesisRule::new(
            "setValue",
            r"(?i)\b(?:enter(?:s|ed)?|type(?:s|d)?|inputs?|fill(?:s|ed)?(?:\s+in)?|send\s+keys)\b",
            classify_set_value,
        ),
        SynthesisRule::new(
            "keypress",
            r"(?i)\b(?:hit|keypress|key\s+press|press\s+key)\b",
            classify_keypress,
        ),
        SynthesisRule::new(
            "fallback",
            r"(?i)\b(?:select(?:s|ed)?|choose(?:s)?|navigate(?:s|d)?(?:\s+to)?|go(?:es)?\s+(?:to|back)|submit(?:s|ted)?|scroll(?:s|ed)?(?:\s+(?:down|up))?(?:\s+to)?|swipe(?:s|d)?(?:\s+(?:left|right|up|down))?|toggle(?:s|d)?|enable(?:s|d)?|disable(?:s|d)?|launch(?:es|ed)?|log\s*in|log\s*out|sign\s*in|sign\s*out|login|logout|accept(?:s|ed)?|dismiss(?:es|ed)?|close(?:s|d)?)\b",
            classify_fallback,
        ),
    ]
});

static STEP_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:(?:step\s*)?\d+\s*[.):\-]\s*|[-*•+]\s*|[a-z]\)\s+)*")
        .expect("step prefix regex should compile")
});

static TRAILING_KEYPRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:^|[\s,;]+)(?:(?:and|then)\s+)?(?:press|hit)\s+(?:the\s+)?(?:keyboard\s+)?["']?(enter|return|done|search|tab|escape|next|go)["']?(?:\s+key)?\s*[.!]?\s*$"#,
    )
    .expect("keypress regex should compile")
});

static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]+)"|“([^”]+)”|(?:^|[^A-Za-z0-9])'([^']+)'"#)
        .expect("quoted regex should compile")
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:for|up\s+to|within)?\s*(\d+)\s*(ms|milliseconds?|s|secs?|seconds?|m|mins?|minutes?)\b")
        .expect("duration regex should compile")
});

static WITH_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)\s+with\s+(.+)$").expect("with regex should compile")
});

static INTO_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)\s+(?:in|into|on)\s+(.+)$").expect("into regex should compile")
});

static FIELD_AFTER_QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:in|into|on|for|to)\s+(.+)$").expect("field regex should compile")
});

const LEADING_FILLERS: &[&str] = &[
    "that", "the", "a", "an", "on", "to", "for", "at", "onto", "into", "in", "of", "upon",
    "user", "is", "if", "whether", "see", "sees", "be",
];

const TRAILING_FILLERS: &[&str] = &[
    "visible", "displayed", "shown", "present", "loaded", "appear", "appears", "load", "loads",
    "is", "are", "should", "must", "will", "to", "be", "been", "now", "successfully",
    "correctly", "properly",
];

/// The ordered rule table.
pub fn rules() -> &'static [SynthesisRule] {
    &RULES
}

/// Synthesize actions for a whole Steps region.
///
/// Adjacent duplicate actions are collapsed into one.
pub fn synthesize_actions(steps: &str) -> Vec<Action> {
    let mut actions: Vec<Action> = Vec::new();
    for line in steps.lines() {
        for action in classify_step(line) {
            if actions.last() != Some(&action) {
                actions.push(action);
            }
        }
    }
    actions
}

/// Translate one step line into zero, one or two actions.
pub fn classify_step(line: &str) -> Vec<Action> {
    let cleaned = clean_step_line(line);
    if cleaned.is_empty() {
        return Vec::new();
    }

    let (clause, key) = split_trailing_keypress(&cleaned);
    let mut actions = Vec::new();
    if !clause.is_empty()
        && let Some(action) = classify_clause(clause)
    {
        actions.push(action);
    }
    if let Some(key) = key {
        actions.push(Action::new(ActionVerb::Keypress, key));
    }
    actions
}

/// Run the rule table on a clause; first rule that yields an action wins.
pub fn classify_clause(clause: &str) -> Option<Action> {
    rules().iter().find_map(|rule| rule.apply(clause))
}

/// Name of the rule that claims a clause, if any.
pub fn matching_rule(clause: &str) -> Option<&'static str> {
    rules()
        .iter()
        .find(|rule| rule.apply(clause).is_some())
        .map(|rule| rule.name)
}

fn clean_step_line(line: &str) -> String {
    let stripped = STEP_PREFIX_RE.replace(line, "");
    stripped
        .trim()
        .trim_end_matches(['.', '!', ';'])
        .trim()
        .to_string()
}

fn split_trailing_keypress(line: &str) -> (&str, Option<String>) {
    match TRAILING_KEYPRESS_RE.captures(line) {
        Some(caps) => {
            let start = caps.get(0).map_or(line.len(), |m| m.start());
            let key = caps.get(1).map(|m| m.as_str().to_lowercase());
            let clause = line[..start].trim().trim_end_matches([',', ';']).trim();
            (clause, key)
        }
        None => (line, None),
    }
}

fn classify_click(clause: &str, m: Match<'_>) -> Option<Action> {
    let target = first_quoted(clause)
        .or_else(|| non_empty(clean_target(&clause[m.end()..])))
        .or_else(|| non_empty(clean_target(&clause[..m.start()])))?;
    Some(Action::new(ActionVerb::Click, derive_locator_key(&target)))
}

fn classify_wait(clause: &str, m: Match<'_>) -> Option<Action> {
    let timeout = parse_duration_ms(clause).unwrap_or(DEFAULT_WAIT_TIMEOUT_MS);
    let target = first_quoted(clause)
        .or_else(|| non_empty(clean_target(&DURATION_RE.replace_all(&clause[m.end()..], ""))))
        .or_else(|| non_empty(clean_target(&clause[..m.start()])))?;
    Some(
        Action::new(ActionVerb::WaitUntilVisible, derive_locator_key(&target))
            .with_param(timeout.to_string()),
    )
}

fn classify_visible(clause: &str, m: Match<'_>) -> Option<Action> {
    let target = first_quoted(clause)
        .or_else(|| non_empty(clean_target(&clause[m.end()..])))
        .or_else(|| non_empty(clean_target(&clause[..m.start()])))?;
    Some(Action::new(ActionVerb::IsVisible, derive_locator_key(&target)))
}

fn classify_set_value(clause: &str, m: Match<'_>) -> Option<Action> {
    let quotes = quoted_spans(clause);
    let (value, field) = match quotes.as_slice() {
        [value, field, ..] => (Some(value.text.clone()), field.text.clone()),
        [value] => {
            let after = &clause[value.end..];
            let field = FIELD_AFTER_QUOTE_RE
                .captures(after)
                .and_then(|caps| caps.get(1))
                .map(|f| f.as_str().to_string())
                .or_else(|| clause.get(m.end()..value.start).map(str::to_string))
                .unwrap_or_default();
            (Some(value.text.clone()), field)
        }
        [] => {
            let rest = clause[m.end()..].trim();
            if let Some(caps) = WITH_VALUE_RE.captures(rest) {
                (
                    caps.get(2).map(|v| clean_value(v.as_str())),
                    caps.get(1).map_or_else(String::new, |f| f.as_str().to_string()),
                )
            } else if let Some(caps) = INTO_FIELD_RE.captures(rest) {
                (
                    caps.get(1).map(|v| clean_value(v.as_str())),
                    caps.get(2).map_or_else(String::new, |f| f.as_str().to_string()),
                )
            } else {
                (None, rest.to_string())
            }
        }
    };

    let field = non_empty(clean_target(&field))?;
    let mut action = Action::new(ActionVerb::SetValue, derive_locator_key(&field));
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        action.params.push(value);
    }
    Some(action)
}

fn classify_keypress(clause: &str, m: Match<'_>) -> Option<Action> {
    let key = clean_target(&clause[m.end()..]);
    let key = key
        .split_whitespace()
        .find(|word| !word.eq_ignore_ascii_case("key"))?
        .to_lowercase();
    Some(Action::new(ActionVerb::Keypress, key))
}

fn classify_fallback(clause: &str, m: Match<'_>) -> Option<Action> {
    let target = first_quoted(clause)
        .or_else(|| non_empty(clean_target(&clause[m.end()..])))
        .unwrap_or_else(|| m.as_str().to_string());
    Some(Action::new(
        ActionVerb::FallbackClick,
        derive_locator_key(&target),
    ))
}

#[derive(Debug)]
struct QuotedSpan {
    start: usize,
    end: usize,
    text: String,
}

fn quoted_spans(clause: &str) -> Vec<QuotedSpan> {
    QUOTED_RE
        .captures_iter(clause)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
            Some(QuotedSpan {
                start: whole.start(),
                end: whole.end(),
                text: inner.as_str().trim().to_string(),
            })
        })
        .filter(|span| !span.text.is_empty())
        .collect()
}

fn first_quoted(clause: &str) -> Option<String> {
    quoted_spans(clause).into_iter().next().map(|span| span.text)
}

fn parse_duration_ms(clause: &str) -> Option<u64> {
    let caps = DURATION_RE.captures(clause)?;
    let amount: u64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_ascii_lowercase();
    let factor = if unit.starts_with("ms") || unit.starts_with("milli") {
        1
    } else if unit.starts_with('m') {
        60_000
    } else {
        1_000
    };
    amount.checked_mul(factor)
}

/// Strip filler words from both ends of a phrase.
fn clean_target(raw: &str) -> String {
    let mut words: Vec<&str> = raw
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | ',' | '.' | ':' | ';')))
        .filter(|word| !word.is_empty())
        .collect();

    while let Some(first) = words.first() {
        if LEADING_FILLERS.contains(&first.to_lowercase().as_str()) {
            words.remove(0);
        } else {
            break;
        }
    }
    while let Some(last) = words.last() {
        if TRAILING_FILLERS.contains(&last.to_lowercase().as_str()) {
            words.pop();
        } else {
            break;
        }
    }
    words.join(" ")
}

fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”'))
        .trim()
        .to_string()
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(line: &str) -> Action {
        let actions = classify_step(line);
        assert_eq!(actions.len(), 1, "expected one action for {line:?}: {actions:?}");
        actions.into_iter().next().expect("one action")
    }

    #[test]
    fn tap_becomes_click_with_derived_key() {
        assert_eq!(one("2. Tap Login button"), Action::new(ActionVerb::Click, "loginButton"));
        assert_eq!(one("- Click on \"Sign Up\""), Action::new(ActionVerb::Click, "signUp"));
    }

    #[test]
    fn wait_gets_default_timeout() {
        assert_eq!(
            one("Wait for home screen to appear"),
            Action::new(ActionVerb::WaitUntilVisible, "homeScreen").with_param("20000")
        );
    }

    #[test]
    fn wait_honours_explicit_duration() {
        assert_eq!(
            one("Wait 5 seconds for the Dashboard"),
            Action::new(ActionVerb::WaitUntilVisible, "dashboard").with_param("5000")
        );
    }

    #[test]
    fn should_appear_uses_subject_as_target() {
        assert_eq!(
            one("Home screen should appear"),
            Action::new(ActionVerb::WaitUntilVisible, "homeScreen").with_param("20000")
        );
    }

    #[test]
    fn verification_becomes_is_visible() {
        assert_eq!(
            one("Verify the Welcome banner is displayed"),
            Action::new(ActionVerb::IsVisible, "welcomeBanner")
        );
        assert_eq!(
            one("Error message appears"),
            Action::new(ActionVerb::IsVisible, "errorMessage")
        );
    }

    #[test]
    fn set_value_with_quoted_value_and_field() {
        assert_eq!(
            one("Enter \"a@b.co\" in the email field"),
            Action::new(ActionVerb::SetValue, "emailField").with_param("a@b.co")
        );
        assert_eq!(
            one("Type \"secret\" \"Password\""),
            Action::new(ActionVerb::SetValue, "password").with_param("secret")
        );
    }

    #[test]
    fn set_value_with_keyword_forms() {
        assert_eq!(
            one("Fill username with qa_user"),
            Action::new(ActionVerb::SetValue, "username").with_param("qa_user")
        );
        assert_eq!(
            one("Type hunter2 into password field"),
            Action::new(ActionVerb::SetValue, "passwordField").with_param("hunter2")
        );
    }

    #[test]
    fn set_value_without_value_has_no_params() {
        assert_eq!(
            one("Enter valid credentials"),
            Action::new(ActionVerb::SetValue, "validCredentials")
        );
    }

    #[test]
    fn trailing_keypress_is_split_off() {
        let actions = classify_step("Type \"shoes\" in search box and press Enter");
        assert_eq!(
            actions,
            vec![
                Action::new(ActionVerb::SetValue, "searchBox").with_param("shoes"),
                Action::new(ActionVerb::Keypress, "enter"),
            ]
        );
        assert_eq!(one("Press Enter"), Action::new(ActionVerb::Keypress, "enter"));
    }

    #[test]
    fn navigation_steps_fall_back_to_click() {
        assert_eq!(
            one("Navigate to Settings"),
            Action::new(ActionVerb::FallbackClick, "settings")
        );
        assert_eq!(one("Login"), Action::new(ActionVerb::FallbackClick, "login"));
    }

    #[test]
    fn unmatched_lines_produce_nothing() {
        assert!(classify_step("The weather is nice").is_empty());
        assert!(classify_step("   ").is_empty());
    }

    #[test]
    fn adjacent_duplicates_collapse() {
        let actions = synthesize_actions("Tap Login button\n2. Tap login button\nWait for Home screen");
        assert_eq!(
            actions,
            vec![
                Action::new(ActionVerb::Click, "loginButton"),
                Action::new(ActionVerb::WaitUntilVisible, "homeScreen").with_param("20000"),
            ]
        );
    }

    #[test]
    fn click_rule_outranks_later_rules() {
        assert_eq!(matching_rule("Verify user can tap Profile"), Some("click"));
        assert_eq!(matching_rule("Check the footer"), Some("isVisible"));
    }

    #[test]
    fn synthesis_is_deterministic() {
        let steps = "1. Open Menu\n2. Select Settings option\n3. Verify Settings screen is displayed";
        assert_eq!(synthesize_actions(steps), synthesize_actions(steps));
    }
}
