//! Grammar of the explicit `Actions:` block.
//!
//! Each line has the shape `verb(target[, param]*)`. Commas inside quoted
//! parameters do not split. Inside quotes, `\\` and a backslash before the
//! opening quote character are escapes; any other backslash is literal. Lines that do not fit the grammar are rejected
//! individually and reported back to the caller; they never abort a parse.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::{Action, ActionVerb};

static ACTION_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•]\s*|\d+\s*[.)]\s*)?([A-Za-z][A-Za-z_-]*)\s*\((.*)\)\s*;?$")
        .expect("action line regex should compile")
});

/// Outcome of parsing one Actions block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedActions {
    pub actions: Vec<Action>,
    /// Non-blank lines that did not match the grammar, verbatim.
    pub rejected: Vec<String>,
}

/// Parse every line of an Actions block body.
pub fn parse_actions_block(body: &str) -> ParsedActions {
    let mut parsed = ParsedActions::default();
    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match parse_action_line(trimmed) {
            Some(action) => parsed.actions.push(action),
            None => parsed.rejected.push(trimmed.to_string()),
        }
    }
    parsed
}

/// Parse a single `verb(target, params...)` line.
pub fn parse_action_line(line: &str) -> Option<Action> {
    let caps = ACTION_LINE_RE.captures(line.trim())?;
    let verb = ActionVerb::parse(caps.get(1)?.as_str())?;
    let mut args = split_arguments(caps.get(2)?.as_str())?.into_iter();
    let target = args.next().filter(|target| !target.is_empty())?;
    Some(Action {
        verb,
        target,
        params: args.collect(),
    })
}

/// Split an argument list on commas outside quotes, unquoting each piece.
///
/// Returns `None` when a quote is left open.
fn split_arguments(raw: &str) -> Option<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted_arg = false;
    let mut escaped = false;

    for c in raw.chars() {
        match quote {
            Some(open) if escaped => {
                if c != open && c != '\\' {
                    current.push('\\');
                }
                current.push(c);
                escaped = false;
            }
            Some(_) if c == '\\' => escaped = true,
            Some(open) if c == open => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                if current.trim().is_empty() {
                    current.clear();
                }
                quote = Some(c);
                quoted_arg = true;
            }
            None if c == ',' => {
                args.push(finish_argument(&current, quoted_arg));
                current.clear();
                quoted_arg = false;
            }
            None if quoted_arg && c.is_whitespace() => {}
            None => current.push(c),
        }
    }
    if quote.is_some() {
        return None;
    }
    if !current.trim().is_empty() || quoted_arg || !args.is_empty() {
        args.push(finish_argument(&current, quoted_arg));
    }
    Some(args)
}

fn finish_argument(raw: &str, quoted: bool) -> String {
    if quoted {
        raw.to_string()
    } else {
        raw.trim().to_string()
    }
}

/// Render one action back into block syntax.
pub fn render_action_line(action: &Action) -> String {
    let mut args = vec![action.target.clone()];
    args.extend(action.params.iter().map(|param| render_param(param)));
    format!("{}({})", action.verb.as_str(), args.join(", "))
}

fn render_param(param: &str) -> String {
    let needs_quotes = param.is_empty()
        || param.contains(',')
        || param.contains('\'')
        || param.trim() != param
        || param.parse::<f64>().is_err();
    if !needs_quotes {
        return param.to_string();
    }
    let escaped = param.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Render a complete `Actions:` block, header included.
pub fn render_actions_block(actions: &[Action]) -> String {
    let mut out = String::from("Actions:\n");
    for action in actions {
        out.push_str(&render_action_line(action));
        out.push('\n');
    }
    out
}

/// Distinct element locator keys in first-use order. Keypress targets are
/// key names, not locators, and are left out.
pub fn locator_keys(actions: &[Action]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for action in actions.iter().filter(|action| action.verb.targets_element()) {
        if !keys.contains(&action.target) {
            keys.push(action.target.clone());
        }
    }
    keys
}

/// Pause a generated page object makes in place of a keypress step.
pub const KEYPRESS_PAUSE_MS: u64 = 1000;

/// The shared-executor call a generated page object makes for `action`.
///
/// Fallback clicks become plain clicks and keypresses become pauses; string
/// arguments are emitted as double-quoted literals.
pub fn executor_call(action: &Action) -> String {
    let key = string_literal(&action.target);
    match action.verb {
        ActionVerb::Click | ActionVerb::FallbackClick => format!("click({key})"),
        ActionVerb::SetValue => format!(
            "setValue({key}, {})",
            string_literal(action.first_param().unwrap_or_default())
        ),
        ActionVerb::WaitUntilVisible => format!("waitUntilVisible({key})"),
        ActionVerb::IsVisible => format!("isVisible({key})"),
        ActionVerb::Keypress => format!("pause({KEYPRESS_PAUSE_MS})"),
    }
}

fn string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
