//! Instruction builder for the generation service.
//!
//! The template marks each section with `<!-- section:KEY required|droppable -->`.
//! When the rendered prompt exceeds the byte budget, droppable sections go
//! first (page exemplars, spec exemplars, expected results, preconditions).
//! Required sections are never dropped or shortened; a prompt whose required
//! part alone exceeds the budget is sent over budget with a warning.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::capture::PendingLocator;
use crate::core::actions::{executor_call, locator_keys};
use crate::core::locator_set::LocatorSet;
use crate::core::naming::ArtifactNames;
use crate::core::types::{Action, Platform};
use crate::io::exemplars::Exemplar;

const GENERATE_TEMPLATE: &str = include_str!("prompts/generate.md");

/// Section keys dropped, in order, when over budget.
const DROP_ORDER: &[&str] = &["page_exemplars", "spec_exemplars", "expected", "preconditions"];

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*section:(\w+)\s+(required|droppable)\s*-->")
        .expect("section marker regex should compile")
});

/// Project-relative output paths the response must use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPaths {
    pub spec: String,
    pub page: String,
    pub locators: String,
}

/// Everything the instruction embeds.
#[derive(Debug, Clone)]
pub struct PromptInputs<'a> {
    pub names: &'a ArtifactNames,
    pub targets: TargetPaths,
    pub platform: Platform,
    pub actions: &'a [Action],
    /// Merged locator repository; known selectors are quoted for each key.
    pub locators: &'a LocatorSet,
    pub pending: &'a [PendingLocator],
    pub preconditions: Option<&'a str>,
    pub expected: Option<&'a str>,
    pub spec_exemplars: &'a [Exemplar],
    pub page_exemplars: &'a [Exemplar],
}

#[derive(Debug, Clone, Serialize)]
struct KeyContext {
    key: String,
    /// Known selectors as `android: ..., ios: ...`.
    known: Option<String>,
}

fn key_contexts(actions: &[Action], locators: &LocatorSet) -> Vec<KeyContext> {
    locator_keys(actions)
        .into_iter()
        .map(|key| {
            let known = locators.entry(&key).map(|entry| {
                entry
                    .iter()
                    .map(|(platform, selector)| format!("{platform}: `{selector}`"))
                    .collect::<Vec<_>>()
                    .join(", ")
            });
            KeyContext { key, known }
        })
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn render_template(input: &PromptInputs<'_>) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("generate", GENERATE_TEMPLATE)
        .context("load generation template")?;
    let template = env.get_template("generate")?;
    let calls: Vec<String> = input.actions.iter().map(executor_call).collect();
    let rendered = template
        .render(context! {
            spec_path => input.targets.spec.as_str(),
            page_path => input.targets.page.as_str(),
            locators_path => input.targets.locators.as_str(),
            page_class => input.names.page_class.as_str(),
            title => input.names.title.as_str(),
            calls => calls,
            keys => key_contexts(input.actions, input.locators),
            platform => input.platform.as_str(),
            pending => input.pending,
            preconditions => non_blank(input.preconditions),
            expected => non_blank(input.expected),
            spec_exemplars => input.spec_exemplars,
            page_exemplars => input.page_exemplars,
        })
        .context("render generation template")?;
    Ok(rendered)
}

#[derive(Debug, Clone)]
struct ParsedSection {
    key: String,
    required: bool,
    content: String,
}

fn parse_sections(rendered: &str) -> Vec<ParsedSection> {
    let markers: Vec<(usize, usize, String, bool)> = SECTION_RE
        .captures_iter(rendered)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((
                whole.start(),
                whole.end(),
                caps.get(1)?.as_str().to_string(),
                caps.get(2)?.as_str() == "required",
            ))
        })
        .collect();

    let mut sections = Vec::new();
    for (i, (_, content_start, key, required)) in markers.iter().enumerate() {
        let content_end = markers.get(i + 1).map_or(rendered.len(), |next| next.0);
        let content = rendered[*content_start..content_end].trim().to_string();
        if !content.is_empty() || *required {
            sections.push(ParsedSection {
                key: key.clone(),
                required: *required,
                content,
            });
        }
    }
    sections
}

fn total_len(sections: &[ParsedSection]) -> usize {
    sections.iter().map(|s| s.content.len()).sum()
}

fn apply_budget_to_sections(sections: &mut Vec<ParsedSection>, budget: usize) {
    if total_len(sections) <= budget {
        return;
    }

    for key in DROP_ORDER {
        if total_len(sections) <= budget {
            break;
        }
        if let Some(idx) = sections.iter().position(|s| s.key == *key && !s.required) {
            debug!(
                section = *key,
                bytes_dropped = sections[idx].content.len(),
                "dropped section for budget"
            );
            sections.remove(idx);
        }
    }

    if total_len(sections) > budget {
        warn!(
            budget,
            required_bytes = total_len(sections),
            "required prompt sections exceed the budget, sending them whole"
        );
    }
}

fn render_sections(sections: &[ParsedSection]) -> String {
    let mut out = sections
        .iter()
        .map(|s| s.content.as_str())
        .filter(|content| !content.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

/// Builds the generation instruction within a byte budget.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    budget_bytes: usize,
}

impl PromptBuilder {
    pub fn new(budget_bytes: usize) -> Self {
        Self { budget_bytes }
    }

    pub fn build(&self, input: &PromptInputs<'_>) -> Result<String> {
        let rendered = render_template(input)?;
        let mut sections = parse_sections(&rendered);
        apply_budget_to_sections(&mut sections, self.budget_bytes);
        Ok(render_sections(&sections))
    }
}
