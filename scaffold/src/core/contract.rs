//! Parsing of the generation service's artifact response.
//!
//! The response must be one JSON object with six string fields (see
//! `schemas/artifact_response.schema.json`). A response wrapped in a code
//! fence gets exactly one retry with the fence removed. Anything else is a
//! [`ScaffoldError::ContractViolation`] carrying a truncated copy of the raw
//! text.

use anyhow::{Context, Result};
use jsonschema::Draft;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::locator_set::LocatorSet;
use crate::error::ScaffoldError;

pub const RESPONSE_SCHEMA: &str = include_str!("../../schemas/artifact_response.schema.json");

/// Raw text kept in a contract violation, in characters.
pub const EXCERPT_CHARS: usize = 500;

/// Wire shape of a generation response. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactResponse {
    pub spec_path: String,
    pub spec_content: String,
    pub page_path: String,
    pub page_content: String,
    pub locators_path: String,
    pub locators_content: String,
}

/// A proposed source file: path as suggested by the service, plus content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedFile {
    pub path: String,
    pub content: String,
}

/// Validated artifacts of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationArtifactSet {
    pub spec: ProposedFile,
    pub page: ProposedFile,
    pub locators_path: String,
    pub locators: LocatorSet,
    /// Locator entries dropped while reading `locatorsContent`.
    pub skipped_locators: Vec<String>,
}

/// Parse and validate a raw generation response.
pub fn parse_artifact_response(raw: &str) -> Result<GenerationArtifactSet> {
    let value = match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) => value,
        Err(first_err) => {
            let Some(inner) = strip_code_fences(raw) else {
                return Err(violation(format!("response is not JSON: {first_err}"), raw).into());
            };
            serde_json::from_str::<Value>(inner).map_err(|err| {
                violation(format!("fenced response is not JSON: {err}"), raw)
            })?
        }
    };

    let problems = schema_problems(&value)?;
    if !problems.is_empty() {
        return Err(violation(problems.join("; "), raw).into());
    }

    let response: ArtifactResponse = serde_json::from_value(value)
        .map_err(|err| violation(format!("unexpected response shape: {err}"), raw))?;

    let parsed_locators = LocatorSet::from_json_lenient(&response.locators_content)
        .map_err(|err| violation(format!("locatorsContent is not a locator document: {err}"), raw))?;

    Ok(GenerationArtifactSet {
        spec: ProposedFile {
            path: response.spec_path,
            content: response.spec_content,
        },
        page: ProposedFile {
            path: response.page_path,
            content: response.page_content,
        },
        locators_path: response.locators_path,
        locators: parsed_locators.set,
        skipped_locators: parsed_locators.skipped,
    })
}

fn schema_problems(instance: &Value) -> Result<Vec<String>> {
    let schema: Value =
        serde_json::from_str(RESPONSE_SCHEMA).context("parse artifact response schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .context("compile artifact response schema")?;
    Ok(compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect())
}

/// Return the body of the first fenced block (``` or ~~~), if any.
pub fn strip_code_fences(raw: &str) -> Option<&str> {
    let (start, fence) = ["```", "~~~"]
        .iter()
        .filter_map(|fence| raw.find(fence).map(|idx| (idx, *fence)))
        .min_by_key(|(idx, _)| *idx)?;
    let after_open = &raw[start + fence.len()..];
    // The opening line may carry a language tag such as `json`.
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    let end = body.rfind(fence).unwrap_or(body.len());
    Some(body[..end].trim())
}

fn violation(reason: String, raw: &str) -> ScaffoldError {
    ScaffoldError::ContractViolation {
        reason,
        excerpt: excerpt(raw),
    }
}

/// First [`EXCERPT_CHARS`] characters of `raw`, with a truncation note.
pub fn excerpt(raw: &str) -> String {
    match raw.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!(
            "{}\n[truncated {} bytes]",
            &raw[..cut],
            raw.len() - cut
        ),
        None => raw.to_string(),
    }
}
