//! Parser for free-form test case documents.
//!
//! A document carries a metadata preamble (`Key: value` lines), optional
//! section headers (Preconditions, Steps, Actions, Expected Results) and a
//! title. Everything except a missing title is tolerated.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::actions::{ParsedActions, parse_actions_block};
use crate::error::ScaffoldError;

/// Metadata is only looked for in this many leading lines.
pub const METADATA_SCAN_LINES: usize = 40;

/// Normalized metadata keys accepted as the title, in priority order.
const TITLE_KEYS: &[&str] = &[
    "testcasetitle",
    "title",
    "testcase",
    "testcasename",
    "testname",
    "name",
    "scenario",
];

static METADATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9 .\-]*?)\s*[:=]\s*(.*?)\s*$")
        .expect("metadata regex should compile")
});

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:#+\s*)?(?:test\s+)?(preconditions?|steps?|actions?|expected(?:\s+results?)?)\s*(?::\s*(.*?))?\s*$",
    )
    .expect("header regex should compile")
});

/// Named region of a document introduced by a header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Preconditions,
    Steps,
    Actions,
    ExpectedResults,
}

impl SectionKind {
    fn from_header_word(word: &str) -> Self {
        let lower = word.to_ascii_lowercase();
        if lower.starts_with("precondition") {
            SectionKind::Preconditions
        } else if lower.starts_with("step") {
            SectionKind::Steps
        } else if lower.starts_with("action") {
            SectionKind::Actions
        } else {
            SectionKind::ExpectedResults
        }
    }
}

/// Structured view of one test case document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseDocument {
    pub title: String,
    /// Metadata with lower-cased keys, first occurrence wins.
    pub metadata: BTreeMap<String, String>,
    pub preconditions: Option<String>,
    pub steps: Option<String>,
    pub expected_results: Option<String>,
    /// Present when the document has an `Actions:` header, even if empty.
    pub actions: Option<ParsedActions>,
}

impl TestCaseDocument {
    /// Case-insensitive metadata lookup.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(&key.to_lowercase())
            .map(String::as_str)
    }

    pub fn has_actions_block(&self) -> bool {
        self.actions.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header<'a> {
    kind: SectionKind,
    inline: Option<&'a str>,
}

fn parse_header(line: &str) -> Option<Header<'_>> {
    let caps = HEADER_RE.captures(line)?;
    Some(Header {
        kind: SectionKind::from_header_word(caps.get(1)?.as_str()),
        inline: caps
            .get(2)
            .map(|m| m.as_str())
            .filter(|rest| !rest.is_empty()),
    })
}

fn parse_metadata_line(line: &str) -> Option<(String, String)> {
    let caps = METADATA_RE.captures(line)?;
    let key = caps.get(1)?.as_str().trim().to_lowercase();
    let value = unquote(caps.get(2)?.as_str());
    if key.is_empty() {
        return None;
    }
    Some((key, value.to_string()))
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”')] {
        if let Some(inner) = value
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    value
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Parse a raw document.
///
/// Fails only with [`ScaffoldError::MissingTitle`].
pub fn parse_document(raw: &str) -> Result<TestCaseDocument, ScaffoldError> {
    let lines: Vec<&str> = raw.lines().collect();
    let first_header = lines.iter().position(|line| parse_header(line).is_some());
    let preamble_end = first_header.unwrap_or(lines.len());

    let mut metadata = BTreeMap::new();
    for line in lines.iter().take(preamble_end.min(METADATA_SCAN_LINES)) {
        if let Some((key, value)) = parse_metadata_line(line) {
            metadata.entry(key).or_insert(value);
        }
    }

    let title = title_from_metadata(&metadata)
        .or_else(|| title_from_preamble(&lines[..preamble_end]))
        .ok_or(ScaffoldError::MissingTitle)?;

    // Repeated headers append to the region they first opened.
    let mut regions: Vec<(SectionKind, Vec<&str>)> = Vec::new();
    let mut current: Option<usize> = None;
    for line in lines.iter().skip(preamble_end) {
        if let Some(header) = parse_header(line) {
            let idx = match regions.iter().position(|(kind, _)| *kind == header.kind) {
                Some(idx) => idx,
                None => {
                    regions.push((header.kind, Vec::new()));
                    regions.len() - 1
                }
            };
            if let Some(inline) = header.inline {
                regions[idx].1.push(inline);
            }
            current = Some(idx);
        } else if let Some(idx) = current {
            regions[idx].1.push(line);
        }
    }

    let region = |kind: SectionKind| -> Option<String> {
        regions
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, body)| join_region(body))
    };

    Ok(TestCaseDocument {
        title,
        preconditions: region(SectionKind::Preconditions),
        steps: region(SectionKind::Steps),
        expected_results: region(SectionKind::ExpectedResults),
        actions: region(SectionKind::Actions).map(|body| parse_actions_block(&body)),
        metadata,
    })
}

fn title_from_metadata(metadata: &BTreeMap<String, String>) -> Option<String> {
    TITLE_KEYS.iter().find_map(|wanted| {
        metadata
            .iter()
            .find(|(key, value)| normalize_key(key) == *wanted && !value.is_empty())
            .map(|(_, value)| value.clone())
    })
}

fn title_from_preamble(preamble: &[&str]) -> Option<String> {
    preamble
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .find(|line| parse_metadata_line(line).is_none())
        .map(|line| unquote(line.trim_start_matches('#')).to_string())
        .filter(|title| !title.is_empty())
}

fn join_region(body: &[&str]) -> String {
    let joined = body.join("\n");
    joined.trim_matches('\n').trim_end().to_string()
}
