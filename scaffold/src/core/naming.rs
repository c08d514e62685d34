//! Names of the generated artifacts, all derived from the test case title.

use serde::Serialize;

use crate::core::safe_path::make_safe_basename;

/// Slug used when a title has no ASCII alphanumerics.
pub const FALLBACK_SLUG: &str = "test-case";

/// Every name a generation run needs, computed once from the title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactNames {
    pub title: String,
    pub slug: String,
    pub spec_file: String,
    pub page_file: String,
    pub locators_file: String,
    pub page_class: String,
}

impl ArtifactNames {
    pub fn from_title(title: &str) -> Self {
        let slug = slugify(title);
        Self {
            title: title.trim().to_string(),
            spec_file: format!("{slug}.spec.ts"),
            page_file: format!("{slug}.page.ts"),
            locators_file: format!("{slug}.json"),
            page_class: format!("{}Page", pascal_case(title)),
            slug,
        }
    }
}

/// Lower-case, hyphen-separated, filesystem-safe slug.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        return FALLBACK_SLUG.to_string();
    }
    make_safe_basename(&slug)
}

/// PascalCase identifier built from the alphanumeric words of a title.
pub fn pascal_case(title: &str) -> String {
    let mut out: String = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if out.is_empty() {
        out.push_str("TestCase");
    } else if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "Case");
    }
    out
}
