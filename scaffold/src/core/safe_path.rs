//! Confinement of externally supplied paths to a known root.
//!
//! Paths proposed by the generation service are untrusted. Every one goes
//! through [`resolve_safe_path`], which always returns a location at or
//! below the given root.

use std::path::{Path, PathBuf};

/// Upper bound on a sanitized file name, in characters.
pub const MAX_BASENAME_CHARS: usize = 120;

/// Name used when sanitizing leaves nothing behind.
pub const DEFAULT_BASENAME: &str = "artifact";

const RESERVED_STEMS: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '_' | '-')
}

/// Reduce arbitrary text to a portable file name.
///
/// Disallowed characters become `-`. A run of two or more separator
/// characters collapses to one: `.` if the run held a dot, `-` otherwise, so
/// `..` never survives. Leading and trailing separators are trimmed and
/// device names such as `con` get a suffix. The result is never empty.
pub fn make_safe_basename(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| if is_allowed(c) { c } else { '-' })
        .collect();

    let mut collapsed = String::with_capacity(replaced.len());
    let mut run = String::new();
    for c in replaced.chars() {
        if is_separator(c) {
            run.push(c);
            continue;
        }
        flush_separator_run(&mut collapsed, &mut run);
        collapsed.push(c);
    }
    flush_separator_run(&mut collapsed, &mut run);

    let mut name: String = collapsed
        .trim_matches(is_separator)
        .chars()
        .take(MAX_BASENAME_CHARS)
        .collect();
    name = name.trim_end_matches(is_separator).to_string();

    if name.is_empty() {
        return DEFAULT_BASENAME.to_string();
    }

    let stem = name.split('.').next().unwrap_or_default().to_ascii_lowercase();
    if RESERVED_STEMS.contains(&stem.as_str()) {
        name.insert_str(stem.len(), "-file");
    }
    name
}

fn flush_separator_run(out: &mut String, run: &mut String) {
    match run.chars().count() {
        0 => {}
        1 => out.push_str(run),
        _ if run.contains('.') => out.push('.'),
        _ => out.push('-'),
    }
    run.clear();
}

/// Normalize a candidate into root-relative components.
///
/// Backslashes count as separators, drive prefixes and leading slashes are
/// dropped, `.` is skipped and `..` pops a component. Returns `None` when a
/// `..` would climb above the root or nothing is left.
fn normalized_components(candidate: &str) -> Option<Vec<String>> {
    let unified = candidate.trim().replace('\\', "/");
    let without_drive = match unified.as_bytes() {
        [letter, b':', ..] if letter.is_ascii_alphabetic() => &unified[2..],
        _ => unified.as_str(),
    };

    let mut components: Vec<String> = Vec::new();
    for part in without_drive.split('/') {
        match part.trim() {
            "" | "." => {}
            ".." => {
                components.pop()?;
            }
            other => components.push(make_safe_basename(other)),
        }
    }
    (!components.is_empty()).then_some(components)
}

/// Resolve `candidate` below `root`.
///
/// Falls back to `root/<safe fallback_name>` when the normalized candidate
/// would escape the root or is empty. Components are sanitized with
/// [`make_safe_basename`].
pub fn resolve_safe_path(root: &Path, candidate: &str, fallback_name: &str) -> PathBuf {
    match normalized_components(candidate) {
        Some(components) => components
            .iter()
            .fold(root.to_path_buf(), |path, part| path.join(part)),
        None => root.join(make_safe_basename(fallback_name)),
    }
}

/// Strip a logical root prefix (such as `test/specs`) from a proposed path.
///
/// Generation responses usually express paths relative to the project; the
/// writer resolves them against the matching root, so the duplicate prefix
/// has to go first. Paths without the prefix are returned unchanged.
pub fn strip_logical_prefix(candidate: &str, logical_root: &str) -> String {
    let unified = candidate.trim().replace('\\', "/");
    let trimmed = unified.trim_start_matches("./").trim_start_matches('/');
    let prefix = logical_root.replace('\\', "/");
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return trimmed.to_string();
    }
    match trimmed.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() => String::new(),
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn basename_drops_traversal_and_illegal_characters() {
        let name = make_safe_basename("con:/../../weird??name.ts");
        assert!(!name.contains(".."));
        assert!(!name.contains('/'));
        assert!(name.chars().all(is_allowed));
        assert!(name.ends_with("name.ts"));
    }

    #[test]
    fn basename_keeps_ordinary_names() {
        assert_eq!(make_safe_basename("login.spec.ts"), "login.spec.ts");
        assert_eq!(make_safe_basename("My File (2).json"), "My-File-2.json");
    }

    #[test]
    fn basename_never_empty() {
        assert_eq!(make_safe_basename("///"), DEFAULT_BASENAME);
        assert_eq!(make_safe_basename(""), DEFAULT_BASENAME);
    }

    #[test]
    fn reserved_device_names_are_suffixed() {
        assert_eq!(make_safe_basename("NUL.json"), "NUL-file.json");
    }

    #[test]
    fn long_names_are_capped() {
        let name = make_safe_basename(&"a".repeat(500));
        assert_eq!(name.len(), MAX_BASENAME_CHARS);
    }

    #[test]
    fn relative_candidate_stays_below_root() {
        let root = Path::new("/project/test/specs");
        assert_eq!(
            resolve_safe_path(root, "auth/login.spec.ts", "fallback.ts"),
            root.join("auth").join("login.spec.ts")
        );
    }

    #[test]
    fn escaping_candidate_falls_back() {
        let root = Path::new("/project/test/specs");
        assert_eq!(
            resolve_safe_path(root, "../../etc/passwd", "login.spec.ts"),
            root.join("login.spec.ts")
        );
    }

    #[test]
    fn absolute_and_drive_candidates_are_rebased() {
        let root = Path::new("/project/out");
        assert_eq!(
            resolve_safe_path(root, "/etc/passwd", "x"),
            root.join("etc").join("passwd")
        );
        assert_eq!(
            resolve_safe_path(root, "C:\\Windows\\evil.ts", "x"),
            root.join("Windows").join("evil.ts")
        );
    }

    #[test]
    fn inner_parent_segments_resolve_normally() {
        let root = Path::new("/r");
        assert_eq!(resolve_safe_path(root, "a/../b.ts", "x"), root.join("b.ts"));
    }

    #[test]
    fn logical_prefix_is_stripped() {
        assert_eq!(
            strip_logical_prefix("test/specs/login.spec.ts", "test/specs"),
            "login.spec.ts"
        );
        assert_eq!(
            strip_logical_prefix("./src/pages/login.page.ts", "src/pages"),
            "login.page.ts"
        );
        assert_eq!(strip_logical_prefix("login.page.ts", "src/pages"), "login.page.ts");
        assert_eq!(
            strip_logical_prefix("src/pagesextra/x.ts", "src/pages"),
            "src/pagesextra/x.ts"
        );
    }

    proptest! {
        #[test]
        fn resolved_path_never_leaves_root(candidate in ".{0,80}", fallback in ".{0,20}") {
            let root = Path::new("/sandbox/root");
            let resolved = resolve_safe_path(root, &candidate, &fallback);
            prop_assert!(resolved.starts_with(root));
            prop_assert!(resolved != root);
            for component in resolved.strip_prefix(root).expect("below root").components() {
                prop_assert!(matches!(component, std::path::Component::Normal(_)));
            }
        }

        #[test]
        fn basename_is_portable(input in ".{0,200}") {
            let name = make_safe_basename(&input);
            prop_assert!(!name.is_empty());
            prop_assert!(!name.contains(".."));
            prop_assert!(name.chars().all(is_allowed));
        }
    }
}
