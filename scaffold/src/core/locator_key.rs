//! Deterministic mapping from a UI phrase to a camelCase locator key.
//!
//! A phrase such as `Login Button` becomes `loginButton`. Role words are
//! detected in a fixed priority order and always moved to the end of the key,
//! so `Button Login` and `Login button` both derive `loginButton`.

/// Key used when a phrase has no alphanumeric content at all.
pub const GENERIC_KEY: &str = "element";

/// Role word groups in detection priority. The first group containing a word
/// present in the phrase wins; within a group the first listed word wins.
pub const ROLE_GROUPS: &[&[&str]] = &[
    &["icon"],
    &["button"],
    &["option"],
    &["screen", "component", "form"],
    &["header", "title"],
];

/// Derive the locator key for a phrase.
///
/// Role words are matched against whole tokens (a trailing plural `s` is
/// tolerated), so `platform` never counts as the role `form`.
pub fn derive_locator_key(phrase: &str) -> String {
    let tokens = tokenize(phrase);
    if tokens.is_empty() {
        return GENERIC_KEY.to_string();
    }

    let role = detect_role(&tokens);
    let words: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|token| role.is_none_or(|role| !is_role_token(token, role)))
        .collect();

    let mut key = camel_case(&words);
    match role {
        Some(role) if key.is_empty() => key.push_str(role),
        Some(role) => key.push_str(&capitalize(role)),
        None => {}
    }
    if key.is_empty() {
        GENERIC_KEY.to_string()
    } else {
        key
    }
}

/// Human-readable label for a key: camelCase is split into words, the role
/// suffix is dropped and the first letter is capitalized.
///
/// `loginButton` becomes `Login`, `homeScreen` becomes `Home`. A key made of
/// a role word alone keeps it (`button` becomes `Button`).
pub fn humanize_key(key: &str) -> String {
    let mut words = split_camel(key);
    if words.len() > 1
        && let Some(last) = words.last()
        && ROLE_GROUPS
            .iter()
            .flat_map(|group| group.iter())
            .any(|role| last == role)
    {
        words.pop();
    }
    capitalize(&words.join(" "))
}

fn tokenize(phrase: &str) -> Vec<String> {
    phrase
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn detect_role(tokens: &[String]) -> Option<&'static str> {
    ROLE_GROUPS.iter().find_map(|group| {
        group
            .iter()
            .copied()
            .find(|role| tokens.iter().any(|token| is_role_token(token, role)))
    })
}

fn is_role_token(token: &str, role: &str) -> bool {
    token == role || token.strip_suffix('s') == Some(role)
}

fn camel_case(words: &[&str]) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn split_camel(key: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in key.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
