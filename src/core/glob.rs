//! Wildcard matching built on `globset`.
//!
//! Two flavours are needed. Token and file-name patterns only know `*` and `?`,
//! and `*` matches any run of characters. Path patterns handed to the
//! enumerator keep directory semantics: `*`/`?` stop at `/`, `**` crosses it.

use globset::{GlobBuilder, GlobMatcher};
use std::borrow::Cow;

use super::error::CoreError;

/// A compiled `*`/`?` wildcard together with its case mode.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    text: String,
    case_insensitive: bool,
    matcher: GlobMatcher,
}

impl WildcardPattern {
    pub fn new(text: &str, case_insensitive: bool) -> Result<Self, CoreError> {
        let glob = GlobBuilder::new(&escape_wildcard(text))
            .case_insensitive(case_insensitive)
            .literal_separator(false)
            .backslash_escape(false)
            .build()?;

        Ok(Self {
            text: text.to_string(),
            case_insensitive,
            matcher: glob.compile_matcher(),
        })
    }

    /// The pattern as the user wrote it.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.matcher.is_match(candidate)
    }
}

impl PartialEq for WildcardPattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.case_insensitive == other.case_insensitive
    }
}

impl std::fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Rewrites a `*`/`?` wildcard into glob syntax, neutralising every other
/// glob metacharacter so it matches literally.
fn escape_wildcard(text: &str) -> String {
    escape_literals(text, true)
}

/// Wraps `[`, `]`, `{` and `}` in single-character classes. With
/// `collapse_stars`, runs of `*` become one `*`.
fn escape_literals(text: &str, collapse_stars: bool) -> String {
    let mut escaped = String::with_capacity(text.len() + 4);
    let mut previous_star = false;

    for c in text.chars() {
        match c {
            // `**` has path meaning in globset; for tokens it equals `*`.
            '*' if previous_star && collapse_stars => continue,
            '[' | ']' | '{' | '}' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
        previous_star = c == '*';
    }

    escaped
}

/// Builds the matcher the enumerator uses for a full path pattern.
///
/// Only `*`, `?` and `**` are wildcards; every other character is literal.
pub fn build_path_glob(pattern: &str, case_insensitive: bool) -> Result<GlobMatcher, CoreError> {
    let glob = GlobBuilder::new(&escape_literals(&normalize_separators(pattern), false))
        .case_insensitive(case_insensitive)
        .literal_separator(true)
        .backslash_escape(false)
        .build()?;
    Ok(glob.compile_matcher())
}

/// Forward slashes everywhere so one pattern syntax works on every platform.
pub fn normalize_separators(path: &str) -> Cow<'_, str> {
    if cfg!(windows) && path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}

/// `true` if the text contains a character with wildcard meaning.
pub fn has_wildcard(text: &str) -> bool {
    text.contains(['*', '?'])
}
