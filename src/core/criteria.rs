//! The search-criteria model: raw user input and its normalized form.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::str::FromStr;

use super::date::{parse_date_expr, DateBound};
use super::error::CoreError;
use super::glob::WildcardPattern;
use super::record::{Delimiters, DEFAULT_DELIMITERS};

/// Upper bound on entries per pattern list, kept for criteria-file compatibility.
pub const MAX_PATTERNS: usize = 10;

/// How many search strings must hit a file for it to be accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchRule {
    #[default]
    Any,
    All,
    AllInRecord,
}

/// How ignore-string hits suppress a file or an individual record match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IgnoreRule {
    #[default]
    Any,
    All,
    AllInRecord,
    CancelRecordIfAny,
    CancelRecordIfAll,
}

impl MatchRule {
    pub const ALL: [MatchRule; 3] = [MatchRule::Any, MatchRule::All, MatchRule::AllInRecord];

    pub fn name(self) -> &'static str {
        match self {
            MatchRule::Any => "any",
            MatchRule::All => "all",
            MatchRule::AllInRecord => "all-in-record",
        }
    }

    /// Position used by the criteria file.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl IgnoreRule {
    pub const ALL: [IgnoreRule; 5] = [
        IgnoreRule::Any,
        IgnoreRule::All,
        IgnoreRule::AllInRecord,
        IgnoreRule::CancelRecordIfAny,
        IgnoreRule::CancelRecordIfAll,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IgnoreRule::Any => "any",
            IgnoreRule::All => "all",
            IgnoreRule::AllInRecord => "all-in-record",
            IgnoreRule::CancelRecordIfAny => "cancel-record-if-any",
            IgnoreRule::CancelRecordIfAll => "cancel-record-if-all",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Accepts either the rule name or its numeric index.
fn parse_rule<T: Copy>(text: &str, all: &[T], name: impl Fn(T) -> &'static str) -> Result<T, CoreError> {
    let text = text.trim();
    if let Ok(index) = text.parse::<usize>() {
        return all
            .get(index)
            .copied()
            .ok_or_else(|| CoreError::UnknownRule(text.to_string()));
    }
    all.iter()
        .copied()
        .find(|rule| name(*rule).eq_ignore_ascii_case(text))
        .ok_or_else(|| CoreError::UnknownRule(text.to_string()))
}

impl FromStr for MatchRule {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_rule(s, &Self::ALL, Self::name)
    }
}

impl FromStr for IgnoreRule {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_rule(s, &Self::ALL, Self::name)
    }
}

impl std::fmt::Display for MatchRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Criteria as entered by the user: free text, one field per input box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCriteria {
    pub search_path: String,
    pub search_files: String,
    pub search_strings: String,
    pub ignore_files: String,
    pub ignore_strings: String,
    /// `None` selects [`DEFAULT_DELIMITERS`].
    pub delimiters: Option<String>,
    pub date_from: String,
    pub date_to: String,
    pub match_rule: MatchRule,
    pub ignore_rule: IgnoreRule,
    pub ignore_case_files: bool,
    pub ignore_case_strings: bool,
    pub list_detail: bool,
    pub lines_before: usize,
    pub lines_after: usize,
}

/// Normalized, validated criteria consumed by the engine.
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    /// Absolute directory pattern, always ending in a path separator.
    pub path_pattern: String,
    pub file_patterns: Vec<WildcardPattern>,
    pub search_strings: Vec<WildcardPattern>,
    pub ignore_file_patterns: Vec<WildcardPattern>,
    pub ignore_strings: Vec<WildcardPattern>,
    pub delimiters: Delimiters,
    pub date_from: Option<DateTime<Local>>,
    pub date_to: Option<DateTime<Local>>,
    pub match_rule: MatchRule,
    pub ignore_rule: IgnoreRule,
    pub ignore_case_files: bool,
    pub ignore_case_strings: bool,
    pub list_detail: bool,
    pub lines_before: usize,
    pub lines_after: usize,
}

impl SearchCriteria {
    /// The glob handed to the enumerator for one search-file pattern.
    pub fn enumeration_pattern(&self, file_pattern: &WildcardPattern) -> String {
        format!("{}{}", self.path_pattern, file_pattern.as_str())
    }

    /// `true` if the file's name or full path matches an ignore-file pattern.
    pub fn is_ignored_file(&self, path: &Path) -> bool {
        let full = path.to_string_lossy();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        self.ignore_file_patterns
            .iter()
            .any(|p| p.is_match(&name) || p.is_match(&full))
    }

    /// `true` if the file name matches one of the search-file patterns.
    pub fn matches_file_name(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        self.file_patterns.iter().any(|p| p.is_match(&name))
    }

    /// `true` when neither search nor ignore strings are set: the file itself is the match.
    pub fn matches_on_identity(&self) -> bool {
        self.search_strings.is_empty() && self.ignore_strings.is_empty()
    }

    /// Re-runs the checks `normalize` performs, for criteria built by hand.
    pub fn validate(&self, now: DateTime<Local>) -> Result<(), CoreError> {
        check_delimiter_conflicts(&self.search_strings, &self.delimiters)?;
        check_delimiter_conflicts(&self.ignore_strings, &self.delimiters)?;
        check_date_range(self.date_from, self.date_to, now)?;

        if self.path_pattern.trim().is_empty() {
            return Err(CoreError::InvalidPathPattern("empty search path".to_string()));
        }
        if !Path::new(&self.path_pattern).is_absolute() {
            return Err(CoreError::InvalidPathPattern(format!(
                "{} is not absolute",
                self.path_pattern
            )));
        }
        if let Some(bad) = self
            .file_patterns
            .iter()
            .find(|p| p.as_str().contains(['/', MAIN_SEPARATOR]))
        {
            return Err(CoreError::InvalidPathPattern(format!(
                "file pattern {bad} must not contain a path separator"
            )));
        }
        Ok(())
    }
}

/// Normalizes raw criteria against the current time.
pub fn normalize(raw: &RawCriteria) -> Result<SearchCriteria, CoreError> {
    normalize_at(raw, Local::now())
}

/// Normalizes raw criteria, resolving relative dates against `now`.
pub fn normalize_at(raw: &RawCriteria, now: DateTime<Local>) -> Result<SearchCriteria, CoreError> {
    let delimiters = Delimiters::new(raw.delimiters.as_deref().unwrap_or(DEFAULT_DELIMITERS));

    let mut file_texts = split_patterns(&raw.search_files);
    if file_texts.is_empty() {
        file_texts.push("*".to_string());
    }

    let file_patterns = compile(&file_texts, raw.ignore_case_files)?;
    let ignore_file_patterns = compile(&split_patterns(&raw.ignore_files), raw.ignore_case_files)?;
    let search_strings = compile(&split_patterns(&raw.search_strings), raw.ignore_case_strings)?;
    let ignore_strings = compile(&split_patterns(&raw.ignore_strings), raw.ignore_case_strings)?;

    let date_from = parse_date_expr(&raw.date_from, DateBound::From, now);
    // An upper bound of "now" stays open so files modified during the run still qualify.
    let date_to = parse_date_expr(&raw.date_to, DateBound::To, now).filter(|to| *to < now);

    let criteria = SearchCriteria {
        path_pattern: resolve_search_path(&raw.search_path)?,
        file_patterns,
        search_strings,
        ignore_file_patterns,
        ignore_strings,
        delimiters,
        date_from,
        date_to,
        match_rule: raw.match_rule,
        ignore_rule: raw.ignore_rule,
        ignore_case_files: raw.ignore_case_files,
        ignore_case_strings: raw.ignore_case_strings,
        list_detail: raw.list_detail,
        lines_before: raw.lines_before,
        lines_after: raw.lines_after,
    };
    criteria.validate(now)?;
    Ok(criteria)
}

/// Splits a free-text field on whitespace.
///
/// Quotes carry no meaning, so a pattern cannot contain a space.
pub fn split_patterns(text: &str) -> Vec<String> {
    let mut patterns: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    if patterns.len() > MAX_PATTERNS {
        tracing::warn!(
            "Dropping {} patterns beyond the limit of {}: {:?}",
            patterns.len() - MAX_PATTERNS,
            MAX_PATTERNS,
            &patterns[MAX_PATTERNS..]
        );
        patterns.truncate(MAX_PATTERNS);
    }
    patterns
}

fn compile(texts: &[String], case_insensitive: bool) -> Result<Vec<WildcardPattern>, CoreError> {
    texts
        .iter()
        .map(|t| WildcardPattern::new(t, case_insensitive))
        .collect()
}

fn check_delimiter_conflicts(
    patterns: &[WildcardPattern],
    delimiters: &Delimiters,
) -> Result<(), CoreError> {
    for pattern in patterns {
        if let Some(character) = pattern
            .as_str()
            .chars()
            .find(|c| *c != ' ' && *c != '*' && delimiters.contains(*c))
        {
            return Err(CoreError::DelimiterConflict {
                character,
                pattern: pattern.as_str().to_string(),
            });
        }
    }
    Ok(())
}

fn check_date_range(
    from: Option<DateTime<Local>>,
    to: Option<DateTime<Local>>,
    now: DateTime<Local>,
) -> Result<(), CoreError> {
    let format = |d: DateTime<Local>| d.format("%Y-%m-%d %H:%M:%S").to_string();

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(CoreError::InvalidDateRange {
                from: format(from),
                to: format(to),
            });
        }
    }
    for bound in [from, to].into_iter().flatten() {
        if bound > now {
            return Err(CoreError::DateInFuture(format(bound)));
        }
    }
    Ok(())
}

/// Turns the search path into an absolute directory pattern ending in a separator.
fn resolve_search_path(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    let expanded: PathBuf = match trimmed.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', MAIN_SEPARATOR]) => {
            let home = dirs::home_dir().ok_or_else(|| {
                CoreError::InvalidPathPattern("cannot resolve home directory".to_string())
            })?;
            home.join(rest.trim_start_matches(['/', MAIN_SEPARATOR]))
        }
        _ => PathBuf::from(trimmed),
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| CoreError::InvalidPathPattern(format!("no current directory: {e}")))?;
        if trimmed.is_empty() {
            cwd
        } else {
            cwd.join(expanded)
        }
    };

    let mut pattern = absolute.to_string_lossy().into_owned();
    if !pattern.ends_with(['/', MAIN_SEPARATOR]) {
        pattern.push(MAIN_SEPARATOR);
    }
    Ok(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn raw() -> RawCriteria {
        RawCriteria {
            search_path: "/tmp/data".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let criteria = normalize_at(&raw(), now()).unwrap();
        assert_eq!(criteria.file_patterns.len(), 1);
        assert_eq!(criteria.file_patterns[0].as_str(), "*");
        assert!(criteria.search_strings.is_empty());
        assert!(criteria.delimiters.contains(','));
        assert!(criteria.path_pattern.ends_with(MAIN_SEPARATOR));
        assert!(criteria.matches_on_identity());
    }

    #[test]
    fn test_whitespace_split_and_cap() {
        let texts = split_patterns("  a b\tc\n d ");
        assert_eq!(texts, vec!["a", "b", "c", "d"]);

        let many = (0..14).map(|i| format!("p{i}")).collect::<Vec<_>>().join(" ");
        let capped = split_patterns(&many);
        assert_eq!(capped.len(), MAX_PATTERNS);
        assert_eq!(capped.last().map(String::as_str), Some("p9"));
    }

    #[test]
    fn test_quotes_do_not_group_words() {
        assert_eq!(split_patterns("'foo bar'"), vec!["'foo", "bar'"]);
    }

    #[test]
    fn test_delimiter_conflict_is_rejected() {
        let input = RawCriteria {
            search_strings: "foo.bar".to_string(),
            ..raw()
        };
        let err = normalize_at(&input, now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::DelimiterConflict { character: '.', .. }
        ));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_star_is_exempt_from_conflicts() {
        let input = RawCriteria {
            search_strings: "foo*".to_string(),
            delimiters: Some("*,".to_string()),
            ..raw()
        };
        assert!(normalize_at(&input, now()).is_ok());
    }

    #[test]
    fn test_ignore_strings_are_checked_too() {
        let input = RawCriteria {
            ignore_strings: "a-b".to_string(),
            ..raw()
        };
        assert!(matches!(
            normalize_at(&input, now()),
            Err(CoreError::DelimiterConflict { character: '-', .. })
        ));
    }

    #[test]
    fn test_date_range_validation() {
        let inverted = RawCriteria {
            date_from: "-1".to_string(),
            date_to: "-7".to_string(),
            ..raw()
        };
        assert!(matches!(
            normalize_at(&inverted, now()),
            Err(CoreError::InvalidDateRange { .. })
        ));

        let future = RawCriteria {
            date_to: "2030-01-01".to_string(),
            ..raw()
        };
        assert!(matches!(
            normalize_at(&future, now()),
            Err(CoreError::DateInFuture(_))
        ));

        let valid = RawCriteria {
            date_from: "-7".to_string(),
            date_to: "0".to_string(),
            ..raw()
        };
        let criteria = normalize_at(&valid, now()).unwrap();
        assert_eq!(criteria.date_from, Some(now() - Duration::days(7)));
        assert_eq!(criteria.date_to, None);
    }

    #[test]
    fn test_upper_bound_of_today_is_open() {
        let today = RawCriteria {
            date_to: "2024-06-15".to_string(),
            ..raw()
        };
        assert_eq!(normalize_at(&today, now()).unwrap().date_to, None);

        let yesterday = RawCriteria {
            date_to: "-1".to_string(),
            ..raw()
        };
        assert_eq!(
            normalize_at(&yesterday, now()).unwrap().date_to,
            Some(now() - Duration::days(1))
        );
    }

    #[test]
    fn test_invalid_dates_mean_no_bound() {
        let input = RawCriteria {
            date_from: "last week".to_string(),
            ..raw()
        };
        let criteria = normalize_at(&input, now()).unwrap();
        assert_eq!(criteria.date_from, None);
    }

    #[test]
    fn test_case_modes_flow_into_patterns() {
        let input = RawCriteria {
            search_files: "*.RS".to_string(),
            search_strings: "Foo".to_string(),
            ignore_case_files: true,
            ..raw()
        };
        let criteria = normalize_at(&input, now()).unwrap();
        assert!(criteria.file_patterns[0].is_case_insensitive());
        assert!(!criteria.search_strings[0].is_case_insensitive());
        assert!(criteria.matches_file_name(Path::new("/x/main.rs")));
    }

    #[test]
    fn test_ignore_file_matches_name_or_full_path() {
        let input = RawCriteria {
            ignore_files: "*.bak */target/*".to_string(),
            ..raw()
        };
        let criteria = normalize_at(&input, now()).unwrap();
        assert!(criteria.is_ignored_file(Path::new("/src/notes.bak")));
        assert!(criteria.is_ignored_file(Path::new("/src/target/debug.txt")));
        assert!(!criteria.is_ignored_file(Path::new("/src/main.rs")));
    }

    #[test]
    fn test_file_pattern_with_separator_is_rejected() {
        let input = RawCriteria {
            search_files: "src/*.rs".to_string(),
            ..raw()
        };
        assert!(matches!(
            normalize_at(&input, now()),
            Err(CoreError::InvalidPathPattern(_))
        ));
    }

    #[test]
    fn test_home_expansion() {
        if let Some(home) = dirs::home_dir() {
            let input = RawCriteria {
                search_path: "~/projects".to_string(),
                ..Default::default()
            };
            let criteria = normalize_at(&input, now()).unwrap();
            assert!(criteria.path_pattern.starts_with(&*home.to_string_lossy()));
            assert!(criteria.path_pattern.contains("projects"));
        }
    }

    #[test]
    fn test_rule_parsing() {
        assert_eq!("all-in-record".parse::<MatchRule>().unwrap(), MatchRule::AllInRecord);
        assert_eq!("1".parse::<MatchRule>().unwrap(), MatchRule::All);
        assert_eq!(
            "Cancel-Record-If-All".parse::<IgnoreRule>().unwrap(),
            IgnoreRule::CancelRecordIfAll
        );
        assert_eq!("3".parse::<IgnoreRule>().unwrap(), IgnoreRule::CancelRecordIfAny);
        assert!("7".parse::<MatchRule>().is_err());
        assert!("some".parse::<IgnoreRule>().is_err());
        assert_eq!(IgnoreRule::CancelRecordIfAll.index(), 4);
    }
}
