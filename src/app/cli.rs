use clap::Parser;
use std::path::PathBuf;

use crate::config::{criteria_file, EngineConfig};
use crate::core::{IgnoreRule, MatchRule, RawCriteria};

/// Find files by name and content using `*` and `?` wildcards.
#[derive(Parser, Debug, Default)]
#[command(name = "wildscan", version, about, long_about = None)]
pub struct Cli {
    /// Directory to search. May contain wildcards.
    #[arg(short = 'p', long = "path")]
    pub search_path: Option<String>,

    /// File name patterns, separated by spaces (e.g. "*.rs *.toml")
    #[arg(short = 'f', long = "files")]
    pub search_files: Option<String>,

    /// Content patterns matched against whole tokens
    #[arg(short = 's', long = "strings")]
    pub search_strings: Option<String>,

    /// File name patterns to skip
    #[arg(long)]
    pub ignore_files: Option<String>,

    /// Content patterns that suppress a file or record
    #[arg(long)]
    pub ignore_strings: Option<String>,

    /// Characters that separate tokens. Space and tab always do.
    #[arg(long)]
    pub delimiters: Option<String>,

    /// Oldest modification date: yyyy-mm-dd, or -N days ago
    #[arg(long = "from", allow_hyphen_values = true)]
    pub date_from: Option<String>,

    /// Newest modification date: yyyy-mm-dd, or -N days ago
    #[arg(long = "to", allow_hyphen_values = true)]
    pub date_to: Option<String>,

    /// any, all, all-in-record (or 0-2)
    #[arg(long)]
    pub match_rule: Option<MatchRule>,

    /// any, all, all-in-record, cancel-record-if-any, cancel-record-if-all (or 0-4)
    #[arg(long)]
    pub ignore_rule: Option<IgnoreRule>,

    /// Match file names case-insensitively
    #[arg(long)]
    pub ignore_case_files: bool,

    /// Match content case-insensitively
    #[arg(short = 'i', long)]
    pub ignore_case_strings: bool,

    /// List matching records instead of match counts
    #[arg(short = 'd', long = "detail")]
    pub list_detail: bool,

    /// Records of context before each match
    #[arg(short = 'B', long = "before")]
    pub lines_before: Option<usize>,

    /// Records of context after each match
    #[arg(short = 'A', long = "after")]
    pub lines_after: Option<usize>,

    /// Search only the files found by the previous run
    #[arg(long)]
    pub refine: bool,

    /// Load criteria from a file; flags given on the command line override it
    #[arg(long, value_name = "FILE")]
    pub criteria: Option<PathBuf>,

    /// Save the effective criteria to a file; later runs start from it
    #[arg(long, value_name = "FILE")]
    pub save_criteria: Option<PathBuf>,

    /// Hits file to write (and read with --refine)
    #[arg(long, value_name = "FILE")]
    pub hits: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Show a progress counter on stderr
    #[arg(long)]
    pub progress: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Criteria the flags are applied to: the `--criteria` file, else the
    /// remembered criteria file, else the configured defaults.
    pub fn base_criteria(&self, config: &EngineConfig) -> anyhow::Result<RawCriteria> {
        if let Some(path) = &self.criteria {
            return criteria_file::load_criteria(path);
        }
        if let Some(path) = &config.last_criteria_file {
            match criteria_file::load_criteria(path) {
                Ok(raw) => return Ok(raw),
                Err(e) => tracing::warn!("Ignoring remembered criteria file: {:#}", e),
            }
        }
        Ok(RawCriteria {
            delimiters: Some(config.default_delimiters.clone()),
            lines_before: config.default_lines_before,
            lines_after: config.default_lines_after,
            ..Default::default()
        })
    }

    /// Applies the flags that were given on top of `base`.
    pub fn apply_to(&self, base: RawCriteria) -> RawCriteria {
        let mut raw = base;

        let text_fields = [
            (&self.search_path, &mut raw.search_path),
            (&self.search_files, &mut raw.search_files),
            (&self.search_strings, &mut raw.search_strings),
            (&self.ignore_files, &mut raw.ignore_files),
            (&self.ignore_strings, &mut raw.ignore_strings),
            (&self.date_from, &mut raw.date_from),
            (&self.date_to, &mut raw.date_to),
        ];
        for (flag, field) in text_fields {
            if let Some(value) = flag {
                *field = value.clone();
            }
        }

        if let Some(delimiters) = &self.delimiters {
            raw.delimiters = Some(delimiters.clone());
        }
        if let Some(rule) = self.match_rule {
            raw.match_rule = rule;
        }
        if let Some(rule) = self.ignore_rule {
            raw.ignore_rule = rule;
        }
        raw.ignore_case_files |= self.ignore_case_files;
        raw.ignore_case_strings |= self.ignore_case_strings;
        raw.list_detail |= self.list_detail;
        if let Some(lines) = self.lines_before {
            raw.lines_before = lines;
        }
        if let Some(lines) = self.lines_after {
            raw.lines_after = lines;
        }
        raw
    }

    /// The default log filter directive for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_rules_by_name_and_index() {
        let cli = Cli::try_parse_from([
            "wildscan",
            "-p",
            "/data",
            "-f",
            "*.log",
            "--match-rule",
            "all-in-record",
            "--ignore-rule",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.match_rule, Some(MatchRule::AllInRecord));
        assert_eq!(cli.ignore_rule, Some(IgnoreRule::CancelRecordIfAny));
    }

    #[test]
    fn test_rejects_unknown_rule() {
        assert!(Cli::try_parse_from(["wildscan", "--match-rule", "most"]).is_err());
    }

    #[test]
    fn test_relative_dates_are_values() {
        let cli = Cli::try_parse_from(["wildscan", "--from", "-7", "--to", "0"]).unwrap();
        assert_eq!(cli.date_from.as_deref(), Some("-7"));
        assert_eq!(cli.date_to.as_deref(), Some("0"));
    }

    #[test]
    fn test_flags_override_base_criteria() {
        let base = RawCriteria {
            search_path: "/from/file".to_string(),
            search_strings: "kept".to_string(),
            lines_after: 4,
            ..Default::default()
        };
        let cli = Cli::try_parse_from(["wildscan", "-p", "/from/flag", "-d", "-B", "1"]).unwrap();
        let raw = cli.apply_to(base);

        assert_eq!(raw.search_path, "/from/flag");
        assert_eq!(raw.search_strings, "kept");
        assert!(raw.list_detail);
        assert_eq!((raw.lines_before, raw.lines_after), (1, 4));
    }

    #[test]
    fn test_remembered_criteria_file_is_the_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let remembered = dir.path().join("last.criteria");
        let saved = RawCriteria {
            search_strings: "remembered*".to_string(),
            ..Default::default()
        };
        criteria_file::save_criteria(&remembered, &saved).unwrap();
        let config = EngineConfig {
            last_criteria_file: Some(remembered.clone()),
            ..Default::default()
        };

        let cli = Cli::try_parse_from(["wildscan"]).unwrap();
        assert_eq!(cli.base_criteria(&config).unwrap().search_strings, "remembered*");

        let explicit = dir.path().join("explicit.criteria");
        let other = RawCriteria {
            search_strings: "explicit".to_string(),
            ..Default::default()
        };
        criteria_file::save_criteria(&explicit, &other).unwrap();
        let cli = Cli::try_parse_from(["wildscan", "--criteria", explicit.to_str().unwrap()]).unwrap();
        assert_eq!(cli.base_criteria(&config).unwrap().search_strings, "explicit");
    }

    #[test]
    fn test_missing_remembered_file_falls_back_to_defaults() {
        let config = EngineConfig {
            last_criteria_file: Some(PathBuf::from("/definitely/not/here.criteria")),
            default_lines_after: 3,
            ..Default::default()
        };
        let cli = Cli::try_parse_from(["wildscan"]).unwrap();
        let raw = cli.base_criteria(&config).unwrap();

        assert!(raw.search_strings.is_empty());
        assert_eq!(raw.lines_after, 3);
        assert_eq!(raw.delimiters.as_deref(), Some(config.default_delimiters.as_str()));
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Cli::try_parse_from(["wildscan"]).unwrap().log_level(), "warn");
        assert_eq!(Cli::try_parse_from(["wildscan", "-vv"]).unwrap().log_level(), "debug");
    }
}
