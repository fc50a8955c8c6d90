//! Saved search criteria: one `key value` pair per line.
//!
//! ```text
//! # nightly log sweep
//! search path ~/logs
//! search file *.log *.txt
//! search string timeout* refused
//! match rule 0
//! lines after 2
//! ```
//!
//! Rules are stored by index. Repeated list keys append to the list.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::core::{IgnoreRule, MatchRule, RawCriteria};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    MatchRule,
    IgnoreRule,
    SearchPath,
    SearchFile,
    SearchString,
    IgnoreFiles,
    IgnoreString,
    Delimiters,
    DateFrom,
    DateTo,
    CaseFiles,
    CaseStrings,
    ListDetail,
    LinesBefore,
    LinesAfter,
}

const KEYS: &[(&str, Key)] = &[
    ("match rule", Key::MatchRule),
    ("ignore rule", Key::IgnoreRule),
    ("search path", Key::SearchPath),
    ("search file", Key::SearchFile),
    ("search string", Key::SearchString),
    ("ignore files", Key::IgnoreFiles),
    ("ignore string", Key::IgnoreString),
    ("delimiters", Key::Delimiters),
    ("date from", Key::DateFrom),
    ("date to", Key::DateTo),
    ("case files", Key::CaseFiles),
    ("case strings", Key::CaseStrings),
    ("list detail", Key::ListDetail),
    ("lines before", Key::LinesBefore),
    ("lines after", Key::LinesAfter),
];

fn split_key(line: &str) -> Option<(&'static str, Key, &str)> {
    KEYS.iter().find_map(|(name, key)| {
        let rest = line.strip_prefix(name)?;
        if rest.is_empty() {
            Some((*name, *key, rest))
        } else {
            rest.strip_prefix(' ').map(|value| (*name, *key, value))
        }
    })
}

fn append(list: &mut String, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    if !list.is_empty() {
        list.push(' ');
    }
    list.push_str(value);
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        other => anyhow::bail!("Invalid value {:?} for '{}'", other, key),
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid number {:?} for '{}'", value.trim(), key))
}

/// Parses criteria text. Unknown keys are skipped with a warning.
pub fn parse_criteria(text: &str) -> Result<RawCriteria> {
    let mut raw = RawCriteria::default();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((name, key, value)) = split_key(trimmed) else {
            tracing::warn!("Ignoring unknown criteria key on line {}: {}", number + 1, trimmed);
            continue;
        };

        match key {
            Key::MatchRule => raw.match_rule = value.parse::<MatchRule>()?,
            Key::IgnoreRule => raw.ignore_rule = value.parse::<IgnoreRule>()?,
            Key::SearchPath => raw.search_path = value.trim().to_string(),
            Key::SearchFile => append(&mut raw.search_files, value),
            Key::SearchString => append(&mut raw.search_strings, value),
            Key::IgnoreFiles => append(&mut raw.ignore_files, value),
            Key::IgnoreString => append(&mut raw.ignore_strings, value),
            // Kept verbatim: a delimiter set may start or end with a space.
            Key::Delimiters => raw.delimiters = Some(value.to_string()),
            Key::DateFrom => raw.date_from = value.trim().to_string(),
            Key::DateTo => raw.date_to = value.trim().to_string(),
            Key::CaseFiles => raw.ignore_case_files = parse_flag(name, value)?,
            Key::CaseStrings => raw.ignore_case_strings = parse_flag(name, value)?,
            Key::ListDetail => raw.list_detail = parse_flag(name, value)?,
            Key::LinesBefore => raw.lines_before = parse_count(name, value)?,
            Key::LinesAfter => raw.lines_after = parse_count(name, value)?,
        }
    }

    Ok(raw)
}

/// Renders criteria in the format [`parse_criteria`] reads.
pub fn render_criteria(raw: &RawCriteria) -> String {
    let mut out = String::new();
    let flag = |b: bool| u8::from(b);

    let _ = writeln!(out, "match rule {}", raw.match_rule.index());
    let _ = writeln!(out, "ignore rule {}", raw.ignore_rule.index());
    for (key, value) in [
        ("search path", &raw.search_path),
        ("search file", &raw.search_files),
        ("search string", &raw.search_strings),
        ("ignore files", &raw.ignore_files),
        ("ignore string", &raw.ignore_strings),
        ("date from", &raw.date_from),
        ("date to", &raw.date_to),
    ] {
        if !value.is_empty() {
            let _ = writeln!(out, "{key} {value}");
        }
    }
    if let Some(delimiters) = &raw.delimiters {
        let _ = writeln!(out, "delimiters {delimiters}");
    }
    let _ = writeln!(out, "case files {}", flag(raw.ignore_case_files));
    let _ = writeln!(out, "case strings {}", flag(raw.ignore_case_strings));
    let _ = writeln!(out, "list detail {}", flag(raw.list_detail));
    let _ = writeln!(out, "lines before {}", raw.lines_before);
    let _ = writeln!(out, "lines after {}", raw.lines_after);
    out
}

pub fn load_criteria(path: &Path) -> Result<RawCriteria> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Could not read criteria file {:?}", path))?;
    let raw = parse_criteria(&text).with_context(|| format!("In criteria file {:?}", path))?;
    tracing::info!("Loaded criteria from {:?}", path);
    Ok(raw)
}

pub fn save_criteria(path: &Path, raw: &RawCriteria) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_criteria(raw))
        .with_context(|| format!("Could not write criteria file {:?}", path))?;
    tracing::info!("Saved criteria to {:?}", path);
    Ok(())
}
