//! Tokenizing a record and scoring it against the search and ignore strings.

use std::collections::BTreeSet;

use super::criteria::SearchCriteria;
use super::glob::WildcardPattern;

/// Punctuation and whitespace that separate tokens unless configured otherwise.
pub const DEFAULT_DELIMITERS: &str = " \t,.;:!\"'`()[]{}<>=+-/\\|&^%$#@~";

/// The set of characters that bound tokens inside a record.
///
/// Space and tab always belong to the set: patterns are split on whitespace,
/// so a token containing either could never be matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    chars: BTreeSet<char>,
}

impl Delimiters {
    pub fn new(chars: &str) -> Self {
        let mut set: BTreeSet<char> = chars.chars().collect();
        set.insert(' ');
        set.insert('\t');
        Self { chars: set }
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    /// Tokens of `record` starting at byte offset `cursor`.
    pub fn tokens<'a>(&'a self, record: &'a str, cursor: usize) -> Tokens<'a> {
        let mut pos = cursor.min(record.len());
        while !record.is_char_boundary(pos) {
            pos += 1;
        }
        Tokens {
            record,
            delimiters: self,
            pos,
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITERS)
    }
}

impl std::fmt::Display for Delimiters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.chars.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

/// Iterator over the non-empty, delimiter-bounded tokens of a record.
/// Yields the byte offset of each token along with its text.
pub struct Tokens<'a> {
    record: &'a str,
    delimiters: &'a Delimiters,
    pos: usize,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.record[self.pos..];
        let (offset, _) = rest
            .char_indices()
            .find(|(_, c)| !self.delimiters.contains(*c))?;

        let start = self.pos + offset;
        let tail = &self.record[start..];
        let len = tail
            .char_indices()
            .find(|(_, c)| self.delimiters.contains(*c))
            .map_or(tail.len(), |(i, _)| i);

        self.pos = start + len;
        Some((start, &tail[..len]))
    }
}

/// Per-record scoring result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMatchState {
    /// Token matches per search string, index-aligned with the search list.
    pub search_hits: Vec<usize>,
    /// Token matches per ignore string, index-aligned with the ignore list.
    pub ignore_hits: Vec<usize>,
    /// Distinct search strings matched in this record.
    pub match_count: usize,
    /// Distinct ignore strings matched in this record.
    pub ignore_count: usize,
}

/// Scores records against the active search and ignore strings.
#[derive(Debug, Clone, Copy)]
pub struct RecordMatcher<'a> {
    search: &'a [WildcardPattern],
    ignore: &'a [WildcardPattern],
    delimiters: &'a Delimiters,
}

impl<'a> RecordMatcher<'a> {
    pub fn new(
        search: &'a [WildcardPattern],
        ignore: &'a [WildcardPattern],
        delimiters: &'a Delimiters,
    ) -> Self {
        Self {
            search,
            ignore,
            delimiters,
        }
    }

    pub fn from_criteria(criteria: &'a SearchCriteria) -> Self {
        Self::new(
            &criteria.search_strings,
            &criteria.ignore_strings,
            &criteria.delimiters,
        )
    }

    pub fn search_len(&self) -> usize {
        self.search.len()
    }

    pub fn ignore_len(&self) -> usize {
        self.ignore.len()
    }

    pub fn search_patterns(&self) -> &'a [WildcardPattern] {
        self.search
    }

    pub fn delimiters(&self) -> &'a Delimiters {
        self.delimiters
    }

    /// Tokenizes `record` and tests every token against every pattern.
    ///
    /// A pattern counts towards `match_count`/`ignore_count` once per record;
    /// further token matches only raise its entry in the hit vectors. With no
    /// search strings the record is a single "no-criteria" match.
    pub fn scan(&self, record: &str) -> RecordMatchState {
        let mut state = RecordMatchState {
            search_hits: vec![0; self.search.len()],
            ignore_hits: vec![0; self.ignore.len()],
            match_count: 0,
            ignore_count: 0,
        };

        if self.search.is_empty() && self.ignore.is_empty() {
            state.match_count = 1;
            return state;
        }

        for (_, token) in self.delimiters.tokens(record, 0) {
            for (hits, pattern) in state.search_hits.iter_mut().zip(self.search) {
                if pattern.is_match(token) {
                    if *hits == 0 {
                        state.match_count += 1;
                    }
                    *hits += 1;
                }
            }
            for (hits, pattern) in state.ignore_hits.iter_mut().zip(self.ignore) {
                if pattern.is_match(token) {
                    if *hits == 0 {
                        state.ignore_count += 1;
                    }
                    *hits += 1;
                }
            }
        }

        if self.search.is_empty() {
            state.match_count = 1;
        }
        state
    }
}
