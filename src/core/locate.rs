//! Finding the tokens of a record that match a pattern, for highlighting.

use serde::{Deserialize, Serialize};

use super::glob::WildcardPattern;
use super::record::Delimiters;

/// A byte range inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Returns the next token at or after `cursor` that matches `pattern`.
///
/// Delimiters in front of the cursor are skipped first, so calling again with
/// `cursor = span.end()` walks every occurrence in the record.
pub fn locate(
    record: &str,
    pattern: &WildcardPattern,
    delimiters: &Delimiters,
    cursor: usize,
) -> Option<Span> {
    delimiters
        .tokens(record, cursor)
        .find(|(_, token)| pattern.is_match(token))
        .map(|(start, token)| Span {
            start,
            len: token.len(),
        })
}

/// Every occurrence of every pattern, sorted and with overlaps merged.
pub fn highlight_spans(
    record: &str,
    patterns: &[WildcardPattern],
    delimiters: &Delimiters,
) -> Vec<Span> {
    let mut spans = Vec::new();
    for pattern in patterns {
        let mut cursor = 0;
        while let Some(span) = locate(record, pattern, delimiters, cursor) {
            cursor = span.end();
            spans.push(span);
        }
    }

    spans.sort();
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end() => {
                last.len = last.len.max(span.end() - last.start);
            }
            _ => merged.push(span),
        }
    }
    merged
}
