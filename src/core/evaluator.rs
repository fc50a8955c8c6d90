//! Per-file accept/reject decision and the detailed listing of accepted files.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use super::context::ContextWindow;
use super::criteria::{IgnoreRule, MatchRule, SearchCriteria};
use super::error::CoreError;
use super::locate::highlight_spans;
use super::output::{OutputSink, SearchEvent};
use super::record::{RecordMatchState, RecordMatcher};

/// Why a file was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No record produced a counted match.
    NoMatches,
    /// A single record triggered the `any` or `all-in-record` ignore rule.
    IgnoredRecord,
    /// Every ignore string occurs somewhere in the file (`all` ignore rule).
    AllIgnoreStringsPresent,
    /// A search string never matched (`all` match rule).
    MissingSearchString,
}

/// Result of classifying one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted { matches: usize },
    Rejected(RejectReason),
    /// The run was cancelled while the file was being read.
    Cancelled,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }
}

/// How a detailed listing ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Complete { matched_records: usize },
    Cancelled,
}

/// File-wide accumulators for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMatchState {
    pub records: usize,
    pub total_matches: usize,
    pub search_hits: Vec<usize>,
    pub ignore_hits: Vec<usize>,
}

enum RecordDecision {
    RejectFile,
    Count(usize),
}

/// Classifies files against normalized criteria.
pub struct FileEvaluator<'a> {
    criteria: &'a SearchCriteria,
    matcher: RecordMatcher<'a>,
}

impl<'a> FileEvaluator<'a> {
    pub fn new(criteria: &'a SearchCriteria) -> Self {
        Self {
            criteria,
            matcher: RecordMatcher::from_criteria(criteria),
        }
    }

    /// Opens `path` and classifies its records.
    pub fn classify(&self, path: &Path, cancel: &AtomicBool) -> Result<Verdict, CoreError> {
        if self.criteria.matches_on_identity() {
            return Ok(Verdict::Accepted { matches: 0 });
        }
        let file = File::open(path).map_err(|e| CoreError::Io(e, path.to_path_buf()))?;
        let (verdict, _) = self
            .classify_reader(BufReader::new(file), cancel)
            .map_err(|e| CoreError::Io(e, path.to_path_buf()))?;
        Ok(verdict)
    }

    /// Streams records through the matcher and applies the match and ignore rules.
    pub fn classify_reader<R: BufRead>(
        &self,
        mut reader: R,
        cancel: &AtomicBool,
    ) -> io::Result<(Verdict, FileMatchState)> {
        let mut state = FileMatchState {
            search_hits: vec![0; self.matcher.search_len()],
            ignore_hits: vec![0; self.matcher.ignore_len()],
            ..Default::default()
        };
        let mut buffer = Vec::new();

        loop {
            if cancel.load(Ordering::Relaxed) {
                return Ok((Verdict::Cancelled, state));
            }
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            state.records += 1;

            let record = decode_record(&buffer);
            let scored = self.matcher.scan(&record);

            for (total, hits) in state.ignore_hits.iter_mut().zip(&scored.ignore_hits) {
                *total += hits;
            }

            match self.decide(&scored) {
                RecordDecision::RejectFile => {
                    return Ok((Verdict::Rejected(RejectReason::IgnoredRecord), state));
                }
                RecordDecision::Count(0) => {}
                RecordDecision::Count(count) => {
                    state.total_matches += count;
                    for (total, hits) in state.search_hits.iter_mut().zip(&scored.search_hits) {
                        *total += hits;
                    }
                }
            }
        }

        let verdict = self.file_verdict(&state);
        Ok((verdict, state))
    }

    fn file_verdict(&self, state: &FileMatchState) -> Verdict {
        if state.total_matches == 0 {
            return Verdict::Rejected(RejectReason::NoMatches);
        }
        if self.criteria.ignore_rule == IgnoreRule::All
            && !state.ignore_hits.is_empty()
            && state.ignore_hits.iter().all(|&hits| hits > 0)
        {
            return Verdict::Rejected(RejectReason::AllIgnoreStringsPresent);
        }
        if self.criteria.match_rule == MatchRule::All
            && state.search_hits.iter().any(|&hits| hits == 0)
        {
            return Verdict::Rejected(RejectReason::MissingSearchString);
        }
        Verdict::Accepted {
            matches: state.total_matches,
        }
    }

    /// Record-level rules, in order: whole-file ignore rules first, then the
    /// match rule and the record-cancelling ignore rules.
    fn decide(&self, scored: &RecordMatchState) -> RecordDecision {
        let ignore_len = self.matcher.ignore_len();
        match self.criteria.ignore_rule {
            IgnoreRule::Any if scored.ignore_count > 0 => return RecordDecision::RejectFile,
            IgnoreRule::AllInRecord if ignore_len > 0 && scored.ignore_count == ignore_len => {
                return RecordDecision::RejectFile;
            }
            _ => {}
        }
        RecordDecision::Count(self.counted_matches(scored))
    }

    /// The record's match count after the match rule and record cancellation.
    fn counted_matches(&self, scored: &RecordMatchState) -> usize {
        if scored.match_count == 0 {
            return 0;
        }
        let search_len = self.matcher.search_len();
        if self.criteria.match_rule == MatchRule::AllInRecord
            && search_len > 0
            && scored.match_count != search_len
        {
            return 0;
        }
        if scored.ignore_count > 0 {
            match self.criteria.ignore_rule {
                IgnoreRule::CancelRecordIfAny => return 0,
                IgnoreRule::CancelRecordIfAll if scored.ignore_count == self.matcher.ignore_len() => {
                    return 0;
                }
                _ => {}
            }
        }
        scored.match_count
    }

    /// Re-reads an accepted file and emits its matching records with context.
    pub fn list_detail<S: OutputSink + ?Sized>(
        &self,
        path: &Path,
        cancel: &AtomicBool,
        sink: &S,
    ) -> Result<Listing, CoreError> {
        let file = File::open(path).map_err(|e| CoreError::Io(e, path.to_path_buf()))?;
        self.list_detail_reader(BufReader::new(file), cancel, sink)
            .map_err(|e| CoreError::Io(e, path.to_path_buf()))
    }

    pub fn list_detail_reader<R: BufRead, S: OutputSink + ?Sized>(
        &self,
        mut reader: R,
        cancel: &AtomicBool,
        sink: &S,
    ) -> io::Result<Listing> {
        let mut window = ContextWindow::new(self.criteria.lines_before, self.criteria.lines_after);
        let patterns = self.matcher.search_patterns();
        let delimiters = self.matcher.delimiters();
        let mut buffer = Vec::new();
        let mut line_number = 0;
        let mut matched_records = 0;

        loop {
            if cancel.load(Ordering::Relaxed) {
                return Ok(Listing::Cancelled);
            }
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line_number += 1;
            let record = decode_record(&buffer).into_owned();
            let scored = self.matcher.scan(&record);

            if self.counted_matches(&scored) > 0 {
                for context in window.flush() {
                    sink.send_event(SearchEvent::Record {
                        line_number: context.line_number,
                        text: context.text,
                        highlights: Vec::new(),
                    });
                }
                let highlights = highlight_spans(&record, patterns, delimiters);
                sink.send_event(SearchEvent::Record {
                    line_number,
                    text: record,
                    highlights,
                });
                matched_records += 1;

                if window.following_configured() {
                    window.start_following();
                } else {
                    sink.send_event(SearchEvent::Line(String::new()));
                }
            } else if window.remaining_following() > 0 {
                sink.send_event(SearchEvent::Record {
                    line_number,
                    text: record,
                    highlights: Vec::new(),
                });
                if window.consume_following() {
                    window.clear();
                    sink.send_event(SearchEvent::Line(String::new()));
                }
            } else {
                window.push(line_number, record);
            }
        }

        // The file ended inside a following-context run.
        if window.remaining_following() > 0 {
            sink.send_event(SearchEvent::Line(String::new()));
        }
        Ok(Listing::Complete { matched_records })
    }
}

/// One line of raw bytes as text, without its line terminator.
fn decode_record(bytes: &[u8]) -> Cow<'_, str> {
    let mut end = bytes.len();
    if end > 0 && bytes[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && bytes[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&bytes[..end])
}
