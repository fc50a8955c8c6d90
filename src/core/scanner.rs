use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::date::within_range;
use super::enumerator::{enumeration_root, EnumerationGuard, GlobEnumerator};
use super::error::CoreError;
use super::evaluator::{FileEvaluator, Listing, Verdict};
use super::glob::build_path_glob;
use super::hits::{hand_off, HitsReader, HitsWriter};
use super::output::{OutputSink, SearchEvent};
use super::session::{ScanOutcome, ScanState, SearchSession};
use super::{ScanProgress, SearchCriteria};

/// Where the candidate files of a run come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Enumerate the filesystem for every search-file pattern.
    Fresh,
    /// Re-examine the paths stored in the hits file of the previous run.
    RefinePrevious,
}

/// Why a candidate never reached the file evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    NameMismatch,
    IgnoredFile,
    OutsideDateRange,
    Unreadable,
}

enum Candidate {
    Skipped(Skip),
    Classified(Verdict),
}

/// Drives one search run: enumeration, filtering, evaluation and the hits file.
pub struct SearchScanner {
    criteria: SearchCriteria,
    hits_path: PathBuf,
}

impl SearchScanner {
    pub fn new(criteria: SearchCriteria, hits_path: impl Into<PathBuf>) -> Self {
        Self {
            criteria,
            hits_path: hits_path.into(),
        }
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    pub fn hits_path(&self) -> &Path {
        &self.hits_path
    }

    /// Runs a search to completion or cancellation.
    ///
    /// Configuration and fatal errors are reported to the sink as a single
    /// `Error` event and returned; every other run ends with `Finished`.
    pub async fn run<S: OutputSink + ?Sized>(
        &self,
        mode: SearchMode,
        session: &SearchSession,
        sink: &S,
    ) -> Result<ScanOutcome, CoreError> {
        session.reset();
        session.set_state(ScanState::Validating);

        if let Err(e) = self.validate(mode) {
            tracing::warn!("Search rejected: {}", e);
            session.set_state(ScanState::Idle);
            sink.send_event(SearchEvent::Error(e.to_string()));
            return Err(e);
        }

        tracing::info!(
            "Starting {:?} search in {} ({} file patterns, {} search strings)",
            mode,
            self.criteria.path_pattern,
            self.criteria.file_patterns.len(),
            self.criteria.search_strings.len()
        );

        let result = match mode {
            SearchMode::Fresh => self.search_filesystem(session, sink).await,
            SearchMode::RefinePrevious => self.refine_previous(session, sink).await,
        };

        match result {
            Ok(outcome) => {
                session.set_state(if outcome.is_cancelled() {
                    ScanState::Cancelled
                } else {
                    ScanState::Done
                });
                match outcome {
                    ScanOutcome::Completed { hits } => tracing::info!(
                        "Search completed: {} hits in {} files examined",
                        hits,
                        session.examined()
                    ),
                    ScanOutcome::Cancelled { hits } => {
                        tracing::info!("Search cancelled after {} hits", hits)
                    }
                }
                sink.send_event(SearchEvent::Finished(outcome));
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!("Search aborted: {}", e);
                session.set_state(ScanState::Done);
                sink.send_event(SearchEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    fn validate(&self, mode: SearchMode) -> Result<(), CoreError> {
        self.criteria.validate(Local::now())?;

        match mode {
            SearchMode::Fresh => {
                let first = self.criteria.file_patterns.first().ok_or_else(|| {
                    CoreError::InvalidPathPattern("no search-file patterns".to_string())
                })?;
                let root = enumeration_root(&self.criteria.enumeration_pattern(first));
                if !root.is_dir() {
                    return Err(CoreError::InvalidPathPattern(format!(
                        "{} is not a directory",
                        root.display()
                    )));
                }
                // Every glob must compile before the hits file is truncated.
                for file_pattern in &self.criteria.file_patterns {
                    build_path_glob(
                        &self.criteria.enumeration_pattern(file_pattern),
                        self.criteria.ignore_case_files,
                    )?;
                }
            }
            SearchMode::RefinePrevious => {
                if !self.hits_path.is_file() {
                    return Err(CoreError::NoPreviousHits(self.hits_path.clone()));
                }
            }
        }
        Ok(())
    }

    async fn search_filesystem<S: OutputSink + ?Sized>(
        &self,
        session: &SearchSession,
        sink: &S,
    ) -> Result<ScanOutcome, CoreError> {
        let mut hits = HitsWriter::create(&self.hits_path)?;
        let evaluator = FileEvaluator::new(&self.criteria);
        let mut seen = HashSet::new();

        for file_pattern in &self.criteria.file_patterns {
            session.set_state(ScanState::Enumerating);
            let pattern = self.criteria.enumeration_pattern(file_pattern);
            let mut candidates = EnumerationGuard::new(GlobEnumerator::start(
                &pattern,
                self.criteria.ignore_case_files,
            )?);

            loop {
                if session.is_cancelled() {
                    // Dropping the guard closes the enumerator.
                    hits.finish()?;
                    return Ok(ScanOutcome::Cancelled {
                        hits: session.hits(),
                    });
                }
                let Some(path) = candidates.next() else {
                    break;
                };
                // Several file patterns may name the same file.
                if !seen.insert(path.clone()) {
                    continue;
                }

                self.examine(&evaluator, &path, false, &mut hits, session, sink)?;
                tokio::task::yield_now().await;
            }
        }

        hits.finish()?;
        Ok(ScanOutcome::Completed {
            hits: session.hits(),
        })
    }

    async fn refine_previous<S: OutputSink + ?Sized>(
        &self,
        session: &SearchSession,
        sink: &S,
    ) -> Result<ScanOutcome, CoreError> {
        session.set_state(ScanState::Enumerating);
        let side_copy = hand_off(&self.hits_path)?;

        let mut hits = match HitsWriter::create(&self.hits_path) {
            Ok(writer) => writer,
            Err(e) => {
                // Put the previous list back so nothing is lost.
                if let Err(restore) = fs::rename(&side_copy, &self.hits_path) {
                    tracing::error!(
                        "Could not restore {} from {}: {}",
                        self.hits_path.display(),
                        side_copy.display(),
                        restore
                    );
                }
                return Err(e);
            }
        };
        let evaluator = FileEvaluator::new(&self.criteria);
        let mut previous = HitsReader::open(&side_copy)?;

        loop {
            if session.is_cancelled() {
                hits.finish()?;
                tracing::info!("Keeping {} after cancellation", side_copy.display());
                return Ok(ScanOutcome::Cancelled {
                    hits: session.hits(),
                });
            }
            let Some(path) = previous.next() else {
                break;
            };

            self.examine(&evaluator, &path, true, &mut hits, session, sink)?;
            tokio::task::yield_now().await;
        }

        hits.finish()?;
        if let Err(e) = fs::remove_file(&side_copy) {
            tracing::warn!("Failed to remove {}: {}", side_copy.display(), e);
        }
        Ok(ScanOutcome::Completed {
            hits: session.hits(),
        })
    }

    /// Filters, classifies and reports one candidate.
    fn examine<S: OutputSink + ?Sized>(
        &self,
        evaluator: &FileEvaluator<'_>,
        path: &Path,
        check_name: bool,
        hits: &mut HitsWriter,
        session: &SearchSession,
        sink: &S,
    ) -> Result<(), CoreError> {
        session.set_state(ScanState::PerFile);

        match self.classify_candidate(evaluator, path, check_name, session) {
            Candidate::Skipped(reason) => {
                tracing::debug!("Skipped {}: {:?}", path.display(), reason);
            }
            Candidate::Classified(Verdict::Accepted { matches }) => {
                hits.append(path)?;
                session.record_hit();
                self.report_hit(evaluator, path, matches, session, sink);
            }
            Candidate::Classified(Verdict::Rejected(reason)) => {
                tracing::debug!("Rejected {}: {:?}", path.display(), reason);
            }
            Candidate::Classified(Verdict::Cancelled) => {}
        }

        sink.send_event(SearchEvent::Progress(ScanProgress {
            current_path: path.to_path_buf(),
            files_examined: session.record_examined(),
            hits: session.hits(),
        }));
        Ok(())
    }

    fn classify_candidate(
        &self,
        evaluator: &FileEvaluator<'_>,
        path: &Path,
        check_name: bool,
        session: &SearchSession,
    ) -> Candidate {
        if check_name && !self.criteria.matches_file_name(path) {
            return Candidate::Skipped(Skip::NameMismatch);
        }
        if self.criteria.is_ignored_file(path) {
            return Candidate::Skipped(Skip::IgnoredFile);
        }
        if self.criteria.date_from.is_some() || self.criteria.date_to.is_some() {
            match modified_time(path) {
                Ok(modified)
                    if within_range(modified, self.criteria.date_from, self.criteria.date_to) => {}
                Ok(_) => return Candidate::Skipped(Skip::OutsideDateRange),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    return Candidate::Skipped(Skip::Unreadable);
                }
            }
        }

        let cancel_flag = session.cancel_flag();
        match evaluator.classify(path, &cancel_flag) {
            Ok(verdict) => Candidate::Classified(verdict),
            Err(e) => {
                tracing::warn!("Skipping unreadable file: {}", e);
                Candidate::Skipped(Skip::Unreadable)
            }
        }
    }

    fn report_hit<S: OutputSink + ?Sized>(
        &self,
        evaluator: &FileEvaluator<'_>,
        path: &Path,
        matches: usize,
        session: &SearchSession,
        sink: &S,
    ) {
        let display = path.display().to_string();

        if self.criteria.list_detail && !self.criteria.search_strings.is_empty() {
            sink.send_event(SearchEvent::BoldLine(display));
            let cancel_flag = session.cancel_flag();
            match evaluator.list_detail(path, &cancel_flag, sink) {
                Ok(Listing::Complete { matched_records }) => {
                    tracing::debug!("Listed {} records of {}", matched_records, path.display());
                }
                Ok(Listing::Cancelled) => {}
                Err(e) => tracing::warn!("Could not list {}: {}", path.display(), e),
            }
        } else if self.criteria.matches_on_identity() {
            sink.send_event(SearchEvent::Line(display));
        } else {
            let noun = if matches == 1 { "match" } else { "matches" };
            sink.send_event(SearchEvent::Line(format!("{display} ({matches} {noun})")));
        }
    }
}

fn modified_time(path: &Path) -> Result<DateTime<Local>, CoreError> {
    let metadata = fs::metadata(path).map_err(|e| CoreError::Io(e, path.to_path_buf()))?;
    let modified = metadata
        .modified()
        .map_err(|e| CoreError::Io(e, path.to_path_buf()))?;
    Ok(DateTime::<Local>::from(modified))
}
