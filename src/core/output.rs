//! Defines the events the engine emits and the sink that receives them.

use serde::{Deserialize, Serialize};

use super::locate::Span;
use super::session::ScanOutcome;
use super::ScanProgress;

/// Everything the engine reports, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchEvent {
    /// A plain output line. The empty line separates context runs.
    Line(String),
    /// An emphasised line, used for the path heading a detailed listing.
    BoldLine(String),
    /// One record of a detailed listing. Context records carry no highlights.
    Record {
        line_number: usize,
        text: String,
        highlights: Vec<Span>,
    },
    /// The candidate that was just classified.
    Progress(ScanProgress),
    /// A configuration or fatal error; the run produced no result.
    Error(String),
    /// The run is over, either completed or cancelled.
    Finished(ScanOutcome),
}

/// A trait that abstracts where search output goes.
/// This is "fire-and-forget" and doesn't return a result, simplifying its use.
pub trait OutputSink: Send + Sync {
    fn send_event(&self, event: SearchEvent);
}

impl<S: OutputSink + ?Sized> OutputSink for std::sync::Arc<S> {
    fn send_event(&self, event: SearchEvent) {
        (**self).send_event(event)
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &S {
    fn send_event(&self, event: SearchEvent) {
        (**self).send_event(event)
    }
}
