//! Output sinks for the front end: the terminal, a tokio channel, and memory.

use colored::Colorize;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedSender;

use crate::core::locate::Span;
use crate::core::{OutputSink, ScanOutcome, SearchEvent};

/// Renders one detail record as `<line>: <text>`, highlighting matched spans.
pub fn render_record(line_number: usize, text: &str, highlights: &[Span], color: bool) -> String {
    let mut out = format!("{line_number}: ");
    let mut cursor = 0;

    for span in highlights {
        let (Some(before), Some(matched)) =
            (text.get(cursor..span.start), text.get(span.start..span.end()))
        else {
            continue;
        };
        out.push_str(before);
        if color {
            out.push_str(&matched.yellow().bold().to_string());
        } else {
            out.push_str(matched);
        }
        cursor = span.end();
    }
    out.push_str(text.get(cursor..).unwrap_or_default());
    out
}

/// The stdout text for an event, or `None` for events that go elsewhere.
pub fn render_event(event: &SearchEvent, color: bool) -> Option<String> {
    match event {
        SearchEvent::Line(line) => Some(line.clone()),
        SearchEvent::BoldLine(line) if color => Some(line.bold().to_string()),
        SearchEvent::BoldLine(line) => Some(line.clone()),
        SearchEvent::Record {
            line_number,
            text,
            highlights,
        } => Some(render_record(*line_number, text, highlights, color)),
        SearchEvent::Finished(outcome) => Some(summary(outcome)),
        SearchEvent::Progress(_) | SearchEvent::Error(_) => None,
    }
}

fn summary(outcome: &ScanOutcome) -> String {
    let hits = outcome.hits();
    let noun = if hits == 1 { "file" } else { "files" };
    match outcome {
        ScanOutcome::Completed { .. } => format!("{hits} {noun} found"),
        ScanOutcome::Cancelled { .. } => format!("Search cancelled ({hits} {noun} found)"),
    }
}

/// Writes results to stdout, errors and progress to stderr.
pub struct ConsoleSink {
    color: bool,
    show_progress: bool,
}

impl ConsoleSink {
    pub fn new(color: bool, show_progress: bool) -> Self {
        Self {
            color,
            show_progress,
        }
    }
}

impl OutputSink for ConsoleSink {
    fn send_event(&self, event: SearchEvent) {
        let result = match &event {
            SearchEvent::Progress(progress) if self.show_progress => {
                let mut err = io::stderr().lock();
                write!(
                    err,
                    "\r{} examined, {} found",
                    progress.files_examined, progress.hits
                )
                .and_then(|_| err.flush())
            }
            SearchEvent::Progress(_) => Ok(()),
            SearchEvent::Error(message) => {
                let label = if self.color {
                    "error:".red().bold().to_string()
                } else {
                    "error:".to_string()
                };
                writeln!(io::stderr().lock(), "{label} {message}")
            }
            other => match render_event(other, self.color) {
                Some(text) => {
                    if self.show_progress && matches!(other, SearchEvent::Finished(_)) {
                        let _ = writeln!(io::stderr().lock());
                    }
                    writeln!(io::stdout().lock(), "{text}")
                }
                None => Ok(()),
            },
        };

        if let Err(e) = result {
            tracing::debug!("Failed to write search output: {}", e);
        }
    }
}

/// Forwards events over an unbounded tokio channel.
#[derive(Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<SearchEvent>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<SearchEvent>) -> Self {
        Self { sender }
    }
}

impl OutputSink for ChannelSink {
    fn send_event(&self, event: SearchEvent) {
        // The receiver may already be gone; output is fire-and-forget.
        if let Err(e) = self.sender.send(event) {
            tracing::warn!("Failed to send search event: {}", e);
        }
    }
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<SearchEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SearchEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<SearchEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl OutputSink for CollectingSink {
    fn send_event(&self, event: SearchEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_record_plain() {
        let highlights = [Span { start: 0, len: 3 }, Span { start: 8, len: 3 }];
        assert_eq!(
            render_record(7, "foo and bar", &highlights, false),
            "7: foo and bar"
        );
    }

    #[test]
    fn test_render_record_colored_wraps_matches() {
        colored::control::set_override(true);
        let rendered = render_record(1, "say hello", &[Span { start: 4, len: 5 }], true);
        assert!(rendered.starts_with("1: say "));
        assert!(rendered.contains("\u{1b}["));
        assert!(rendered.contains("hello"));
        colored::control::unset_override();
    }

    #[test]
    fn test_out_of_range_span_is_ignored() {
        let rendered = render_record(2, "short", &[Span { start: 10, len: 4 }], false);
        assert_eq!(rendered, "2: short");
    }

    #[test]
    fn test_summary_wording() {
        assert_eq!(
            render_event(&SearchEvent::Finished(ScanOutcome::Completed { hits: 1 }), false),
            Some("1 file found".to_string())
        );
        assert_eq!(
            render_event(&SearchEvent::Finished(ScanOutcome::Cancelled { hits: 3 }), false),
            Some("Search cancelled (3 files found)".to_string())
        );
        assert_eq!(render_event(&SearchEvent::Error("x".into()), false), None);
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ChannelSink::new(tx);
        sink.send_event(SearchEvent::Line("a".into()));
        sink.send_event(SearchEvent::BoldLine("b".into()));
        drop(sink);

        assert_eq!(rx.recv().await, Some(SearchEvent::Line("a".into())));
        assert_eq!(rx.recv().await, Some(SearchEvent::BoldLine("b".into())));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_collecting_sink_take_drains() {
        let sink = CollectingSink::new();
        sink.send_event(SearchEvent::Line("x".into()));
        assert_eq!(sink.take().len(), 1);
        assert!(sink.events().is_empty());
    }
}
