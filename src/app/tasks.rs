use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::core::{CoreError, OutputSink, ScanOutcome, SearchMode, SearchScanner, SearchSession};

/// A search running on the tokio runtime.
pub struct SearchTask {
    session: Arc<SearchSession>,
    handle: JoinHandle<Result<ScanOutcome, CoreError>>,
}

impl SearchTask {
    /// Requests cancellation. The run stops at the next record or candidate
    /// and still reports `Finished`.
    pub fn cancel(&self) {
        tracing::info!("Cancellation requested");
        self.session.cancel();
    }

    /// The flag a signal handler can set to cancel this run.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.session.cancel_flag()
    }

    /// Waits for the run to end.
    pub async fn wait(self) -> anyhow::Result<ScanOutcome> {
        let outcome = self.handle.await??;
        Ok(outcome)
    }
}

/// Starts a search in the background and returns a handle to it.
pub fn spawn_search<S>(scanner: Arc<SearchScanner>, mode: SearchMode, sink: S) -> SearchTask
where
    S: OutputSink + 'static,
{
    let session = Arc::new(SearchSession::new());
    let task_session = session.clone();

    tracing::debug!("Spawning {:?} search task", mode);
    let handle = tokio::spawn(async move { scanner.run(mode, &task_session, &sink).await });

    SearchTask { session, handle }
}
