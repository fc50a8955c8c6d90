pub mod context;
pub mod criteria;
pub mod date;
pub mod enumerator;
pub mod error;
pub mod evaluator;
pub mod glob;
pub mod hits;
pub mod locate;
pub mod output;
pub mod record;
pub mod scanner;
pub mod session;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reported after every candidate file has been classified.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ScanProgress {
    pub current_path: PathBuf,
    pub files_examined: usize,
    pub hits: usize,
}

pub use criteria::{normalize, IgnoreRule, MatchRule, RawCriteria, SearchCriteria};
pub use error::CoreError;
pub use evaluator::{FileEvaluator, Verdict};
pub use output::{OutputSink, SearchEvent};
pub use scanner::{SearchMode, SearchScanner};
pub use session::{ScanOutcome, ScanState, SearchSession};
