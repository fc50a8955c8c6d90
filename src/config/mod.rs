pub mod criteria_file;
pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::record::DEFAULT_DELIMITERS;

const HITS_FILE: &str = "hits.txt";

/// Persistent engine preferences. Per-search input lives in a criteria file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Where the hits of the last run are stored. `None` selects the data directory.
    pub hits_file: Option<PathBuf>,
    pub default_delimiters: String,
    pub default_lines_before: usize,
    pub default_lines_after: usize,
    pub color_output: bool,
    pub show_progress: bool,
    /// Set by `--save-criteria`; runs without `--criteria` start from it.
    pub last_criteria_file: Option<PathBuf>,
}

impl EngineConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// The configured hits file, or `hits.txt` in the platform data directory.
    pub fn hits_path(&self) -> PathBuf {
        self.hits_file.clone().unwrap_or_else(|| {
            settings::get_data_directory()
                .unwrap_or_else(|| Path::new(".").to_path_buf())
                .join(HITS_FILE)
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hits_file: None,
            default_delimiters: DEFAULT_DELIMITERS.to_string(),
            default_lines_before: 0,
            default_lines_after: 0,
            color_output: true,
            show_progress: false,
            last_criteria_file: None,
        }
    }
}
