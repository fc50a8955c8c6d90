//! The hits file: one absolute path per line, written by a run and readable
//! as the input of the next, narrower run.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use super::error::CoreError;

/// Appends accepted paths to a freshly truncated hits file.
pub struct HitsWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl HitsWriter {
    pub fn create(path: &Path) -> Result<Self, CoreError> {
        let fatal = |e| CoreError::HitsFile(e, path.to_path_buf());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(fatal)?;
        }
        let file = File::create(path).map_err(fatal)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn append(&mut self, hit: &Path) -> Result<(), CoreError> {
        writeln!(self.writer, "{}", hit.to_string_lossy())
            .map_err(|e| CoreError::HitsFile(e, self.path.clone()))?;
        self.written += 1;
        Ok(())
    }

    /// Flushes buffered lines and returns how many paths were written.
    pub fn finish(mut self) -> Result<usize, CoreError> {
        self.writer
            .flush()
            .map_err(|e| CoreError::HitsFile(e, self.path.clone()))?;
        Ok(self.written)
    }
}

/// The transient copy a re-filter run reads from: `<name>_2`.
pub fn side_copy_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push("_2");
    path.with_file_name(name)
}

/// Moves the hits file aside so a new one can be written while the old one is read.
///
/// A rename is atomic on the same filesystem, so no reader ever sees a half
/// written list.
pub fn hand_off(path: &Path) -> Result<PathBuf, CoreError> {
    if !path.is_file() {
        return Err(CoreError::NoPreviousHits(path.to_path_buf()));
    }
    let side = side_copy_path(path);
    fs::rename(path, &side).map_err(|e| CoreError::HitsFile(e, side.clone()))?;
    tracing::debug!("Moved {} to {}", path.display(), side.display());
    Ok(side)
}

/// Streams the paths stored in a hits file, skipping blank lines.
pub struct HitsReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
}

impl HitsReader {
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let file = File::open(path).map_err(|e| CoreError::Io(e, path.to_path_buf()))?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
        })
    }
}

impl Iterator for HitsReader {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.lines.next()? {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => return Some(PathBuf::from(line.trim_end_matches('\r'))),
                Err(e) => {
                    tracing::warn!("Stopped reading hits from {}: {}", self.path.display(), e);
                    return None;
                }
            }
        }
    }
}

/// Reads a whole hits file, e.g. to build a report from the last run.
pub fn load_hits(path: &Path) -> Result<Vec<PathBuf>, CoreError> {
    Ok(HitsReader::open(path)?.collect())
}
