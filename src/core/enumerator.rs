//! Restartable glob enumeration of candidate files.

use globset::GlobMatcher;
use std::path::PathBuf;
use walkdir::WalkDir;

use super::error::CoreError;
use super::glob::{build_path_glob, has_wildcard, normalize_separators};

/// A pull-based source of candidate paths.
///
/// Implementations hold iteration state between calls. If the consumer stops
/// before `next_path` returned `None`, `close` must be called to release it;
/// [`EnumerationGuard`] does that on drop.
pub trait FileEnumerator {
    /// The next matching path, or `None` once results are exhausted.
    fn next_path(&mut self) -> Option<PathBuf>;

    /// Releases iteration state. Further `next_path` calls return `None`.
    fn close(&mut self);

    /// `true` once results are exhausted or the enumerator was closed.
    fn is_finished(&self) -> bool;
}

/// Walks the literal directory prefix of a glob and yields the files whose
/// full path matches the whole glob.
pub struct GlobEnumerator {
    pattern: String,
    matcher: GlobMatcher,
    walker: Option<walkdir::IntoIter>,
}

impl GlobEnumerator {
    pub fn start(pattern: &str, case_insensitive: bool) -> Result<Self, CoreError> {
        let pattern = normalize_separators(pattern).into_owned();
        let matcher = build_path_glob(&pattern, case_insensitive)?;
        let (root, max_depth) = split_root(&pattern);

        let mut walk = WalkDir::new(&root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name();
        if let Some(depth) = max_depth {
            walk = walk.max_depth(depth);
        }

        tracing::debug!(
            "Enumerating {} from {} (depth {:?})",
            pattern,
            root.display(),
            max_depth
        );
        Ok(Self {
            pattern,
            matcher,
            walker: Some(walk.into_iter()),
        })
    }
}

impl FileEnumerator for GlobEnumerator {
    fn next_path(&mut self) -> Option<PathBuf> {
        let walker = self.walker.as_mut()?;

        for entry in walker.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry while enumerating: {}", e);
                    continue;
                }
            };
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }
            let candidate = entry.path().to_string_lossy();
            if self.matcher.is_match(normalize_separators(&candidate).as_ref()) {
                return Some(entry.into_path());
            }
        }

        self.walker = None;
        None
    }

    fn close(&mut self) {
        if self.walker.take().is_some() {
            tracing::debug!("Closed enumeration of {} before exhaustion", self.pattern);
        }
    }

    fn is_finished(&self) -> bool {
        self.walker.is_none()
    }
}

/// Splits a glob into the directory to walk and how deep the walk must go.
///
/// The root is every leading component without wildcards. The depth is the
/// number of remaining components, unbounded when one of them is `**`.
fn split_root(pattern: &str) -> (PathBuf, Option<usize>) {
    let components: Vec<&str> = pattern.split('/').collect();
    let first_wild = components
        .iter()
        .position(|c| has_wildcard(c))
        .unwrap_or(components.len().saturating_sub(1));

    let literal = &components[..first_wild];
    let remaining = &components[first_wild..];

    let root = if literal.is_empty() {
        PathBuf::from(".")
    } else if literal.len() == 1 && literal[0].is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(literal.join("/"))
    };

    let depth = if remaining.iter().any(|c| c.contains("**")) {
        None
    } else {
        Some(remaining.len().max(1))
    };
    (root, depth)
}

/// The literal directory an enumeration pattern starts from.
pub fn enumeration_root(pattern: &str) -> PathBuf {
    split_root(&normalize_separators(pattern)).0
}

/// Guarantees `close` is called on an enumerator that is dropped early.
pub struct EnumerationGuard<E: FileEnumerator> {
    inner: E,
}

impl<E: FileEnumerator> EnumerationGuard<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

impl<E: FileEnumerator> Iterator for EnumerationGuard<E> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        self.inner.next_path()
    }
}

impl<E: FileEnumerator> Drop for EnumerationGuard<E> {
    fn drop(&mut self) {
        if !self.inner.is_finished() {
            self.inner.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn names(enumerator: GlobEnumerator, root: &Path) -> Vec<String> {
        EnumerationGuard::new(enumerator)
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn root_pattern(root: &Path, rest: &str) -> String {
        format!("{}/{}", root.to_string_lossy().replace('\\', "/"), rest)
    }

    #[test]
    fn test_split_root() {
        assert_eq!(
            split_root("/data/logs/*.txt"),
            (PathBuf::from("/data/logs"), Some(1))
        );
        assert_eq!(
            split_root("/data/*/src/*.rs"),
            (PathBuf::from("/data"), Some(3))
        );
        assert_eq!(split_root("/data/**/*.rs"), (PathBuf::from("/data"), None));
        assert_eq!(split_root("/*.txt"), (PathBuf::from("/"), Some(1)));
        assert_eq!(split_root("*.txt"), (PathBuf::from("."), Some(1)));
        assert_eq!(
            split_root("/data/README"),
            (PathBuf::from("/data"), Some(1))
        );
    }

    #[test]
    fn test_enumerates_only_matching_files_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.txt");
        touch(dir.path(), "b.log");
        touch(dir.path(), "sub/c.txt");

        let enumerator = GlobEnumerator::start(&root_pattern(dir.path(), "*.txt"), false).unwrap();
        assert_eq!(names(enumerator, dir.path()), vec!["a.txt"]);
    }

    #[test]
    fn test_wildcard_directories_and_recursion() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "one/src/a.rs");
        touch(dir.path(), "two/src/b.rs");
        touch(dir.path(), "two/src/deep/c.rs");

        let enumerator = GlobEnumerator::start(&root_pattern(dir.path(), "*/src/*.rs"), false).unwrap();
        assert_eq!(names(enumerator, dir.path()), vec!["one/src/a.rs", "two/src/b.rs"]);

        let recursive = GlobEnumerator::start(&root_pattern(dir.path(), "**/*.rs"), false).unwrap();
        assert_eq!(
            names(recursive, dir.path()),
            vec!["one/src/a.rs", "two/src/b.rs", "two/src/deep/c.rs"]
        );
    }

    #[test]
    fn test_case_insensitive_variant() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "NOTES.TXT");

        let sensitive = GlobEnumerator::start(&root_pattern(dir.path(), "*.txt"), false).unwrap();
        assert!(names(sensitive, dir.path()).is_empty());

        let insensitive = GlobEnumerator::start(&root_pattern(dir.path(), "*.txt"), true).unwrap();
        assert_eq!(names(insensitive, dir.path()), vec!["NOTES.TXT"]);
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let mut enumerator = GlobEnumerator::start("/definitely/not/here/*.txt", false).unwrap();
        assert_eq!(enumerator.next_path(), None);
        assert!(enumerator.is_finished());
    }

    struct CountingEnumerator {
        remaining: usize,
        closed: Arc<AtomicUsize>,
        finished: bool,
    }

    impl FileEnumerator for CountingEnumerator {
        fn next_path(&mut self) -> Option<PathBuf> {
            if self.finished || self.remaining == 0 {
                self.finished = true;
                return None;
            }
            self.remaining -= 1;
            Some(PathBuf::from(format!("/f{}", self.remaining)))
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
            self.finished = true;
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    #[test]
    fn test_guard_closes_when_dropped_early() {
        let closed = Arc::new(AtomicUsize::new(0));
        let mut guard = EnumerationGuard::new(CountingEnumerator {
            remaining: 5,
            closed: closed.clone(),
            finished: false,
        });
        assert!(guard.next().is_some());
        drop(guard);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_does_not_close_exhausted_enumerator() {
        let closed = Arc::new(AtomicUsize::new(0));
        let guard = EnumerationGuard::new(CountingEnumerator {
            remaining: 2,
            closed: closed.clone(),
            finished: false,
        });
        assert_eq!(guard.count(), 2);
        assert_eq!(closed.load(Ordering::SeqCst), 0);
    }
}
