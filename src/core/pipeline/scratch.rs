//! Request-scoped temporary files.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Removes every registered path when dropped.
///
/// Paths are registered before the file is created, so a failure half way
/// through a stage still gets cleaned up. Removal is best effort and missing
/// files are ignored.
#[derive(Debug, Default)]
pub struct ScratchFiles {
    paths: Vec<PathBuf>,
}

impl ScratchFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks `path` and hands it back for convenience.
    pub fn register(&mut self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path.clone());
        }
        path
    }

    /// Stops tracking `path` so it survives the drop.
    pub fn keep(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

// Removal is synchronous and runs on whichever runtime thread drops the
// guard. Fine for per-segment counts; long scripts would want an async
// sweep before returning.
impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            if std::fs::remove_file(&path).is_ok() {
                debug!("Removed scratch file {}", path.display());
            }
        }
    }
}
