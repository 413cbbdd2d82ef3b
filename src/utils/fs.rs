//! Small filesystem helpers shared by the cache and the pipeline.

use std::path::{Component, Path, PathBuf};

/// Creates `dir` and all of its parents.
pub async fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await
}

/// True when `path` exists and is a regular file.
pub async fn file_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Joins a single file name onto `base`, refusing anything that could
/// resolve outside of it.
///
/// Returns `None` for empty names, absolute paths, and names containing
/// separators or `..` components.
pub fn safe_join(base: &Path, name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    let mut components = candidate.components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == candidate.as_os_str() => {
            Some(base.join(part))
        }
        _ => None,
    }
}
