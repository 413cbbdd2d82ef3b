//! Age-based removal of scratch files and expired artifacts.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Extensions swept from the audio directory.
pub const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".json"];

/// How often the temp directory is swept.
pub const TMP_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// How often the audio directory is swept.
pub const AUDIO_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Deletes regular files in `dir` whose modification time is older than `ttl`.
///
/// When `extensions` is given only names ending with one of them are
/// considered. Per-file errors are ignored; returns the number of files removed.
pub async fn sweep_expired(dir: &Path, ttl: Duration, extensions: Option<&[&str]>) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping sweep of {:?}: {}", dir, e);
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read entry in {:?}: {}", dir, e);
                break;
            }
        };

        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(exts) = extensions
            && !exts.iter().any(|ext| name.ends_with(ext))
        {
            continue;
        }

        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }

        let expired = meta
            .modified()
            .ok()
            .and_then(|mtime| now.duration_since(mtime).ok())
            .is_some_and(|age| age > ttl);

        if expired && tokio::fs::remove_file(entry.path()).await.is_ok() {
            removed += 1;
        }
    }

    removed
}

/// Directories and lifetimes for the background sweeper.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub tmp_dir: PathBuf,
    pub tmp_ttl: Duration,
    pub audio_dir: PathBuf,
    pub audio_ttl: Duration,
}

/// Spawns the periodic sweeps for the temp and audio directories.
///
/// The handles run until aborted or until the runtime shuts down.
pub fn spawn_cleanup_tasks(config: CleanupConfig) -> (JoinHandle<()>, JoinHandle<()>) {
    let tmp = spawn_sweeper(
        config.tmp_dir,
        config.tmp_ttl,
        None,
        TMP_SWEEP_INTERVAL,
    );
    let audio = spawn_sweeper(
        config.audio_dir,
        config.audio_ttl,
        Some(AUDIO_EXTENSIONS),
        AUDIO_SWEEP_INTERVAL,
    );
    (tmp, audio)
}

fn spawn_sweeper(
    dir: PathBuf,
    ttl: Duration,
    extensions: Option<&'static [&'static str]>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = sweep_expired(&dir, ttl, extensions).await;
            if removed > 0 {
                info!("Removed {} expired file(s) from {:?}", removed, dir);
            }
        }
    })
}
