//! Metadata store for rendered audio artifacts.
//!
//! Metadata records are small JSON documents keyed by the content id. The
//! artifact itself always lives next to them in the audio directory; the
//! backend only decides where the metadata is kept.

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::{Cache as MokaCache, CacheBuilder as MokaCacheBuilder};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::format::AudioFormat;
use crate::utils::fs::{file_exists, safe_join};

/// Errors that can occur during cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// I/O error occurred during filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A key or file name would escape the storage directory.
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Persisted description of one rendered artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    pub id: String,
    pub format: AudioFormat,
    /// Artifact file name inside the audio directory, e.g. `<id>.mp3`.
    pub file_name: String,
    /// Creation time in unix milliseconds.
    pub created_at: u64,
    pub bytes: u64,
    pub duration_sec: Option<f64>,
}

impl AudioMetadata {
    /// Builds a record stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        format: AudioFormat,
        bytes: u64,
        duration_sec: Option<f64>,
    ) -> Self {
        let id = id.into();
        Self {
            file_name: format!("{id}.{}", format.extension()),
            id,
            format,
            created_at: now_millis(),
            bytes,
            duration_sec,
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Trait defining the interface for metadata backends.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Stores a value, replacing any previous one.
    async fn set(&self, key: &str, value: Bytes) -> Result<()>;

    /// Retrieves a value by key.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Deletes a value by key.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Returns the backend type as a string identifier.
    fn backend_type(&self) -> &str;
}

/// Hit/miss counters reported by the health endpoint.
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    hits: Arc<RwLock<u64>>,
    misses: Arc<RwLock<u64>>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        *self.hits.write() += 1;
    }

    pub fn record_miss(&self) {
        *self.misses.write() += 1;
    }

    /// Returns current statistics as a tuple (hits, misses).
    pub fn get_stats(&self) -> (u64, u64) {
        (*self.hits.read(), *self.misses.read())
    }
}

struct CacheEntry {
    data: Bytes,
    expires_at: Option<Instant>,
}

/// Memory-based metadata backend using Moka.
///
/// Entries do not survive a restart; artifacts left on disk are simply
/// rendered again and overwritten.
pub struct MemoryCacheBackend {
    cache: MokaCache<String, Arc<CacheEntry>>,
    ttl: Option<Duration>,
}

impl MemoryCacheBackend {
    pub fn new(max_entries: u64, ttl: Option<Duration>) -> Self {
        Self {
            cache: MokaCacheBuilder::new(max_entries).build(),
            ttl,
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let entry = Arc::new(CacheEntry {
            data: value,
            expires_at: self.ttl.map(|d| Instant::now() + d),
        });
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let Some(entry) = self.cache.get(key).await else {
            return Ok(None);
        };

        if let Some(expires_at) = entry.expires_at
            && Instant::now() > expires_at
        {
            self.cache.invalidate(key).await;
            return Ok(None);
        }

        Ok(Some(entry.data.clone()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

/// Filesystem metadata backend writing `<dir>/<key>.json`.
pub struct FilesystemCacheBackend {
    base_path: PathBuf,
}

impl FilesystemCacheBackend {
    /// Creates the backend, creating `base_path` if needed.
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    fn get_meta_path(&self, key: &str) -> Result<PathBuf> {
        safe_join(&self.base_path, &format!("{key}.json"))
            .ok_or_else(|| CacheError::InvalidKey(key.to_string()))
    }
}

#[async_trait]
impl CacheBackend for FilesystemCacheBackend {
    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let meta_path = self.get_meta_path(key)?;

        // Atomic write using temp file
        let temp_path = self
            .base_path
            .join(format!("{key}.json.{}.tmp", std::process::id()));
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&value).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &meta_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let meta_path = self.get_meta_path(key)?;

        match fs::read(&meta_path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let meta_path = self.get_meta_path(key)?;
        let _ = fs::remove_file(&meta_path).await;
        Ok(())
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}

/// Metadata backend selection.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CacheConfig {
    /// In-process metadata.
    Memory {
        max_entries: u64,
        #[serde(default)]
        ttl_seconds: Option<u64>,
    },
    /// JSON documents next to the artifacts.
    #[default]
    Filesystem,
}

/// Maps content ids to metadata and artifact locations.
pub struct AudioCacheStore {
    backend: Arc<dyn CacheBackend>,
    audio_dir: PathBuf,
    metrics: Arc<CacheMetrics>,
}

impl AudioCacheStore {
    /// Creates a store for artifacts under `audio_dir`.
    pub async fn from_config(config: CacheConfig, audio_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&audio_dir).await?;

        let backend: Arc<dyn CacheBackend> = match config {
            CacheConfig::Memory {
                max_entries,
                ttl_seconds,
            } => Arc::new(MemoryCacheBackend::new(
                max_entries,
                ttl_seconds.map(Duration::from_secs),
            )),
            CacheConfig::Filesystem => {
                Arc::new(FilesystemCacheBackend::new(audio_dir.clone()).await?)
            }
        };

        Ok(Self::with_backend(backend, audio_dir))
    }

    /// Creates a store over an explicit backend.
    pub fn with_backend(backend: Arc<dyn CacheBackend>, audio_dir: PathBuf) -> Self {
        Self {
            backend,
            audio_dir,
            metrics: Arc::new(CacheMetrics::new()),
        }
    }

    /// Reads the metadata for `id`.
    ///
    /// A record that cannot be decoded is treated as absent so that a fresh
    /// render can replace it.
    pub async fn read_metadata(&self, id: &str) -> Result<Option<AudioMetadata>> {
        let Some(raw) = self.backend.get(id).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<AudioMetadata>(&raw) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) => {
                warn!("Ignoring unreadable metadata for {}: {}", id, e);
                Ok(None)
            }
        }
    }

    /// Persists a metadata record, replacing any earlier one for the same id.
    pub async fn write_metadata(&self, meta: &AudioMetadata) -> Result<()> {
        let json = serde_json::to_vec_pretty(meta)?;

        debug!(
            "Storing metadata: {} ({} bytes, format {})",
            meta.id, meta.bytes, meta.format
        );

        self.backend.set(&meta.id, Bytes::from(json)).await?;
        Ok(())
    }

    /// Removes the metadata record for `id`, if any.
    pub async fn delete_metadata(&self, id: &str) -> Result<()> {
        self.backend.delete(id).await
    }

    /// Absolute location of the artifact described by `meta`.
    pub fn resolve_artifact_path(&self, meta: &AudioMetadata) -> Result<PathBuf> {
        safe_join(&self.audio_dir, &meta.file_name)
            .ok_or_else(|| CacheError::InvalidKey(meta.file_name.clone()))
    }

    /// True when the artifact described by `meta` is present on disk.
    pub async fn artifact_exists(&self, meta: &AudioMetadata) -> bool {
        match self.resolve_artifact_path(meta) {
            Ok(path) => file_exists(&path).await,
            Err(_) => false,
        }
    }

    /// Cache lookup: a hit needs both the metadata and the artifact file.
    ///
    /// Updates the hit/miss counters.
    pub async fn lookup(&self, id: &str) -> Result<Option<(AudioMetadata, PathBuf)>> {
        if let Some(meta) = self.read_metadata(id).await? {
            let path = self.resolve_artifact_path(&meta)?;
            if file_exists(&path).await {
                debug!("Cache hit: {}", id);
                self.metrics.record_hit();
                return Ok(Some((meta, path)));
            }
            debug!("Cache entry {} has no artifact on disk, dropping it", id);
            if let Err(e) = self.delete_metadata(id).await {
                warn!("Failed to drop stale metadata for {}: {}", id, e);
            }
        }

        debug!("Cache miss: {}", id);
        self.metrics.record_miss();
        Ok(None)
    }

    /// Directory holding the artifacts.
    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Returns the cache metrics.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Returns the backend type identifier.
    pub fn backend_type(&self) -> &str {
        self.backend.backend_type()
    }
}
