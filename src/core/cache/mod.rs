//! Content-addressed cache for rendered audio.
//!
//! - `key`: derives the id from provider, format, sample rate and events
//! - `store`: metadata persistence (filesystem or memory) plus artifact paths
//! - `cleanup`: TTL sweeps of the temp and audio directories

pub mod cleanup;
pub mod key;
pub mod store;

pub use cleanup::{CleanupConfig, spawn_cleanup_tasks, sweep_expired};
pub use key::derive_id;
pub use store::{
    AudioCacheStore, AudioMetadata, CacheBackend, CacheConfig, CacheError, CacheMetrics,
    FilesystemCacheBackend, MemoryCacheBackend, Result,
};
