//! Initialization helpers for preparing the runtime before starting the
//! narrator server.
//!
//! This module hosts the logic behind the `narrator init` CLI command: it
//! creates the storage directories and checks that the codec tool can be
//! started.
//!
//! ```text
//! $ TTS_STORAGE_DIR=/var/lib/narrator narrator init
//! ```
//!
//! ```rust,no_run
//! use narrator::{ServerConfig, init};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
//! init::run(&config).await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};

use crate::config::ServerConfig;
use crate::core::codec::FfmpegCodec;
use crate::utils::ensure_dir;

/// Prepare storage and verify the codec tool.
pub async fn run(config: &ServerConfig) -> Result<()> {
    tracing::info!("Initializing narrator...");
    tracing::info!("Storage dir: {:?}", config.storage_dir);

    prepare_storage(config).await?;

    let codec = FfmpegCodec::new(config.ffmpeg_bin.clone(), config.ffprobe_bin.clone());
    match codec.version().await {
        Ok(version) => tracing::info!("  Codec: {}", version),
        Err(e) => {
            tracing::error!("Failed to run {}: {}", config.ffmpeg_bin, e);
            tracing::error!("Install ffmpeg or point FFMPEG_BIN at the executable");
            return Err(e).context("codec tool check failed");
        }
    }

    tracing::info!("Initialization complete!");
    Ok(())
}

/// Creates the audio and temp directories under the storage root.
pub async fn prepare_storage(config: &ServerConfig) -> Result<()> {
    for dir in [config.audio_dir(), config.tmp_dir()] {
        ensure_dir(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        tracing::info!("  Directory ready: {}", dir.display());
    }
    Ok(())
}
