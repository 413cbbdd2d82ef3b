//! Audio codec capability used by the synthesis pipeline.
//!
//! Every intermediate segment is brought to the same representation
//! (mono, signed 16-bit little-endian PCM WAV at the pipeline sample rate)
//! so that concatenation can be a plain stream copy.

mod ffmpeg;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use ffmpeg::{FfmpegCodec, concat_list_contents};

/// Errors raised by codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Conversion, generation and inspection of audio files.
#[async_trait]
pub trait AudioCodec: Send + Sync {
    /// Re-encodes any input the tool can read into the intermediate WAV.
    async fn normalize(&self, input: &Path, output: &Path, sample_rate_hz: u32)
    -> CodecResult<()>;

    /// Writes `ms` milliseconds of silence as an intermediate WAV.
    async fn silence(&self, output: &Path, ms: u64, sample_rate_hz: u32) -> CodecResult<()>;

    /// Joins intermediate WAVs in order. `list_path` is a scratch file the
    /// implementation may use to describe the inputs.
    async fn concat(&self, parts: &[PathBuf], list_path: &Path, output: &Path) -> CodecResult<()>;

    /// Encodes an intermediate WAV to MP3.
    async fn transcode_mp3(&self, input: &Path, output: &Path, bitrate_kbps: u32)
    -> CodecResult<()>;

    /// Duration in seconds, or `None` when it cannot be determined.
    async fn probe_duration(&self, path: &Path) -> Option<f64>;
}
