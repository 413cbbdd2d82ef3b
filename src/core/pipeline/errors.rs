//! Error types for pipeline runs

use crate::core::cache::CacheError;
use crate::core::codec::CodecError;
use crate::core::tts::{ProviderVoice, TTSError};

/// Problems with the script itself. Nothing is synthesized when one occurs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Script contains no events")]
    EmptyScript,

    #[error("Unknown voices for provider {provider}: {}", .missing.join(", "))]
    UnknownVoices {
        provider: String,
        missing: Vec<String>,
        available_sample: Vec<ProviderVoice>,
    },

    #[error("Script produced no audio segments")]
    NothingToRender,
}

/// Error types for a pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A provider call failed for one segment; the whole run is aborted.
    #[error("Synthesis failed for segment {segment}: {source}")]
    Synthesis {
        segment: usize,
        text: String,
        voice: Option<String>,
        rate: Option<f64>,
        pitch: Option<f64>,
        #[source]
        source: TTSError,
    },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl PipelineError {
    /// True for errors caused by the submitted script.
    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

/// Result type for pipeline runs
pub type PipelineResult<T> = Result<T, PipelineError>;
