//! # Speech provider abstraction
//!
//! A provider turns one span of text under a [`ConfigState`] into an audio
//! file on disk. Providers do not need to agree on container, codec or sample
//! rate: the pipeline normalizes whatever they write.
//!
//! ```rust,ignore
//! use narrator::core::tts::{SpeechProvider, StubProvider, SynthesisRequest};
//!
//! let provider = StubProvider::new();
//! let audio = provider
//!     .synthesize(SynthesisRequest {
//!         text: "Hello there".to_string(),
//!         state: ConfigState::default(),
//!         preferred_format: AudioFormat::Wav,
//!         sample_rate_hz: 24000,
//!         output_stem: "/tmp/job-raw-1".into(),
//!     })
//!     .await?;
//! println!("wrote {:?}", audio.path);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::format::AudioFormat;
use crate::core::script::ConfigState;

/// A voice as advertised by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderVoice {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl ProviderVoice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: None,
            gender: None,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }
}

/// Input for a single synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub state: ConfigState,
    /// Format the caller will eventually deliver; a hint only.
    pub preferred_format: AudioFormat,
    pub sample_rate_hz: u32,
    /// Request-scoped path without extension. Providers append their own.
    pub output_stem: PathBuf,
}

impl SynthesisRequest {
    /// `output_stem` with `.<extension>` appended.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        let mut path: OsString = self.output_stem.clone().into_os_string();
        path.push(".");
        path.push(extension);
        PathBuf::from(path)
    }
}

/// Where a provider wrote its output.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub path: PathBuf,
    pub format: AudioFormat,
    pub bytes: Option<u64>,
}

/// TTS-specific error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum TTSError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    /// The provider refused or failed a synthesis call.
    #[error("Synthesis failed with voice {voice}, rate {rate}, pitch {pitch}: {message}")]
    SynthesisFailed {
        message: String,
        voice: String,
        rate: String,
        pitch: String,
        /// A few voices the provider does offer, to help the caller recover.
        voices_sample: Vec<ProviderVoice>,
    },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl TTSError {
    /// Voices suggested alongside the failure, if any.
    pub fn voices_sample(&self) -> &[ProviderVoice] {
        match self {
            TTSError::SynthesisFailed { voices_sample, .. } => voices_sample,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for TTSError {
    fn from(err: std::io::Error) -> Self {
        TTSError::InternalError(err.to_string())
    }
}

/// Result type for TTS operations
pub type TTSResult<T> = Result<T, TTSError>;

/// A speech synthesis backend.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Stable identity; part of every cache id.
    fn name(&self) -> &str;

    /// Lists the voices on offer, optionally narrowed to a language prefix.
    async fn list_voices(&self, lang_hint: Option<&str>) -> TTSResult<Vec<ProviderVoice>>;

    /// Synthesizes one text span into a file derived from `output_stem`.
    async fn synthesize(&self, request: SynthesisRequest) -> TTSResult<SynthesizedAudio>;
}

/// Shared provider handle.
pub type BoxedSpeechProvider = Arc<dyn SpeechProvider>;
