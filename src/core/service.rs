//! # Speech service
//!
//! Entry point for rendering requests: parse the annotated text, merge the
//! request defaults, derive the content id, answer from the cache when the
//! artifact is already on disk and otherwise run the pipeline.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::cache::{AudioCacheStore, AudioMetadata, CacheError, derive_id};
use crate::core::format::AudioFormat;
use crate::core::pipeline::{PipelineError, PipelineJob, SynthesisPipeline};
use crate::core::script::{
    ConfigState, DirectiveError, Event, MAX_PITCH, MAX_RATE, MIN_PITCH, MIN_RATE, ParseOptions,
    apply_defaults, is_valid_pitch, is_valid_rate, parse,
};
use crate::core::tts::{BoxedSpeechProvider, ProviderVoice, SpeechProvider, TTSError};
use crate::utils::file_exists;

/// Shortest id accepted for artifact lookups.
pub const MIN_ID_LEN: usize = 10;

/// A rendering request as received from a client.
#[derive(Debug, Clone, Default)]
pub struct ScriptRequest {
    pub text: String,
    pub lang: Option<String>,
    pub voice: Option<String>,
    pub rate: Option<f64>,
    pub pitch: Option<f64>,
    pub format: Option<AudioFormat>,
}

/// Result of a rendering request.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutcome {
    pub id: String,
    pub format: AudioFormat,
    pub bytes: u64,
    pub duration_sec: Option<f64>,
    pub cached: bool,
}

impl SynthesisOutcome {
    fn from_metadata(meta: &AudioMetadata, cached: bool) -> Self {
        Self {
            id: meta.id.clone(),
            format: meta.format,
            bytes: meta.bytes,
            duration_sec: meta.duration_sec,
            cached,
        }
    }
}

/// Error types for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid directive: {0}")]
    Directive(#[from] DirectiveError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Text is too long, limit is {max} characters")]
    TextTooLong { max: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Provider error: {0}")]
    Provider(#[from] TTSError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl ServiceError {
    /// True when the request itself is at fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::Directive(_)
            | ServiceError::InvalidRequest(_)
            | ServiceError::TextTooLong { .. }
            | ServiceError::NotFound(_) => true,
            ServiceError::Pipeline(e) => e.is_validation(),
            ServiceError::Provider(_) | ServiceError::Cache(_) => false,
        }
    }
}

/// Limits applied to incoming requests.
#[derive(Debug, Clone, Copy)]
pub struct ServiceLimits {
    pub max_text_chars: usize,
    pub max_pause_ms: u64,
    pub sample_rate_hz: u32,
}

/// Serializes renders of the same id within this process.
#[derive(Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    fn get(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Drops the entry once nobody else holds or waits on it.
    fn release(&self, key: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock();
        // One reference in the map plus ours.
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(key);
        }
    }
}

/// Shared rendering service.
pub struct SpeechService {
    provider: BoxedSpeechProvider,
    pipeline: SynthesisPipeline,
    store: Arc<AudioCacheStore>,
    limits: ServiceLimits,
    in_flight: KeyedLocks,
}

impl SpeechService {
    pub fn new(
        provider: BoxedSpeechProvider,
        pipeline: SynthesisPipeline,
        store: Arc<AudioCacheStore>,
        limits: ServiceLimits,
    ) -> Self {
        Self {
            provider,
            pipeline,
            store,
            limits,
            in_flight: KeyedLocks::default(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn store(&self) -> &AudioCacheStore {
        &self.store
    }

    /// Renders `request`, or returns the cached artifact for identical input.
    pub async fn synthesize(&self, request: ScriptRequest) -> Result<SynthesisOutcome, ServiceError> {
        if request.text.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("text is required".to_string()));
        }
        if request.text.chars().count() > self.limits.max_text_chars {
            return Err(ServiceError::TextTooLong {
                max: self.limits.max_text_chars,
            });
        }

        let defaults = request_defaults(&request)?;
        let format = request.format.unwrap_or_default();

        let options = ParseOptions {
            max_pause_ms: self.limits.max_pause_ms,
        };
        let events = apply_defaults(&defaults, &parse(&request.text, &options)?);

        let provider_name = self.provider.name();
        let id = derive_id(provider_name, format, self.limits.sample_rate_hz, &events)?;
        debug!("Request {} has {} events", id, events.len());

        if let Some((meta, _)) = self.store.lookup(&id).await? {
            return Ok(SynthesisOutcome::from_metadata(&meta, true));
        }

        let lock = self.in_flight.get(&id);
        let result = {
            let _guard = lock.lock().await;
            self.render_locked(&id, events, format).await
        };
        self.in_flight.release(&id, lock);
        result
    }

    async fn render_locked(
        &self,
        id: &str,
        events: Vec<Event>,
        format: AudioFormat,
    ) -> Result<SynthesisOutcome, ServiceError> {
        // Another request may have rendered the same id while we waited.
        if let Some(meta) = self.store.read_metadata(id).await?
            && self.store.artifact_exists(&meta).await
        {
            debug!("Request {} rendered by a concurrent request", id);
            return Ok(SynthesisOutcome::from_metadata(&meta, true));
        }

        info!(
            "Rendering {} with provider {} ({} events, {})",
            id,
            self.provider.name(),
            events.len(),
            format
        );

        let output = self
            .pipeline
            .run(PipelineJob {
                id: id.to_string(),
                provider: self.provider.clone(),
                events,
                format,
                sample_rate_hz: self.limits.sample_rate_hz,
            })
            .await?;

        Ok(SynthesisOutcome::from_metadata(&output.metadata, false))
    }

    /// Metadata and file location for a rendered artifact.
    pub async fn artifact(&self, id: &str) -> Result<(AudioMetadata, PathBuf), ServiceError> {
        let id = id.trim();
        if !is_valid_id(id) {
            return Err(ServiceError::InvalidRequest("invalid id".to_string()));
        }

        let meta = self
            .store
            .read_metadata(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("audio not found".to_string()))?;
        let path = self.store.resolve_artifact_path(&meta)?;
        if !file_exists(&path).await {
            return Err(ServiceError::NotFound(
                "audio file is missing from storage".to_string(),
            ));
        }

        Ok((meta, path))
    }

    /// Voices offered by the provider, optionally filtered by language.
    pub async fn voices(&self, lang: Option<&str>) -> Result<Vec<ProviderVoice>, ServiceError> {
        Ok(self.provider.list_voices(lang).await?)
    }
}

/// Ids are lowercase or uppercase hex of at least [`MIN_ID_LEN`] characters.
pub fn is_valid_id(id: &str) -> bool {
    id.len() >= MIN_ID_LEN && id.chars().all(|c| c.is_ascii_hexdigit())
}

fn request_defaults(request: &ScriptRequest) -> Result<ConfigState, ServiceError> {
    if let Some(rate) = request.rate
        && !is_valid_rate(rate)
    {
        return Err(ServiceError::InvalidRequest(format!(
            "rate must be between {MIN_RATE} and {MAX_RATE}"
        )));
    }
    if let Some(pitch) = request.pitch
        && !is_valid_pitch(pitch)
    {
        return Err(ServiceError::InvalidRequest(format!(
            "pitch must be between {MIN_PITCH} and {MAX_PITCH}"
        )));
    }

    Ok(ConfigState {
        lang: non_blank(request.lang.as_deref()),
        voice: non_blank(request.voice.as_deref()),
        rate: request.rate,
        pitch: request.pitch,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
