use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::cache::AudioCacheStore;
use crate::core::codec::{AudioCodec, FfmpegCodec};
use crate::core::pipeline::SynthesisPipeline;
use crate::core::service::{ServiceError, ServiceLimits, SpeechService};
use crate::core::tts::{BoxedSpeechProvider, SpeechProvider, create_speech_provider};

/// Application state that can be shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    pub service: SpeechService,
}

impl AppState {
    /// Builds the configured provider, the ffmpeg codec and the cache store.
    pub async fn new(config: ServerConfig) -> Result<Arc<Self>, ServiceError> {
        let provider = create_speech_provider(&config)?;
        let codec = Arc::new(FfmpegCodec::new(
            config.ffmpeg_bin.clone(),
            config.ffprobe_bin.clone(),
        ));
        Self::with_components(config, provider, codec).await
    }

    /// Builds the state around an explicit provider and codec.
    pub async fn with_components(
        config: ServerConfig,
        provider: BoxedSpeechProvider,
        codec: Arc<dyn AudioCodec>,
    ) -> Result<Arc<Self>, ServiceError> {
        let store =
            Arc::new(AudioCacheStore::from_config(config.cache_config(), config.audio_dir()).await?);
        let pipeline = SynthesisPipeline::new(
            codec,
            store.clone(),
            config.tmp_dir(),
            config.mp3_bitrate_kbps,
        );
        let limits = ServiceLimits {
            max_text_chars: config.max_text_chars,
            max_pause_ms: config.max_pause_ms,
            sample_rate_hz: config.sample_rate_hz,
        };

        tracing::info!(
            "Using provider {} with {} cache backend",
            provider.name(),
            store.backend_type()
        );

        let service = SpeechService::new(provider, pipeline, store, limits);
        Ok(Arc::new(Self { config, service }))
    }
}
