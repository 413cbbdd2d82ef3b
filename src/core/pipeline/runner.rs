use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

use super::errors::{PipelineError, PipelineResult, ValidationError};
use super::scratch::ScratchFiles;
use crate::core::cache::{AudioCacheStore, AudioMetadata, CacheError};
use crate::core::codec::AudioCodec;
use crate::core::format::AudioFormat;
use crate::core::script::Event;
use crate::core::tts::{BoxedSpeechProvider, SpeechProvider, SynthesisRequest};
use crate::utils::{ensure_dir, safe_join};

/// Number of provider voices returned with an unknown-voice error.
pub const UNKNOWN_VOICE_SAMPLE: usize = 50;

/// One render request.
pub struct PipelineJob {
    pub id: String,
    pub provider: BoxedSpeechProvider,
    pub events: Vec<Event>,
    pub format: AudioFormat,
    pub sample_rate_hz: u32,
}

/// A persisted artifact and its metadata.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub metadata: AudioMetadata,
    pub artifact_path: PathBuf,
}

/// Renders event timelines into cached artifacts.
pub struct SynthesisPipeline {
    codec: Arc<dyn AudioCodec>,
    store: Arc<AudioCacheStore>,
    tmp_dir: PathBuf,
    mp3_bitrate_kbps: u32,
}

impl SynthesisPipeline {
    pub fn new(
        codec: Arc<dyn AudioCodec>,
        store: Arc<AudioCacheStore>,
        tmp_dir: PathBuf,
        mp3_bitrate_kbps: u32,
    ) -> Self {
        Self {
            codec,
            store,
            tmp_dir,
            mp3_bitrate_kbps,
        }
    }

    /// Validates, synthesizes, concatenates and persists one job.
    ///
    /// Intermediate files are removed on every exit path. On success only the
    /// artifact and its metadata remain.
    pub async fn run(&self, job: PipelineJob) -> PipelineResult<PipelineOutput> {
        let PipelineJob {
            id,
            provider,
            events,
            format,
            sample_rate_hz,
        } = job;

        debug!("Pipeline {}: validating {} events", id, events.len());
        validate_events(provider.as_ref(), &events).await?;

        ensure_dir(&self.tmp_dir).await?;
        ensure_dir(self.store.audio_dir()).await?;

        let mut scratch = ScratchFiles::new();
        let total = events.len();
        let mut segments: Vec<PathBuf> = Vec::new();

        for (index, event) in events.iter().enumerate() {
            let n = index + 1;
            match event {
                Event::Speak { text, state } => {
                    debug!("Pipeline {}: synthesizing {} of {}", id, n, total);
                    let stem = self.tmp_path(&id, &format!("raw-{n}"))?;
                    // Providers pick their own extension.
                    for ext in ["wav", "mp3"] {
                        scratch.register(with_extension(&stem, ext));
                    }

                    let request = SynthesisRequest {
                        text: text.clone(),
                        state: state.clone(),
                        preferred_format: format,
                        sample_rate_hz,
                        output_stem: stem,
                    };
                    let audio = provider.synthesize(request).await.map_err(|source| {
                        PipelineError::Synthesis {
                            segment: n,
                            text: text.clone(),
                            voice: state.voice.clone(),
                            rate: state.rate,
                            pitch: state.pitch,
                            source,
                        }
                    })?;
                    let raw = scratch.register(audio.path);

                    let part = scratch.register(self.tmp_path(&id, &format!("part-{n}.wav"))?);
                    self.codec.normalize(&raw, &part, sample_rate_hz).await?;
                    segments.push(part);
                }
                Event::Pause { ms } => {
                    debug!("Pipeline {}: {}ms pause at {} of {}", id, ms, n, total);
                    let part = scratch.register(self.tmp_path(&id, &format!("pause-{n}.wav"))?);
                    self.codec.silence(&part, *ms, sample_rate_hz).await?;
                    segments.push(part);
                }
                Event::Break => continue,
            }
        }

        if segments.is_empty() {
            return Err(ValidationError::NothingToRender.into());
        }

        debug!("Pipeline {}: concatenating {} segments", id, segments.len());
        let list_path = scratch.register(self.tmp_path(&id, "concat.txt")?);
        let combined = scratch.register(self.tmp_path(&id, "combined.wav")?);
        self.codec.concat(&segments, &list_path, &combined).await?;

        let file_name = format!("{id}.{}", format.extension());
        let artifact_path = safe_join(self.store.audio_dir(), &file_name)
            .ok_or_else(|| CacheError::InvalidKey(file_name.clone()))?;
        scratch.register(&artifact_path);

        debug!("Pipeline {}: writing {} artifact", id, format);
        match format {
            AudioFormat::Wav => {
                fs::copy(&combined, &artifact_path).await?;
            }
            AudioFormat::Mp3 => {
                self.codec
                    .transcode_mp3(&combined, &artifact_path, self.mp3_bitrate_kbps)
                    .await?;
            }
        }

        let bytes = fs::metadata(&artifact_path).await?.len();
        let duration_sec = self.codec.probe_duration(&artifact_path).await;
        let metadata = AudioMetadata::new(&id, format, bytes, duration_sec);
        self.store.write_metadata(&metadata).await?;

        scratch.keep(&artifact_path);
        info!(
            "Rendered {} ({} segments, {} bytes, {:?}s)",
            file_name,
            segments.len(),
            bytes,
            duration_sec
        );

        Ok(PipelineOutput {
            metadata,
            artifact_path,
        })
    }

    /// Scratch paths are absolute so concat list entries resolve no matter
    /// where the list file lives.
    fn tmp_path(&self, id: &str, suffix: &str) -> PipelineResult<PathBuf> {
        let name = format!("{id}-{suffix}");
        let path = safe_join(&self.tmp_dir, &name).ok_or(CacheError::InvalidKey(name))?;
        Ok(std::path::absolute(path)?)
    }
}

/// Rejects empty scripts and voices the provider does not list.
///
/// A provider that cannot list voices, or lists none, is trusted as is.
async fn validate_events(provider: &dyn SpeechProvider, events: &[Event]) -> PipelineResult<()> {
    if events.is_empty() {
        return Err(ValidationError::EmptyScript.into());
    }

    let used: BTreeSet<&str> = events.iter().filter_map(Event::voice).collect();
    if used.is_empty() {
        return Ok(());
    }

    let listed = match provider.list_voices(None).await {
        Ok(voices) => voices,
        Err(e) => {
            warn!("Skipping voice validation, {} listing failed: {}", provider.name(), e);
            return Ok(());
        }
    };
    if listed.is_empty() {
        return Ok(());
    }

    let missing: Vec<String> = used
        .into_iter()
        .filter(|voice| !listed.iter().any(|v| v.name == *voice))
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    Err(ValidationError::UnknownVoices {
        provider: provider.name().to_string(),
        missing,
        available_sample: listed.into_iter().take(UNKNOWN_VOICE_SAMPLE).collect(),
    }
    .into())
}

fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}
