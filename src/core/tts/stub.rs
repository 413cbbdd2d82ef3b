//! Offline provider that writes silence sized like speech.
//!
//! Useful for exercising the whole pipeline (parsing, caching, concatenation,
//! downloads) without credentials or network access.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::base::{
    ProviderVoice, SpeechProvider, SynthesisRequest, SynthesizedAudio, TTSError, TTSResult,
};
use crate::core::format::AudioFormat;

/// Assumed speaking pace at rate 1.0 (about 150 words per minute).
const WORDS_PER_SECOND: f64 = 2.5;
/// Shortest clip the stub will produce.
const MIN_DURATION_SECS: f64 = 0.2;

/// Silent WAV provider.
#[derive(Debug, Clone)]
pub struct StubProvider {
    voices: Vec<ProviderVoice>,
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            voices: vec![
                ProviderVoice::new("stub-pt-1").with_lang("pt-BR"),
                ProviderVoice::new("stub-en-1").with_lang("en-US"),
                ProviderVoice::new("stub-es-1").with_lang("es-ES"),
            ],
        }
    }

    /// Estimated clip length for `text` at `rate`.
    pub fn estimate_duration_secs(text: &str, rate: Option<f64>) -> f64 {
        let words = text.split_whitespace().count() as f64;
        let rate = rate.filter(|r| *r > 0.0).unwrap_or(1.0);
        (words / (WORDS_PER_SECOND * rate)).max(MIN_DURATION_SECS)
    }
}

/// Writes `secs` of mono 16-bit silence.
pub(crate) fn write_silent_wav(path: PathBuf, secs: f64, sample_rate_hz: u32) -> TTSResult<u64> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let samples = (secs * sample_rate_hz as f64).round() as u64;
    let mut writer = hound::WavWriter::create(&path, spec)
        .map_err(|e| TTSError::InternalError(format!("Failed to create WAV: {e}")))?;
    for _ in 0..samples {
        writer
            .write_sample(0i16)
            .map_err(|e| TTSError::InternalError(format!("Failed to write WAV: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| TTSError::InternalError(format!("Failed to finalize WAV: {e}")))?;

    Ok(std::fs::metadata(&path)?.len())
}

#[async_trait]
impl SpeechProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn list_voices(&self, lang_hint: Option<&str>) -> TTSResult<Vec<ProviderVoice>> {
        Ok(self
            .voices
            .iter()
            .filter(|v| match (lang_hint, v.lang.as_deref()) {
                (Some(hint), Some(lang)) => lang.starts_with(hint),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .cloned()
            .collect())
    }

    async fn synthesize(&self, request: SynthesisRequest) -> TTSResult<SynthesizedAudio> {
        let secs = Self::estimate_duration_secs(&request.text, request.state.rate);
        let path = request.output_path("wav");
        let sample_rate_hz = request.sample_rate_hz;

        debug!("Stub synthesis: {:.3}s of silence into {:?}", secs, path);

        let target = path.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            write_silent_wav(target, secs, sample_rate_hz)
        })
        .await
        .map_err(|e| TTSError::InternalError(format!("Stub synthesis task failed: {e}")))??;

        Ok(SynthesizedAudio {
            path,
            format: AudioFormat::Wav,
            bytes: Some(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::script::ConfigState;

    #[test]
    fn test_duration_estimate() {
        assert!((StubProvider::estimate_duration_secs("one two three four five", None) - 2.0).abs() < 1e-9);
        assert!((StubProvider::estimate_duration_secs("one two three four five", Some(2.0)) - 1.0).abs() < 1e-9);
        assert_eq!(StubProvider::estimate_duration_secs("hi", Some(2.0)), MIN_DURATION_SECS);
        assert_eq!(StubProvider::estimate_duration_secs("   ", None), MIN_DURATION_SECS);
    }

    #[tokio::test]
    async fn test_list_voices_honours_lang_hint() {
        let stub = StubProvider::new();
        assert_eq!(stub.list_voices(None).await.unwrap().len(), 3);

        let pt = stub.list_voices(Some("pt")).await.unwrap();
        assert_eq!(pt.len(), 1);
        assert_eq!(pt[0].name, "stub-pt-1");
    }

    #[tokio::test]
    async fn test_synthesize_writes_wav_with_expected_length() {
        let dir = tempfile::TempDir::new().unwrap();
        let stub = StubProvider::new();

        let audio = stub
            .synthesize(SynthesisRequest {
                text: "one two three four five".to_string(),
                state: ConfigState::default(),
                preferred_format: AudioFormat::Mp3,
                sample_rate_hz: 8000,
                output_stem: dir.path().join("job-raw-1"),
            })
            .await
            .unwrap();

        assert_eq!(audio.path, dir.path().join("job-raw-1.wav"));
        assert_eq!(audio.format, AudioFormat::Wav);

        let reader = hound::WavReader::open(&audio.path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.duration(), 16_000);
        assert_eq!(audio.bytes, Some(std::fs::metadata(&audio.path).unwrap().len()));
    }
}
