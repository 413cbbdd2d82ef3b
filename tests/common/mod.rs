//! Shared fixtures for integration tests.
//!
//! `WavCodec` stands in for ffmpeg: it only understands 16-bit PCM WAV, which
//! is all the stub provider writes, and "transcodes" to MP3 by copying.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use narrator::config::ServerConfig;
use narrator::core::cache::{AudioCacheStore, CacheBackend, CacheConfig, CacheError};
use narrator::core::codec::{AudioCodec, CodecError, CodecResult, concat_list_contents};
use narrator::core::pipeline::SynthesisPipeline;
use narrator::core::tts::{
    BoxedSpeechProvider, ProviderVoice, SpeechProvider, StubProvider, SynthesisRequest,
    SynthesizedAudio, TTSError, TTSResult,
};
use narrator::state::AppState;

pub const SAMPLE_RATE: u32 = 24_000;

fn wav_spec(sample_rate_hz: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn codec_err(e: hound::Error) -> CodecError {
    CodecError::Failed {
        tool: "hound".to_string(),
        status: "error".to_string(),
        stderr: e.to_string(),
    }
}

fn read_mono(path: &Path) -> CodecResult<(Vec<i16>, u32)> {
    let mut reader = hound::WavReader::open(path).map_err(codec_err)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;
    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(codec_err)?;
    let mono = samples.into_iter().step_by(channels).collect();
    Ok((mono, spec.sample_rate))
}

fn write_mono(path: &Path, samples: &[i16], sample_rate_hz: u32) -> CodecResult<()> {
    let mut writer = hound::WavWriter::create(path, wav_spec(sample_rate_hz)).map_err(codec_err)?;
    for s in samples {
        writer.write_sample(*s).map_err(codec_err)?;
    }
    writer.finalize().map_err(codec_err)
}

/// WAV-only codec for tests that must not depend on ffmpeg.
#[derive(Default)]
pub struct WavCodec {
    pub normalized: AtomicUsize,
}

#[async_trait]
impl AudioCodec for WavCodec {
    async fn normalize(
        &self,
        input: &Path,
        output: &Path,
        sample_rate_hz: u32,
    ) -> CodecResult<()> {
        self.normalized.fetch_add(1, Ordering::SeqCst);
        let (samples, rate) = read_mono(input)?;
        let resampled: Vec<i16> = if rate == sample_rate_hz {
            samples
        } else {
            let len = samples.len() as u64 * sample_rate_hz as u64 / rate as u64;
            (0..len)
                .map(|i| samples[(i * rate as u64 / sample_rate_hz as u64) as usize])
                .collect()
        };
        write_mono(output, &resampled, sample_rate_hz)
    }

    async fn silence(&self, output: &Path, ms: u64, sample_rate_hz: u32) -> CodecResult<()> {
        let len = (ms * sample_rate_hz as u64 / 1000) as usize;
        write_mono(output, &vec![0i16; len], sample_rate_hz)
    }

    async fn concat(&self, parts: &[PathBuf], list_path: &Path, output: &Path) -> CodecResult<()> {
        std::fs::write(list_path, concat_list_contents(parts))?;
        let mut all = Vec::new();
        let mut rate = SAMPLE_RATE;
        for part in parts {
            let (samples, r) = read_mono(part)?;
            rate = r;
            all.extend(samples);
        }
        write_mono(output, &all, rate)
    }

    async fn transcode_mp3(
        &self,
        input: &Path,
        output: &Path,
        _bitrate_kbps: u32,
    ) -> CodecResult<()> {
        std::fs::copy(input, output)?;
        Ok(())
    }

    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let reader = hound::WavReader::open(path).ok()?;
        let spec = reader.spec();
        Some(reader.duration() as f64 / spec.sample_rate as f64)
    }
}

/// Codec whose concat step always fails.
pub struct FailingCodec {
    pub inner: WavCodec,
}

impl FailingCodec {
    pub fn new() -> Self {
        Self {
            inner: WavCodec::default(),
        }
    }
}

#[async_trait]
impl AudioCodec for FailingCodec {
    async fn normalize(&self, input: &Path, output: &Path, rate: u32) -> CodecResult<()> {
        self.inner.normalize(input, output, rate).await
    }

    async fn silence(&self, output: &Path, ms: u64, rate: u32) -> CodecResult<()> {
        self.inner.silence(output, ms, rate).await
    }

    async fn concat(&self, parts: &[PathBuf], list_path: &Path, _output: &Path) -> CodecResult<()> {
        std::fs::write(list_path, concat_list_contents(parts))?;
        Err(CodecError::Failed {
            tool: "ffmpeg".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "concat failed".to_string(),
        })
    }

    async fn transcode_mp3(&self, input: &Path, output: &Path, kbps: u32) -> CodecResult<()> {
        self.inner.transcode_mp3(input, output, kbps).await
    }

    async fn probe_duration(&self, _path: &Path) -> Option<f64> {
        None
    }
}

/// Codec that resolves concat list entries the way ffmpeg's demuxer does:
/// relative entries are taken relative to the list file's directory.
#[derive(Default)]
pub struct ListResolvingCodec {
    pub inner: WavCodec,
    /// `(entry, resolves to an existing file)` for every list line seen.
    pub entries: Mutex<Vec<(String, bool)>>,
}

#[async_trait]
impl AudioCodec for ListResolvingCodec {
    async fn normalize(&self, input: &Path, output: &Path, rate: u32) -> CodecResult<()> {
        self.inner.normalize(input, output, rate).await
    }

    async fn silence(&self, output: &Path, ms: u64, rate: u32) -> CodecResult<()> {
        self.inner.silence(output, ms, rate).await
    }

    async fn concat(&self, parts: &[PathBuf], list_path: &Path, output: &Path) -> CodecResult<()> {
        std::fs::write(list_path, concat_list_contents(parts))?;
        let list_dir = list_path.parent().unwrap_or(Path::new("")).to_path_buf();
        let listed = std::fs::read_to_string(list_path)?;
        for line in listed.lines() {
            let entry = line
                .trim_start_matches("file '")
                .trim_end_matches('\'')
                .to_string();
            let exists = list_dir.join(&entry).is_file();
            self.entries.lock().push((entry, exists));
        }
        self.inner.concat(parts, list_path, output).await
    }

    async fn transcode_mp3(&self, input: &Path, output: &Path, kbps: u32) -> CodecResult<()> {
        self.inner.transcode_mp3(input, output, kbps).await
    }

    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        self.inner.probe_duration(path).await
    }
}

/// Codec whose MP3 step writes a truncated output and then fails.
#[derive(Default)]
pub struct TranscodeFailingCodec {
    pub inner: WavCodec,
}

#[async_trait]
impl AudioCodec for TranscodeFailingCodec {
    async fn normalize(&self, input: &Path, output: &Path, rate: u32) -> CodecResult<()> {
        self.inner.normalize(input, output, rate).await
    }

    async fn silence(&self, output: &Path, ms: u64, rate: u32) -> CodecResult<()> {
        self.inner.silence(output, ms, rate).await
    }

    async fn concat(&self, parts: &[PathBuf], list_path: &Path, output: &Path) -> CodecResult<()> {
        self.inner.concat(parts, list_path, output).await
    }

    async fn transcode_mp3(&self, _input: &Path, output: &Path, _kbps: u32) -> CodecResult<()> {
        std::fs::write(output, b"ID3 truncated")?;
        Err(CodecError::Failed {
            tool: "ffmpeg".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "libmp3lame encoder error".to_string(),
        })
    }

    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        self.inner.probe_duration(path).await
    }
}

/// Metadata backend whose writes always fail.
pub struct ReadOnlyBackend;

#[async_trait]
impl CacheBackend for ReadOnlyBackend {
    async fn set(&self, _key: &str, _value: Bytes) -> Result<(), CacheError> {
        Err(CacheError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "metadata store is read-only",
        )))
    }

    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        Ok(None)
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend_type(&self) -> &str {
        "read-only"
    }
}

/// Stub provider that counts synthesis calls and fails on a marker word.
pub struct CountingProvider {
    inner: StubProvider,
    pub calls: AtomicUsize,
    fail_on: Option<String>,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self {
            inner: StubProvider::new(),
            calls: AtomicUsize::new(0),
            fail_on: None,
        }
    }

    /// Fails any segment whose text contains `marker`.
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechProvider for CountingProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn list_voices(&self, lang_hint: Option<&str>) -> TTSResult<Vec<ProviderVoice>> {
        self.inner.list_voices(lang_hint).await
    }

    async fn synthesize(&self, request: SynthesisRequest) -> TTSResult<SynthesizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.fail_on
            && request.text.contains(marker.as_str())
        {
            // Leave a partial file behind to check cleanup.
            std::fs::write(request.output_path("wav"), b"partial")?;
            return Err(TTSError::SynthesisFailed {
                message: "provider rejected the segment".to_string(),
                voice: request.state.voice.clone().unwrap_or_default(),
                rate: format!("{:?}", request.state.rate),
                pitch: format!("{:?}", request.state.pitch),
                voices_sample: vec![ProviderVoice::new("stub-pt-1")],
            });
        }
        self.inner.synthesize(request).await
    }
}

/// Provider with a fixed voice list and a listing that may fail.
pub struct FixedVoicesProvider {
    inner: StubProvider,
    voices: Vec<ProviderVoice>,
    listing_fails: bool,
}

impl FixedVoicesProvider {
    pub fn new(voices: Vec<ProviderVoice>) -> Self {
        Self {
            inner: StubProvider::new(),
            voices,
            listing_fails: false,
        }
    }

    pub fn with_failing_listing() -> Self {
        Self {
            listing_fails: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl SpeechProvider for FixedVoicesProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn list_voices(&self, _lang_hint: Option<&str>) -> TTSResult<Vec<ProviderVoice>> {
        if self.listing_fails {
            return Err(TTSError::NetworkError("voice list unavailable".to_string()));
        }
        Ok(self.voices.clone())
    }

    async fn synthesize(&self, request: SynthesisRequest) -> TTSResult<SynthesizedAudio> {
        self.inner.synthesize(request).await
    }
}

/// Temp storage root with `audio/` and `tmp/` below it.
pub struct TestStorage {
    pub dir: TempDir,
}

impl TestStorage {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            storage_dir: self.dir.path().to_path_buf(),
            sample_rate_hz: SAMPLE_RATE,
            ..Default::default()
        }
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.config().audio_dir()
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.config().tmp_dir()
    }

    /// Files currently in the temp directory.
    pub fn tmp_files(&self) -> Vec<PathBuf> {
        list_files(&self.tmp_dir())
    }

    pub fn audio_files(&self) -> Vec<PathBuf> {
        list_files(&self.audio_dir())
    }

    pub async fn store(&self) -> Arc<AudioCacheStore> {
        Arc::new(
            AudioCacheStore::from_config(CacheConfig::Filesystem, self.audio_dir())
                .await
                .unwrap(),
        )
    }

    /// Store over a backend that refuses metadata writes.
    pub fn read_only_store(&self) -> Arc<AudioCacheStore> {
        std::fs::create_dir_all(self.audio_dir()).unwrap();
        Arc::new(AudioCacheStore::with_backend(
            Arc::new(ReadOnlyBackend),
            self.audio_dir(),
        ))
    }

    pub fn pipeline(
        &self,
        codec: Arc<dyn AudioCodec>,
        store: Arc<AudioCacheStore>,
    ) -> SynthesisPipeline {
        SynthesisPipeline::new(codec, store, self.tmp_dir(), 192)
    }

    pub async fn app_state(
        &self,
        provider: BoxedSpeechProvider,
        codec: Arc<dyn AudioCodec>,
    ) -> Arc<AppState> {
        AppState::with_components(self.config(), provider, codec)
            .await
            .unwrap()
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            let mut files: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
            files.sort();
            files
        }
        Err(_) => Vec::new(),
    }
}

/// Sample count of a WAV file written by the test codec.
pub fn wav_len(path: &Path) -> u32 {
    hound::WavReader::open(path).unwrap().duration()
}
