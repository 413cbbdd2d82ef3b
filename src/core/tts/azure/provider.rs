//! Azure Speech REST provider.
//!
//! - Synthesis: `POST {base}/cognitiveservices/v1` with an SSML body
//! - Voices: `GET {base}/cognitiveservices/voices/list`
//!
//! Both authenticate with the `Ocp-Apim-Subscription-Key` header.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::config::{
    AZURE_OUTPUT_FORMAT_HEADER, AZURE_SUBSCRIPTION_KEY_HEADER, AzureConfig, AzureOutputFormat,
    build_ssml, format_pitch, format_rate, language_code,
};
use crate::core::tts::base::{
    ProviderVoice, SpeechProvider, SynthesisRequest, SynthesizedAudio, TTSError, TTSResult,
};

/// User-Agent header value for Azure requests.
const USER_AGENT: &str = "narrator-tts-server";

/// Voices attached to a synthesis failure.
const FAILURE_VOICE_SAMPLE: usize = 25;

/// Language used for the failure voice sample.
const FAILURE_SAMPLE_LANG: &str = "pt-BR";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AzureVoice {
    short_name: String,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    gender: Option<String>,
}

impl From<AzureVoice> for ProviderVoice {
    fn from(voice: AzureVoice) -> Self {
        ProviderVoice {
            name: voice.short_name,
            lang: voice.locale,
            gender: voice.gender,
        }
    }
}

/// Microsoft Azure Text-to-Speech provider.
///
/// The voice listing is fetched once and reused for the lifetime of the
/// provider.
pub struct AzureProvider {
    client: reqwest::Client,
    config: AzureConfig,
    voices: OnceCell<Vec<ProviderVoice>>,
}

impl AzureProvider {
    pub fn new(config: AzureConfig) -> TTSResult<Self> {
        if config.subscription_key.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "Azure subscription key is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TTSError::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            voices: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &AzureConfig {
        &self.config
    }

    async fn fetch_voices(&self) -> TTSResult<Vec<ProviderVoice>> {
        let url = self.config.voices_url();
        debug!("Fetching Azure voice list from {}", url);

        let response = self
            .client
            .get(&url)
            .header(AZURE_SUBSCRIPTION_KEY_HEADER, &self.config.subscription_key)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| TTSError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TTSError::ProviderError(format!(
                "Voice list error ({status}): {body}"
            )));
        }

        let voices: Vec<AzureVoice> = response
            .json()
            .await
            .map_err(|e| TTSError::ProviderError(format!("Invalid voice list: {e}")))?;

        info!("Loaded {} Azure voices", voices.len());
        Ok(voices.into_iter().map(ProviderVoice::from).collect())
    }

    async fn voice_sample(&self) -> Vec<ProviderVoice> {
        match self.list_voices(Some(FAILURE_SAMPLE_LANG)).await {
            Ok(mut voices) => {
                voices.truncate(FAILURE_VOICE_SAMPLE);
                voices
            }
            Err(e) => {
                warn!("Could not load voice sample: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SpeechProvider for AzureProvider {
    fn name(&self) -> &str {
        "azure"
    }

    async fn list_voices(&self, lang_hint: Option<&str>) -> TTSResult<Vec<ProviderVoice>> {
        let voices = self
            .voices
            .get_or_try_init(|| self.fetch_voices())
            .await?;

        Ok(voices
            .iter()
            .filter(|v| match lang_hint {
                Some(hint) => v.lang.as_deref().is_some_and(|l| l.starts_with(hint)),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn synthesize(&self, request: SynthesisRequest) -> TTSResult<SynthesizedAudio> {
        let voice = request
            .state
            .voice
            .clone()
            .unwrap_or_else(|| self.config.default_voice.clone());
        let language = request
            .state
            .lang
            .clone()
            .or_else(|| language_code(&voice))
            .unwrap_or_else(|| "en-US".to_string());
        let output_format =
            AzureOutputFormat::for_request(request.preferred_format, request.sample_rate_hz);

        let ssml = build_ssml(
            &request.text,
            &voice,
            &language,
            request.state.rate,
            request.state.pitch,
        );

        let failure = |message: String, voices_sample: Vec<ProviderVoice>| {
            TTSError::SynthesisFailed {
                message,
                voice: voice.clone(),
                rate: format_rate(request.state.rate.unwrap_or(1.0)),
                pitch: format_pitch(request.state.pitch.unwrap_or(0.0)),
                voices_sample,
            }
        };

        let response = self
            .client
            .post(self.config.tts_url())
            .header(AZURE_SUBSCRIPTION_KEY_HEADER, &self.config.subscription_key)
            .header("Content-Type", "application/ssml+xml")
            .header(AZURE_OUTPUT_FORMAT_HEADER, output_format.as_str())
            .header("User-Agent", USER_AGENT)
            .body(ssml)
            .send()
            .await
            .map_err(|e| TTSError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Azure TTS API error ({}): {}", status, body);
            let sample = self.voice_sample().await;
            return Err(failure(format!("API error ({status}): {body}"), sample));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TTSError::NetworkError(e.to_string()))?;
        if audio.is_empty() {
            let sample = self.voice_sample().await;
            return Err(failure("Empty audio response".to_string(), sample));
        }

        let format = output_format.audio_format();
        let path = request.output_path(format.extension());
        tokio::fs::write(&path, &audio).await?;

        debug!("Azure synthesis wrote {} bytes to {:?}", audio.len(), path);

        Ok(SynthesizedAudio {
            path,
            format,
            bytes: Some(audio.len() as u64),
        })
    }
}
