//! Configuration and SSML helpers for the Azure Speech REST API.

use std::time::Duration;

use crate::core::format::AudioFormat;

/// HTTP header name for Azure TTS output format.
pub const AZURE_OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";

/// HTTP header carrying the subscription key.
pub const AZURE_SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Region used when none is configured.
pub const DEFAULT_AZURE_REGION: &str = "eastus";

/// Voice used for spans that never selected one.
pub const DEFAULT_AZURE_VOICE: &str = "pt-BR-AntonioNeural";

// =============================================================================
// Output format
// =============================================================================

/// Subset of Azure's `X-Microsoft-OutputFormat` values used for file rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AzureOutputFormat {
    Riff8Khz16BitMonoPcm,
    Riff16Khz16BitMonoPcm,
    Riff24Khz16BitMonoPcm,
    Riff48Khz16BitMonoPcm,
    Audio16Khz128KBitRateMonoMp3,
    Audio24Khz96KBitRateMonoMp3,
    Audio48Khz192KBitRateMonoMp3,
}

impl AzureOutputFormat {
    /// Picks the closest format not below `sample_rate_hz` in the preferred container.
    pub fn for_request(preferred: AudioFormat, sample_rate_hz: u32) -> Self {
        match preferred {
            AudioFormat::Wav => match sample_rate_hz {
                0..=8000 => Self::Riff8Khz16BitMonoPcm,
                8001..=16000 => Self::Riff16Khz16BitMonoPcm,
                16001..=24000 => Self::Riff24Khz16BitMonoPcm,
                _ => Self::Riff48Khz16BitMonoPcm,
            },
            AudioFormat::Mp3 => match sample_rate_hz {
                0..=16000 => Self::Audio16Khz128KBitRateMonoMp3,
                16001..=24000 => Self::Audio24Khz96KBitRateMonoMp3,
                _ => Self::Audio48Khz192KBitRateMonoMp3,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Riff8Khz16BitMonoPcm => "riff-8khz-16bit-mono-pcm",
            Self::Riff16Khz16BitMonoPcm => "riff-16khz-16bit-mono-pcm",
            Self::Riff24Khz16BitMonoPcm => "riff-24khz-16bit-mono-pcm",
            Self::Riff48Khz16BitMonoPcm => "riff-48khz-16bit-mono-pcm",
            Self::Audio16Khz128KBitRateMonoMp3 => "audio-16khz-128kbitrate-mono-mp3",
            Self::Audio24Khz96KBitRateMonoMp3 => "audio-24khz-96kbitrate-mono-mp3",
            Self::Audio48Khz192KBitRateMonoMp3 => "audio-48khz-192kbitrate-mono-mp3",
        }
    }

    /// Container of the returned body.
    pub fn audio_format(&self) -> AudioFormat {
        match self {
            Self::Riff8Khz16BitMonoPcm
            | Self::Riff16Khz16BitMonoPcm
            | Self::Riff24Khz16BitMonoPcm
            | Self::Riff48Khz16BitMonoPcm => AudioFormat::Wav,
            _ => AudioFormat::Mp3,
        }
    }
}

// =============================================================================
// SSML
// =============================================================================

/// Escapes special XML characters in text for SSML.
pub fn escape_xml(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}

/// Relative prosody rate, e.g. `1.2` becomes `+20%` and `0.75` becomes `-25%`.
pub fn format_rate(rate: f64) -> String {
    let pct = ((rate - 1.0) * 100.0).round() as i64;
    format!("{}{pct}%", if pct >= 0 { "+" } else { "" })
}

/// Relative prosody pitch in hertz, e.g. `+5Hz`.
pub fn format_pitch(pitch: f64) -> String {
    let rounded = (pitch * 100.0).round() / 100.0;
    format!("{}{rounded}Hz", if rounded >= 0.0 { "+" } else { "" })
}

/// Extracts `xx-YY` from voice names shaped like `pt-BR-FranciscaNeural`.
pub fn language_code(voice_name: &str) -> Option<String> {
    let mut parts = voice_name.split('-');
    let lang = parts.next()?;
    let region = parts.next()?;

    if !lang.is_empty()
        && region.len() == 2
        && region.chars().all(|c| c.is_ascii_uppercase())
    {
        Some(format!("{lang}-{region}"))
    } else {
        None
    }
}

/// Builds an SSML document for one span.
///
/// A `<prosody>` element is only emitted when the rate differs from 1.0 or
/// the pitch from 0.
pub fn build_ssml(
    text: &str,
    voice_name: &str,
    language: &str,
    rate: Option<f64>,
    pitch: Option<f64>,
) -> String {
    let escaped_text = escape_xml(text);

    let mut attrs = Vec::new();
    if let Some(rate) = rate
        && (rate - 1.0).abs() > 0.005
    {
        attrs.push(format!("rate=\"{}\"", format_rate(rate)));
    }
    if let Some(pitch) = pitch
        && pitch.abs() > 0.005
    {
        attrs.push(format!("pitch=\"{}\"", format_pitch(pitch)));
    }

    let inner_content = if attrs.is_empty() {
        escaped_text
    } else {
        format!("<prosody {}>{escaped_text}</prosody>", attrs.join(" "))
    };

    format!(
        r#"<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='{language}'>
    <voice name='{}'>
        {inner_content}
    </voice>
</speak>"#,
        escape_xml(voice_name),
    )
}

// =============================================================================
// Provider configuration
// =============================================================================

/// Settings for [`super::AzureProvider`].
#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub subscription_key: String,
    pub region: String,
    /// Replaces `https://{region}.tts.speech.microsoft.com` when set.
    pub endpoint: Option<String>,
    pub request_timeout: Duration,
    pub default_voice: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            subscription_key: String::new(),
            region: DEFAULT_AZURE_REGION.to_string(),
            endpoint: None,
            request_timeout: Duration::from_secs(60),
            default_voice: DEFAULT_AZURE_VOICE.to_string(),
        }
    }
}

impl AzureConfig {
    pub fn new(subscription_key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            subscription_key: subscription_key.into(),
            region: region.into(),
            ..Default::default()
        }
    }

    fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.tts.speech.microsoft.com", self.region),
        }
    }

    /// `https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
    pub fn tts_url(&self) -> String {
        format!("{}/cognitiveservices/v1", self.base_url())
    }

    /// `https://{region}.tts.speech.microsoft.com/cognitiveservices/voices/list`
    pub fn voices_url(&self) -> String {
        format!("{}/cognitiveservices/voices/list", self.base_url())
    }
}
