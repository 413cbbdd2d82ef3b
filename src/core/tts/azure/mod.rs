//! Microsoft Azure Text-to-Speech provider.
//!
//! - **config**: endpoint configuration, output format selection and SSML generation
//! - **provider**: the `AzureProvider` implementation of `SpeechProvider`
//!
//! # Azure TTS API Reference
//!
//! - TTS endpoint: `https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
//! - Required headers: `Ocp-Apim-Subscription-Key`, `Content-Type: application/ssml+xml`,
//!   `X-Microsoft-OutputFormat`
//! - Documentation: <https://learn.microsoft.com/en-us/azure/ai-services/speech-service/rest-text-to-speech>

mod config;
mod provider;

pub use config::{
    AZURE_OUTPUT_FORMAT_HEADER, AZURE_SUBSCRIPTION_KEY_HEADER, AzureConfig, AzureOutputFormat,
    DEFAULT_AZURE_REGION, DEFAULT_AZURE_VOICE, build_ssml, escape_xml, format_pitch, format_rate,
    language_code,
};
pub use provider::AzureProvider;
