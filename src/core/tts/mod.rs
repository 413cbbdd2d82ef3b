pub mod azure;
mod base;
mod stub;

pub use azure::{AzureConfig, AzureProvider};
pub use base::{
    BoxedSpeechProvider, ProviderVoice, SpeechProvider, SynthesisRequest, SynthesizedAudio,
    TTSError, TTSResult,
};
pub use stub::StubProvider;

use std::sync::Arc;

use crate::config::ServerConfig;

/// Factory function to create the configured speech provider.
///
/// # Supported Providers
///
/// - `"stub"` - offline provider writing silent WAV files sized to the text
/// - `"azure"` or `"microsoft-azure"` - Microsoft Azure Text-to-Speech REST API
///
/// ```rust,ignore
/// let config = ServerConfig::from_env()?;
/// let provider = create_speech_provider(&config)?;
/// println!("using {}", provider.name());
/// ```
pub fn create_speech_provider(config: &ServerConfig) -> TTSResult<BoxedSpeechProvider> {
    match config.tts_provider.trim().to_lowercase().as_str() {
        "stub" => Ok(Arc::new(StubProvider::new())),
        "azure" | "microsoft-azure" => {
            let key = config.azure_speech_subscription_key.clone().ok_or_else(|| {
                TTSError::InvalidConfiguration(
                    "AZURE_SPEECH_SUBSCRIPTION_KEY is required for the azure provider".to_string(),
                )
            })?;
            let azure_config = AzureConfig {
                endpoint: config.azure_speech_endpoint.clone(),
                request_timeout: config.request_timeout(),
                ..AzureConfig::new(key, config.azure_speech_region.clone())
            };
            Ok(Arc::new(AzureProvider::new(azure_config)?))
        }
        other => Err(TTSError::InvalidConfiguration(format!(
            "Unsupported TTS provider: {other}. Supported providers: stub, azure"
        ))),
    }
}
