use super::ServerConfig;

/// Provider names accepted by `TTS_PROVIDER`.
pub const SUPPORTED_PROVIDERS: &[&str] = &["stub", "azure"];

/// Output sample rates the render pipeline accepts.
pub const SUPPORTED_SAMPLE_RATES: &[u32] = &[8_000, 16_000, 22_050, 24_000, 44_100, 48_000];

const SUPPORTED_CACHE_BACKENDS: &[&str] = &["filesystem", "memory"];

/// Upper bound for `TTS_MAX_TEXT_CHARS`.
const MAX_TEXT_CHARS_LIMIT: usize = 1_000_000;
/// Upper bound for `TTS_MAX_PAUSE_MS`.
const MAX_PAUSE_MS_LIMIT: u64 = 60 * 60 * 1000;
const MP3_BITRATE_RANGE: std::ops::RangeInclusive<u32> = 32..=320;

/// Validate a merged configuration
///
/// # Errors
/// Returns a message naming the offending setting.
pub fn validate_config(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_provider(config)?;
    validate_limits(config)?;
    validate_storage(config)?;
    Ok(())
}

fn validate_provider(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !SUPPORTED_PROVIDERS.contains(&config.tts_provider.as_str()) {
        return Err(format!(
            "Unsupported TTS_PROVIDER '{}'. Supported providers: {}",
            config.tts_provider,
            SUPPORTED_PROVIDERS.join(", ")
        )
        .into());
    }

    if config.tts_provider == "azure" {
        let has_key = config
            .azure_speech_subscription_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            return Err(
                "TTS_PROVIDER is 'azure' but AZURE_SPEECH_SUBSCRIPTION_KEY is not set".into(),
            );
        }
        if config.azure_speech_region.trim().is_empty() {
            return Err("AZURE_SPEECH_REGION must not be empty".into());
        }
    }

    if config.request_timeout_seconds == 0 {
        return Err("TTS_REQUEST_TIMEOUT_SECONDS must be greater than zero".into());
    }

    Ok(())
}

fn validate_limits(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.max_text_chars == 0 || config.max_text_chars > MAX_TEXT_CHARS_LIMIT {
        return Err(format!(
            "TTS_MAX_TEXT_CHARS must be between 1 and {MAX_TEXT_CHARS_LIMIT}, got {}",
            config.max_text_chars
        )
        .into());
    }

    if config.max_pause_ms == 0 || config.max_pause_ms > MAX_PAUSE_MS_LIMIT {
        return Err(format!(
            "TTS_MAX_PAUSE_MS must be between 1 and {MAX_PAUSE_MS_LIMIT}, got {}",
            config.max_pause_ms
        )
        .into());
    }

    if !SUPPORTED_SAMPLE_RATES.contains(&config.sample_rate_hz) {
        let rates: Vec<String> = SUPPORTED_SAMPLE_RATES.iter().map(u32::to_string).collect();
        return Err(format!(
            "Unsupported TTS_SAMPLE_RATE {}. Supported rates: {}",
            config.sample_rate_hz,
            rates.join(", ")
        )
        .into());
    }

    if !MP3_BITRATE_RANGE.contains(&config.mp3_bitrate_kbps) {
        return Err(format!(
            "TTS_MP3_BITRATE_KBPS must be between {} and {}, got {}",
            MP3_BITRATE_RANGE.start(),
            MP3_BITRATE_RANGE.end(),
            config.mp3_bitrate_kbps
        )
        .into());
    }

    Ok(())
}

fn validate_storage(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.storage_dir.as_os_str().is_empty() {
        return Err("TTS_STORAGE_DIR must not be empty".into());
    }

    if !SUPPORTED_CACHE_BACKENDS.contains(&config.cache_backend.as_str()) {
        return Err(format!(
            "Unsupported TTS_CACHE_BACKEND '{}'. Supported backends: {}",
            config.cache_backend,
            SUPPORTED_CACHE_BACKENDS.join(", ")
        )
        .into());
    }

    if config.tmp_ttl_seconds == 0 {
        return Err("TTS_TMP_TTL_SECONDS must be greater than zero".into());
    }
    if config.audio_ttl_seconds == 0 {
        return Err("TTS_AUDIO_TTL_SECONDS must be greater than zero".into());
    }

    Ok(())
}
