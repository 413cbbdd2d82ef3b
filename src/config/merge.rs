use std::env;
use std::path::PathBuf;

use super::ServerConfig;
use super::utils::{env_bool, env_parsed};
use super::yaml::YamlConfig;

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration to use as overrides
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();
    let defaults = ServerConfig::default();

    // Helper macro for string values: YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok().filter(|v| !v.trim().is_empty()))
                .unwrap_or_else(|| $default)
        };
    }

    // Helper macro for optional string values: YAML > ENV
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            $yaml_value.or_else(|| env::var($env_var).ok().filter(|v| !v.trim().is_empty()))
        };
    }

    // Helper macro for parsed values: YAML > ENV > Default
    macro_rules! get_parsed {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            match $yaml_value {
                Some(value) => value,
                None => env_parsed($env_var)?.unwrap_or($default),
            }
        };
    }

    let server = yaml.server.unwrap_or_default();
    let tts = yaml.tts.unwrap_or_default();
    let providers = yaml.providers.unwrap_or_default();
    let storage = yaml.storage.unwrap_or_default();
    let codec = yaml.codec.unwrap_or_default();

    // Server configuration
    let host = get_value!("HOST", server.host, defaults.host);
    let port = get_parsed!("PORT", server.port, defaults.port);

    // Provider configuration
    let tts_provider = get_value!("TTS_PROVIDER", tts.provider, defaults.tts_provider)
        .trim()
        .to_lowercase();
    let azure_speech_subscription_key = get_optional!(
        "AZURE_SPEECH_SUBSCRIPTION_KEY",
        providers.azure_speech_subscription_key
    );
    let azure_speech_region = get_value!(
        "AZURE_SPEECH_REGION",
        providers.azure_speech_region,
        defaults.azure_speech_region
    );
    let azure_speech_endpoint =
        get_optional!("AZURE_SPEECH_ENDPOINT", providers.azure_speech_endpoint);
    let request_timeout_seconds = get_parsed!(
        "TTS_REQUEST_TIMEOUT_SECONDS",
        tts.request_timeout_seconds,
        defaults.request_timeout_seconds
    );

    // Rendering limits
    let max_text_chars = get_parsed!(
        "TTS_MAX_TEXT_CHARS",
        tts.max_text_chars,
        defaults.max_text_chars
    );
    let max_pause_ms = get_parsed!("TTS_MAX_PAUSE_MS", tts.max_pause_ms, defaults.max_pause_ms);
    let sample_rate_hz = get_parsed!("TTS_SAMPLE_RATE", tts.sample_rate, defaults.sample_rate_hz);
    let mp3_bitrate_kbps = get_parsed!(
        "TTS_MP3_BITRATE_KBPS",
        tts.mp3_bitrate_kbps,
        defaults.mp3_bitrate_kbps
    );

    // Storage configuration
    // Relative dirs are pinned to the working directory at startup. An empty
    // value is left for validation to report.
    let storage_dir = PathBuf::from(get_value!(
        "TTS_STORAGE_DIR",
        storage.dir,
        defaults.storage_dir.to_string_lossy().into_owned()
    ));
    let storage_dir = if storage_dir.as_os_str().is_empty() {
        storage_dir
    } else {
        std::path::absolute(storage_dir)?
    };
    let tmp_ttl_seconds = get_parsed!(
        "TTS_TMP_TTL_SECONDS",
        storage.tmp_ttl_seconds,
        defaults.tmp_ttl_seconds
    );
    let audio_ttl_seconds = get_parsed!(
        "TTS_AUDIO_TTL_SECONDS",
        storage.audio_ttl_seconds,
        defaults.audio_ttl_seconds
    );
    let cache_backend = get_value!(
        "TTS_CACHE_BACKEND",
        storage.cache_backend,
        defaults.cache_backend
    )
    .trim()
    .to_lowercase();
    let cleanup_enabled = match storage.cleanup_enabled {
        Some(value) => value,
        None => env_bool("TTS_CLEANUP_ENABLED")?.unwrap_or(defaults.cleanup_enabled),
    };

    // Codec tools
    let ffmpeg_bin = get_value!("FFMPEG_BIN", codec.ffmpeg_bin, defaults.ffmpeg_bin);
    let ffprobe_bin = get_value!("FFPROBE_BIN", codec.ffprobe_bin, defaults.ffprobe_bin);

    Ok(ServerConfig {
        host,
        port,
        tts_provider,
        azure_speech_subscription_key,
        azure_speech_region,
        azure_speech_endpoint,
        request_timeout_seconds,
        max_text_chars,
        max_pause_ms,
        sample_rate_hz,
        mp3_bitrate_kbps,
        storage_dir,
        tmp_ttl_seconds,
        audio_ttl_seconds,
        cache_backend,
        cleanup_enabled,
        ffmpeg_bin,
        ffprobe_bin,
    })
}
