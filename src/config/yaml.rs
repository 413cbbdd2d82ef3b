use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration; anything left out
/// falls back to the environment and then to built-in defaults.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///
/// tts:
///   provider: "azure"
///   max_text_chars: 20000
///   max_pause_ms: 10000
///   sample_rate: 24000
///   mp3_bitrate_kbps: 192
///   request_timeout_seconds: 60
///
/// providers:
///   azure_speech_subscription_key: "your-azure-key"
///   azure_speech_region: "eastus"
///
/// storage:
///   dir: "/var/lib/narrator"
///   tmp_ttl_seconds: 1800
///   audio_ttl_seconds: 604800
///   cache_backend: "filesystem"
///   cleanup_enabled: true
///
/// codec:
///   ffmpeg_bin: "/usr/bin/ffmpeg"
///   ffprobe_bin: "/usr/bin/ffprobe"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub tts: Option<TtsYaml>,
    pub providers: Option<ProvidersYaml>,
    pub storage: Option<StorageYaml>,
    pub codec: Option<CodecYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Rendering configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TtsYaml {
    pub provider: Option<String>,
    pub max_text_chars: Option<usize>,
    pub max_pause_ms: Option<u64>,
    pub sample_rate: Option<u32>,
    pub mp3_bitrate_kbps: Option<u32>,
    pub request_timeout_seconds: Option<u64>,
}

/// Provider credentials from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    /// Azure Speech Services subscription key
    /// (Azure Portal → Speech resource → Keys and Endpoint → Key 1 or Key 2)
    pub azure_speech_subscription_key: Option<String>,
    /// Azure region where the Speech resource is deployed (e.g., "eastus", "westus2")
    pub azure_speech_region: Option<String>,
    pub azure_speech_endpoint: Option<String>,
}

/// Storage and cache configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageYaml {
    pub dir: Option<String>,
    pub tmp_ttl_seconds: Option<u64>,
    pub audio_ttl_seconds: Option<u64>,
    pub cache_backend: Option<String>,
    pub cleanup_enabled: Option<bool>,
}

/// External codec tool locations from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CodecYaml {
    pub ffmpeg_bin: Option<String>,
    pub ffprobe_bin: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the YAML is malformed, or
    /// a field has the wrong type.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
