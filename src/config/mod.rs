//! Configuration module for the narrator server
//!
//! Configuration comes from environment variables (a `.env` file is honoured)
//! and, optionally, a YAML file. When both are present YAML values win over
//! environment variables, which win over built-in defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use narrator::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file merged with environment variables
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::cache::{CacheConfig, CleanupConfig};

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use validation::{SUPPORTED_PROVIDERS, SUPPORTED_SAMPLE_RATES};

/// Name of the artifact directory under the storage root.
pub const AUDIO_DIR_NAME: &str = "audio";
/// Name of the scratch directory under the storage root.
pub const TMP_DIR_NAME: &str = "tmp";

/// Maximum number of metadata records kept by the memory backend.
const MEMORY_CACHE_MAX_ENTRIES: u64 = 100_000;

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Provider selection and credentials
    pub tts_provider: String,
    pub azure_speech_subscription_key: Option<String>,
    pub azure_speech_region: String,
    /// Base URL override for the Azure endpoints (testing, sovereign clouds).
    pub azure_speech_endpoint: Option<String>,
    pub request_timeout_seconds: u64,

    // Rendering limits and output
    pub max_text_chars: usize,
    pub max_pause_ms: u64,
    pub sample_rate_hz: u32,
    pub mp3_bitrate_kbps: u32,

    // Storage and cache
    pub storage_dir: PathBuf,
    pub tmp_ttl_seconds: u64,
    pub audio_ttl_seconds: u64,
    /// `filesystem` or `memory`
    pub cache_backend: String,
    pub cleanup_enabled: bool,

    // External codec tools
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            tts_provider: "stub".to_string(),
            azure_speech_subscription_key: None,
            azure_speech_region: "eastus".to_string(),
            azure_speech_endpoint: None,
            request_timeout_seconds: 60,
            max_text_chars: 20_000,
            max_pause_ms: 10_000,
            sample_rate_hz: 24_000,
            mp3_bitrate_kbps: 192,
            storage_dir: PathBuf::from("storage"),
            tmp_ttl_seconds: 30 * 60,
            audio_ttl_seconds: 7 * 24 * 60 * 60,
            cache_backend: "filesystem".to_string(),
            cleanup_enabled: true,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file merged with environment variables
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables
    /// 3. Default values
    ///
    /// # Errors
    /// Returns an error if the YAML file cannot be read or is malformed, if an
    /// environment variable has an invalid format, or if validation fails.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // The .env file is not loaded here: the YAML file is the source of
        // truth and only real environment variables fill its gaps.
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Directory holding final artifacts and their metadata.
    pub fn audio_dir(&self) -> PathBuf {
        self.storage_dir.join(AUDIO_DIR_NAME)
    }

    /// Directory holding per-request scratch files.
    pub fn tmp_dir(&self) -> PathBuf {
        self.storage_dir.join(TMP_DIR_NAME)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Metadata backend selected by `cache_backend`.
    pub fn cache_config(&self) -> CacheConfig {
        match self.cache_backend.as_str() {
            "memory" => CacheConfig::Memory {
                max_entries: MEMORY_CACHE_MAX_ENTRIES,
                ttl_seconds: Some(self.audio_ttl_seconds),
            },
            _ => CacheConfig::Filesystem,
        }
    }

    /// Directories and lifetimes for the background sweeper.
    pub fn cleanup_config(&self) -> CleanupConfig {
        CleanupConfig {
            tmp_dir: self.tmp_dir(),
            tmp_ttl: Duration::from_secs(self.tmp_ttl_seconds),
            audio_dir: self.audio_dir(),
            audio_ttl: Duration::from_secs(self.audio_ttl_seconds),
        }
    }
}
